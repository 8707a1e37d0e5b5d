//! Decodes DICOM string data that uses a Specific Character Set into a
//! native UTF-8 string.

mod internal;

use internal::character_set::{self, CharacterSet, CodeElementPair};

/// The type of string to be decoded. This determines the characters that act
/// as delimiters and reset the active character set during decoding of
/// encoded strings that use ISO 2022 escape sequences.
///
/// Encountering a delimiter resets the active code elements back to their
/// initial state.
///
#[derive(Clone, Copy, PartialEq)]
pub enum StringType {
  /// A single-valued string that does not have multiplicity. This uses the
  /// control characters as delimiters and is for use with the `ShortText`,
  /// `LongText`, and `UnlimitedText` value representations.
  SingleValue,

  /// A multi-valued string that supports multiplicity. This uses the
  /// control characters and backslash as delimiters and is for use with the
  /// `LongString`, `ShortString` and `UnlimitedCharacters` value
  /// representations.
  MultiValue,

  /// A person name string. This uses the control characters, backslash,
  /// caret, and equals sign as delimiters. This is for use with the
  /// `PersonName` value representation.
  PersonName,
}

/// A specific character set as defined by the *'(0008,0005) Specific
/// Character Set'* DICOM tag. This is a list of one or more individual
/// character sets.
///
/// When there are multiple character sets in a specific character set it
/// means that Code Extension techniques are being used and that escape
/// sequences may be encountered when decoding.
///
#[derive(Clone, Debug, PartialEq)]
pub struct SpecificCharacterSet(Vec<&'static CharacterSet>);

impl Default for SpecificCharacterSet {
  /// Returns the default specific character set, i.e. the sole ISO_IR 6
  /// default repertoire.
  ///
  fn default() -> Self {
    Self(vec![&character_set::ISO_IR_6])
  }
}

impl SpecificCharacterSet {
  /// Converts a raw value from a *'(0008,0005) Specific Character Set'*
  /// data element into a `SpecificCharacterSet` instance that can be used
  /// to decode bytes into a native string.
  ///
  pub fn from_string(specific_character_set: &str) -> Result<Self, String> {
    let mut charsets: Vec<String> = specific_character_set
      .split('\\')
      .map(|s| s.trim_matches(['\0', ' ']).to_string())
      .collect();

    // If the first character set is empty then default it to IR 6, i.e. the
    // DICOM default character set
    if charsets.first() == Some(&"".to_string()) {
      if charsets.len() == 1 {
        charsets[0] = "ISO_IR 6".to_string();
      } else {
        charsets[0] = "ISO 2022 IR 6".to_string();
      }
    }

    // Convert to recognized character sets
    let mut charsets = charsets
      .iter()
      .map(|term| character_set::from_string(term))
      .collect::<Result<Vec<&'static CharacterSet>, String>>()?;

    // If the first character set does not use extensions then it must be
    // the only one. Conversely, if extensions are in use then all character
    // sets must support them.
    match charsets.as_slice() {
      [_] => Ok(Self(charsets)),

      _ => {
        let has_non_iso_2022_charset = charsets.iter().any(|charset| {
          matches!(
            charset,
            CharacterSet::SingleByteWithoutExtensions { .. }
              | CharacterSet::MultiByteWithoutExtensions { .. }
          )
        });

        if has_non_iso_2022_charset {
          Err(
            "SpecificCharacterSet has multiple non-ISO 2022 values"
              .to_string(),
          )
        } else {
          // If ISO 2022 IR 6 isn't specified in the character sets then
          // append it so it can still be used. This isn't mandated by the
          // spec but it improves compatibility.
          if !charsets.contains(&&character_set::ISO_2022_IR_6) {
            charsets.push(&character_set::ISO_2022_IR_6);
          }

          Ok(Self(charsets))
        }
      }
    }
  }

  /// Returns the defined terms of the character sets in this specific
  /// character set.
  ///
  pub fn defined_terms(&self) -> Vec<&'static str> {
    self.0.iter().map(|charset| charset.defined_term()).collect()
  }

  /// Returns whether a specific character set is byte compatible with
  /// UTF-8. This is only the case for the DICOM default character set
  /// (ISO_IR 6) and the UTF-8 character set itself (ISO_IR 192).
  ///
  pub fn is_utf8_compatible(&self) -> bool {
    self.0.len() == 1
      && (self.0[0] == &character_set::ISO_IR_6
        || self.0[0] == &character_set::ISO_IR_192)
  }

  /// Decodes bytes using a specific character set to a native string.
  ///
  /// Trailing whitespace is automatically removed, and invalid bytes are
  /// replaced with the U+FFFD character: �.
  ///
  pub fn decode_bytes(&self, bytes: &[u8], string_type: StringType) -> String {
    let mut s = match self.0.as_slice() {
      [CharacterSet::SingleByteWithoutExtensions {
        defined_term,
        decoder,
        ..
      }] => {
        // When using the ISO_IR 13 character set to decode bytes that
        // support multiplicity, use a variant of JIS X 0201 that allows the
        // backslash character
        let decoder = if *defined_term == "ISO_IR 13"
          && (string_type == StringType::MultiValue
            || string_type == StringType::PersonName)
        {
          internal::decoders::jis_x_0201_allowing_backslash
        } else {
          *decoder
        };

        character_set::decode_bytes(bytes, decoder)
      }

      [CharacterSet::MultiByteWithoutExtensions { decoder, .. }] => {
        character_set::decode_bytes(bytes, *decoder)
      }

      _ => self.decode_iso_2022_bytes(
        bytes,
        string_type,
        self.default_code_elements(),
      ),
    };

    trim_codepoints_end(&mut s);

    s
  }

  fn decode_iso_2022_bytes(
    &self,
    mut bytes: &[u8],
    string_type: StringType,
    mut active_code_elements: CodeElementPair,
  ) -> String {
    let mut s = String::with_capacity(bytes.len());

    loop {
      match bytes {
        [] => return s,

        // Detect escape sequences and use them to update the active code
        // elements
        [0x1B, rest @ ..] => {
          bytes = self.apply_escape_sequence(rest, &mut active_code_elements);
        }

        _ => {
          // Determine the decoder to use
          let decoder = match (bytes, &active_code_elements) {
            // If the byte has its high bit set and there is a G1 code
            // element active then use it
            ([byte, ..], (_, Some(g1))) if *byte >= 0x80 => g1.decoder,

            // Otherwise if there is a G0 code element active then use it
            (_, (Some(g0), _)) => g0.decoder,

            // Fall back to the default character set
            _ => internal::decoders::iso_ir_6,
          };

          // This unwrap is safe because decoders only error when fed no
          // bytes
          let (char, next_bytes) = decoder(bytes).unwrap();

          // Detect delimiters and reset code elements to default when they
          // occur
          match (char, &string_type) {
            ('\u{9}', _)
            | ('\u{A}', _)
            | ('\u{C}', _)
            | ('\u{D}', _)
            | ('\\', StringType::MultiValue)
            | ('\\', StringType::PersonName)
            | ('=', StringType::PersonName)
            | ('^', StringType::PersonName) => {
              active_code_elements = self.default_code_elements()
            }

            _ => (),
          };

          s.push(char);

          bytes = next_bytes;
        }
      }
    }
  }

  /// Returns the default G0 and G1 code elements which are the ones
  /// specified by the first character set. These are the initially active
  /// code elements and they are also reactivated after any delimiter is
  /// encountered.
  ///
  fn default_code_elements(&self) -> CodeElementPair {
    match self.0.as_slice() {
      [charset, ..] => charset.code_elements(),
      _ => (None, None),
    }
  }

  /// Attempts to update the active code elements based on the escape
  /// sequence at the start of the given bytes. If the escape sequence isn't
  /// for any of the available character sets then nothing happens, i.e.
  /// unrecognized escape sequences are ignored.
  ///
  fn apply_escape_sequence<'a>(
    &self,
    bytes: &'a [u8],
    active_code_elements: &mut CodeElementPair,
  ) -> &'a [u8] {
    for charset in self.0.iter() {
      let code_elements = charset.code_elements();

      // See if the escape sequence applies to the G0 code element of this
      // character set
      match update_code_element(&code_elements.0, bytes) {
        Ok(bytes) => {
          active_code_elements.0 = code_elements.0;
          return bytes;
        }

        // See if the escape sequence applies to the G1 code element of this
        // character set
        _ => match update_code_element(&code_elements.1, bytes) {
          Ok(bytes) => {
            active_code_elements.1 = code_elements.1;
            return bytes;
          }

          _ => continue,
        },
      }
    }

    bytes
  }
}

fn update_code_element<'a>(
  candidate: &Option<internal::character_set::CodeElement>,
  bytes: &'a [u8],
) -> Result<&'a [u8], ()> {
  match candidate {
    Some(candidate) => {
      let escape_sequence = candidate.escape_sequence;
      let escape_sequence_length = if escape_sequence[2] == 0 { 2 } else { 3 };

      if bytes.starts_with(&escape_sequence[0..escape_sequence_length]) {
        Ok(&bytes[escape_sequence_length..])
      } else {
        Err(())
      }
    }

    None => Err(()),
  }
}

/// Removes U+0000 and U+0020 characters from the end of a string.
///
fn trim_codepoints_end(s: &mut String) {
  while let Some(last_byte) = s.as_bytes().last() {
    if *last_byte != 0x00 && *last_byte != 0x20 {
      break;
    }

    s.pop();
  }
}

/// Replaces all bytes greater than 0x7F with the value 0x3F, i.e. the
/// question mark character. This can be used to ensure that only valid
/// ISO 646/US-ASCII bytes are present.
///
pub fn sanitize_default_charset_bytes(bytes: &mut [u8]) -> &[u8] {
  for b in bytes.iter_mut() {
    if *b > 0x7F {
      *b = 0x3F;
    }
  }

  bytes
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  pub fn specific_character_set_test() {
    assert!(SpecificCharacterSet::from_string("").is_ok());
    assert!(SpecificCharacterSet::from_string("ISO_IR 144").is_ok());
    assert!(SpecificCharacterSet::from_string("ISO IR 144").is_ok());
    assert!(SpecificCharacterSet::from_string("iso-ir 144").is_ok());
    assert!(SpecificCharacterSet::from_string("\\ISO_IR 144").is_err());
    assert!(SpecificCharacterSet::from_string("\\ISO 2022 IR 144").is_ok());
    assert!(
      SpecificCharacterSet::from_string("ISO 2022 IR 6\\ISO 2022 IR 87")
        .is_ok()
    );
    assert!(
      SpecificCharacterSet::from_string("ISO_IR 6\\ISO 2022 IR 87").is_err()
    );
    assert!(SpecificCharacterSet::from_string("ISO_IR 192").is_ok());
    assert!(
      SpecificCharacterSet::from_string("ISO_IR 192\\ISO 2022 IR 149")
        .is_err()
    );
    assert!(SpecificCharacterSet::from_string("GB18030").is_ok());
    assert!(SpecificCharacterSet::from_string("ISO_IR 90210").is_err());
  }

  #[test]
  pub fn is_utf8_compatible_test() {
    for (term, compatible) in [
      ("", true),
      ("ISO_IR 192", true),
      ("ISO_IR 100", false),
      ("\\ISO 2022 IR 87", false),
    ] {
      assert_eq!(
        SpecificCharacterSet::from_string(term)
          .unwrap()
          .is_utf8_compatible(),
        compatible
      );
    }
  }

  #[test]
  pub fn decode_bytes_single_byte_without_extensions_test() {
    // ISO IR 6 (ISO 646, US-ASCII)
    assert_eq!(
      decode_bytes("ISO_IR 6", b"Hello", StringType::PersonName),
      "Hello"
    );

    // ISO IR 100 (ISO 8859-1, Latin-1)
    assert_eq!(
      decode_bytes(
        "ISO_IR 100",
        &[0x42, 0x75, 0x63, 0x5E, 0x4A, 0xE9, 0x72, 0xF4, 0x6D, 0x65],
        StringType::PersonName,
      ),
      "Buc^Jérôme"
    );

    // ISO IR 101 (ISO 8859-2, Latin-2)
    assert_eq!(
      decode_bytes(
        "ISO_IR 101",
        &[0x57, 0x61, 0xB3, 0xEA, 0x73, 0x61],
        StringType::PersonName,
      ),
      "Wałęsa"
    );

    // ISO IR 144 (ISO 8859-5, Latin/Cyrillic)
    assert_eq!(
      decode_bytes(
        "ISO_IR 144",
        &[0xBB, 0xEE, 0xDA, 0x63, 0x65, 0xDC, 0xD1, 0x79, 0x70, 0xD3],
        StringType::PersonName,
      ),
      "Люкceмбypг"
    );

    // ISO IR 126 (ISO 8859-7, Latin/Greek)
    assert_eq!(
      decode_bytes(
        "ISO_IR 126",
        &[0xC4, 0xE9, 0xEF, 0xED, 0xF5, 0xF3, 0xE9, 0xEF, 0xF2],
        StringType::PersonName,
      ),
      "Διονυσιος"
    );

    // ISO IR 148 (ISO 8859-9, Latin-5)
    assert_eq!(
      decode_bytes(
        "ISO_IR 148",
        &[0xC7, 0x61, 0x76, 0x75, 0xFE, 0x6F, 0xF0, 0x6C, 0x75],
        StringType::PersonName,
      ),
      "Çavuşoğlu"
    );

    // ISO IR 13 (JIS X 0201)
    assert_eq!(
      decode_bytes(
        "ISO_IR 13",
        &[0xD4, 0xCF, 0xC0, 0xDE, 0x5E, 0xC0, 0xDB, 0xB3],
        StringType::PersonName,
      ),
      "ﾔﾏﾀﾞ^ﾀﾛｳ"
    );

    // An 0x5C byte is the Yen symbol in a single-valued JIS X 0201 string
    assert_eq!(
      decode_bytes(
        "ISO_IR 13",
        &[0xA6, 0xDD, 0xDF, 0x5C, 0x7E],
        StringType::SingleValue,
      ),
      "ｦﾝﾟ¥‾"
    );

    // An 0x5C byte is a backslash in a JIS X 0201 string with multiplicity
    assert_eq!(
      decode_bytes(
        "ISO_IR 13",
        &[0xA6, 0xDD, 0xDF, 0x5C, 0x7E],
        StringType::MultiValue,
      ),
      "ｦﾝﾟ\\‾"
    );

    // ISO IR 166 (ISO 8859-11, TIS 620-2533)
    assert_eq!(
      decode_bytes(
        "ISO_IR 166",
        &[0xB9, 0xD2, 0xC1, 0xCA, 0xA1, 0xD8, 0xC5],
        StringType::PersonName,
      ),
      "นามสกุล"
    );
  }

  #[test]
  pub fn decode_bytes_single_byte_with_extensions_test() {
    // ISO 2022 IR 126 with an escape sequence designating G1
    assert_eq!(
      decode_bytes(
        "ISO 2022 IR 126",
        &[
          0x1B, 0x2D, 0x46, 0xC4, 0xE9, 0xEF, 0xED, 0xF5, 0xF3, 0xE9, 0xEF,
          0xF2
        ],
        StringType::PersonName,
      ),
      "Διονυσιος"
    );

    // Multiple values in different single-byte encodings
    assert_eq!(
      decode_bytes(
        "ISO 2022 IR 100\\ISO 2022 IR 144\\ISO 2022 IR 126",
        &[
          0x42, 0x75, 0x63, 0x5E, 0x4A, 0xE9, 0x72, 0xF4, 0x6D, 0x65, 0x5C,
          0x1B, 0x2D, 0x46, 0xC4, 0xE9, 0xEF, 0xED, 0xF5, 0xF3, 0xE9, 0xEF,
          0xF2, 0x5C, 0x1B, 0x2D, 0x4C, 0xBB, 0xEE, 0xDA, 0x63, 0x65, 0xDC,
          0xD1, 0x79, 0x70, 0xD3,
        ],
        StringType::PersonName,
      ),
      "Buc^Jérôme\\Διονυσιος\\Люкceмбypг"
    );

    // An invalid escape sequence is ignored
    assert_eq!(
      decode_bytes(
        "ISO 2022 IR 126",
        &[0x1B, 0x2D, 0x46, 0xC4, 0x1B, 0xC4],
        StringType::SingleValue,
      ),
      "ΔΔ"
    );
  }

  #[test]
  pub fn decode_bytes_multi_byte_with_extensions_test() {
    // ISO 2022 IR 87 (JIS X 0208) designated into G0
    assert_eq!(
      decode_bytes(
        "\\ISO 2022 IR 87",
        &[0x1B, 0x24, 0x42, 0x3B, 0x33, 0x45, 0x44],
        StringType::PersonName,
      ),
      "山田"
    );

    // A 0x5C lead byte is not treated as a backslash inside JIS X 0208
    assert_eq!(
      decode_bytes(
        "\\ISO 2022 IR 87",
        &[0x1B, 0x24, 0x42, 0x5C, 0x41],
        StringType::MultiValue
      ),
      "楞"
    );

    // ISO 2022 IR 149 (KS X 1001) designated into G1
    assert_eq!(
      decode_bytes(
        "\\ISO 2022 IR 149",
        &[
          0x1B, 0x24, 0x29, 0x43, 0xB1, 0xE8, 0xC8, 0xF1, 0xC1, 0xDF, 0x1B,
          0x28, 0x42, 0x5C, 0x1B, 0x24, 0x29, 0x43, 0xB1, 0xE8, 0xC8, 0xF1,
          0xC1, 0xDF, 0x1B, 0x28, 0x42, 0x20,
        ],
        StringType::PersonName,
      ),
      "김희중\\김희중"
    );

    // ISO 2022 IR 58 (GB 2312) designated into G1
    assert_eq!(
      decode_bytes(
        "\\ISO 2022 IR 58",
        &[
          0x5A, 0x68, 0x61, 0x6E, 0x67, 0x5E, 0x58, 0x69, 0x61, 0x6F, 0x44,
          0x6F, 0x6E, 0x67, 0x3D, 0x1B, 0x24, 0x29, 0x41, 0xD5, 0xC5, 0x5E,
          0x1B, 0x24, 0x29, 0x41, 0xD0, 0xA1, 0xB6, 0xAB, 0x3D, 0x20,
        ],
        StringType::PersonName,
      ),
      "Zhang^XiaoDong=张^小东="
    );

    // Example from Annex H of the DICOM standard (Japanese)
    assert_eq!(
      decode_bytes(
        "ISO 2022 IR 13\\ISO 2022 IR 87",
        &[
          0xD4, 0xCF, 0xC0, 0xDE, 0x5E, 0xC0, 0xDB, 0xB3, 0x3D, 0x1B, 0x24,
          0x42, 0x3B, 0x33, 0x45, 0x44, 0x1B, 0x28, 0x42, 0x5E, 0x1B, 0x24,
          0x42, 0x42, 0x40, 0x4F, 0x3A, 0x1B, 0x28, 0x42, 0x3D, 0x1B, 0x24,
          0x42, 0x24, 0x64, 0x24, 0x5E, 0x24, 0x40, 0x1B, 0x28, 0x42, 0x5E,
          0x1B, 0x24, 0x42, 0x24, 0x3F, 0x24, 0x6D, 0x24, 0x26, 0x1B, 0x28,
          0x42,
        ],
        StringType::PersonName,
      ),
      "ﾔﾏﾀﾞ^ﾀﾛｳ=山田^太郎=やまだ^たろう"
    );
  }

  #[test]
  pub fn decode_bytes_multi_byte_without_extensions_test() {
    // ISO IR 192 (UTF-8)
    assert_eq!(
      decode_bytes(
        "ISO_IR 192",
        &[
          0x57, 0x61, 0x6E, 0x67, 0x5E, 0x58, 0x69, 0x61, 0x6F, 0x44, 0x6F,
          0x6E, 0x67, 0x3D, 0xE7, 0x8E, 0x8B, 0x5E, 0xE5, 0xB0, 0x8F, 0xE6,
          0x9D, 0xB1, 0x3D, 0x20,
        ],
        StringType::PersonName,
      ),
      "Wang^XiaoDong=王^小東="
    );

    // GB 18030
    assert_eq!(
      decode_bytes(
        "GB18030",
        &[
          0x57, 0x61, 0x6E, 0x67, 0x5E, 0x58, 0x69, 0x61, 0x6F, 0x44, 0x6F,
          0x6E, 0x67, 0x3D, 0xCD, 0xF5, 0x5E, 0xD0, 0xA1, 0xB6, 0xAB, 0x3D,
        ],
        StringType::PersonName,
      ),
      "Wang^XiaoDong=王^小东="
    );
  }

  fn decode_bytes(
    specific_character_set: &str,
    bytes: &[u8],
    string_type: StringType,
  ) -> String {
    let charset =
      SpecificCharacterSet::from_string(specific_character_set).unwrap();

    charset.decode_bytes(bytes, string_type)
  }

  #[test]
  pub fn sanitize_default_charset_bytes_test() {
    assert_eq!(
      sanitize_default_charset_bytes(&mut [0x40, 0xDD, 0x60]),
      [0x40, 0x3F, 0x60]
    );
  }
}
