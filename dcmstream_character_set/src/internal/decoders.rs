//! Decoder functions that read the next Unicode codepoint out of bytes
//! stored in a specific DICOM character repertoire.
//!
//! The multi-byte East Asian repertoires are decoded through `encoding_rs`
//! by re-basing the 94x94 code points onto the corresponding EUC encodings.

use encoding_rs::Encoding;

/// A function that decodes the next codepoint from the given bytes and
/// returns it along with the remaining bytes.
///
/// Returns an error if called with no bytes.
///
pub type DecodeNextCodepointFn = fn(&[u8]) -> Result<(char, &[u8]), ()>;

/// The replacement character emitted for invalid byte sequences.
///
const REPLACEMENT: char = '\u{FFFD}';

/// Decodes a complete byte sequence for one codepoint using the given
/// `encoding_rs` encoding.
///
fn decode_with(encoding: &'static Encoding, bytes: &[u8]) -> char {
  let (decoded, _) = encoding.decode_without_bom_handling(bytes);

  decoded.chars().next().unwrap_or(REPLACEMENT)
}

/// Decodes the next byte of a single-byte character set through the given
/// `encoding_rs` encoding.
///
fn decode_single_byte<'a>(
  encoding: &'static Encoding,
  bytes: &'a [u8],
) -> Result<(char, &'a [u8]), ()> {
  match bytes {
    [] => Err(()),
    [byte, rest @ ..] => Ok((decode_with(encoding, &[*byte]), rest)),
  }
}

/// ISO IR 6, i.e. ISO 646 / US-ASCII, the DICOM default repertoire.
///
pub fn iso_ir_6(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  match bytes {
    [] => Err(()),
    [byte, rest @ ..] if *byte < 0x80 => Ok((char::from(*byte), rest)),
    [_, rest @ ..] => Ok((REPLACEMENT, rest)),
  }
}

/// ISO 8859-1, Latin-1. Its bytes are exactly the first 256 Unicode
/// codepoints.
///
pub fn iso_8859_1(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  match bytes {
    [] => Err(()),
    [byte, rest @ ..] => Ok((char::from_u32((*byte).into()).unwrap(), rest)),
  }
}

pub fn iso_8859_2(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  decode_single_byte(encoding_rs::ISO_8859_2, bytes)
}

pub fn iso_8859_3(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  decode_single_byte(encoding_rs::ISO_8859_3, bytes)
}

pub fn iso_8859_4(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  decode_single_byte(encoding_rs::ISO_8859_4, bytes)
}

pub fn iso_8859_5(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  decode_single_byte(encoding_rs::ISO_8859_5, bytes)
}

pub fn iso_8859_6(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  decode_single_byte(encoding_rs::ISO_8859_6, bytes)
}

pub fn iso_8859_7(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  decode_single_byte(encoding_rs::ISO_8859_7, bytes)
}

pub fn iso_8859_8(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  decode_single_byte(encoding_rs::ISO_8859_8, bytes)
}

/// ISO 8859-9, Latin-5. The windows-1254 encoding is its superset and
/// identical over the 0xA0-0xFF range used by DICOM G1 code elements.
///
pub fn iso_8859_9(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  decode_single_byte(encoding_rs::WINDOWS_1254, bytes)
}

/// ISO 8859-11 / TIS 620-2533, Thai. The windows-874 encoding is its
/// superset and identical over the 0xA0-0xFF range.
///
pub fn iso_8859_11(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  decode_single_byte(encoding_rs::WINDOWS_874, bytes)
}

pub fn iso_8859_15(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  decode_single_byte(encoding_rs::ISO_8859_15, bytes)
}

/// JIS X 0201, Japanese romaji and half-width katakana. The repertoire is
/// ASCII with the Yen sign at 0x5C and an overline at 0x7E, plus the
/// katakana block in the 0xA1-0xDF range.
///
pub fn jis_x_0201(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  match bytes {
    [] => Err(()),
    [0x5C, rest @ ..] => Ok(('¥', rest)),
    [0x7E, rest @ ..] => Ok(('‾', rest)),
    [byte, rest @ ..] if *byte < 0x80 => Ok((char::from(*byte), rest)),
    [byte @ 0xA1..=0xDF, rest @ ..] => {
      Ok((char::from_u32(0xFF61 + u32::from(*byte) - 0xA1).unwrap(), rest))
    }
    [_, rest @ ..] => Ok((REPLACEMENT, rest)),
  }
}

/// A variant of JIS X 0201 decoding in which the 0x5C byte stays a
/// backslash. This is used when decoding string values that support
/// multiplicity, where 0x5C must act as the value delimiter.
///
pub fn jis_x_0201_allowing_backslash(
  bytes: &[u8],
) -> Result<(char, &[u8]), ()> {
  match bytes {
    [0x5C, rest @ ..] => Ok(('\\', rest)),
    _ => jis_x_0201(bytes),
  }
}

/// JIS X 0208, the main Japanese multi-byte repertoire. Two-byte code
/// points are re-based into EUC-JP by setting the high bit of both bytes.
///
pub fn jis_x_0208(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  match bytes {
    [] => Err(()),
    [b0, b1, rest @ ..] => {
      let euc_jp = [*b0 | 0x80, *b1 | 0x80];
      Ok((decode_with(encoding_rs::EUC_JP, &euc_jp), rest))
    }
    [_, rest @ ..] => Ok((REPLACEMENT, rest)),
  }
}

/// JIS X 0212, the supplementary Japanese repertoire. Two-byte code points
/// live in the SS3-prefixed plane of EUC-JP.
///
pub fn jis_x_0212(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  match bytes {
    [] => Err(()),
    [b0, b1, rest @ ..] => {
      let euc_jp = [0x8F, *b0 | 0x80, *b1 | 0x80];
      Ok((decode_with(encoding_rs::EUC_JP, &euc_jp), rest))
    }
    [_, rest @ ..] => Ok((REPLACEMENT, rest)),
  }
}

/// KS X 1001, Korean. Two-byte code points are re-based into EUC-KR by
/// setting the high bit of both bytes, which is a no-op for the G1 bytes
/// DICOM data carries.
///
pub fn ks_x_1001(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  match bytes {
    [] => Err(()),
    [b0, b1, rest @ ..] => {
      let euc_kr = [*b0 | 0x80, *b1 | 0x80];
      Ok((decode_with(encoding_rs::EUC_KR, &euc_kr), rest))
    }
    [_, rest @ ..] => Ok((REPLACEMENT, rest)),
  }
}

/// GB 18030 and its GB 2312 / GBK subsets. Code point length is determined
/// from the lead bytes: a byte value of 0x30-0x39 in the second position
/// marks a four-byte code point.
///
pub fn gb_18030(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  match bytes {
    [] => Err(()),

    [byte, rest @ ..] if *byte < 0x80 => Ok((char::from(*byte), rest)),

    [b0, b1 @ 0x30..=0x39, b2, b3, rest @ ..] => Ok((
      decode_with(encoding_rs::GB18030, &[*b0, *b1, *b2, *b3]),
      rest,
    )),

    [b0, b1, rest @ ..] => {
      let high_bit = [*b0 | 0x80, *b1 | 0x80];

      // G1 bytes from an ISO 2022 stream have their high bits stripped or
      // present depending on the writer; the re-based form covers both
      let two_bytes = if *b0 >= 0x80 { [*b0, *b1] } else { high_bit };

      Ok((decode_with(encoding_rs::GB18030, &two_bytes), rest))
    }

    [_, rest @ ..] => Ok((REPLACEMENT, rest)),
  }
}

/// UTF-8.
///
pub fn utf8(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  if bytes.is_empty() {
    return Err(());
  }

  let char_length = match bytes[0] {
    0x00..=0x7F => 1,
    0xC0..=0xDF => 2,
    0xE0..=0xEF => 3,
    0xF0..=0xF7 => 4,
    _ => return Ok((REPLACEMENT, &bytes[1..])),
  };

  if bytes.len() < char_length {
    return Ok((REPLACEMENT, &bytes[bytes.len()..]));
  }

  match std::str::from_utf8(&bytes[..char_length]) {
    Ok(s) => Ok((s.chars().next().unwrap(), &bytes[char_length..])),
    Err(_) => Ok((REPLACEMENT, &bytes[1..])),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn jis_x_0201_test() {
    assert_eq!(jis_x_0201(&[0xD4, 0xCF]), Ok(('ﾔ', [0xCF].as_slice())));
    assert_eq!(jis_x_0201(&[0x5C]), Ok(('¥', [].as_slice())));
    assert_eq!(
      jis_x_0201_allowing_backslash(&[0x5C]),
      Ok(('\\', [].as_slice()))
    );
  }

  #[test]
  fn jis_x_0208_test() {
    // 0x3B33 0x4544 is 山田
    assert_eq!(jis_x_0208(&[0x3B, 0x33, 0x45, 0x44]).unwrap().0, '山');
    assert_eq!(jis_x_0208(&[0x45, 0x44]).unwrap().0, '田');
  }

  #[test]
  fn ks_x_1001_test() {
    assert_eq!(ks_x_1001(&[0xB1, 0xE8]).unwrap().0, '김');
  }

  #[test]
  fn gb_18030_test() {
    assert_eq!(gb_18030(&[0xD0, 0xA1]).unwrap().0, '小');
    assert_eq!(gb_18030(b"a").unwrap().0, 'a');
  }

  #[test]
  fn utf8_test() {
    let (c, rest) = utf8("山x".as_bytes()).unwrap();
    assert_eq!(c, '山');
    assert_eq!(rest, b"x");
  }
}
