//! The header of a single data element as stored in DICOM P10, and its
//! serialization to the 8 and 12-byte wire forms.

use dcmstream_core::transfer_syntax::Endianness;
use dcmstream_core::{dictionary, DataElementTag, ValueRepresentation};

use crate::internal::value_length::ValueLength;

/// Describes the header for a single DICOM data element, specifically its
/// tag, VR, and length. The VR is optional because some data elements, e.g.
/// sequence delimiters and sequence item delimiters, don't have a VR.
///
pub struct DataElementHeader {
  pub tag: DataElementTag,
  pub vr: Option<ValueRepresentation>,
  pub length: ValueLength,
}

impl std::fmt::Display for DataElementHeader {
  /// Converts a data element header to a human-readable string in the
  /// format "(GROUP,ELEMENT) VR NAME", e.g. `"(0008,0020) DA Study Date"`.
  ///
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    let tag_name = dictionary::tag_name(self.tag);

    match self.vr {
      Some(vr) => write!(f, "{} {} {}", self.tag, vr, tag_name),
      _ => write!(f, "{} {}", self.tag, tag_name),
    }
  }
}

/// The two possibilities for the size of the value length for a VR stored in
/// the DICOM P10 format.
///
pub enum ValueLengthSize {
  U16,
  U32,
}

impl DataElementHeader {
  /// Returns the size of the value length for a VR stored in the DICOM P10
  /// format.
  ///
  pub fn value_length_size(vr: ValueRepresentation) -> ValueLengthSize {
    match vr {
      ValueRepresentation::AgeString
      | ValueRepresentation::ApplicationEntity
      | ValueRepresentation::AttributeTag
      | ValueRepresentation::CodeString
      | ValueRepresentation::Date
      | ValueRepresentation::DateTime
      | ValueRepresentation::DecimalString
      | ValueRepresentation::FloatingPointDouble
      | ValueRepresentation::FloatingPointSingle
      | ValueRepresentation::IntegerString
      | ValueRepresentation::LongString
      | ValueRepresentation::LongText
      | ValueRepresentation::PersonName
      | ValueRepresentation::ShortString
      | ValueRepresentation::ShortText
      | ValueRepresentation::SignedLong
      | ValueRepresentation::SignedShort
      | ValueRepresentation::Time
      | ValueRepresentation::UniqueIdentifier
      | ValueRepresentation::UnsignedLong
      | ValueRepresentation::UnsignedShort => ValueLengthSize::U16,

      ValueRepresentation::OtherByteString
      | ValueRepresentation::OtherDoubleString
      | ValueRepresentation::OtherFloatString
      | ValueRepresentation::OtherLongString
      | ValueRepresentation::OtherVeryLongString
      | ValueRepresentation::OtherWordString
      | ValueRepresentation::Sequence
      | ValueRepresentation::SignedVeryLong
      | ValueRepresentation::UniversalResourceIdentifier
      | ValueRepresentation::Unknown
      | ValueRepresentation::UnlimitedCharacters
      | ValueRepresentation::UnlimitedText
      | ValueRepresentation::UnsignedVeryLong => ValueLengthSize::U32,
    }
  }

  /// Serializes this header to the bytes that encode it in DICOM P10 data.
  ///
  /// A header without a VR uses the 8-byte implicit form: tag followed by a
  /// 32-bit length. A header with a VR uses the explicit form, where the
  /// VR's length field size decides between the 8-byte layout with a 16-bit
  /// length and the 12-byte layout with two reserved bytes and a 32-bit
  /// length. Fails when the length overflows a 16-bit length field.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn to_bytes(&self, endianness: Endianness) -> Result<Vec<u8>, ()> {
    let length = self.length.to_u32();

    let mut bytes = Vec::with_capacity(12);
    put_u16(&mut bytes, self.tag.group, endianness);
    put_u16(&mut bytes, self.tag.element, endianness);

    match self.vr {
      None => put_u32(&mut bytes, length, endianness),

      Some(vr) => {
        bytes.extend_from_slice(&vr.to_bytes());

        match Self::value_length_size(vr) {
          ValueLengthSize::U16 => {
            let length = u16::try_from(length).map_err(|_| ())?;
            put_u16(&mut bytes, length, endianness);
          }

          ValueLengthSize::U32 => {
            bytes.extend_from_slice(&[0, 0]);
            put_u32(&mut bytes, length, endianness);
          }
        }
      }
    }

    Ok(bytes)
  }
}

fn put_u16(bytes: &mut Vec<u8>, value: u16, endianness: Endianness) {
  match endianness {
    Endianness::LittleEndian => bytes.extend_from_slice(&value.to_le_bytes()),
    Endianness::BigEndian => bytes.extend_from_slice(&value.to_be_bytes()),
  }
}

fn put_u32(bytes: &mut Vec<u8>, value: u32, endianness: Endianness) {
  match endianness {
    Endianness::LittleEndian => bytes.extend_from_slice(&value.to_le_bytes()),
    Endianness::BigEndian => bytes.extend_from_slice(&value.to_be_bytes()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn to_string_test() {
    assert_eq!(
      DataElementHeader {
        tag: dictionary::STUDY_DATE.tag,
        vr: Some(ValueRepresentation::Date),
        length: ValueLength::new(8),
      }
      .to_string(),
      "(0008,0020) DA Study Date".to_string()
    );

    assert_eq!(
      DataElementHeader {
        tag: dictionary::SEQUENCE_DELIMITATION_ITEM.tag,
        vr: None,
        length: ValueLength::ZERO,
      }
      .to_string(),
      "(FFFE,E0DD) Sequence Delimitation Item".to_string()
    );
  }

  #[test]
  fn implicit_form_to_bytes_test() {
    // An item header with undefined length
    assert_eq!(
      DataElementHeader {
        tag: dictionary::ITEM.tag,
        vr: None,
        length: ValueLength::Undefined,
      }
      .to_bytes(Endianness::LittleEndian),
      Ok(vec![0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF])
    );

    assert_eq!(
      DataElementHeader {
        tag: dictionary::ITEM.tag,
        vr: None,
        length: ValueLength::new(0x0C),
      }
      .to_bytes(Endianness::BigEndian),
      Ok(vec![0xFF, 0xFE, 0xE0, 0x00, 0x00, 0x00, 0x00, 0x0C])
    );
  }

  #[test]
  fn explicit_form_to_bytes_test() {
    // A VR with a 16-bit length field uses the 8-byte layout
    assert_eq!(
      DataElementHeader {
        tag: dictionary::STUDY_DATE.tag,
        vr: Some(ValueRepresentation::Date),
        length: ValueLength::new(8),
      }
      .to_bytes(Endianness::LittleEndian),
      Ok(vec![0x08, 0x00, 0x20, 0x00, 0x44, 0x41, 0x08, 0x00])
    );

    assert_eq!(
      DataElementHeader {
        tag: dictionary::ROWS.tag,
        vr: Some(ValueRepresentation::UnsignedShort),
        length: ValueLength::new(2),
      }
      .to_bytes(Endianness::BigEndian),
      Ok(vec![0x00, 0x28, 0x00, 0x10, 0x55, 0x53, 0x00, 0x02])
    );

    // A VR with a 32-bit length field uses the 12-byte layout with two
    // reserved bytes after the VR
    assert_eq!(
      DataElementHeader {
        tag: dictionary::DERIVATION_CODE_SEQUENCE.tag,
        vr: Some(ValueRepresentation::Sequence),
        length: ValueLength::Undefined,
      }
      .to_bytes(Endianness::LittleEndian),
      Ok(vec![
        0x08, 0x00, 0x15, 0x92, 0x53, 0x51, 0x00, 0x00, 0xFF, 0xFF, 0xFF,
        0xFF
      ])
    );

    assert_eq!(
      DataElementHeader {
        tag: dictionary::FILE_META_INFORMATION_VERSION.tag,
        vr: Some(ValueRepresentation::OtherByteString),
        length: ValueLength::new(0x000A0B0C),
      }
      .to_bytes(Endianness::BigEndian),
      Ok(vec![
        0x00, 0x02, 0x00, 0x01, 0x4F, 0x42, 0x00, 0x00, 0x00, 0x0A, 0x0B,
        0x0C
      ])
    );
  }

  #[test]
  fn length_overflow_to_bytes_test() {
    // 16-bit length fields reject lengths above 0xFFFF
    assert_eq!(
      DataElementHeader {
        tag: dictionary::PATIENT_ID.tag,
        vr: Some(ValueRepresentation::LongString),
        length: ValueLength::new(0x10000),
      }
      .to_bytes(Endianness::LittleEndian),
      Err(())
    );
  }
}
