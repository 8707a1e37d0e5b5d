//! A single decoded data element value and the typed accessors over its
//! bytes.

use byteorder::ByteOrder;
use unicode_segmentation::UnicodeSegmentation;

use crate::element_set::{
  attribute_tag, date::StructuredDate, date_time::StructuredDateTime,
  decimal_string, integer_string, person_name,
  person_name::StructuredPersonName, time::StructuredTime, unique_identifier,
};
use crate::{
  utils, DataElementTag, DataError, RcByteSlice, ValueRepresentation,
};

/// A data element value holding raw bytes for a specific VR, along with the
/// encoding the bytes use. The bytes are always padded to even length with
/// the VR's pad byte.
///
/// The bytes are stored exactly as they appeared on the wire, so binary
/// values of big endian streams stay big endian; the `big_endian` flag
/// records which interpretation applies.
///
#[derive(Clone, Debug, PartialEq)]
pub struct ValueElement {
  pub tag: DataElementTag,
  pub vr: ValueRepresentation,
  pub bytes: RcByteSlice,
  pub big_endian: bool,
  pub explicit_vr: bool,
}

impl ValueElement {
  /// Creates a new value element with the given VR and bytes, padding the
  /// bytes to even length. Little endian, explicit VR encoding is assumed.
  ///
  pub fn new(
    tag: DataElementTag,
    vr: ValueRepresentation,
    bytes: RcByteSlice,
  ) -> Result<Self, DataError> {
    Self::new_with_encoding(tag, vr, bytes, false, true)
  }

  /// Creates a new value element with the given VR, bytes, and encoding,
  /// padding the bytes to even length.
  ///
  pub fn new_with_encoding(
    tag: DataElementTag,
    vr: ValueRepresentation,
    bytes: RcByteSlice,
    big_endian: bool,
    explicit_vr: bool,
  ) -> Result<Self, DataError> {
    if vr == ValueRepresentation::Sequence {
      return Err(DataError::new_value_invalid(format!(
        "Value representation '{vr}' is not valid for a value element"
      )));
    }

    let bytes = if bytes.len() % 2 == 1 {
      let mut padded = bytes.into_vec();
      vr.pad_bytes_to_even_length(&mut padded);
      padded.into()
    } else {
      bytes
    };

    let element = Self {
      tag,
      vr,
      bytes,
      big_endian,
      explicit_vr,
    };

    element.validate_length()?;

    Ok(element)
  }

  /// Creates a new value element without validating or padding the bytes.
  ///
  pub fn new_unchecked(
    tag: DataElementTag,
    vr: ValueRepresentation,
    bytes: RcByteSlice,
    big_endian: bool,
    explicit_vr: bool,
  ) -> Self {
    Self {
      tag,
      vr,
      bytes,
      big_endian,
      explicit_vr,
    }
  }

  /// Creates a new `CodeString` value element.
  ///
  pub fn new_code_string(
    tag: DataElementTag,
    values: &[&str],
  ) -> Result<Self, DataError> {
    new_string_list(tag, ValueRepresentation::CodeString, values)
  }

  /// Creates a new `LongString` value element.
  ///
  pub fn new_long_string(
    tag: DataElementTag,
    values: &[&str],
  ) -> Result<Self, DataError> {
    new_string_list(tag, ValueRepresentation::LongString, values)
  }

  /// Creates a new `ShortString` value element.
  ///
  pub fn new_short_string(
    tag: DataElementTag,
    values: &[&str],
  ) -> Result<Self, DataError> {
    new_string_list(tag, ValueRepresentation::ShortString, values)
  }

  /// Creates a new `LongText` value element.
  ///
  pub fn new_long_text(
    tag: DataElementTag,
    value: &str,
  ) -> Result<Self, DataError> {
    let bytes = value.trim_end_matches(' ').as_bytes().to_vec();

    Self::new(tag, ValueRepresentation::LongText, bytes.into())
  }

  /// Creates a new `UniqueIdentifier` value element.
  ///
  pub fn new_unique_identifier(
    tag: DataElementTag,
    values: &[&str],
  ) -> Result<Self, DataError> {
    let bytes = unique_identifier::to_bytes(values)?;

    Self::new(tag, ValueRepresentation::UniqueIdentifier, bytes.into())
  }

  /// Creates a new `PersonName` value element.
  ///
  pub fn new_person_name(
    tag: DataElementTag,
    values: &[StructuredPersonName],
  ) -> Result<Self, DataError> {
    let bytes = person_name::to_bytes(values)?;

    Self::new(tag, ValueRepresentation::PersonName, bytes.into())
  }

  /// Creates a new `Date` value element.
  ///
  pub fn new_date(
    tag: DataElementTag,
    value: &StructuredDate,
  ) -> Result<Self, DataError> {
    Self::new(tag, ValueRepresentation::Date, value.to_bytes()?.into())
  }

  /// Creates a new `Time` value element.
  ///
  pub fn new_time(
    tag: DataElementTag,
    value: &StructuredTime,
  ) -> Result<Self, DataError> {
    Self::new(tag, ValueRepresentation::Time, value.to_bytes()?.into())
  }

  /// Creates a new `DateTime` value element.
  ///
  pub fn new_date_time(
    tag: DataElementTag,
    value: &StructuredDateTime,
  ) -> Result<Self, DataError> {
    Self::new(tag, ValueRepresentation::DateTime, value.to_bytes()?.into())
  }

  /// Creates a new `IntegerString` value element.
  ///
  pub fn new_integer_string(
    tag: DataElementTag,
    values: &[i32],
  ) -> Result<Self, DataError> {
    Self::new(
      tag,
      ValueRepresentation::IntegerString,
      integer_string::to_bytes(values).into(),
    )
  }

  /// Creates a new `DecimalString` value element.
  ///
  pub fn new_decimal_string(
    tag: DataElementTag,
    values: &[f64],
  ) -> Result<Self, DataError> {
    Self::new(
      tag,
      ValueRepresentation::DecimalString,
      decimal_string::to_bytes(values).into(),
    )
  }

  /// Creates a new `UnsignedShort` value element.
  ///
  pub fn new_unsigned_short(
    tag: DataElementTag,
    values: &[u16],
  ) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; values.len() * 2];
    byteorder::LittleEndian::write_u16_into(values, &mut bytes);

    Self::new(tag, ValueRepresentation::UnsignedShort, bytes.into())
  }

  /// Creates a new `UnsignedLong` value element.
  ///
  pub fn new_unsigned_long(
    tag: DataElementTag,
    values: &[u32],
  ) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; values.len() * 4];
    byteorder::LittleEndian::write_u32_into(values, &mut bytes);

    Self::new(tag, ValueRepresentation::UnsignedLong, bytes.into())
  }

  /// Creates a new `SignedShort` value element.
  ///
  pub fn new_signed_short(
    tag: DataElementTag,
    values: &[i16],
  ) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; values.len() * 2];
    byteorder::LittleEndian::write_i16_into(values, &mut bytes);

    Self::new(tag, ValueRepresentation::SignedShort, bytes.into())
  }

  /// Creates a new `SignedLong` value element.
  ///
  pub fn new_signed_long(
    tag: DataElementTag,
    values: &[i32],
  ) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; values.len() * 4];
    byteorder::LittleEndian::write_i32_into(values, &mut bytes);

    Self::new(tag, ValueRepresentation::SignedLong, bytes.into())
  }

  /// Creates a new `FloatingPointSingle` value element.
  ///
  pub fn new_floating_point_single(
    tag: DataElementTag,
    values: &[f32],
  ) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; values.len() * 4];
    byteorder::LittleEndian::write_f32_into(values, &mut bytes);

    Self::new(tag, ValueRepresentation::FloatingPointSingle, bytes.into())
  }

  /// Creates a new `FloatingPointDouble` value element.
  ///
  pub fn new_floating_point_double(
    tag: DataElementTag,
    values: &[f64],
  ) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; values.len() * 8];
    byteorder::LittleEndian::write_f64_into(values, &mut bytes);

    Self::new(tag, ValueRepresentation::FloatingPointDouble, bytes.into())
  }

  /// Creates a new `OtherByteString` value element.
  ///
  pub fn new_other_byte_string(
    tag: DataElementTag,
    bytes: Vec<u8>,
  ) -> Result<Self, DataError> {
    Self::new(tag, ValueRepresentation::OtherByteString, bytes.into())
  }

  /// Creates a new `OtherWordString` value element.
  ///
  pub fn new_other_word_string(
    tag: DataElementTag,
    bytes: Vec<u8>,
  ) -> Result<Self, DataError> {
    Self::new(tag, ValueRepresentation::OtherWordString, bytes.into())
  }

  /// Creates a new `AttributeTag` value element.
  ///
  pub fn new_attribute_tag(
    tag: DataElementTag,
    values: &[DataElementTag],
  ) -> Result<Self, DataError> {
    Self::new(
      tag,
      ValueRepresentation::AttributeTag,
      attribute_tag::to_bytes(values).into(),
    )
  }

  /// Returns the length in bytes of this value element's value.
  ///
  pub fn length(&self) -> usize {
    self.bytes.len()
  }

  /// Returns the string contained in this value element. This is only
  /// supported for value representations that either don't allow
  /// multiplicity, or those that do allow multiplicity but only one string
  /// is present in the value.
  ///
  pub fn get_string(&self) -> Result<&str, DataError> {
    match self.vr {
      ValueRepresentation::ApplicationEntity
      | ValueRepresentation::LongText
      | ValueRepresentation::ShortText
      | ValueRepresentation::UniversalResourceIdentifier
      | ValueRepresentation::UnlimitedText => {
        let string = std::str::from_utf8(&self.bytes).map_err(|_| {
          DataError::new_value_invalid(
            "String bytes are not valid UTF-8".to_string(),
          )
        })?;

        let string = match self.vr {
          ValueRepresentation::ApplicationEntity
          | ValueRepresentation::UniversalResourceIdentifier => {
            string.trim_matches(' ')
          }
          _ => string.trim_end_matches(' '),
        };

        Ok(string)
      }

      _ => {
        let strings = self.get_strings()?;

        match strings.as_slice() {
          [s] => Ok(s),
          _ => Err(DataError::new_multiplicity_mismatch()),
        }
      }
    }
  }

  /// Returns the strings contained in this value element. This is only
  /// supported for value representations that allow multiplicity. The bytes
  /// are expected to already be UTF-8, i.e. values in other character sets
  /// are decoded at the `Elements` level where the active character set
  /// stack is known.
  ///
  pub fn get_strings(&self) -> Result<Vec<&str>, DataError> {
    match self.vr {
      ValueRepresentation::AgeString
      | ValueRepresentation::CodeString
      | ValueRepresentation::Date
      | ValueRepresentation::DateTime
      | ValueRepresentation::LongString
      | ValueRepresentation::PersonName
      | ValueRepresentation::ShortString
      | ValueRepresentation::Time
      | ValueRepresentation::UniqueIdentifier
      | ValueRepresentation::UnlimitedCharacters => {
        let string = std::str::from_utf8(&self.bytes).map_err(|_| {
          DataError::new_value_invalid(
            "String bytes are not valid UTF-8".to_string(),
          )
        })?;

        let strings = string
          .split('\\')
          .map(|s| match self.vr {
            ValueRepresentation::UniqueIdentifier => s.trim_end_matches('\0'),
            ValueRepresentation::UnlimitedCharacters => s.trim_end_matches(' '),
            _ => s.trim_matches(' '),
          })
          .collect::<Vec<&str>>();

        Ok(strings)
      }

      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the integers contained in this value element. This is only
  /// supported for value representations that contain integer data.
  ///
  pub fn get_ints<T: num_traits::PrimInt + TryFrom<i64>>(
    &self,
  ) -> Result<Vec<T>, DataError> {
    fn convert_int<
      U: num_traits::PrimInt + Into<i64> + std::fmt::Display,
      T: num_traits::PrimInt + TryFrom<i64>,
    >(
      i: U,
    ) -> Result<T, DataError> {
      match T::try_from(i.into()) {
        Ok(i) => Ok(i),
        Err(_) => Err(DataError::new_value_invalid(format!(
          "Value '{}' is out of range for the target integer type",
          i
        ))),
      }
    }

    match self.vr {
      ValueRepresentation::IntegerString => {
        let ints = integer_string::from_bytes(&self.bytes)?;

        let mut values = Vec::<T>::with_capacity(ints.len());
        for value in ints {
          values.push(convert_int(value)?);
        }

        Ok(values)
      }

      ValueRepresentation::SignedLong => {
        if self.bytes.len() % 4 != 0 {
          return Err(DataError::new_value_invalid(
            "Invalid Int32 data".to_string(),
          ));
        }

        let mut values = Vec::<T>::with_capacity(self.bytes.len() / 4);
        for chunk in self.bytes.chunks_exact(4) {
          values.push(convert_int(self.read_i32(chunk))?);
        }

        Ok(values)
      }

      ValueRepresentation::SignedShort => {
        if self.bytes.len() % 2 != 0 {
          return Err(DataError::new_value_invalid(
            "Invalid Int16 data".to_string(),
          ));
        }

        let mut values = Vec::<T>::with_capacity(self.bytes.len() / 2);
        for chunk in self.bytes.chunks_exact(2) {
          values.push(convert_int(self.read_i16(chunk))?);
        }

        Ok(values)
      }

      ValueRepresentation::UnsignedLong => {
        if self.bytes.len() % 4 != 0 {
          return Err(DataError::new_value_invalid(
            "Invalid Uint32 data".to_string(),
          ));
        }

        let mut values = Vec::with_capacity(self.bytes.len() / 4);
        for chunk in self.bytes.chunks_exact(4) {
          values.push(convert_int(i64::from(self.read_u32(chunk)))?);
        }

        Ok(values)
      }

      ValueRepresentation::UnsignedShort => {
        if self.bytes.len() % 2 != 0 {
          return Err(DataError::new_value_invalid(
            "Invalid Uint16 data".to_string(),
          ));
        }

        let mut values = Vec::<T>::with_capacity(self.bytes.len() / 2);
        for chunk in self.bytes.chunks_exact(2) {
          values.push(convert_int(i64::from(self.read_u16(chunk)))?);
        }

        Ok(values)
      }

      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the single integer contained in this value element.
  ///
  pub fn get_int<T: num_traits::PrimInt + TryFrom<i64>>(
    &self,
  ) -> Result<T, DataError> {
    let ints = self.get_ints()?;

    match ints.as_slice() {
      [i] => Ok(*i),
      _ => Err(DataError::new_multiplicity_mismatch()),
    }
  }

  /// Returns the floating point values contained in this value element.
  /// This is only supported for value representations containing floating
  /// point data.
  ///
  pub fn get_floats(&self) -> Result<Vec<f64>, DataError> {
    match self.vr {
      ValueRepresentation::DecimalString => {
        decimal_string::from_bytes(&self.bytes)
      }

      ValueRepresentation::FloatingPointDouble
      | ValueRepresentation::OtherDoubleString => {
        if self.bytes.len() % 8 != 0 {
          return Err(DataError::new_value_invalid(
            "Invalid Float64 data".to_string(),
          ));
        }

        let mut values = Vec::with_capacity(self.bytes.len() / 8);
        for chunk in self.bytes.chunks_exact(8) {
          values.push(self.read_f64(chunk));
        }

        Ok(values)
      }

      ValueRepresentation::FloatingPointSingle
      | ValueRepresentation::OtherFloatString => {
        if self.bytes.len() % 4 != 0 {
          return Err(DataError::new_value_invalid(
            "Invalid Float32 data".to_string(),
          ));
        }

        let mut values = Vec::with_capacity(self.bytes.len() / 4);
        for chunk in self.bytes.chunks_exact(4) {
          values.push(f64::from(self.read_f32(chunk)));
        }

        Ok(values)
      }

      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the single floating point value contained in this value
  /// element.
  ///
  pub fn get_float(&self) -> Result<f64, DataError> {
    let floats = self.get_floats()?;

    match floats.as_slice() {
      [f] => Ok(*f),
      _ => Err(DataError::new_multiplicity_mismatch()),
    }
  }

  /// Returns the data element tags contained in this value element. This is
  /// only supported for the `AttributeTag` value representation.
  ///
  pub fn get_attribute_tags(&self) -> Result<Vec<DataElementTag>, DataError> {
    match self.vr {
      ValueRepresentation::AttributeTag => {
        attribute_tag::from_bytes(&self.bytes, self.big_endian)
      }
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the structured dates contained in this value element. This is
  /// only supported for the `Date` value representation. Values that fail
  /// to parse are skipped.
  ///
  pub fn get_dates(&self) -> Result<Vec<StructuredDate>, DataError> {
    if self.vr != ValueRepresentation::Date {
      return Err(DataError::new_value_not_present());
    }

    Ok(
      split_multi_value(&self.bytes)?
        .filter_map(|s| StructuredDate::from_bytes(s.as_bytes()).ok())
        .collect(),
    )
  }

  /// Returns the structured times contained in this value element. This is
  /// only supported for the `Time` value representation. Values that fail
  /// to parse are skipped.
  ///
  pub fn get_times(&self) -> Result<Vec<StructuredTime>, DataError> {
    if self.vr != ValueRepresentation::Time {
      return Err(DataError::new_value_not_present());
    }

    Ok(
      split_multi_value(&self.bytes)?
        .filter_map(|s| StructuredTime::from_bytes(s.as_bytes()).ok())
        .collect(),
    )
  }

  /// Returns the structured date/times contained in this value element.
  /// This is only supported for the `DateTime` value representation. Values
  /// that fail to parse are skipped.
  ///
  pub fn get_date_times(&self) -> Result<Vec<StructuredDateTime>, DataError> {
    if self.vr != ValueRepresentation::DateTime {
      return Err(DataError::new_value_not_present());
    }

    Ok(
      split_multi_value(&self.bytes)?
        .filter_map(|s| StructuredDateTime::from_bytes(s.as_bytes()).ok())
        .collect(),
    )
  }

  /// Returns the structured person names contained in this value element.
  /// This is only supported for the `PersonName` value representation.
  ///
  pub fn get_person_names(
    &self,
  ) -> Result<Vec<StructuredPersonName>, DataError> {
    match self.vr {
      ValueRepresentation::PersonName => person_name::from_bytes(&self.bytes),
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the URI contained in this value element. This is only
  /// supported for the `UniversalResourceIdentifier` value representation.
  ///
  pub fn get_uri(&self) -> Result<&str, DataError> {
    match self.vr {
      ValueRepresentation::UniversalResourceIdentifier => self.get_string(),
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Checks that the number of bytes stored in this value element is valid
  /// for its value representation.
  ///
  pub fn validate_length(&self) -> Result<(), DataError> {
    let unit_size = match self.vr {
      ValueRepresentation::AttributeTag
      | ValueRepresentation::FloatingPointSingle
      | ValueRepresentation::OtherFloatString
      | ValueRepresentation::OtherLongString
      | ValueRepresentation::SignedLong
      | ValueRepresentation::UnsignedLong => 4,

      ValueRepresentation::FloatingPointDouble
      | ValueRepresentation::OtherDoubleString
      | ValueRepresentation::OtherVeryLongString
      | ValueRepresentation::SignedVeryLong
      | ValueRepresentation::UnsignedVeryLong => 8,

      _ => 2,
    };

    if self.bytes.len() % unit_size != 0 {
      return Err(DataError::new_value_length_invalid(
        self.vr,
        self.bytes.len() as u64,
        format!("Must be a multiple of {unit_size} bytes"),
      ));
    }

    Ok(())
  }

  /// Formats this value element's value as a human-readable single line of
  /// text. Values longer than the output width are truncated with a
  /// trailing ellipsis.
  ///
  pub fn to_preview_string(&self, output_width: usize) -> String {
    let output_list_max_size = output_width.div_ceil(3);

    let s = if self.vr.is_string() {
      match std::str::from_utf8(&self.bytes) {
        Ok(value) => format!("{:?}", value.trim_end_matches(['\0', ' '])),
        Err(_) => "!! Invalid UTF-8 data".to_string(),
      }
    } else {
      match self.vr {
        ValueRepresentation::SignedLong
        | ValueRepresentation::SignedShort
        | ValueRepresentation::UnsignedLong
        | ValueRepresentation::UnsignedShort
        | ValueRepresentation::IntegerString => match self.get_ints::<i64>() {
          Ok(ints) => ints
            .iter()
            .take(output_list_max_size)
            .map(|i| i.to_string())
            .collect::<Vec<String>>()
            .join(", "),
          Err(_) => "<error converting to string>".to_string(),
        },

        ValueRepresentation::FloatingPointDouble
        | ValueRepresentation::FloatingPointSingle => match self.get_floats() {
          Ok(floats) => floats
            .iter()
            .take(output_list_max_size)
            .map(|f| format!("{f:?}"))
            .collect::<Vec<String>>()
            .join(", "),
          Err(_) => "<error converting to string>".to_string(),
        },

        ValueRepresentation::AttributeTag => {
          match self.get_attribute_tags() {
            Ok(tags) => tags
              .iter()
              .take(output_list_max_size)
              .map(|tag| tag.to_string())
              .collect::<Vec<String>>()
              .join(", "),
            Err(_) => "<error converting to string>".to_string(),
          }
        }

        _ => utils::inspect_u8_slice(&self.bytes, output_list_max_size),
      }
    };

    // If there are more codepoints than columns then convert to graphemes
    // and assume one column per grapheme for display
    if s.len() > output_width {
      let graphemes =
        UnicodeSegmentation::graphemes(s.as_str(), true).collect::<Vec<&str>>();

      if graphemes.len() > output_width {
        format!("{} …", graphemes[0..output_width.saturating_sub(2)].join(""))
      } else {
        s
      }
    } else {
      s
    }
  }

  fn read_u16(&self, chunk: &[u8]) -> u16 {
    if self.big_endian {
      byteorder::BigEndian::read_u16(chunk)
    } else {
      byteorder::LittleEndian::read_u16(chunk)
    }
  }

  fn read_i16(&self, chunk: &[u8]) -> i16 {
    if self.big_endian {
      byteorder::BigEndian::read_i16(chunk)
    } else {
      byteorder::LittleEndian::read_i16(chunk)
    }
  }

  fn read_u32(&self, chunk: &[u8]) -> u32 {
    if self.big_endian {
      byteorder::BigEndian::read_u32(chunk)
    } else {
      byteorder::LittleEndian::read_u32(chunk)
    }
  }

  fn read_i32(&self, chunk: &[u8]) -> i32 {
    if self.big_endian {
      byteorder::BigEndian::read_i32(chunk)
    } else {
      byteorder::LittleEndian::read_i32(chunk)
    }
  }

  fn read_f32(&self, chunk: &[u8]) -> f32 {
    if self.big_endian {
      byteorder::BigEndian::read_f32(chunk)
    } else {
      byteorder::LittleEndian::read_f32(chunk)
    }
  }

  fn read_f64(&self, chunk: &[u8]) -> f64 {
    if self.big_endian {
      byteorder::BigEndian::read_f64(chunk)
    } else {
      byteorder::LittleEndian::read_f64(chunk)
    }
  }
}

/// Splits a multi-valued string value on the backslash delimiter, trimming
/// trailing padding from each value.
///
fn split_multi_value(
  bytes: &[u8],
) -> Result<impl Iterator<Item = &str>, DataError> {
  let string = std::str::from_utf8(bytes).map_err(|_| {
    DataError::new_value_invalid("String bytes are not valid UTF-8".to_string())
  })?;

  Ok(
    string
      .split('\\')
      .map(|s| s.trim_matches(['\0', ' ']))
      .filter(|s| !s.is_empty()),
  )
}

/// Creates a value element containing a multi-valued string. This checks
/// that the individual values don't contain backslashes that would affect
/// the multiplicity once joined together.
///
fn new_string_list(
  tag: DataElementTag,
  vr: ValueRepresentation,
  values: &[&str],
) -> Result<ValueElement, DataError> {
  for s in values.iter() {
    if s.contains('\\') {
      return Err(DataError::new_value_invalid(
        "String list item contains backslashes".to_string(),
      ));
    }
  }

  let bytes = values
    .iter()
    .map(|s| s.trim_matches(' '))
    .collect::<Vec<&str>>()
    .join("\\")
    .into_bytes();

  ValueElement::new(tag, vr, bytes.into())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dictionary;

  #[test]
  fn padding_test() {
    let element = ValueElement::new_long_text(
      dictionary::PATIENT_ID.tag,
      "odd",
    )
    .unwrap();

    assert_eq!(&*element.bytes, b"odd ");

    let element = ValueElement::new_unique_identifier(
      dictionary::SOP_INSTANCE_UID.tag,
      &["1.2.3"],
    )
    .unwrap();

    assert_eq!(&*element.bytes, b"1.2.3\0");
  }

  #[test]
  fn get_strings_test() {
    let element = ValueElement::new_code_string(
      dictionary::IMAGE_TYPE.tag,
      &["ORIGINAL", "PRIMARY"],
    )
    .unwrap();

    assert_eq!(element.get_strings(), Ok(vec!["ORIGINAL", "PRIMARY"]));
    assert_eq!(
      element.get_string(),
      Err(DataError::new_multiplicity_mismatch())
    );
  }

  #[test]
  fn get_ints_test() {
    let element =
      ValueElement::new_unsigned_short(dictionary::ROWS.tag, &[512]).unwrap();

    assert_eq!(element.get_int::<u16>(), Ok(512));

    // Big endian bytes decode through the recorded byte order
    let element = ValueElement::new_unchecked(
      dictionary::ROWS.tag,
      ValueRepresentation::UnsignedShort,
      vec![0x02, 0x00].into(),
      true,
      true,
    );

    assert_eq!(element.get_int::<u16>(), Ok(512));
  }

  #[test]
  fn get_dates_test() {
    let element = ValueElement::new(
      dictionary::STUDY_DATE.tag,
      ValueRepresentation::Date,
      b"20041230\\invalid".to_vec().into(),
    )
    .unwrap();

    assert_eq!(
      element.get_dates(),
      Ok(vec![StructuredDate {
        year: 2004,
        month: 12,
        day: 30
      }])
    );
  }

  #[test]
  fn get_floats_test() {
    let element = ValueElement::new_decimal_string(
      dictionary::PATIENT_WEIGHT.tag,
      &[1.5, -2.0],
    )
    .unwrap();

    assert_eq!(element.get_floats(), Ok(vec![1.5, -2.0]));
  }
}
