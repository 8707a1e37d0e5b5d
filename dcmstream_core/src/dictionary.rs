//! A facade over the DICOM data element dictionary.
//!
//! The complete dictionary is generated externally from the DICOM standard;
//! this module holds the well-known entries that the streaming core itself
//! consumes, applies the standard fallback rules for private and group
//! length tags, and exposes the `vr_of`/`keyword_of`/`tag_of_keyword`
//! lookups that the parser, tag path parser, and flows rely on.

use crate::{DataElementTag, ValueMultiplicity, ValueRepresentation};

/// A single entry in the data element dictionary.
///
#[derive(Debug, PartialEq)]
pub struct Item {
  pub tag: DataElementTag,
  pub name: &'static str,
  pub keyword: &'static str,
  pub vrs: &'static [ValueRepresentation],
  pub multiplicity: ValueMultiplicity,
}

macro_rules! dictionary_item {
  ($const_name:ident, $group:literal, $element:literal, $name:literal,
   $keyword:literal, $vrs:expr, $multiplicity:expr) => {
    pub const $const_name: Item = Item {
      tag: DataElementTag::new($group, $element),
      name: $name,
      keyword: $keyword,
      vrs: $vrs,
      multiplicity: $multiplicity,
    };
  };
}

use ValueMultiplicity as VM;
use ValueRepresentation as VR;

dictionary_item!(
  FILE_META_INFORMATION_GROUP_LENGTH,
  0x0002, 0x0000,
  "File Meta Information Group Length",
  "FileMetaInformationGroupLength",
  &[VR::UnsignedLong], VM::ONE
);
dictionary_item!(
  FILE_META_INFORMATION_VERSION,
  0x0002, 0x0001,
  "File Meta Information Version",
  "FileMetaInformationVersion",
  &[VR::OtherByteString], VM::ONE
);
dictionary_item!(
  MEDIA_STORAGE_SOP_CLASS_UID,
  0x0002, 0x0002,
  "Media Storage SOP Class UID",
  "MediaStorageSOPClassUID",
  &[VR::UniqueIdentifier], VM::ONE
);
dictionary_item!(
  MEDIA_STORAGE_SOP_INSTANCE_UID,
  0x0002, 0x0003,
  "Media Storage SOP Instance UID",
  "MediaStorageSOPInstanceUID",
  &[VR::UniqueIdentifier], VM::ONE
);
dictionary_item!(
  TRANSFER_SYNTAX_UID,
  0x0002, 0x0010,
  "Transfer Syntax UID",
  "TransferSyntaxUID",
  &[VR::UniqueIdentifier], VM::ONE
);
dictionary_item!(
  IMPLEMENTATION_CLASS_UID,
  0x0002, 0x0012,
  "Implementation Class UID",
  "ImplementationClassUID",
  &[VR::UniqueIdentifier], VM::ONE
);
dictionary_item!(
  IMPLEMENTATION_VERSION_NAME,
  0x0002, 0x0013,
  "Implementation Version Name",
  "ImplementationVersionName",
  &[VR::ShortString], VM::ONE
);
dictionary_item!(
  SPECIFIC_CHARACTER_SET,
  0x0008, 0x0005,
  "Specific Character Set",
  "SpecificCharacterSet",
  &[VR::CodeString], VM::MANY
);
dictionary_item!(
  IMAGE_TYPE,
  0x0008, 0x0008,
  "Image Type",
  "ImageType",
  &[VR::CodeString], VM::MANY
);
dictionary_item!(
  SOP_CLASS_UID,
  0x0008, 0x0016,
  "SOP Class UID",
  "SOPClassUID",
  &[VR::UniqueIdentifier], VM::ONE
);
dictionary_item!(
  SOP_INSTANCE_UID,
  0x0008, 0x0018,
  "SOP Instance UID",
  "SOPInstanceUID",
  &[VR::UniqueIdentifier], VM::ONE
);
dictionary_item!(
  STUDY_DATE,
  0x0008, 0x0020,
  "Study Date",
  "StudyDate",
  &[VR::Date], VM::ONE
);
dictionary_item!(
  ACQUISITION_DATE,
  0x0008, 0x0022,
  "Acquisition Date",
  "AcquisitionDate",
  &[VR::Date], VM::ONE
);
dictionary_item!(
  STUDY_TIME,
  0x0008, 0x0030,
  "Study Time",
  "StudyTime",
  &[VR::Time], VM::ONE
);
dictionary_item!(
  ACCESSION_NUMBER,
  0x0008, 0x0050,
  "Accession Number",
  "AccessionNumber",
  &[VR::ShortString], VM::ONE
);
dictionary_item!(
  MODALITY,
  0x0008, 0x0060,
  "Modality",
  "Modality",
  &[VR::CodeString], VM::ONE
);
dictionary_item!(
  TIMEZONE_OFFSET_FROM_UTC,
  0x0008, 0x0201,
  "Timezone Offset From UTC",
  "TimezoneOffsetFromUTC",
  &[VR::ShortString], VM::ONE
);
dictionary_item!(
  REFERENCED_IMAGE_SEQUENCE,
  0x0008, 0x1140,
  "Referenced Image Sequence",
  "ReferencedImageSequence",
  &[VR::Sequence], VM::ONE
);
dictionary_item!(
  DERIVATION_CODE_SEQUENCE,
  0x0008, 0x9215,
  "Derivation Code Sequence",
  "DerivationCodeSequence",
  &[VR::Sequence], VM::ONE
);
dictionary_item!(
  PATIENT_NAME,
  0x0010, 0x0010,
  "Patient's Name",
  "PatientName",
  &[VR::PersonName], VM::ONE
);
dictionary_item!(
  PATIENT_ID,
  0x0010, 0x0020,
  "Patient ID",
  "PatientID",
  &[VR::LongString], VM::ONE
);
dictionary_item!(
  PATIENT_BIRTH_DATE,
  0x0010, 0x0030,
  "Patient's Birth Date",
  "PatientBirthDate",
  &[VR::Date], VM::ONE
);
dictionary_item!(
  PATIENT_SEX,
  0x0010, 0x0040,
  "Patient's Sex",
  "PatientSex",
  &[VR::CodeString], VM::ONE
);
dictionary_item!(
  PATIENT_AGE,
  0x0010, 0x1010,
  "Patient's Age",
  "PatientAge",
  &[VR::AgeString], VM::ONE
);
dictionary_item!(
  PATIENT_WEIGHT,
  0x0010, 0x1030,
  "Patient's Weight",
  "PatientWeight",
  &[VR::DecimalString], VM::ONE
);
dictionary_item!(
  WAVEFORM_SEQUENCE,
  0x5400, 0x0100,
  "Waveform Sequence",
  "WaveformSequence",
  &[VR::Sequence], VM::ONE
);
dictionary_item!(
  WAVEFORM_DATA,
  0x5400, 0x1010,
  "Waveform Data",
  "WaveformData",
  &[VR::OtherByteString, VR::OtherWordString], VM::ONE
);
dictionary_item!(
  STUDY_INSTANCE_UID,
  0x0020, 0x000D,
  "Study Instance UID",
  "StudyInstanceUID",
  &[VR::UniqueIdentifier], VM::ONE
);
dictionary_item!(
  SERIES_INSTANCE_UID,
  0x0020, 0x000E,
  "Series Instance UID",
  "SeriesInstanceUID",
  &[VR::UniqueIdentifier], VM::ONE
);
dictionary_item!(
  SAMPLES_PER_PIXEL,
  0x0028, 0x0002,
  "Samples per Pixel",
  "SamplesPerPixel",
  &[VR::UnsignedShort], VM::ONE
);
dictionary_item!(
  ROWS,
  0x0028, 0x0010,
  "Rows",
  "Rows",
  &[VR::UnsignedShort], VM::ONE
);
dictionary_item!(
  COLUMNS,
  0x0028, 0x0011,
  "Columns",
  "Columns",
  &[VR::UnsignedShort], VM::ONE
);
dictionary_item!(
  BITS_ALLOCATED,
  0x0028, 0x0100,
  "Bits Allocated",
  "BitsAllocated",
  &[VR::UnsignedShort], VM::ONE
);
dictionary_item!(
  PIXEL_REPRESENTATION,
  0x0028, 0x0103,
  "Pixel Representation",
  "PixelRepresentation",
  &[VR::UnsignedShort], VM::ONE
);
dictionary_item!(
  PIXEL_DATA,
  0x7FE0, 0x0010,
  "Pixel Data",
  "PixelData",
  &[VR::OtherByteString, VR::OtherWordString], VM::ONE
);
dictionary_item!(
  DATA_SET_TRAILING_PADDING,
  0xFFFC, 0xFFFC,
  "Data Set Trailing Padding",
  "DataSetTrailingPadding",
  &[VR::OtherByteString], VM::ONE
);
dictionary_item!(
  ITEM,
  0xFFFE, 0xE000,
  "Item",
  "Item",
  &[], VM::ONE
);
dictionary_item!(
  ITEM_DELIMITATION_ITEM,
  0xFFFE, 0xE00D,
  "Item Delimitation Item",
  "ItemDelimitationItem",
  &[], VM::ONE
);
dictionary_item!(
  SEQUENCE_DELIMITATION_ITEM,
  0xFFFE, 0xE0DD,
  "Sequence Delimitation Item",
  "SequenceDelimitationItem",
  &[], VM::ONE
);

/// All dictionary entries known to this facade, in ascending tag order.
///
pub const ALL_ITEMS: [&Item; 39] = [
  &FILE_META_INFORMATION_GROUP_LENGTH,
  &FILE_META_INFORMATION_VERSION,
  &MEDIA_STORAGE_SOP_CLASS_UID,
  &MEDIA_STORAGE_SOP_INSTANCE_UID,
  &TRANSFER_SYNTAX_UID,
  &IMPLEMENTATION_CLASS_UID,
  &IMPLEMENTATION_VERSION_NAME,
  &SPECIFIC_CHARACTER_SET,
  &IMAGE_TYPE,
  &SOP_CLASS_UID,
  &SOP_INSTANCE_UID,
  &STUDY_DATE,
  &ACQUISITION_DATE,
  &STUDY_TIME,
  &ACCESSION_NUMBER,
  &MODALITY,
  &TIMEZONE_OFFSET_FROM_UTC,
  &REFERENCED_IMAGE_SEQUENCE,
  &DERIVATION_CODE_SEQUENCE,
  &PATIENT_NAME,
  &PATIENT_ID,
  &PATIENT_BIRTH_DATE,
  &PATIENT_SEX,
  &PATIENT_AGE,
  &PATIENT_WEIGHT,
  &STUDY_INSTANCE_UID,
  &SERIES_INSTANCE_UID,
  &SAMPLES_PER_PIXEL,
  &ROWS,
  &COLUMNS,
  &BITS_ALLOCATED,
  &PIXEL_REPRESENTATION,
  &WAVEFORM_SEQUENCE,
  &WAVEFORM_DATA,
  &PIXEL_DATA,
  &DATA_SET_TRAILING_PADDING,
  &ITEM,
  &ITEM_DELIMITATION_ITEM,
  &SEQUENCE_DELIMITATION_ITEM,
];

/// Finds the dictionary entry for the given data element tag.
///
#[allow(clippy::result_unit_err)]
pub fn find(tag: DataElementTag) -> Result<&'static Item, ()> {
  for item in ALL_ITEMS {
    if item.tag == tag {
      return Ok(item);
    }
  }

  Err(())
}

/// Finds the dictionary entry with the given keyword, e.g. "PatientName".
///
#[allow(clippy::result_unit_err)]
pub fn find_by_keyword(keyword: &str) -> Result<&'static Item, ()> {
  for item in ALL_ITEMS {
    if item.keyword == keyword {
      return Ok(item);
    }
  }

  Err(())
}

/// Returns the tag for the given dictionary keyword.
///
#[allow(clippy::result_unit_err)]
pub fn tag_of_keyword(keyword: &str) -> Result<DataElementTag, ()> {
  find_by_keyword(keyword).map(|item| item.tag)
}

/// Returns the dictionary keyword for the given tag, or an empty string if
/// the tag isn't known.
///
pub fn keyword_of(tag: DataElementTag) -> &'static str {
  find(tag).map(|item| item.keyword).unwrap_or("")
}

/// Returns the VR to use for a data element when the transfer syntax is
/// 'Implicit VR Little Endian' and the VR is therefore not present on the
/// wire.
///
/// Group length tags are always `UL`, private creator tags are `LO`, other
/// private tags are `UN`, and everything else comes from the dictionary,
/// falling back to `UN` for tags not in this facade or with more than one
/// allowed VR.
///
pub fn vr_of(tag: DataElementTag) -> ValueRepresentation {
  if tag.is_group_length() {
    return ValueRepresentation::UnsignedLong;
  }

  if tag.is_private_creator() {
    return ValueRepresentation::LongString;
  }

  if tag.is_private() {
    return ValueRepresentation::Unknown;
  }

  match find(tag) {
    Ok(Item { vrs: [vr], .. }) => *vr,

    // Pixel data can't use OB when the VR is implicit. Ref: PS3.5 8.2.
    Ok(Item {
      vrs: [ValueRepresentation::OtherByteString, ValueRepresentation::OtherWordString],
      ..
    }) => ValueRepresentation::OtherWordString,

    _ => ValueRepresentation::Unknown,
  }
}

/// Returns the human-readable name for a data element tag, or
/// `"unknown_tag"` if the tag isn't known to this facade.
///
pub fn tag_name(tag: DataElementTag) -> &'static str {
  match find(tag) {
    Ok(item) => item.name,
    Err(()) => {
      if tag.is_group_length() {
        "Group Length"
      } else if tag.is_private_creator() {
        "Private Creator"
      } else {
        "unknown_tag"
      }
    }
  }
}

/// Formats a data element tag as `"($GROUP,$ELEMENT) $NAME"`, e.g.
/// `"(0008,0020) Study Date"`.
///
pub fn tag_with_name(tag: DataElementTag) -> String {
  format!("{} {}", tag, tag_name(tag))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn find_test() {
    assert_eq!(find(DataElementTag::new(0x0010, 0x0010)), Ok(&PATIENT_NAME));

    assert_eq!(find(DataElementTag::new(0x0011, 0x0010)), Err(()));
  }

  #[test]
  fn vr_of_test() {
    assert_eq!(vr_of(PATIENT_NAME.tag), ValueRepresentation::PersonName);

    // Group lengths are always UL
    assert_eq!(
      vr_of(DataElementTag::new(0x0008, 0x0000)),
      ValueRepresentation::UnsignedLong
    );

    // Private creators are LO
    assert_eq!(
      vr_of(DataElementTag::new(0x0009, 0x0010)),
      ValueRepresentation::LongString
    );

    // Other private tags are UN
    assert_eq!(
      vr_of(DataElementTag::new(0x0009, 0x1001)),
      ValueRepresentation::Unknown
    );

    // Pixel data resolves to OW under implicit VR
    assert_eq!(vr_of(PIXEL_DATA.tag), ValueRepresentation::OtherWordString);
  }

  #[test]
  fn keyword_lookup_test() {
    assert_eq!(tag_of_keyword("PatientName"), Ok(PATIENT_NAME.tag));
    assert_eq!(keyword_of(STUDY_DATE.tag), "StudyDate");
    assert_eq!(tag_of_keyword("NotAKeyword"), Err(()));
  }

  #[test]
  fn tag_with_name_test() {
    assert_eq!(
      tag_with_name(PATIENT_AGE.tag),
      "(0010,1010) Patient's Age"
    );
  }
}
