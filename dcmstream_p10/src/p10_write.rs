//! Serializes streams of DICOM parts and in-memory data sets into DICOM P10
//! bytes.
//!
//! Parts carry the wire bytes they correspond to, so serializing a part
//! stream is a concatenation. The functions here additionally project an
//! [`Elements`] data set into its canonical part stream: indeterminate
//! lengths for every sequence and item, with explicit delimitations at each
//! level.

use byteorder::ByteOrder;

use dcmstream_core::transfer_syntax::{self, Endianness};
use dcmstream_core::{
  dictionary, DataElementTag, ElementSet, Elements, RcByteSlice, TagPath,
  ValueElement, ValueRepresentation,
};

use crate::internal::data_element_header::DataElementHeader;
use crate::internal::value_length::ValueLength;
use crate::part;
use crate::{DicomPart, P10Error, P10WriteConfig};

/// A write context holds the current state of an in-progress DICOM P10
/// write. DICOM parts are written to a write context with
/// [`Self::write_part`], and the output P10 bytes are returned by
/// [`Self::read_bytes`].
///
pub struct P10WriteContext {
  p10_bytes: Vec<RcByteSlice>,
  p10_total_byte_count: u64,
  is_inside_value: bool,
  is_ended: bool,
}

impl Default for P10WriteContext {
  fn default() -> Self {
    Self::new()
  }
}

impl P10WriteContext {
  /// Creates a new write context for writing DICOM P10 data.
  ///
  pub fn new() -> Self {
    Self {
      p10_bytes: vec![],
      p10_total_byte_count: 0,
      is_inside_value: false,
      is_ended: false,
    }
  }

  /// Returns the total number of bytes written to this write context.
  ///
  pub fn total_byte_count(&self) -> u64 {
    self.p10_total_byte_count
  }

  /// Reads the current DICOM P10 bytes available out of a write context.
  /// These are the bytes generated by recent calls to [`Self::write_part`].
  ///
  pub fn read_bytes(&mut self) -> Vec<RcByteSlice> {
    std::mem::take(&mut self.p10_bytes)
  }

  /// Writes a DICOM part to a write context. Use [`Self::read_bytes`] to
  /// get the new DICOM P10 bytes generated as a result of writing this
  /// part.
  ///
  /// Pipeline markers are accepted and write no bytes; an end marker ends
  /// the write, after which further parts are an error.
  ///
  pub fn write_part(&mut self, part: &DicomPart) -> Result<(), P10Error> {
    if self.is_ended {
      return Err(P10Error::PartStreamInvalid {
        when: "Writing DICOM part".to_string(),
        details: "Received a further part after the write was completed"
          .to_string(),
        part: part.clone(),
      });
    }

    match part {
      DicomPart::StartMarker => Ok(()),

      DicomPart::EndMarker => {
        self.is_ended = true;
        Ok(())
      }

      DicomPart::DataElementValueChunk { data, last, .. } => {
        if !self.is_inside_value {
          return Err(P10Error::PartStreamInvalid {
            when: "Writing DICOM part".to_string(),
            details: "Value chunk does not follow a data element header"
              .to_string(),
            part: part.clone(),
          });
        }

        self.is_inside_value = !last;
        self.push_bytes(data.clone());

        Ok(())
      }

      DicomPart::DataElementHeader { .. }
      | DicomPart::FragmentsItem { .. } => {
        self.is_inside_value = true;
        self.push_bytes(part.bytes());

        Ok(())
      }

      _ => {
        self.push_bytes(part.bytes());
        Ok(())
      }
    }
  }

  fn push_bytes(&mut self, bytes: RcByteSlice) {
    if bytes.is_empty() {
      return;
    }

    self.p10_total_byte_count += bytes.len() as u64;
    self.p10_bytes.push(bytes);
  }
}

/// Serializes a list of DICOM parts to their P10 bytes.
///
pub fn parts_to_bytes(parts: &[DicomPart]) -> Result<Vec<u8>, P10Error> {
  let mut context = P10WriteContext::new();

  for part in parts {
    context.write_part(part)?;
  }

  let mut bytes = Vec::with_capacity(context.total_byte_count() as usize);
  for chunk in context.read_bytes() {
    bytes.extend_from_slice(&chunk);
  }

  Ok(bytes)
}

/// Converts all the data elements in a data set directly to DICOM parts in
/// the canonical encoding. Each part is returned via a callback.
///
pub fn elements_to_parts<E>(
  elements: &Elements,
  part_callback: &mut impl FnMut(&DicomPart) -> Result<(), E>,
) -> Result<(), E>
where
  E: From<P10Error>,
{
  for (_tag, element) in elements.iter() {
    element_to_parts(element, part_callback)?;
  }

  Ok(())
}

/// Converts a single data element to DICOM parts in the canonical encoding.
/// Each part is returned via a callback.
///
pub fn element_to_parts<E>(
  element: &ElementSet,
  part_callback: &mut impl FnMut(&DicomPart) -> Result<(), E>,
) -> Result<(), E>
where
  E: From<P10Error>,
{
  match element {
    ElementSet::Value(value) => value_element_to_parts(value, part_callback),

    // Sequences are written with indeterminate lengths and explicit
    // delimitations at every level
    ElementSet::Sequence(sequence) => {
      let endianness = endianness_for(sequence.big_endian);

      let header = DataElementHeader {
        tag: sequence.tag,
        vr: sequence
          .explicit_vr
          .then_some(ValueRepresentation::Sequence),
        length: ValueLength::Undefined,
      };

      part_callback(&DicomPart::SequenceStart {
        tag: sequence.tag,
        length: ValueLength::Undefined,
        big_endian: sequence.big_endian,
        explicit_vr: sequence.explicit_vr,
        bytes: header_bytes(&header, endianness, sequence.tag)?,
      })?;

      for (index, item) in sequence.items.iter().enumerate() {
        let item_header = DataElementHeader {
          tag: dictionary::ITEM.tag,
          vr: None,
          length: ValueLength::Undefined,
        };

        part_callback(&DicomPart::SequenceItemStart {
          index: index + 1,
          length: ValueLength::Undefined,
          big_endian: sequence.big_endian,
          bytes: header_bytes(&item_header, endianness, sequence.tag)?,
        })?;

        elements_to_parts(&item.elements, part_callback)?;

        part_callback(&part::item_delimitation(
          index + 1,
          sequence.big_endian,
        ))?;
      }

      part_callback(&part::sequence_delimitation(sequence.big_endian))?;

      Ok(())
    }

    ElementSet::Fragments(fragments) => {
      let endianness = endianness_for(fragments.big_endian);

      let header = DataElementHeader {
        tag: fragments.tag,
        vr: Some(fragments.vr),
        length: ValueLength::Undefined,
      };

      part_callback(&DicomPart::FragmentsStart {
        tag: fragments.tag,
        vr: fragments.vr,
        big_endian: fragments.big_endian,
        explicit_vr: fragments.explicit_vr,
        bytes: header_bytes(&header, endianness, fragments.tag)?,
      })?;

      let mut item_index = 0;

      // Write the basic offset table as the first item when present
      if let Some(offsets) = &fragments.offsets {
        let mut offset_bytes = vec![0u8; offsets.len() * 4];

        if fragments.big_endian {
          byteorder::BigEndian::write_u32_into(offsets, &mut offset_bytes);
        } else {
          byteorder::LittleEndian::write_u32_into(offsets, &mut offset_bytes);
        }

        item_index += 1;
        fragments_item_to_parts(
          item_index,
          offset_bytes.into(),
          fragments.big_endian,
          endianness,
          part_callback,
        )?;
      }

      for fragment in fragments.fragments.iter() {
        item_index += 1;
        fragments_item_to_parts(
          item_index,
          fragment.bytes.clone(),
          fragments.big_endian,
          endianness,
          part_callback,
        )?;
      }

      part_callback(&DicomPart::FragmentsDelimitation {
        big_endian: fragments.big_endian,
        bytes: part::sequence_delimitation(fragments.big_endian).bytes(),
      })?;

      Ok(())
    }
  }
}

fn value_element_to_parts<E>(
  value: &ValueElement,
  part_callback: &mut impl FnMut(&DicomPart) -> Result<(), E>,
) -> Result<(), E>
where
  E: From<P10Error>,
{
  let endianness = endianness_for(value.big_endian);

  let header = DataElementHeader {
    tag: value.tag,
    vr: value.explicit_vr.then_some(value.vr),
    length: ValueLength::new(value.bytes.len() as u32),
  };

  part_callback(&DicomPart::DataElementHeader {
    tag: value.tag,
    vr: value.vr,
    length: ValueLength::new(value.bytes.len() as u32),
    is_fmi: value.tag.is_file_meta_information(),
    big_endian: value.big_endian,
    explicit_vr: value.explicit_vr,
    bytes: header_bytes(&header, endianness, value.tag)?,
  })?;

  part_callback(&DicomPart::DataElementValueChunk {
    big_endian: value.big_endian,
    data: value.bytes.clone(),
    last: true,
  })?;

  Ok(())
}

fn fragments_item_to_parts<E>(
  index: usize,
  data: RcByteSlice,
  big_endian: bool,
  endianness: Endianness,
  part_callback: &mut impl FnMut(&DicomPart) -> Result<(), E>,
) -> Result<(), E>
where
  E: From<P10Error>,
{
  let header = DataElementHeader {
    tag: dictionary::ITEM.tag,
    vr: None,
    length: ValueLength::new(data.len() as u32),
  };

  part_callback(&DicomPart::FragmentsItem {
    index,
    length: data.len() as u32,
    big_endian,
    bytes: header_bytes(&header, endianness, dictionary::ITEM.tag)?,
  })?;

  part_callback(&DicomPart::DataElementValueChunk {
    big_endian,
    data,
    last: true,
  })?;

  Ok(())
}

/// Converts a data set to the parts of a complete DICOM P10 file: the File
/// Preamble, the File Meta Information with a correct group length and this
/// library's implementation details, and the main data set in the canonical
/// encoding.
///
pub fn elements_to_p10_parts<E>(
  elements: &Elements,
  config: &P10WriteConfig,
  part_callback: &mut impl FnMut(&DicomPart) -> Result<(), E>,
) -> Result<(), E>
where
  E: From<P10Error>,
{
  // Write the File Preamble and "DICM" prefix
  let mut preamble = vec![0u8; 132];
  preamble[128..132].copy_from_slice(b"DICM");
  part_callback(&DicomPart::FilePreamble {
    bytes: preamble.into(),
  })?;

  for part in file_meta_information_parts(elements, config)? {
    part_callback(&part)?;
  }

  // Write the main data set
  for (tag, element) in elements.iter() {
    if tag.is_file_meta_information() {
      continue;
    }

    element_to_parts(element, part_callback)?;
  }

  Ok(())
}

/// Converts a data set to complete DICOM P10 bytes.
///
pub fn elements_to_bytes(
  elements: &Elements,
  config: &P10WriteConfig,
) -> Result<Vec<u8>, P10Error> {
  let mut context = P10WriteContext::new();

  elements_to_p10_parts(elements, config, &mut |part: &DicomPart| {
    context.write_part(part)
  })?;

  let mut bytes = Vec::with_capacity(context.total_byte_count() as usize);
  for chunk in context.read_bytes() {
    bytes.extend_from_slice(&chunk);
  }

  Ok(bytes)
}

/// Builds the parts for a data set's File Meta Information: its group 2
/// data elements together with this library's implementation class UID and
/// version name, led by a *'(0002,0000) File Meta Information Group
/// Length'* holding the byte length of what follows.
///
pub fn file_meta_information_parts(
  elements: &Elements,
  config: &P10WriteConfig,
) -> Result<Vec<DicomPart>, P10Error> {
  let mut fmi = elements.file_meta_information();

  fmi = fmi.remove(dictionary::FILE_META_INFORMATION_GROUP_LENGTH.tag);

  // Data sets that don't carry a transfer syntax are written in the
  // canonical encoding, so declare it
  if !fmi.has(dictionary::TRANSFER_SYNTAX_UID.tag) {
    fmi = fmi.set(ElementSet::Value(
      ValueElement::new_unique_identifier(
        dictionary::TRANSFER_SYNTAX_UID.tag,
        &[transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN.uid],
      )
      .map_err(|_| invalid_fmi_error())?,
    ));
  }

  fmi = fmi.set(ElementSet::Value(
    ValueElement::new_other_byte_string(
      dictionary::FILE_META_INFORMATION_VERSION.tag,
      vec![0, 1],
    )
    .map_err(|_| invalid_fmi_error())?,
  ));

  fmi = fmi.set(ElementSet::Value(
    ValueElement::new_unique_identifier(
      dictionary::IMPLEMENTATION_CLASS_UID.tag,
      &[&config.implementation_class_uid],
    )
    .map_err(|_| invalid_fmi_error())?,
  ));

  fmi = fmi.set(ElementSet::Value(
    ValueElement::new_short_string(
      dictionary::IMPLEMENTATION_VERSION_NAME.tag,
      &[&config.implementation_version_name],
    )
    .map_err(|_| invalid_fmi_error())?,
  ));

  // Collect the parts for the FMI data elements so their total byte length
  // is known
  let mut element_parts: Vec<DicomPart> = vec![];
  for (_tag, element) in fmi.iter() {
    match element {
      ElementSet::Value(value) => {
        // FMI data elements are always in explicit VR little endian
        let value = ValueElement::new_unchecked(
          value.tag,
          value.vr,
          value.bytes.clone(),
          false,
          true,
        );

        value_element_to_parts::<P10Error>(&value, &mut |part| {
          element_parts.push(part.clone());
          Ok(())
        })?;
      }

      // Sequences and fragments aren't allowed in File Meta Information
      _ => return Err(invalid_fmi_error()),
    }
  }

  let fmi_length = element_parts
    .iter()
    .fold(0u64, |total, part| total + part.byte_size());

  let group_length = ValueElement::new_unsigned_long(
    dictionary::FILE_META_INFORMATION_GROUP_LENGTH.tag,
    &[fmi_length as u32],
  )
  .map_err(|_| invalid_fmi_error())?;

  let mut parts = vec![];
  value_element_to_parts::<P10Error>(&group_length, &mut |part| {
    parts.push(part.clone());
    Ok(())
  })?;

  parts.extend(element_parts);

  Ok(parts)
}

fn invalid_fmi_error() -> P10Error {
  P10Error::DataInvalid {
    when: "Serializing File Meta Information".to_string(),
    details: "File Meta Information is invalid".to_string(),
    path: TagPath::new(),
    offset: 0,
  }
}

fn endianness_for(big_endian: bool) -> Endianness {
  if big_endian {
    Endianness::BigEndian
  } else {
    Endianness::LittleEndian
  }
}

fn header_bytes<E>(
  header: &DataElementHeader,
  endianness: Endianness,
  tag: DataElementTag,
) -> Result<RcByteSlice, E>
where
  E: From<P10Error>,
{
  match header.to_bytes(endianness) {
    Ok(bytes) => Ok(bytes.into()),
    Err(()) => Err(
      P10Error::DataInvalid {
        when: "Serializing data element header".to_string(),
        details: format!(
          "Length of value for '{}' exceeds the maximum for its VR",
          tag
        ),
        path: TagPath::from_tag(tag),
        offset: 0,
      }
      .into(),
    ),
  }
}
