//! Flow that recomputes the File Meta Information group length.

use byteorder::ByteOrder;

use dcmstream_core::{dictionary, ValueRepresentation};
use dcmstream_p10::internal::data_element_header::DataElementHeader;
use dcmstream_p10::{DicomPart, P10Error, ValueLength};

use crate::DicomFlow;

/// Flow that buffers the File Meta Information and rewrites the
/// *'(0002,0000) File Meta Information Group Length'* data element so that
/// its value equals the total byte length of the FMI data elements that
/// follow it, inserting the element when it is absent.
///
#[derive(Default)]
pub struct FmiGroupLengthFlow {
  buffer: Vec<DicomPart>,
  is_buffering: bool,
  is_inside_fmi_value: bool,
  is_fmi_finished: bool,
}

/// Creates a new [`FmiGroupLengthFlow`].
///
pub fn fmi_group_length_flow() -> FmiGroupLengthFlow {
  FmiGroupLengthFlow::default()
}

impl FmiGroupLengthFlow {
  /// Emits the buffered File Meta Information with a correct group length
  /// element at its head.
  ///
  fn flush(&mut self) -> Result<Vec<DicomPart>, P10Error> {
    self.is_buffering = false;
    self.is_fmi_finished = true;

    let mut output = vec![];

    // The File Preamble stays ahead of the group length element
    let mut fmi_parts = std::mem::take(&mut self.buffer);
    if matches!(fmi_parts.first(), Some(DicomPart::FilePreamble { .. })) {
      output.push(fmi_parts.remove(0));
    }

    // Drop any existing group length element from the buffered parts
    let mut elements: Vec<DicomPart> = vec![];
    let mut skip_value = false;
    for part in fmi_parts {
      match &part {
        DicomPart::DataElementHeader { tag, .. }
          if *tag == dictionary::FILE_META_INFORMATION_GROUP_LENGTH.tag =>
        {
          skip_value = true;
        }

        DicomPart::DataElementValueChunk { .. } if skip_value => {
          skip_value = false;
        }

        _ => elements.push(part),
      }
    }

    let fmi_length = elements
      .iter()
      .fold(0u64, |total, part| total + part.byte_size());

    // Build the replacement group length element in explicit VR little
    // endian, the encoding the File Meta Information always uses
    let mut length_bytes = vec![0u8; 4];
    byteorder::LittleEndian::write_u32_into(
      &[fmi_length as u32],
      &mut length_bytes,
    );

    let header = DataElementHeader {
      tag: dictionary::FILE_META_INFORMATION_GROUP_LENGTH.tag,
      vr: Some(ValueRepresentation::UnsignedLong),
      length: ValueLength::new(4),
    };

    output.push(DicomPart::DataElementHeader {
      tag: dictionary::FILE_META_INFORMATION_GROUP_LENGTH.tag,
      vr: ValueRepresentation::UnsignedLong,
      length: ValueLength::new(4),
      is_fmi: true,
      big_endian: false,
      explicit_vr: true,
      bytes: header
        .to_bytes(dcmstream_core::transfer_syntax::Endianness::LittleEndian)
        .unwrap()
        .into(),
    });

    output.push(DicomPart::DataElementValueChunk {
      big_endian: false,
      data: length_bytes.into(),
      last: true,
    });

    output.extend(elements);

    Ok(output)
  }
}

impl DicomFlow for FmiGroupLengthFlow {
  type Out = DicomPart;

  fn on_part(&mut self, part: &DicomPart) -> Result<Vec<DicomPart>, P10Error> {
    if self.is_fmi_finished {
      return Ok(vec![part.clone()]);
    }

    match part {
      DicomPart::StartMarker => Ok(vec![part.clone()]),

      DicomPart::FilePreamble { .. } => {
        self.is_buffering = true;
        self.buffer.push(part.clone());
        Ok(vec![])
      }

      DicomPart::DataElementHeader { is_fmi: true, .. } => {
        self.is_buffering = true;
        self.is_inside_fmi_value = true;
        self.buffer.push(part.clone());
        Ok(vec![])
      }

      DicomPart::DataElementValueChunk { last, .. }
        if self.is_inside_fmi_value =>
      {
        self.is_inside_fmi_value = !last;
        self.buffer.push(part.clone());
        Ok(vec![])
      }

      // Any other part marks the end of the File Meta Information
      _ => {
        let mut output = if self.is_buffering {
          self.flush()?
        } else {
          self.is_fmi_finished = true;
          vec![]
        };

        output.push(part.clone());

        Ok(output)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::flow::create;

  #[test]
  fn recomputes_group_length_test() {
    let mut transform = create(fmi_group_length_flow());

    // An FMI element of 8 header bytes plus a 20-byte value
    let fmi_header = DicomPart::DataElementHeader {
      tag: dictionary::TRANSFER_SYNTAX_UID.tag,
      vr: ValueRepresentation::UniqueIdentifier,
      length: ValueLength::new(20),
      is_fmi: true,
      big_endian: false,
      explicit_vr: true,
      bytes: vec![0x02, 0x00, 0x10, 0x00, 0x55, 0x49, 0x14, 0x00].into(),
    };

    let fmi_value = DicomPart::DataElementValueChunk {
      big_endian: false,
      data: b"1.2.840.10008.1.2.1\0".to_vec().into(),
      last: true,
    };

    let dataset_header = DicomPart::DataElementHeader {
      tag: dictionary::PATIENT_NAME.tag,
      vr: ValueRepresentation::PersonName,
      length: ValueLength::new(8),
      is_fmi: false,
      big_endian: false,
      explicit_vr: true,
      bytes: vec![0x10, 0x00, 0x10, 0x00, 0x50, 0x4E, 0x08, 0x00].into(),
    };

    let mut output = vec![];
    output.extend(transform.add_part(&fmi_header).unwrap());
    output.extend(transform.add_part(&fmi_value).unwrap());
    output.extend(transform.add_part(&dataset_header).unwrap());

    // The group length element leads the FMI and holds 8 + 20 = 28
    match &output[1..3] {
      [DicomPart::DataElementHeader { tag, .. }, DicomPart::DataElementValueChunk { data, .. }] =>
      {
        assert_eq!(*tag, dictionary::FILE_META_INFORMATION_GROUP_LENGTH.tag);
        assert_eq!(&**data, &[28, 0, 0, 0]);
      }

      parts => panic!("Unexpected parts: {parts:?}"),
    }

    assert_eq!(output[3], fmi_header);
    assert_eq!(output[4], fmi_value);
    assert_eq!(output[5], dataset_header);
  }
}
