//! Flow that normalizes a part stream to the 'Explicit VR Little Endian'
//! transfer syntax.

use dcmstream_core::transfer_syntax::Endianness;
use dcmstream_core::{dictionary, TagPath, ValueRepresentation};
use dcmstream_p10::internal::data_element_header::DataElementHeader;
use dcmstream_p10::{DicomPart, P10Error, ValueLength};

use crate::DicomFlow;

/// Flow that rewrites every header to explicit VR little endian form and
/// byte-swaps the values of binary VRs arriving from a big endian stream.
/// Fragment data of `OW` encapsulated pixel data is swapped 16 bits at a
/// time; all other fragment data passes through untouched.
///
/// Explicit VR headers keep their size when their byte order changes, so
/// determinate sequence and item lengths stay valid for explicit VR
/// sources. Implicit VR headers grow when made explicit, so for implicit
/// sources every determinate sequence and item is rewritten to
/// indeterminate length with real delimitations.
///
/// Streams already in explicit VR little endian pass through unchanged.
///
pub struct ToExplicitVrLittleEndianFlow {
  chunk_swap_vr: Option<ValueRepresentation>,
  fragments_swap: bool,
  implicit_source: bool,
}

/// Creates a new [`ToExplicitVrLittleEndianFlow`]. This composes over
/// guaranteed delimitation events so that the determinate-length containers
/// of implicit VR sources receive the delimitations their indeterminate
/// rewrite requires.
///
pub fn to_explicit_vr_little_endian_flow() -> impl DicomFlow<Out = DicomPart> {
  crate::GuaranteedDelimitationEvents::new(ToExplicitVrLittleEndianFlow {
    chunk_swap_vr: None,
    fragments_swap: false,
    implicit_source: false,
  })
}

impl ToExplicitVrLittleEndianFlow {
  fn encode_header(
    &self,
    header: DataElementHeader,
    part: &DicomPart,
  ) -> Result<dcmstream_core::RcByteSlice, P10Error> {
    let tag = header.tag;

    header
      .to_bytes(Endianness::LittleEndian)
      .map(|bytes| bytes.into())
      .map_err(|_| P10Error::DataInvalid {
        when: "Normalizing to explicit VR little endian".to_string(),
        details: format!(
          "Length of value for '{}' exceeds the maximum for its VR",
          tag
        ),
        path: TagPath::from_tag(tag),
        offset: part.byte_size(),
      })
  }
}

impl DicomFlow for ToExplicitVrLittleEndianFlow {
  type Out = DicomPart;

  fn on_part(&mut self, part: &DicomPart) -> Result<Vec<DicomPart>, P10Error> {
    match part {
      DicomPart::DataElementHeader {
        tag,
        vr,
        length,
        is_fmi,
        big_endian,
        explicit_vr,
        ..
      } => {
        self.implicit_source = self.implicit_source || !*explicit_vr;
        self.chunk_swap_vr = if *big_endian { Some(*vr) } else { None };

        let header = DataElementHeader {
          tag: *tag,
          vr: Some(*vr),
          length: *length,
        };

        Ok(vec![DicomPart::DataElementHeader {
          tag: *tag,
          vr: *vr,
          length: *length,
          is_fmi: *is_fmi,
          big_endian: false,
          explicit_vr: true,
          bytes: self.encode_header(header, part)?,
        }])
      }

      DicomPart::DataElementValueChunk {
        big_endian,
        data,
        last,
      } => {
        let data = match self.chunk_swap_vr {
          Some(vr) if *big_endian => {
            let mut swapped = data.clone().into_vec();
            vr.swap_endianness(&mut swapped);
            swapped.into()
          }

          _ => data.clone(),
        };

        if *last {
          self.chunk_swap_vr = None;
        }

        Ok(vec![DicomPart::DataElementValueChunk {
          big_endian: false,
          data,
          last: *last,
        }])
      }

      DicomPart::SequenceStart {
        tag,
        length,
        explicit_vr,
        ..
      } => {
        self.implicit_source = self.implicit_source || !*explicit_vr;

        // Determinate lengths of implicit sources can't survive the larger
        // explicit headers of their content
        let length = if self.implicit_source {
          ValueLength::Undefined
        } else {
          *length
        };

        let header = DataElementHeader {
          tag: *tag,
          vr: Some(ValueRepresentation::Sequence),
          length,
        };

        Ok(vec![DicomPart::SequenceStart {
          tag: *tag,
          length,
          big_endian: false,
          explicit_vr: true,
          bytes: self.encode_header(header, part)?,
        }])
      }

      DicomPart::SequenceItemStart { index, length, .. } => {
        let length = if self.implicit_source {
          ValueLength::Undefined
        } else {
          *length
        };

        let header = DataElementHeader {
          tag: dictionary::ITEM.tag,
          vr: None,
          length,
        };

        Ok(vec![DicomPart::SequenceItemStart {
          index: *index,
          length,
          big_endian: false,
          bytes: self.encode_header(header, part)?,
        }])
      }

      DicomPart::SequenceItemDelimitation { index, .. } => {
        // Synthesized delimitations stay synthetic for explicit sources,
        // whose determinate lengths are preserved
        if part.byte_size() == 0 && !self.implicit_source {
          return Ok(vec![DicomPart::SequenceItemDelimitation {
            index: *index,
            big_endian: false,
            bytes: dcmstream_core::RcByteSlice::empty(),
          }]);
        }

        Ok(vec![dcmstream_p10::part::item_delimitation(*index, false)])
      }

      DicomPart::SequenceDelimitation { .. } => {
        if part.byte_size() == 0 && !self.implicit_source {
          return Ok(vec![DicomPart::SequenceDelimitation {
            big_endian: false,
            bytes: dcmstream_core::RcByteSlice::empty(),
          }]);
        }

        Ok(vec![dcmstream_p10::part::sequence_delimitation(false)])
      }

      DicomPart::FragmentsStart {
        tag,
        vr,
        big_endian,
        ..
      } => {
        self.fragments_swap =
          *big_endian && *vr == ValueRepresentation::OtherWordString;

        let header = DataElementHeader {
          tag: *tag,
          vr: Some(*vr),
          length: ValueLength::Undefined,
        };

        Ok(vec![DicomPart::FragmentsStart {
          tag: *tag,
          vr: *vr,
          big_endian: false,
          explicit_vr: true,
          bytes: self.encode_header(header, part)?,
        }])
      }

      DicomPart::FragmentsItem { index, length, .. } => {
        // Word-swap the data of OW fragments from big endian streams
        self.chunk_swap_vr = if self.fragments_swap {
          Some(ValueRepresentation::OtherWordString)
        } else {
          None
        };

        let header = DataElementHeader {
          tag: dictionary::ITEM.tag,
          vr: None,
          length: ValueLength::new(*length),
        };

        Ok(vec![DicomPart::FragmentsItem {
          index: *index,
          length: *length,
          big_endian: false,
          bytes: self.encode_header(header, part)?,
        }])
      }

      DicomPart::FragmentsDelimitation { .. } => {
        Ok(vec![DicomPart::FragmentsDelimitation {
          big_endian: false,
          bytes: dcmstream_p10::part::sequence_delimitation(false).bytes(),
        }])
      }

      _ => Ok(vec![part.clone()]),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::flow::create;

  #[test]
  fn rewrites_big_endian_values_test() {
    let mut transform = create(to_explicit_vr_little_endian_flow());

    // '(0028,0010) Rows' with a big endian value of 512
    let header = DicomPart::DataElementHeader {
      tag: dictionary::ROWS.tag,
      vr: ValueRepresentation::UnsignedShort,
      length: ValueLength::new(2),
      is_fmi: false,
      big_endian: true,
      explicit_vr: true,
      bytes: vec![0x00, 0x28, 0x00, 0x10, 0x55, 0x53, 0x00, 0x02].into(),
    };

    let chunk = DicomPart::DataElementValueChunk {
      big_endian: true,
      data: vec![0x02, 0x00].into(),
      last: true,
    };

    let mut output = vec![];
    output.extend(transform.add_part(&header).unwrap());
    output.extend(transform.add_part(&chunk).unwrap());
    output.retain(|part| !part.is_marker());

    assert_eq!(
      output,
      vec![
        DicomPart::DataElementHeader {
          tag: dictionary::ROWS.tag,
          vr: ValueRepresentation::UnsignedShort,
          length: ValueLength::new(2),
          is_fmi: false,
          big_endian: false,
          explicit_vr: true,
          bytes: vec![0x28, 0x00, 0x10, 0x00, 0x55, 0x53, 0x02, 0x00].into(),
        },
        DicomPart::DataElementValueChunk {
          big_endian: false,
          data: vec![0x00, 0x02].into(),
          last: true,
        },
      ]
    );
  }

  #[test]
  fn explicit_little_endian_is_a_fixed_point_test() {
    let mut transform = create(to_explicit_vr_little_endian_flow());

    let header = DicomPart::DataElementHeader {
      tag: dictionary::PATIENT_NAME.tag,
      vr: ValueRepresentation::PersonName,
      length: ValueLength::new(8),
      is_fmi: false,
      big_endian: false,
      explicit_vr: true,
      bytes: vec![0x10, 0x00, 0x10, 0x00, 0x50, 0x4E, 0x08, 0x00].into(),
    };

    let chunk = DicomPart::DataElementValueChunk {
      big_endian: false,
      data: b"John^Doe".to_vec().into(),
      last: true,
    };

    let mut output = vec![];
    output.extend(transform.add_part(&header).unwrap());
    output.extend(transform.add_part(&chunk).unwrap());
    output.retain(|part| !part.is_marker());

    assert_eq!(output, vec![header, chunk]);
  }
}
