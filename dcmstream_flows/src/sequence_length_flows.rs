//! Flows that rewrite sequence and item lengths between their determinate
//! and indeterminate encodings.

use dcmstream_core::transfer_syntax::Endianness;
use dcmstream_core::{dictionary, TagPath, ValueRepresentation};
use dcmstream_p10::internal::data_element_header::DataElementHeader;
use dcmstream_p10::{part, DicomPart, P10Error, ValueLength};

use crate::{DicomFlow, GuaranteedDelimitationEvents};

fn endianness_for(big_endian: bool) -> Endianness {
  if big_endian {
    Endianness::BigEndian
  } else {
    Endianness::LittleEndian
  }
}

fn encode_header(
  header: DataElementHeader,
  big_endian: bool,
  part: &DicomPart,
) -> Result<dcmstream_core::RcByteSlice, P10Error> {
  header
    .to_bytes(endianness_for(big_endian))
    .map(|bytes| bytes.into())
    .map_err(|_| P10Error::PartStreamInvalid {
      when: "Rewriting sequence lengths".to_string(),
      details: "Data element header could not be serialized".to_string(),
      part: part.clone(),
    })
}

/// The rewriting half of [`to_undefined_length_sequences`]: every sequence
/// and item header becomes indeterminate, and synthesized delimitations
/// receive their real wire bytes. Fragments item lengths are left
/// untouched.
///
struct UndefinedLengthRewriter;

impl DicomFlow for UndefinedLengthRewriter {
  type Out = DicomPart;

  fn on_part(&mut self, part: &DicomPart) -> Result<Vec<DicomPart>, P10Error> {
    match part {
      DicomPart::SequenceStart {
        tag,
        length: ValueLength::Defined { .. },
        big_endian,
        explicit_vr,
        ..
      } => {
        let header = DataElementHeader {
          tag: *tag,
          vr: explicit_vr.then_some(ValueRepresentation::Sequence),
          length: ValueLength::Undefined,
        };

        Ok(vec![DicomPart::SequenceStart {
          tag: *tag,
          length: ValueLength::Undefined,
          big_endian: *big_endian,
          explicit_vr: *explicit_vr,
          bytes: encode_header(header, *big_endian, part)?,
        }])
      }

      DicomPart::SequenceItemStart {
        index,
        length: ValueLength::Defined { .. },
        big_endian,
        ..
      } => {
        let header = DataElementHeader {
          tag: dictionary::ITEM.tag,
          vr: None,
          length: ValueLength::Undefined,
        };

        Ok(vec![DicomPart::SequenceItemStart {
          index: *index,
          length: ValueLength::Undefined,
          big_endian: *big_endian,
          bytes: encode_header(header, *big_endian, part)?,
        }])
      }

      // Synthesized delimitations become real ones
      DicomPart::SequenceItemDelimitation {
        index, big_endian, ..
      } if part.byte_size() == 0 => {
        Ok(vec![part::item_delimitation(*index, *big_endian)])
      }

      DicomPart::SequenceDelimitation { big_endian, .. }
        if part.byte_size() == 0 =>
      {
        Ok(vec![part::sequence_delimitation(*big_endian)])
      }

      _ => Ok(vec![part.clone()]),
    }
  }
}

/// Creates a flow that rewrites every sequence and item header to use
/// indeterminate length, inserting explicit delimitation parts where the
/// original encoding relied on determinate lengths. Fragments item lengths
/// are left untouched.
///
pub fn to_undefined_length_sequences() -> impl DicomFlow<Out = DicomPart> {
  GuaranteedDelimitationEvents::new(UndefinedLengthRewriter)
}

/// The collecting half of [`to_defined_length_sequences`]. Sequences are
/// buffered in full so their byte lengths can be computed bottom-up, then
/// re-emitted with determinate lengths and no delimitation parts.
///
#[derive(Default)]
struct DefinedLengthCollector {
  frames: Vec<Frame>,
}

struct Frame {
  kind: FrameKind,
  big_endian: bool,
  parts: Vec<DicomPart>,
}

enum FrameKind {
  Sequence {
    tag: dcmstream_core::DataElementTag,
    explicit_vr: bool,
  },
  Item {
    index: usize,
  },
}

impl DefinedLengthCollector {
  fn append_or_emit(&mut self, parts: Vec<DicomPart>) -> Vec<DicomPart> {
    match self.frames.last_mut() {
      Some(frame) => {
        frame.parts.extend(parts);
        vec![]
      }
      None => parts,
    }
  }

  fn frame_byte_length(parts: &[DicomPart]) -> u64 {
    parts.iter().fold(0, |total, part| total + part.byte_size())
  }
}

impl DicomFlow for DefinedLengthCollector {
  type Out = DicomPart;

  fn on_part(&mut self, part: &DicomPart) -> Result<Vec<DicomPart>, P10Error> {
    match part {
      DicomPart::SequenceStart {
        tag,
        big_endian,
        explicit_vr,
        ..
      } => {
        self.frames.push(Frame {
          kind: FrameKind::Sequence {
            tag: *tag,
            explicit_vr: *explicit_vr,
          },
          big_endian: *big_endian,
          parts: vec![],
        });

        Ok(vec![])
      }

      DicomPart::SequenceItemStart {
        index, big_endian, ..
      } if self.frames.last().is_some() => {
        self.frames.push(Frame {
          kind: FrameKind::Item { index: *index },
          big_endian: *big_endian,
          parts: vec![],
        });

        Ok(vec![])
      }

      DicomPart::SequenceItemDelimitation { .. }
        if matches!(
          self.frames.last(),
          Some(Frame {
            kind: FrameKind::Item { .. },
            ..
          })
        ) =>
      {
        let frame = self.frames.pop().unwrap();

        let FrameKind::Item { index } = frame.kind else {
          unreachable!();
        };

        let content_length = Self::frame_byte_length(&frame.parts);

        let header = DataElementHeader {
          tag: dictionary::ITEM.tag,
          vr: None,
          length: ValueLength::new(content_length as u32),
        };

        let mut parts = vec![DicomPart::SequenceItemStart {
          index,
          length: ValueLength::new(content_length as u32),
          big_endian: frame.big_endian,
          bytes: encode_header(header, frame.big_endian, part)?,
        }];
        parts.extend(frame.parts);

        Ok(self.append_or_emit(parts))
      }

      DicomPart::SequenceDelimitation { .. }
        if matches!(
          self.frames.last(),
          Some(Frame {
            kind: FrameKind::Sequence { .. },
            ..
          })
        ) =>
      {
        let frame = self.frames.pop().unwrap();

        let FrameKind::Sequence { tag, explicit_vr } = frame.kind else {
          unreachable!();
        };

        let content_length = Self::frame_byte_length(&frame.parts);

        let header = DataElementHeader {
          tag,
          vr: explicit_vr.then_some(ValueRepresentation::Sequence),
          length: ValueLength::new(content_length as u32),
        };

        let mut parts = vec![DicomPart::SequenceStart {
          tag,
          length: ValueLength::new(content_length as u32),
          big_endian: frame.big_endian,
          explicit_vr,
          bytes: encode_header(header, frame.big_endian, part)?,
        }];
        parts.extend(frame.parts);

        Ok(self.append_or_emit(parts))
      }

      DicomPart::EndMarker => {
        // Flush any frames left open by a truncated stream as-is
        let mut output = vec![];
        while let Some(frame) = self.frames.pop() {
          output.extend(frame.parts);
        }

        output.push(part.clone());

        Ok(output)
      }

      _ => Ok(self.append_or_emit(vec![part.clone()])),
    }
  }
}

/// Creates a flow that collects every sequence and item into determinate
/// lengths, dropping delimitation parts. This is the inverse of
/// [`to_undefined_length_sequences`]. Fragments item lengths are left
/// untouched.
///
/// Sequences are buffered in full while their byte lengths are computed, so
/// memory usage is bounded by the largest sequence in the stream.
///
pub fn to_defined_length_sequences() -> impl DicomFlow<Out = DicomPart> {
  GuaranteedDelimitationEvents::new(DefinedLengthCollector::default())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::flow::create;

  use dcmstream_core::ValueRepresentation;

  fn element_parts() -> Vec<DicomPart> {
    vec![
      DicomPart::DataElementHeader {
        tag: dictionary::STUDY_DATE.tag,
        vr: ValueRepresentation::Date,
        length: ValueLength::new(8),
        is_fmi: false,
        big_endian: false,
        explicit_vr: true,
        bytes: vec![0x08, 0x00, 0x20, 0x00, 0x44, 0x41, 0x08, 0x00].into(),
      },
      DicomPart::DataElementValueChunk {
        big_endian: false,
        data: b"20041230".to_vec().into(),
        last: true,
      },
    ]
  }

  #[test]
  fn to_undefined_then_to_defined_round_trip_test() {
    let sequence_tag = dictionary::DERIVATION_CODE_SEQUENCE.tag;

    // A determinate-length sequence with one determinate-length item
    let item_header = DataElementHeader {
      tag: dictionary::ITEM.tag,
      vr: None,
      length: ValueLength::new(16),
    };

    let sequence_header = DataElementHeader {
      tag: sequence_tag,
      vr: Some(ValueRepresentation::Sequence),
      length: ValueLength::new(24),
    };

    let input = {
      let mut parts = vec![
        DicomPart::SequenceStart {
          tag: sequence_tag,
          length: ValueLength::new(24),
          big_endian: false,
          explicit_vr: true,
          bytes: sequence_header
            .to_bytes(Endianness::LittleEndian)
            .unwrap()
            .into(),
        },
        DicomPart::SequenceItemStart {
          index: 1,
          length: ValueLength::new(16),
          big_endian: false,
          bytes: item_header
            .to_bytes(Endianness::LittleEndian)
            .unwrap()
            .into(),
        },
      ];
      parts.extend(element_parts());
      parts
    };

    // Convert to undefined lengths
    let mut to_undefined = create(to_undefined_length_sequences());
    let mut undefined_parts = vec![];
    for part in &input {
      undefined_parts.extend(to_undefined.add_part(part).unwrap());
    }
    undefined_parts.extend(to_undefined.finish().unwrap());

    // All sequence and item lengths are now undefined, with real
    // delimitation parts in place
    assert!(undefined_parts.iter().all(|part| match part {
      DicomPart::SequenceStart { length, .. }
      | DicomPart::SequenceItemStart { length, .. } => {
        *length == ValueLength::Undefined
      }
      _ => true,
    }));

    assert!(undefined_parts.iter().any(|part| matches!(
      part,
      DicomPart::SequenceDelimitation { .. }
    ) && part.byte_size() == 8));

    // Convert back to defined lengths
    let mut to_defined = create(to_defined_length_sequences());
    let mut defined_parts = vec![];
    for part in &undefined_parts {
      if !part.is_marker() {
        defined_parts.extend(to_defined.add_part(part).unwrap());
      }
    }
    defined_parts.extend(to_defined.finish().unwrap());
    defined_parts.retain(|part| !part.is_marker());

    assert_eq!(defined_parts, input);
  }
}
