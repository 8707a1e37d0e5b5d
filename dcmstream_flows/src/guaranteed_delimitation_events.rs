//! Capability that guarantees delimitation events for every sequence and
//! item, including determinate-length ones.

use dcmstream_p10::{part, DicomPart, P10Error};

use crate::DicomFlow;

/// Capability that tracks the remaining byte count of every open
/// determinate-length sequence and item, and synthesizes the matching
/// delimitation part the moment a container's bytes are exhausted. The
/// synthesized delimitations carry empty bytes so that serializing the
/// resulting stream reproduces the original determinate-length encoding.
///
/// Delimitation parts that are present on the wire pass through unchanged
/// and replace, rather than supplement, the synthesized ones.
///
/// Containers still open when the stream ends are closed ahead of the end
/// marker, so downstream flows always observe balanced start/end events.
///
pub struct GuaranteedDelimitationEvents<F: DicomFlow> {
  inner: F,
  stack: Vec<ContainerEntry>,
  in_value: bool,
}

struct ContainerEntry {
  kind: ContainerKind,
  index: usize,
  big_endian: bool,
  bytes_remaining: Option<u64>,
}

enum ContainerKind {
  Sequence,
  Item,
  Fragments,
}

impl<F: DicomFlow> GuaranteedDelimitationEvents<F> {
  pub fn new(inner: F) -> Self {
    Self {
      inner,
      stack: vec![],
      in_value: false,
    }
  }

  /// Subtracts a part's byte size from the remaining lengths of all open
  /// determinate-length containers.
  ///
  fn consume_bytes(&mut self, part: &DicomPart) {
    let part_size = part.byte_size();

    for entry in self.stack.iter_mut() {
      if let Some(bytes_remaining) = entry.bytes_remaining.as_mut() {
        *bytes_remaining = bytes_remaining.saturating_sub(part_size);
      }
    }
  }

  /// Synthesizes delimitation parts for all containers at the head of the
  /// stack whose bytes are exhausted, delivering them to the wrapped flow.
  ///
  fn close_exhausted_containers(
    &mut self,
    output: &mut Vec<F::Out>,
  ) -> Result<(), P10Error> {
    while let Some(entry) = self.stack.last() {
      if entry.bytes_remaining != Some(0) {
        return Ok(());
      }

      let entry = self.stack.pop().unwrap();

      output.extend(self.inner.handle(&Self::delimitation_for(&entry))?);
    }

    Ok(())
  }

  /// Synthesizes delimitation parts for every container still open,
  /// regardless of remaining length. Used when the stream ends.
  ///
  fn close_all_containers(
    &mut self,
    output: &mut Vec<F::Out>,
  ) -> Result<(), P10Error> {
    while let Some(entry) = self.stack.pop() {
      output.extend(self.inner.handle(&Self::delimitation_for(&entry))?);
    }

    Ok(())
  }

  fn delimitation_for(entry: &ContainerEntry) -> DicomPart {
    match entry.kind {
      ContainerKind::Item => {
        part::synthetic_item_delimitation(entry.index, entry.big_endian)
      }

      ContainerKind::Sequence => {
        part::synthetic_sequence_delimitation(entry.big_endian)
      }

      ContainerKind::Fragments => DicomPart::FragmentsDelimitation {
        big_endian: entry.big_endian,
        bytes: dcmstream_core::RcByteSlice::empty(),
      },
    }
  }
}

impl<F: DicomFlow> DicomFlow for GuaranteedDelimitationEvents<F> {
  type Out = F::Out;

  fn on_part(&mut self, part: &DicomPart) -> Result<Vec<F::Out>, P10Error> {
    if self.inner.guarantees_delimitation_events() {
      return self.inner.handle(part);
    }

    // Bytes of this part count against all currently open containers. Any
    // container the part itself opens is pushed afterwards with its own
    // fresh count.
    self.consume_bytes(part);

    // A container can't be closed between a data element header and the
    // last chunk of its value, even if its byte count is already exhausted,
    // e.g. by a zero-length value at the end of a determinate-length item
    match part {
      DicomPart::DataElementHeader { .. }
      | DicomPart::FragmentsItem { .. } => self.in_value = true,

      DicomPart::DataElementValueChunk { last, .. } => {
        self.in_value = !last;
      }

      _ => (),
    }

    let mut output = vec![];

    match part {
      DicomPart::SequenceStart {
        length, big_endian, ..
      } => {
        output.extend(self.inner.handle(part)?);

        self.stack.push(ContainerEntry {
          kind: ContainerKind::Sequence,
          index: 0,
          big_endian: *big_endian,
          bytes_remaining: length.defined().map(u64::from),
        });
      }

      DicomPart::SequenceItemStart {
        index,
        length,
        big_endian,
        ..
      } => {
        output.extend(self.inner.handle(part)?);

        self.stack.push(ContainerEntry {
          kind: ContainerKind::Item,
          index: *index,
          big_endian: *big_endian,
          bytes_remaining: length.defined().map(u64::from),
        });
      }

      DicomPart::FragmentsStart { big_endian, .. } => {
        output.extend(self.inner.handle(part)?);

        self.stack.push(ContainerEntry {
          kind: ContainerKind::Fragments,
          index: 0,
          big_endian: *big_endian,
          bytes_remaining: None,
        });
      }

      // A delimitation present on the wire closes its container itself
      DicomPart::SequenceItemDelimitation { .. }
      | DicomPart::SequenceDelimitation { .. }
      | DicomPart::FragmentsDelimitation { .. } => {
        self.stack.pop();
        output.extend(self.inner.handle(part)?);
      }

      DicomPart::EndMarker => {
        self.close_all_containers(&mut output)?;
        output.extend(self.inner.handle(part)?);

        return Ok(output);
      }

      _ => {
        output.extend(self.inner.handle(part)?);
      }
    }

    if !self.in_value {
      self.close_exhausted_containers(&mut output)?;
    }

    Ok(output)
  }

  fn guarantees_value_events(&self) -> bool {
    self.inner.guarantees_value_events()
  }

  fn guarantees_delimitation_events(&self) -> bool {
    true
  }

  fn handles_stream_markers(&self) -> bool {
    self.inner.handles_stream_markers()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::flow::{create, IdentityFlow};

  use dcmstream_core::dictionary;
  use dcmstream_p10::ValueLength;

  fn sequence_start(length: ValueLength) -> DicomPart {
    DicomPart::SequenceStart {
      tag: dictionary::DERIVATION_CODE_SEQUENCE.tag,
      length,
      big_endian: false,
      explicit_vr: true,
      bytes: vec![0; 12].into(),
    }
  }

  fn item_start(index: usize, length: ValueLength) -> DicomPart {
    DicomPart::SequenceItemStart {
      index,
      length,
      big_endian: false,
      bytes: vec![0; 8].into(),
    }
  }

  fn value_parts(length: u32) -> Vec<DicomPart> {
    vec![
      DicomPart::DataElementHeader {
        tag: dictionary::STUDY_DATE.tag,
        vr: dcmstream_core::ValueRepresentation::Date,
        length: ValueLength::new(length),
        is_fmi: false,
        big_endian: false,
        explicit_vr: true,
        bytes: vec![0; 8].into(),
      },
      DicomPart::DataElementValueChunk {
        big_endian: false,
        data: vec![0x20; length as usize].into(),
        last: true,
      },
    ]
  }

  #[test]
  fn synthesizes_delimitations_for_determinate_lengths_test() {
    let mut transform =
      create(GuaranteedDelimitationEvents::new(IdentityFlow));

    let mut output = vec![];

    // A 0x18-byte sequence holding one 0x10-byte item holding one element
    // of 8 + 8 bytes
    output.extend(
      transform
        .add_part(&sequence_start(ValueLength::new(0x18)))
        .unwrap(),
    );
    output
      .extend(transform.add_part(&item_start(1, ValueLength::new(0x10))).unwrap());

    for part in value_parts(8) {
      output.extend(transform.add_part(&part).unwrap());
    }

    output.extend(transform.finish().unwrap());

    assert_eq!(
      output,
      vec![
        DicomPart::StartMarker,
        sequence_start(ValueLength::new(0x18)),
        item_start(1, ValueLength::new(0x10)),
        value_parts(8)[0].clone(),
        value_parts(8)[1].clone(),
        part::synthetic_item_delimitation(1, false),
        part::synthetic_sequence_delimitation(false),
        DicomPart::EndMarker,
      ]
    );
  }

  #[test]
  fn closes_open_containers_at_end_of_stream_test() {
    let mut transform =
      create(GuaranteedDelimitationEvents::new(IdentityFlow));

    let mut output = vec![];
    output.extend(
      transform.add_part(&sequence_start(ValueLength::Undefined)).unwrap(),
    );
    output.extend(
      transform.add_part(&item_start(1, ValueLength::Undefined)).unwrap(),
    );
    output.extend(transform.finish().unwrap());

    assert_eq!(
      output,
      vec![
        DicomPart::StartMarker,
        sequence_start(ValueLength::Undefined),
        item_start(1, ValueLength::Undefined),
        part::synthetic_item_delimitation(1, false),
        part::synthetic_sequence_delimitation(false),
        DicomPart::EndMarker,
      ]
    );
  }
}
