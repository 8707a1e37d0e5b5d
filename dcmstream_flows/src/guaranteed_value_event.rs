//! Capability that guarantees a value chunk event for every data element,
//! including zero-length ones.

use dcmstream_core::RcByteSlice;
use dcmstream_p10::{DicomPart, P10Error, ValueLength};

use crate::DicomFlow;

/// Capability that guarantees a single value chunk with `last` set follows
/// every zero-length data element header and zero-length fragments item, so
/// that the wrapped flow sees a value event for every value.
///
/// A zero-length header is held back until the next part shows whether the
/// stream already carries the empty chunk. When it doesn't, the chunk is
/// synthesized: it is delivered to the wrapped flow's callbacks but
/// filtered back out of the emitted stream.
///
pub struct GuaranteedValueEvent<F: DicomFlow> {
  inner: F,
  held_header: Option<DicomPart>,
}

impl<F: DicomFlow> GuaranteedValueEvent<F> {
  pub fn new(inner: F) -> Self {
    Self {
      inner,
      held_header: None,
    }
  }
}

impl<F: DicomFlow> GuaranteedValueEvent<F>
where
  F::Out: PartialEq + From<DicomPart>,
{
  /// Releases a held zero-length header, synthesizing its value chunk when
  /// the part that followed it is not the value chunk itself.
  ///
  fn release_held_header(
    &mut self,
    next_part: Option<&DicomPart>,
  ) -> Result<Vec<F::Out>, P10Error> {
    let header = match self.held_header.take() {
      Some(header) => header,
      None => return Ok(vec![]),
    };

    let mut output = self.inner.handle(&header)?;

    if matches!(next_part, Some(DicomPart::DataElementValueChunk { .. })) {
      return Ok(output);
    }

    let big_endian = match &header {
      DicomPart::DataElementHeader { big_endian, .. }
      | DicomPart::FragmentsItem { big_endian, .. } => *big_endian,
      _ => false,
    };

    let synthetic = DicomPart::DataElementValueChunk {
      big_endian,
      data: RcByteSlice::empty(),
      last: true,
    };

    let synthetic_out = <F::Out as From<DicomPart>>::from(synthetic.clone());

    output.extend(
      self
        .inner
        .handle(&synthetic)?
        .into_iter()
        .filter(|p| *p != synthetic_out),
    );

    Ok(output)
  }
}

impl<F: DicomFlow> DicomFlow for GuaranteedValueEvent<F>
where
  F::Out: PartialEq + From<DicomPart>,
{
  type Out = F::Out;

  fn on_part(&mut self, part: &DicomPart) -> Result<Vec<F::Out>, P10Error> {
    let mut output = self.release_held_header(Some(part))?;

    let is_zero_length_value = !self.inner.guarantees_value_events()
      && matches!(
        part,
        DicomPart::DataElementHeader {
          length: ValueLength::Defined { length: 0 },
          ..
        } | DicomPart::FragmentsItem { length: 0, .. }
      );

    if is_zero_length_value {
      self.held_header = Some(part.clone());
    } else {
      output.extend(self.inner.handle(part)?);
    }

    Ok(output)
  }

  fn on_end_marker(
    &mut self,
    part: &DicomPart,
  ) -> Result<Vec<F::Out>, P10Error> {
    let mut output = self.release_held_header(None)?;
    output.extend(self.inner.handle(part)?);

    Ok(output)
  }

  fn guarantees_value_events(&self) -> bool {
    true
  }

  fn guarantees_delimitation_events(&self) -> bool {
    self.inner.guarantees_delimitation_events()
  }

  fn handles_stream_markers(&self) -> bool {
    self.inner.handles_stream_markers()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::flow::{create, IdentityFlow};

  use dcmstream_core::{dictionary, ValueRepresentation};

  #[test]
  fn synthesizes_value_chunk_for_empty_value_test() {
    let mut seen_chunks = 0;

    // A flow that counts the value chunks its callbacks observe
    struct ChunkCounter<'a> {
      count: &'a mut usize,
    }

    impl DicomFlow for ChunkCounter<'_> {
      type Out = DicomPart;

      fn on_part(
        &mut self,
        part: &DicomPart,
      ) -> Result<Vec<DicomPart>, P10Error> {
        Ok(vec![part.clone()])
      }

      fn on_data_element_value_chunk(
        &mut self,
        part: &DicomPart,
      ) -> Result<Vec<DicomPart>, P10Error> {
        *self.count += 1;
        Ok(vec![part.clone()])
      }
    }

    let header = DicomPart::DataElementHeader {
      tag: dictionary::PATIENT_NAME.tag,
      vr: ValueRepresentation::PersonName,
      length: ValueLength::ZERO,
      is_fmi: false,
      big_endian: false,
      explicit_vr: true,
      bytes: vec![0x10, 0x00, 0x10, 0x00, 0x50, 0x4E, 0x00, 0x00].into(),
    };

    let mut transform = create(GuaranteedValueEvent::new(ChunkCounter {
      count: &mut seen_chunks,
    }));

    // The header is held until the stream shows no real chunk follows it;
    // the synthetic chunk then reaches the callbacks but not the output
    let mut output = transform.add_part(&header).unwrap();
    output.extend(transform.finish().unwrap());

    assert_eq!(
      output,
      vec![DicomPart::StartMarker, header.clone(), DicomPart::EndMarker]
    );

    assert_eq!(seen_chunks, 1);
  }

  #[test]
  fn does_not_synthesize_when_chunk_is_present_test() {
    let mut seen_chunks = 0;

    struct ChunkCounter<'a> {
      count: &'a mut usize,
    }

    impl DicomFlow for ChunkCounter<'_> {
      type Out = DicomPart;

      fn on_part(
        &mut self,
        part: &DicomPart,
      ) -> Result<Vec<DicomPart>, P10Error> {
        Ok(vec![part.clone()])
      }

      fn on_data_element_value_chunk(
        &mut self,
        part: &DicomPart,
      ) -> Result<Vec<DicomPart>, P10Error> {
        *self.count += 1;
        Ok(vec![part.clone()])
      }
    }

    let header = DicomPart::DataElementHeader {
      tag: dictionary::PATIENT_NAME.tag,
      vr: ValueRepresentation::PersonName,
      length: ValueLength::ZERO,
      is_fmi: false,
      big_endian: false,
      explicit_vr: true,
      bytes: vec![0x10, 0x00, 0x10, 0x00, 0x50, 0x4E, 0x00, 0x00].into(),
    };

    let chunk = DicomPart::DataElementValueChunk {
      big_endian: false,
      data: dcmstream_core::RcByteSlice::empty(),
      last: true,
    };

    let mut transform = create(GuaranteedValueEvent::new(ChunkCounter {
      count: &mut seen_chunks,
    }));

    // The stream's own empty chunk satisfies the guarantee: nothing is
    // synthesized and the chunk stays in the output
    let mut output = transform.add_part(&header).unwrap();
    output.extend(transform.add_part(&chunk).unwrap());
    output.extend(transform.finish().unwrap());

    assert_eq!(
      output,
      vec![
        DicomPart::StartMarker,
        header.clone(),
        chunk.clone(),
        DicomPart::EndMarker
      ]
    );

    assert_eq!(seen_chunks, 1);
  }

  #[test]
  fn double_composition_synthesizes_once_test() {
    let header = DicomPart::DataElementHeader {
      tag: dictionary::PATIENT_NAME.tag,
      vr: ValueRepresentation::PersonName,
      length: ValueLength::ZERO,
      is_fmi: false,
      big_endian: false,
      explicit_vr: true,
      bytes: vec![0x10, 0x00, 0x10, 0x00, 0x50, 0x4E, 0x00, 0x00].into(),
    };

    let mut transform = create(GuaranteedValueEvent::new(
      GuaranteedValueEvent::new(IdentityFlow),
    ));

    // The inner wrapper synthesizes, the outer one defers to it
    let mut output = transform.add_part(&header).unwrap();
    output.extend(transform.finish().unwrap());

    assert_eq!(
      output,
      vec![DicomPart::StartMarker, header, DicomPart::EndMarker]
    );
  }
}
