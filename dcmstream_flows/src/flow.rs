//! The `DicomFlow` callback trait that all part stream transformations are
//! built on, and the transform wrapper that drives a flow over a stream of
//! parts.

use dcmstream_p10::{DicomPart, P10Error};

/// A flow over an output type is a set of callbacks, one per part variant,
/// plus the `on_part` catch-all that the per-variant callbacks default to.
/// Feeding a part to [`DicomFlow::handle`] dispatches it to the matching
/// callback and returns the resulting output parts.
///
/// Flows whose callbacks all defer to `on_part` can specialize common
/// behavior in that one place; flows that care about specific part variants
/// override just those callbacks.
///
/// The capability methods advertise behaviors that a flow already provides.
/// The capability wrappers in this crate consult them so that composing the
/// same capability twice still invokes its callbacks exactly once per
/// logical event.
///
pub trait DicomFlow {
  type Out;

  /// The catch-all callback that every per-variant callback defaults to.
  ///
  fn on_part(&mut self, part: &DicomPart) -> Result<Vec<Self::Out>, P10Error>;

  fn on_file_preamble(
    &mut self,
    part: &DicomPart,
  ) -> Result<Vec<Self::Out>, P10Error> {
    self.on_part(part)
  }

  fn on_data_element_header(
    &mut self,
    part: &DicomPart,
  ) -> Result<Vec<Self::Out>, P10Error> {
    self.on_part(part)
  }

  fn on_data_element_value_chunk(
    &mut self,
    part: &DicomPart,
  ) -> Result<Vec<Self::Out>, P10Error> {
    self.on_part(part)
  }

  fn on_sequence_start(
    &mut self,
    part: &DicomPart,
  ) -> Result<Vec<Self::Out>, P10Error> {
    self.on_part(part)
  }

  fn on_sequence_delimitation(
    &mut self,
    part: &DicomPart,
  ) -> Result<Vec<Self::Out>, P10Error> {
    self.on_part(part)
  }

  fn on_sequence_item_start(
    &mut self,
    part: &DicomPart,
  ) -> Result<Vec<Self::Out>, P10Error> {
    self.on_part(part)
  }

  fn on_sequence_item_delimitation(
    &mut self,
    part: &DicomPart,
  ) -> Result<Vec<Self::Out>, P10Error> {
    self.on_part(part)
  }

  fn on_fragments_start(
    &mut self,
    part: &DicomPart,
  ) -> Result<Vec<Self::Out>, P10Error> {
    self.on_part(part)
  }

  fn on_fragments_item(
    &mut self,
    part: &DicomPart,
  ) -> Result<Vec<Self::Out>, P10Error> {
    self.on_part(part)
  }

  fn on_fragments_delimitation(
    &mut self,
    part: &DicomPart,
  ) -> Result<Vec<Self::Out>, P10Error> {
    self.on_part(part)
  }

  fn on_deflated_chunk(
    &mut self,
    part: &DicomPart,
  ) -> Result<Vec<Self::Out>, P10Error> {
    self.on_part(part)
  }

  fn on_unknown(
    &mut self,
    part: &DicomPart,
  ) -> Result<Vec<Self::Out>, P10Error> {
    self.on_part(part)
  }

  fn on_start_marker(
    &mut self,
    part: &DicomPart,
  ) -> Result<Vec<Self::Out>, P10Error> {
    self.on_part(part)
  }

  fn on_end_marker(
    &mut self,
    part: &DicomPart,
  ) -> Result<Vec<Self::Out>, P10Error> {
    self.on_part(part)
  }

  /// Dispatches a part to the callback for its variant.
  ///
  fn handle(&mut self, part: &DicomPart) -> Result<Vec<Self::Out>, P10Error> {
    match part {
      DicomPart::FilePreamble { .. } => self.on_file_preamble(part),
      DicomPart::DataElementHeader { .. } => self.on_data_element_header(part),
      DicomPart::DataElementValueChunk { .. } => {
        self.on_data_element_value_chunk(part)
      }
      DicomPart::SequenceStart { .. } => self.on_sequence_start(part),
      DicomPart::SequenceDelimitation { .. } => {
        self.on_sequence_delimitation(part)
      }
      DicomPart::SequenceItemStart { .. } => self.on_sequence_item_start(part),
      DicomPart::SequenceItemDelimitation { .. } => {
        self.on_sequence_item_delimitation(part)
      }
      DicomPart::FragmentsStart { .. } => self.on_fragments_start(part),
      DicomPart::FragmentsItem { .. } => self.on_fragments_item(part),
      DicomPart::FragmentsDelimitation { .. } => {
        self.on_fragments_delimitation(part)
      }
      DicomPart::DeflatedChunk { .. } => self.on_deflated_chunk(part),
      DicomPart::Unknown { .. } => self.on_unknown(part),
      DicomPart::StartMarker => self.on_start_marker(part),
      DicomPart::EndMarker => self.on_end_marker(part),
    }
  }

  /// Whether this flow already guarantees that every zero-length value is
  /// followed by a single empty value chunk with `last` set.
  ///
  fn guarantees_value_events(&self) -> bool {
    false
  }

  /// Whether this flow already guarantees that every sequence and item is
  /// closed by a delimitation part, including determinate-length ones.
  ///
  fn guarantees_delimitation_events(&self) -> bool {
    false
  }

  /// Whether this flow intercepts the pipeline's stream markers, i.e. a
  /// further marker-handling wrapper should pass markers through to it
  /// untouched.
  ///
  fn handles_stream_markers(&self) -> bool {
    false
  }
}

/// The identity flow: every callback returns the input part unchanged.
///
#[derive(Debug, Default)]
pub struct IdentityFlow;

impl DicomFlow for IdentityFlow {
  type Out = DicomPart;

  fn on_part(&mut self, part: &DicomPart) -> Result<Vec<DicomPart>, P10Error> {
    Ok(vec![part.clone()])
  }
}

/// Wraps a flow into a stream transformer that prepends the start marker,
/// dispatches each incoming part through the flow, and appends the end
/// marker when the stream finishes.
///
pub fn create<F: DicomFlow>(flow: F) -> FlowTransform<F> {
  FlowTransform {
    flow,
    is_started: false,
    is_finished: false,
  }
}

/// A stream transformer around a [`DicomFlow`]. Feed parts in with
/// [`Self::add_part`] and signal the end of the stream with
/// [`Self::finish`].
///
pub struct FlowTransform<F: DicomFlow> {
  flow: F,
  is_started: bool,
  is_finished: bool,
}

impl<F: DicomFlow> FlowTransform<F> {
  /// Feeds the next part through the flow, returning the resulting output
  /// parts. The first call delivers the start marker to the flow ahead of
  /// the part.
  ///
  pub fn add_part(
    &mut self,
    part: &DicomPart,
  ) -> Result<Vec<F::Out>, P10Error> {
    let mut output = self.start()?;

    output.extend(self.flow.handle(part)?);

    Ok(output)
  }

  /// Feeds a list of parts through the flow.
  ///
  pub fn add_parts(
    &mut self,
    parts: &[DicomPart],
  ) -> Result<Vec<F::Out>, P10Error> {
    let mut output = vec![];

    for part in parts {
      output.extend(self.add_part(part)?);
    }

    Ok(output)
  }

  /// Signals the end of the part stream, delivering the end marker to the
  /// flow and returning any final output parts.
  ///
  pub fn finish(&mut self) -> Result<Vec<F::Out>, P10Error> {
    let mut output = self.start()?;

    if !self.is_finished {
      self.is_finished = true;
      output.extend(self.flow.handle(&DicomPart::EndMarker)?);
    }

    Ok(output)
  }

  fn start(&mut self) -> Result<Vec<F::Out>, P10Error> {
    if self.is_started {
      return Ok(vec![]);
    }

    self.is_started = true;
    self.flow.handle(&DicomPart::StartMarker)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn identity_flow_test() {
    let mut transform = create(IdentityFlow);

    let part = DicomPart::Unknown {
      big_endian: false,
      data: vec![1, 2, 3].into(),
    };

    assert_eq!(
      transform.add_part(&part).unwrap(),
      vec![DicomPart::StartMarker, part.clone()]
    );

    assert_eq!(transform.finish().unwrap(), vec![DicomPart::EndMarker]);
  }
}
