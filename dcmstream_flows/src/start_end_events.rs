//! Capabilities that turn the pipeline's stream markers into single
//! `on_start`/`on_end` invocations on the wrapped flow.

use dcmstream_p10::{DicomPart, P10Error};

use crate::DicomFlow;

/// A flow that wants to be notified when the part stream starts.
///
pub trait StartHandler: DicomFlow {
  /// Called exactly once, before any stream part is delivered.
  ///
  fn on_start(&mut self) -> Result<Vec<Self::Out>, P10Error> {
    Ok(vec![])
  }
}

/// A flow that wants to be notified when the part stream ends.
///
pub trait EndHandler: DicomFlow {
  /// Called exactly once, after all stream parts have been delivered.
  ///
  fn on_end(&mut self) -> Result<Vec<Self::Out>, P10Error> {
    Ok(vec![])
  }
}

/// Capability that intercepts the start marker into a single
/// [`StartHandler::on_start`] invocation on the wrapped flow. The marker
/// does not leak past the innermost interception.
///
pub struct StartEvent<F: StartHandler> {
  inner: F,
}

impl<F: StartHandler> StartEvent<F> {
  pub fn new(inner: F) -> Self {
    Self { inner }
  }
}

impl<F: StartHandler<Out = DicomPart>> DicomFlow for StartEvent<F> {
  type Out = DicomPart;

  fn on_part(&mut self, part: &DicomPart) -> Result<Vec<DicomPart>, P10Error> {
    self.inner.handle(part)
  }

  fn on_start_marker(
    &mut self,
    part: &DicomPart,
  ) -> Result<Vec<DicomPart>, P10Error> {
    // When the wrapped flow intercepts markers itself it owns the start
    // notification; forwarding keeps the invocation exactly-once
    if self.inner.handles_stream_markers() {
      return self.inner.handle(part);
    }

    self.inner.on_start()
  }

  fn guarantees_value_events(&self) -> bool {
    self.inner.guarantees_value_events()
  }

  fn guarantees_delimitation_events(&self) -> bool {
    self.inner.guarantees_delimitation_events()
  }

  fn handles_stream_markers(&self) -> bool {
    true
  }
}

/// Capability that intercepts the end marker into a single
/// [`EndHandler::on_end`] invocation on the wrapped flow. The marker does
/// not leak past the innermost interception.
///
pub struct EndEvent<F: EndHandler> {
  inner: F,
}

impl<F: EndHandler> EndEvent<F> {
  pub fn new(inner: F) -> Self {
    Self { inner }
  }
}

impl<F: EndHandler<Out = DicomPart>> DicomFlow for EndEvent<F> {
  type Out = DicomPart;

  fn on_part(&mut self, part: &DicomPart) -> Result<Vec<DicomPart>, P10Error> {
    self.inner.handle(part)
  }

  fn on_end_marker(
    &mut self,
    part: &DicomPart,
  ) -> Result<Vec<DicomPart>, P10Error> {
    if self.inner.handles_stream_markers() {
      return self.inner.handle(part);
    }

    self.inner.on_end()
  }

  fn guarantees_value_events(&self) -> bool {
    self.inner.guarantees_value_events()
  }

  fn guarantees_delimitation_events(&self) -> bool {
    self.inner.guarantees_delimitation_events()
  }

  fn handles_stream_markers(&self) -> bool {
    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::flow::create;

  #[derive(Default)]
  struct CountingFlow {
    starts: usize,
    ends: usize,
  }

  impl DicomFlow for CountingFlow {
    type Out = DicomPart;

    fn on_part(
      &mut self,
      part: &DicomPart,
    ) -> Result<Vec<DicomPart>, P10Error> {
      Ok(vec![part.clone()])
    }
  }

  impl StartHandler for CountingFlow {
    fn on_start(&mut self) -> Result<Vec<DicomPart>, P10Error> {
      self.starts += 1;
      Ok(vec![])
    }
  }

  impl EndHandler for CountingFlow {
    fn on_end(&mut self) -> Result<Vec<DicomPart>, P10Error> {
      self.ends += 1;
      Ok(vec![])
    }
  }

  impl StartHandler for StartEvent<CountingFlow> {}

  #[test]
  fn start_event_is_exactly_once_test() {
    // Composing the capability twice still invokes on_start exactly once
    let mut transform =
      create(StartEvent::new(StartEvent::new(CountingFlow::default())));

    let part = DicomPart::Unknown {
      big_endian: false,
      data: vec![1].into(),
    };

    // The start marker is intercepted and does not leak downstream
    assert_eq!(transform.add_part(&part).unwrap(), vec![part.clone()]);
  }

  #[test]
  fn end_event_test() {
    let mut transform = create(EndEvent::new(CountingFlow::default()));

    assert_eq!(transform.finish().unwrap(), vec![]);
  }
}
