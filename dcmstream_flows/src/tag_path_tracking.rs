//! Capability that tracks the tag path of the current position in the part
//! stream and exposes it to the wrapped flow.

use dcmstream_core::{TagPath, TagPathNode};
use dcmstream_p10::{DicomPart, P10Error};

use crate::{
  DicomFlow, GuaranteedDelimitationEvents, GuaranteedValueEvent,
};

/// A flow whose callbacks receive the tag path of each incoming part in
/// addition to the part itself. Used with [`TagPathTracking`].
///
pub trait PathAwareFlow {
  type Out;

  fn on_part_at_path(
    &mut self,
    part: &DicomPart,
    path: &TagPath,
  ) -> Result<Vec<Self::Out>, P10Error>;
}

/// Maintains the current [`TagPath`] over a stream of parts by updating it
/// on every header, sequence start/end, item start/end, and fragments
/// start/item/end.
///
/// The tracker expects a stream with guaranteed value and delimitation
/// events so that determinate and indeterminate containers track uniformly.
///
#[derive(Debug, Default)]
pub struct TagPathTracker {
  path: TagPath,
}

impl TagPathTracker {
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns the tag path of the most recently updated part.
  ///
  pub fn path(&self) -> &TagPath {
    &self.path
  }

  /// Applies a part's transition to the tracked path. After this call the
  /// path names the location of the given part.
  ///
  pub fn update(&mut self, part: &DicomPart) -> Result<(), String> {
    match part {
      DicomPart::DataElementHeader { tag, .. } => {
        self.pop_leaf();
        self.path.push(TagPathNode::Tag { tag: *tag })
      }

      DicomPart::SequenceStart { tag, .. }
      | DicomPart::FragmentsStart { tag, .. } => {
        self.pop_leaf();
        self.path.push(TagPathNode::SequenceStart { tag: *tag })
      }

      DicomPart::SequenceItemStart { index, .. } => {
        match self.path.pop() {
          Some(
            TagPathNode::SequenceStart { tag }
            | TagPathNode::ItemEnd { tag, .. },
          ) => self.path.push(TagPathNode::Item {
            tag,
            index: *index,
          }),

          node => Err(format!(
            "Sequence item is not valid at the current position: {:?}",
            node
          )),
        }
      }

      DicomPart::SequenceItemDelimitation { .. } => {
        self.pop_leaf();

        match self.path.pop() {
          Some(TagPathNode::Item { tag, index }) => {
            self.path.push(TagPathNode::ItemEnd { tag, index })
          }

          node => Err(format!(
            "Item delimitation is not valid at the current position: {:?}",
            node
          )),
        }
      }

      DicomPart::SequenceDelimitation { .. } => match self.path.pop() {
        Some(
          TagPathNode::SequenceStart { tag }
          | TagPathNode::ItemEnd { tag, .. },
        ) => self.path.push(TagPathNode::SequenceEnd { tag }),

        node => Err(format!(
          "Sequence delimitation is not valid at the current position: {:?}",
          node
        )),
      },

      DicomPart::FragmentsItem { index, .. } => match self.path.pop() {
        Some(
          TagPathNode::SequenceStart { tag } | TagPathNode::Item { tag, .. },
        ) => self.path.push(TagPathNode::Item {
          tag,
          index: *index,
        }),

        node => Err(format!(
          "Fragments item is not valid at the current position: {:?}",
          node
        )),
      },

      DicomPart::FragmentsDelimitation { .. } => {
        match self.path.pop() {
          Some(
            TagPathNode::SequenceStart { tag }
            | TagPathNode::Item { tag, .. },
          ) => self.path.push(TagPathNode::SequenceEnd { tag }),

          node => Err(format!(
            "Fragments delimitation is not valid at the current position: \
             {:?}",
            node
          )),
        }
      }

      // Value chunks belong to the element the path already names, and the
      // remaining parts don't alter the path
      _ => Ok(()),
    }
  }

  /// Pops the node of a completed element or container end, leaving the
  /// path a trunk that the next node can be pushed onto. Fragment items
  /// stay on the path until the next item or the fragments end.
  ///
  fn pop_leaf(&mut self) {
    match self.path.last_node() {
      Some(
        TagPathNode::Tag { .. }
        | TagPathNode::SequenceEnd { .. }
        | TagPathNode::ItemEnd { .. },
      ) => {
        self.path.pop();
      }

      _ => (),
    }
  }
}

/// Capability that maintains a current tag path and passes it to the
/// wrapped flow's callbacks. Composes over guaranteed value and
/// delimitation events via [`tag_path_tracking`] so that tracking works
/// uniformly across determinate and indeterminate containers.
///
pub struct TagPathTracking<F: PathAwareFlow> {
  tracker: TagPathTracker,
  inner: F,
}

impl<F: PathAwareFlow> TagPathTracking<F> {
  pub fn new(inner: F) -> Self {
    Self {
      tracker: TagPathTracker::new(),
      inner,
    }
  }
}

impl<F: PathAwareFlow> DicomFlow for TagPathTracking<F> {
  type Out = F::Out;

  fn on_part(&mut self, part: &DicomPart) -> Result<Vec<F::Out>, P10Error> {
    self.tracker.update(part).map_err(|details| {
      P10Error::PartStreamInvalid {
        when: "Tracking tag path".to_string(),
        details,
        part: part.clone(),
      }
    })?;

    self.inner.on_part_at_path(part, self.tracker.path())
  }
}

/// Wraps a path-aware flow with tag path tracking and its prerequisite
/// capabilities: guaranteed value events and guaranteed delimitation
/// events.
///
pub fn tag_path_tracking<F: PathAwareFlow>(
  flow: F,
) -> GuaranteedDelimitationEvents<GuaranteedValueEvent<TagPathTracking<F>>>
where
  F::Out: PartialEq + From<DicomPart>,
{
  GuaranteedDelimitationEvents::new(GuaranteedValueEvent::new(
    TagPathTracking::new(flow),
  ))
}

#[cfg(test)]
mod tests {
  use super::*;

  use dcmstream_core::{dictionary, DataElementTag, ValueRepresentation};
  use dcmstream_p10::{part, ValueLength};

  fn header(tag: DataElementTag) -> DicomPart {
    DicomPart::DataElementHeader {
      tag,
      vr: ValueRepresentation::LongString,
      length: ValueLength::new(2),
      is_fmi: false,
      big_endian: false,
      explicit_vr: true,
      bytes: vec![0; 8].into(),
    }
  }

  #[test]
  fn tracks_nested_path_test() {
    let mut tracker = TagPathTracker::new();

    let sequence_tag = dictionary::DERIVATION_CODE_SEQUENCE.tag;

    tracker
      .update(&DicomPart::SequenceStart {
        tag: sequence_tag,
        length: ValueLength::Undefined,
        big_endian: false,
        explicit_vr: true,
        bytes: vec![0; 12].into(),
      })
      .unwrap();

    assert_eq!(tracker.path(), &TagPath::from_sequence(sequence_tag));

    tracker
      .update(&DicomPart::SequenceItemStart {
        index: 1,
        length: ValueLength::Undefined,
        big_endian: false,
        bytes: vec![0; 8].into(),
      })
      .unwrap();

    assert_eq!(tracker.path(), &TagPath::from_item(sequence_tag, 1));

    tracker.update(&header(dictionary::STUDY_DATE.tag)).unwrap();

    assert_eq!(
      tracker.path(),
      &TagPath::from_item(sequence_tag, 1)
        .then_tag(dictionary::STUDY_DATE.tag)
        .unwrap()
    );

    tracker
      .update(&part::synthetic_item_delimitation(1, false))
      .unwrap();

    assert_eq!(
      tracker.path(),
      &TagPath::from_item_end(sequence_tag, 1)
    );

    tracker
      .update(&part::synthetic_sequence_delimitation(false))
      .unwrap();

    assert_eq!(tracker.path(), &TagPath::from_sequence_end(sequence_tag));

    // The next root-level element replaces the sequence end node
    tracker.update(&header(dictionary::PATIENT_NAME.tag)).unwrap();

    assert_eq!(
      tracker.path(),
      &TagPath::from_tag(dictionary::PATIENT_NAME.tag)
    );
  }

  #[test]
  fn tracks_fragments_test() {
    let mut tracker = TagPathTracker::new();

    tracker
      .update(&DicomPart::FragmentsStart {
        tag: dictionary::PIXEL_DATA.tag,
        vr: ValueRepresentation::OtherWordString,
        big_endian: false,
        explicit_vr: true,
        bytes: vec![0; 12].into(),
      })
      .unwrap();

    for index in 1..=2 {
      tracker
        .update(&DicomPart::FragmentsItem {
          index,
          length: 4,
          big_endian: false,
          bytes: vec![0; 8].into(),
        })
        .unwrap();

      assert_eq!(
        tracker.path(),
        &TagPath::from_item(dictionary::PIXEL_DATA.tag, index)
      );
    }

    tracker
      .update(&DicomPart::FragmentsDelimitation {
        big_endian: false,
        bytes: vec![0; 8].into(),
      })
      .unwrap();

    assert_eq!(
      tracker.path(),
      &TagPath::from_sequence_end(dictionary::PIXEL_DATA.tag)
    );
  }
}
