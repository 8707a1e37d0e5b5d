//! Flows that filter data elements out of a part stream based on their tag
//! path.

use dcmstream_core::{dictionary, TagPath, TagTree};
use dcmstream_p10::{DicomPart, P10Error};

use crate::tag_path_tracking::{tag_path_tracking, PathAwareFlow};
use crate::DicomFlow;

/// A filter over a part stream. Data elements, sequences, and items whose
/// tracked tag path fails the predicate are dropped, along with everything
/// nested inside them. The File Meta Information is kept or dropped en bloc
/// by the `keep_fmi` flag without consulting the predicate.
///
pub struct TagFilter<P> {
  predicate: P,
  keep_fmi: bool,
  container_results: Vec<bool>,
  element_kept: bool,
}

impl<P: FnMut(&TagPath, &DicomPart) -> bool> TagFilter<P> {
  pub fn new(predicate: P, keep_fmi: bool) -> Self {
    Self {
      predicate,
      keep_fmi,
      container_results: vec![],
      element_kept: true,
    }
  }

  fn current(&self) -> bool {
    *self.container_results.last().unwrap_or(&true)
  }

  /// Runs the predicate unless an enclosing container has already been
  /// filtered out, in which case the predicate is skipped.
  ///
  fn run_predicate(&mut self, path: &TagPath, part: &DicomPart) -> bool {
    self.current() && (self.predicate)(path, part)
  }
}

impl<P: FnMut(&TagPath, &DicomPart) -> bool> PathAwareFlow for TagFilter<P> {
  type Out = DicomPart;

  fn on_part_at_path(
    &mut self,
    part: &DicomPart,
    path: &TagPath,
  ) -> Result<Vec<DicomPart>, P10Error> {
    let keep = match part {
      DicomPart::FilePreamble { .. } => self.keep_fmi,

      DicomPart::DataElementHeader { is_fmi: true, .. } => {
        self.element_kept = self.keep_fmi;
        self.element_kept
      }

      DicomPart::DataElementHeader { .. } => {
        self.element_kept = self.run_predicate(path, part);
        self.element_kept
      }

      DicomPart::DataElementValueChunk { .. } => self.element_kept,

      DicomPart::SequenceStart { .. } | DicomPart::FragmentsStart { .. } => {
        let keep = self.run_predicate(path, part);
        self.container_results.push(keep);
        keep
      }

      DicomPart::SequenceItemStart { .. } => {
        let keep = self.run_predicate(path, part);
        self.container_results.push(keep);
        keep
      }

      DicomPart::FragmentsItem { .. } => {
        self.element_kept = self.current();
        self.element_kept
      }

      DicomPart::SequenceItemDelimitation { .. }
      | DicomPart::SequenceDelimitation { .. }
      | DicomPart::FragmentsDelimitation { .. } => {
        let keep = self.current();
        self.container_results.pop();
        keep
      }

      DicomPart::DeflatedChunk { .. } | DicomPart::Unknown { .. } => {
        self.current()
      }

      DicomPart::StartMarker | DicomPart::EndMarker => true,
    };

    if keep {
      Ok(vec![part.clone()])
    } else {
      Ok(vec![])
    }
  }
}

/// Creates a flow that drops any data element whose tracked tag path fails
/// the given predicate. Whole sequences and items are dropped when their
/// own paths fail. The File Meta Information is kept or dropped en bloc per
/// `keep_fmi`.
///
pub fn tag_filter(
  predicate: impl FnMut(&TagPath, &DicomPart) -> bool,
  keep_fmi: bool,
) -> impl DicomFlow<Out = DicomPart> {
  tag_path_tracking(TagFilter::new(predicate, keep_fmi))
}

/// Creates a flow that keeps only the locations matched by the given tag
/// trees. A container is preserved while any tree could still match one of
/// its descendants, and everything inside a fully matched location is
/// preserved.
///
pub fn whitelist_filter(
  trees: Vec<TagTree>,
  keep_fmi: bool,
) -> impl DicomFlow<Out = DicomPart> {
  tag_filter(
    move |path, _part| {
      trees
        .iter()
        .any(|tree| tree.has_trunk(path) || tree.is_trunk_of(path))
    },
    keep_fmi,
  )
}

/// Creates a flow that drops the locations matched by the given tag trees,
/// including everything nested inside a matched location.
///
pub fn blacklist_filter(
  trees: Vec<TagTree>,
) -> impl DicomFlow<Out = DicomPart> {
  tag_filter(
    move |path, _part| !trees.iter().any(|tree| tree.is_trunk_of(path)),
    true,
  )
}

/// Creates a flow that drops every group length data element, i.e. those
/// with an element of 0x0000, other than the *'(0002,0000) File Meta
/// Information Group Length'*.
///
pub fn group_length_discard_filter() -> impl DicomFlow<Out = DicomPart> {
  tag_filter(
    |path, _part| match path.final_tag() {
      Some(tag) => !tag.is_group_length(),
      None => true,
    },
    true,
  )
}

/// Creates a flow that drops the entire File Meta Information, including
/// the File Preamble.
///
pub fn fmi_discard_filter() -> impl DicomFlow<Out = DicomPart> {
  tag_filter(|_path, _part| true, false)
}

/// Creates a flow that drops the *'(7FE0,0010) Pixel Data'* and
/// *'(5400,1010) Waveform Data'* data elements in the root data set while
/// preserving them inside sequence items.
///
pub fn bulk_data_filter() -> impl DicomFlow<Out = DicomPart> {
  tag_filter(
    |path, _part| {
      let is_root_element = path.depth() == 1;

      !(is_root_element
        && (path.final_tag() == Some(dictionary::PIXEL_DATA.tag)
          || path.final_tag() == Some(dictionary::WAVEFORM_DATA.tag)))
    },
    true,
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::flow::create;

  use dcmstream_core::{DataElementTag, ValueRepresentation};
  use dcmstream_p10::ValueLength;

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

  fn chunk() -> DicomPart {
    DicomPart::DataElementValueChunk {
      big_endian: false,
      data: vec![0x41, 0x42].into(),
      last: true,
    }
  }

  #[test]
  fn drops_elements_failing_the_predicate_test() {
    let mut transform = create(tag_filter(
      |path, _| path.final_tag() != Some(dictionary::PATIENT_ID.tag),
      true,
    ));

    let mut output = vec![];
    output.extend(transform.add_part(&header(dictionary::PATIENT_NAME.tag)).unwrap());
    output.extend(transform.add_part(&chunk()).unwrap());
    output.extend(transform.add_part(&header(dictionary::PATIENT_ID.tag)).unwrap());
    output.extend(transform.add_part(&chunk()).unwrap());
    output.extend(transform.finish().unwrap());

    assert_eq!(
      output,
      vec![
        DicomPart::StartMarker,
        header(dictionary::PATIENT_NAME.tag),
        chunk(),
        DicomPart::EndMarker,
      ]
    );
  }

  #[test]
  fn whitelist_keeps_matched_subtrees_test() {
    let sequence_tag = dictionary::DERIVATION_CODE_SEQUENCE.tag;

    let trees = vec![TagTree::from_any_item(sequence_tag)
      .then_tag(dictionary::STUDY_DATE.tag)
      .unwrap()];

    let mut transform = create(whitelist_filter(trees, true));

    let sequence_start = DicomPart::SequenceStart {
      tag: sequence_tag,
      length: ValueLength::Undefined,
      big_endian: false,
      explicit_vr: true,
      bytes: vec![0; 12].into(),
    };

    let item_start = DicomPart::SequenceItemStart {
      index: 1,
      length: ValueLength::Undefined,
      big_endian: false,
      bytes: vec![0; 8].into(),
    };

    let mut output = vec![];
    output.extend(transform.add_part(&sequence_start).unwrap());
    output.extend(transform.add_part(&item_start).unwrap());
    output.extend(transform.add_part(&header(dictionary::STUDY_DATE.tag)).unwrap());
    output.extend(transform.add_part(&chunk()).unwrap());
    output.extend(transform.add_part(&header(dictionary::PATIENT_ID.tag)).unwrap());
    output.extend(transform.add_part(&chunk()).unwrap());

    // The root-level element after the sequence is not whitelisted
    output.extend(transform.add_part(&header(dictionary::PATIENT_NAME.tag)).unwrap());
    output.extend(transform.add_part(&chunk()).unwrap());
    output.extend(transform.finish().unwrap());

    assert_eq!(
      output,
      vec![
        DicomPart::StartMarker,
        sequence_start,
        item_start,
        header(dictionary::STUDY_DATE.tag),
        chunk(),
        dcmstream_p10::part::synthetic_item_delimitation(1, false),
        dcmstream_p10::part::synthetic_sequence_delimitation(false),
        DicomPart::EndMarker,
      ]
    );
  }

  #[test]
  fn bulk_data_filter_preserves_nested_pixel_data_test() {
    let mut transform = create(bulk_data_filter());

    let mut output = vec![];
    output.extend(
      transform.add_part(&header(dictionary::PIXEL_DATA.tag)).unwrap(),
    );
    output.extend(transform.add_part(&chunk()).unwrap());
    output.extend(transform.finish().unwrap());

    assert_eq!(
      output,
      vec![DicomPart::StartMarker, DicomPart::EndMarker]
    );
  }
}
