//! Flow that collects data elements into an in-memory data set while
//! buffering the stream.

use dcmstream_core::{Elements, TagPath, TagTree};
use dcmstream_p10::{DicomPart, ElementsBuilder, P10Error};

use crate::tag_path_tracking::{tag_path_tracking, PathAwareFlow};
use crate::DicomFlow;

/// The output of [`collect_flow`]: either a buffered stream part, or the
/// data set of collected elements emitted once the flow's stop condition
/// holds.
///
#[derive(Clone, Debug, PartialEq)]
pub enum CollectedPart {
  /// The collected elements, labeled with the name given to the flow.
  Elements { label: String, elements: Elements },

  /// A part of the underlying stream.
  Part(DicomPart),
}

impl From<DicomPart> for CollectedPart {
  fn from(part: DicomPart) -> Self {
    CollectedPart::Part(part)
  }
}

/// The collecting half of [`collect_flow`].
///
struct CollectTransform<S> {
  trees: Vec<TagTree>,
  stop_condition: S,
  label: String,
  max_buffer_size: u64,

  buffer: Vec<DicomPart>,
  buffered_bytes: u64,
  builder: ElementsBuilder,
  element_collected: bool,
  is_collecting: bool,
}

impl<S: FnMut(&TagPath, &DicomPart) -> bool> CollectTransform<S> {
  /// Ends collection and emits the collected elements followed by the
  /// buffered parts.
  ///
  fn emit(&mut self) -> Result<Vec<CollectedPart>, P10Error> {
    self.is_collecting = false;
    self.builder.end();

    let elements = self.builder.final_elements().unwrap_or_default();

    let mut output = vec![CollectedPart::Elements {
      label: self.label.clone(),
      elements,
    }];

    output.extend(
      std::mem::take(&mut self.buffer)
        .into_iter()
        .map(CollectedPart::Part),
    );

    Ok(output)
  }

  /// Feeds a part into the elements builder when its location matches one
  /// of the collection trees.
  ///
  fn collect_part(
    &mut self,
    part: &DicomPart,
    path: &TagPath,
  ) -> Result<(), P10Error> {
    let matches = match part {
      DicomPart::DataElementHeader { .. }
      | DicomPart::SequenceStart { .. }
      | DicomPart::FragmentsStart { .. } => {
        self.element_collected = self
          .trees
          .iter()
          .any(|tree| tree.has_trunk(path) || tree.is_trunk_of(path));

        self.element_collected
      }

      DicomPart::SequenceItemStart { .. }
      | DicomPart::FragmentsItem { .. } => {
        self.element_collected = self
          .trees
          .iter()
          .any(|tree| tree.has_trunk(path) || tree.is_trunk_of(path));

        self.element_collected
      }

      DicomPart::DataElementValueChunk { .. } => self.element_collected,

      DicomPart::SequenceItemDelimitation { .. }
      | DicomPart::SequenceDelimitation { .. }
      | DicomPart::FragmentsDelimitation { .. } => self
        .trees
        .iter()
        .any(|tree| tree.has_trunk(path) || tree.is_trunk_of(path)),

      _ => false,
    };

    if matches {
      self.builder.add_part(part)?;
    }

    Ok(())
  }
}

impl<S: FnMut(&TagPath, &DicomPart) -> bool> PathAwareFlow
  for CollectTransform<S>
{
  type Out = CollectedPart;

  fn on_part_at_path(
    &mut self,
    part: &DicomPart,
    path: &TagPath,
  ) -> Result<Vec<CollectedPart>, P10Error> {
    if !self.is_collecting {
      return Ok(vec![CollectedPart::Part(part.clone())]);
    }

    if matches!(part, DicomPart::StartMarker) {
      return Ok(vec![CollectedPart::Part(part.clone())]);
    }

    // The stop condition and the end of the stream both release the
    // buffered parts
    if (self.stop_condition)(path, part)
      || matches!(part, DicomPart::EndMarker)
    {
      let mut output = self.emit()?;
      output.push(CollectedPart::Part(part.clone()));

      return Ok(output);
    }

    self.collect_part(part, path)?;

    self.buffered_bytes += part.byte_size();
    if self.buffered_bytes > self.max_buffer_size {
      return Err(P10Error::MaximumExceeded {
        details: format!(
          "Collecting elements exceeded the max buffer size of {} bytes",
          self.max_buffer_size
        ),
        path: path.clone(),
        offset: 0,
      });
    }

    self.buffer.push(part.clone());

    Ok(vec![])
  }
}

/// Creates a flow that buffers the upstream until the stop condition holds
/// for the current tag path, then emits the elements matched by the given
/// tag trees as a labeled data set, followed by all buffered parts in their
/// original order. The stream then continues to pass through untouched.
///
/// An error is raised if the number of buffered bytes exceeds
/// `max_buffer_size`.
///
pub fn collect_flow(
  trees: Vec<TagTree>,
  stop_condition: impl FnMut(&TagPath, &DicomPart) -> bool,
  label: String,
  max_buffer_size: u64,
) -> impl DicomFlow<Out = CollectedPart> {
  tag_path_tracking(CollectTransform {
    trees,
    stop_condition,
    label,
    max_buffer_size,
    buffer: vec![],
    buffered_bytes: 0,
    builder: ElementsBuilder::new(),
    element_collected: false,
    is_collecting: true,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::flow::create;

  use dcmstream_core::transfer_syntax::Endianness;
  use dcmstream_core::{dictionary, DataElementTag, ValueRepresentation};
  use dcmstream_p10::internal::data_element_header::DataElementHeader;
  use dcmstream_p10::ValueLength;

  fn element_parts(
    tag: DataElementTag,
    vr: ValueRepresentation,
    value: &[u8],
  ) -> Vec<DicomPart> {
    let header = DataElementHeader {
      tag,
      vr: Some(vr),
      length: ValueLength::new(value.len() as u32),
    };

    vec![
      DicomPart::DataElementHeader {
        tag,
        vr,
        length: ValueLength::new(value.len() as u32),
        is_fmi: false,
        big_endian: false,
        explicit_vr: true,
        bytes: header.to_bytes(Endianness::LittleEndian).unwrap().into(),
      },
      DicomPart::DataElementValueChunk {
        big_endian: false,
        data: value.to_vec().into(),
        last: true,
      },
    ]
  }

  #[test]
  fn collects_elements_until_stop_condition_test() {
    let mut transform = create(collect_flow(
      vec![TagTree::from_tag(dictionary::PATIENT_NAME.tag)],
      |path, _part| path.final_tag() == Some(dictionary::PATIENT_AGE.tag),
      "patient".to_string(),
      1024,
    ));

    let mut output = vec![];
    for part in element_parts(
      dictionary::PATIENT_NAME.tag,
      ValueRepresentation::PersonName,
      b"John^Doe",
    ) {
      output.extend(transform.add_part(&part).unwrap());
    }

    // Nothing is emitted until the stop condition holds
    assert!(output
      .iter()
      .all(|part| *part == CollectedPart::Part(DicomPart::StartMarker)));

    for part in element_parts(
      dictionary::PATIENT_AGE.tag,
      ValueRepresentation::AgeString,
      b"042Y",
    ) {
      output.extend(transform.add_part(&part).unwrap());
    }

    match &output[1] {
      CollectedPart::Elements { label, elements } => {
        assert_eq!(label, "patient");
        assert_eq!(elements.tags(), vec![dictionary::PATIENT_NAME.tag]);
      }

      part => panic!("Unexpected part: {part:?}"),
    }
  }

  #[test]
  fn errors_when_buffer_exceeded_test() {
    let mut transform = create(collect_flow(
      vec![],
      |_path, _part| false,
      "buffered".to_string(),
      8,
    ));

    let mut result = Ok(vec![]);
    for part in element_parts(
      dictionary::PATIENT_NAME.tag,
      ValueRepresentation::PersonName,
      b"John^Doe",
    ) {
      result = transform.add_part(&part);
    }

    assert!(matches!(result, Err(P10Error::MaximumExceeded { .. })));
  }
}
