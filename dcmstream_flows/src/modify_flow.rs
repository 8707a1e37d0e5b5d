//! Flow that rewrites and inserts data element values in a part stream.

use dcmstream_core::transfer_syntax::Endianness;
use dcmstream_core::{
  dictionary, DataElementTag, TagPath, TagTree, ValueRepresentation,
};
use dcmstream_p10::internal::data_element_header::DataElementHeader;
use dcmstream_p10::{DicomPart, P10Error, ValueLength};

use crate::tag_path_tracking::{tag_path_tracking, PathAwareFlow};
use crate::DicomFlow;

/// A single modification applied by [`modify_flow`]: locations matched by
/// the tag tree have their value bytes replaced with the result of the
/// value function, which receives the current bytes. When
/// `insert_if_missing` is set and the tree names a single root-level data
/// element that is absent from the stream, the element is inserted in tag
/// order with the value function's output for an absent value.
///
pub struct Modification {
  pub matcher: TagTree,
  pub value_fn: Box<dyn FnMut(Option<&[u8]>) -> Vec<u8>>,
  pub insert_if_missing: bool,
}

impl Modification {
  /// Returns the root data element tag this modification can insert, when
  /// insertion applies to it.
  ///
  fn insertable_tag(&self) -> Option<DataElementTag> {
    if !self.insert_if_missing {
      return None;
    }

    match self.matcher.nodes() {
      [dcmstream_core::TagTreeNode::Tag { tag }] => Some(*tag),
      _ => None,
    }
  }
}

/// The rewriting half of [`modify_flow`].
///
struct ModifyTransform {
  modifications: Vec<Modification>,

  // Indices into `modifications` of root-level insertions not yet emitted,
  // in descending tag order so the next one can be popped off the end
  pending_insertions: Vec<usize>,

  pending_value: Option<PendingValue>,
}

struct PendingValue {
  modification_index: usize,
  tag: DataElementTag,
  vr: ValueRepresentation,
  is_fmi: bool,
  big_endian: bool,
  explicit_vr: bool,
  data: Vec<u8>,
}

impl ModifyTransform {
  fn new(modifications: Vec<Modification>) -> Self {
    let mut pending_insertions: Vec<usize> = modifications
      .iter()
      .enumerate()
      .filter(|(_, modification)| modification.insertable_tag().is_some())
      .map(|(index, _)| index)
      .collect();

    pending_insertions.sort_by_key(|index| {
      std::cmp::Reverse(
        modifications[*index].insertable_tag().unwrap().to_int(),
      )
    });

    Self {
      modifications,
      pending_insertions,
      pending_value: None,
    }
  }

  /// Emits the parts for pending insertions whose tags precede the given
  /// tag at the root data set level.
  ///
  fn emit_insertions_before(
    &mut self,
    next_tag: Option<DataElementTag>,
    output: &mut Vec<DicomPart>,
  ) -> Result<(), P10Error> {
    while let Some(index) = self.pending_insertions.last().copied() {
      let tag = self.modifications[index].insertable_tag().unwrap();

      if let Some(next_tag) = next_tag {
        if tag.to_int() >= next_tag.to_int() {
          // An element with this tag is present in the stream, so it will
          // be rewritten rather than inserted
          if tag == next_tag {
            self.pending_insertions.pop();
          }

          return Ok(());
        }
      }

      self.pending_insertions.pop();

      let bytes = (self.modifications[index].value_fn)(None);
      output.extend(Self::element_parts(tag, bytes)?);
    }

    Ok(())
  }

  /// Builds the header and value chunk parts for an inserted data element,
  /// encoded as explicit VR little endian.
  ///
  fn element_parts(
    tag: DataElementTag,
    mut bytes: Vec<u8>,
  ) -> Result<Vec<DicomPart>, P10Error> {
    let vr = dictionary::vr_of(tag);

    vr.pad_bytes_to_even_length(&mut bytes);

    let header = DataElementHeader {
      tag,
      vr: Some(vr),
      length: ValueLength::new(bytes.len() as u32),
    };

    let header_bytes = header
      .to_bytes(Endianness::LittleEndian)
      .map_err(|_| P10Error::DataInvalid {
        when: "Inserting data element".to_string(),
        details: format!(
          "Length of value for '{}' exceeds the maximum for its VR",
          tag
        ),
        path: TagPath::from_tag(tag),
        offset: 0,
      })?;

    Ok(vec![
      DicomPart::DataElementHeader {
        tag,
        vr,
        length: ValueLength::new(bytes.len() as u32),
        is_fmi: tag.is_file_meta_information(),
        big_endian: false,
        explicit_vr: true,
        bytes: header_bytes.into(),
      },
      DicomPart::DataElementValueChunk {
        big_endian: false,
        data: bytes.into(),
        last: true,
      },
    ])
  }

  /// Emits the rewritten header and value chunk for a fully buffered value.
  ///
  fn finish_pending_value(
    &mut self,
    pending: PendingValue,
  ) -> Result<Vec<DicomPart>, P10Error> {
    let mut bytes =
      (self.modifications[pending.modification_index].value_fn)(Some(
        &pending.data,
      ));

    pending.vr.pad_bytes_to_even_length(&mut bytes);

    let endianness = if pending.big_endian {
      Endianness::BigEndian
    } else {
      Endianness::LittleEndian
    };

    let header = DataElementHeader {
      tag: pending.tag,
      vr: pending.explicit_vr.then_some(pending.vr),
      length: ValueLength::new(bytes.len() as u32),
    };

    let header_bytes = header
      .to_bytes(endianness)
      .map_err(|_| P10Error::DataInvalid {
        when: "Modifying data element value".to_string(),
        details: format!(
          "Length of value for '{}' exceeds the maximum for its VR",
          pending.tag
        ),
        path: TagPath::from_tag(pending.tag),
        offset: 0,
      })?;

    Ok(vec![
      DicomPart::DataElementHeader {
        tag: pending.tag,
        vr: pending.vr,
        length: ValueLength::new(bytes.len() as u32),
        is_fmi: pending.is_fmi,
        big_endian: pending.big_endian,
        explicit_vr: pending.explicit_vr,
        bytes: header_bytes.into(),
      },
      DicomPart::DataElementValueChunk {
        big_endian: pending.big_endian,
        data: bytes.into(),
        last: true,
      },
    ])
  }
}

impl PathAwareFlow for ModifyTransform {
  type Out = DicomPart;

  fn on_part_at_path(
    &mut self,
    part: &DicomPart,
    path: &TagPath,
  ) -> Result<Vec<DicomPart>, P10Error> {
    match part {
      DicomPart::DataElementHeader {
        tag,
        vr,
        is_fmi,
        big_endian,
        explicit_vr,
        ..
      } => {
        let mut output = vec![];

        // Insert any pending elements that sort before this root element
        if path.depth() == 1 && !is_fmi {
          self.emit_insertions_before(Some(*tag), &mut output)?;
        }

        // Start buffering the value when a modification matches this path
        let modification_index = self
          .modifications
          .iter()
          .position(|modification| modification.matcher.is_path_of(path));

        match modification_index {
          Some(modification_index) => {
            self.pending_value = Some(PendingValue {
              modification_index,
              tag: *tag,
              vr: *vr,
              is_fmi: *is_fmi,
              big_endian: *big_endian,
              explicit_vr: *explicit_vr,
              data: vec![],
            });
          }

          None => output.push(part.clone()),
        }

        Ok(output)
      }

      DicomPart::DataElementValueChunk { data, last, .. } => {
        match self.pending_value.as_mut() {
          Some(pending) => {
            pending.data.extend_from_slice(data);

            if *last {
              let pending = self.pending_value.take().unwrap();
              self.finish_pending_value(pending)
            } else {
              Ok(vec![])
            }
          }

          None => Ok(vec![part.clone()]),
        }
      }

      DicomPart::SequenceStart { tag, .. }
      | DicomPart::FragmentsStart { tag, .. } => {
        let mut output = vec![];

        if path.depth() == 1 {
          self.emit_insertions_before(Some(*tag), &mut output)?;
        }

        output.push(part.clone());

        Ok(output)
      }

      DicomPart::EndMarker => {
        let mut output = vec![];

        self.emit_insertions_before(None, &mut output)?;
        output.push(part.clone());

        Ok(output)
      }

      _ => Ok(vec![part.clone()]),
    }
  }
}

/// Creates a flow that applies the given modifications to a part stream:
/// matched values are rewritten through their value function, with the
/// header length updated and the new bytes padded to even length, and
/// missing root-level elements are inserted in tag order when requested.
///
pub fn modify_flow(
  modifications: Vec<Modification>,
) -> impl DicomFlow<Out = DicomPart> {
  tag_path_tracking(ModifyTransform::new(modifications))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::flow::create;

  fn element_parts(tag: DataElementTag, value: &[u8]) -> Vec<DicomPart> {
    ModifyTransform::element_parts(tag, value.to_vec()).unwrap()
  }

  #[test]
  fn rewrites_matched_values_test() {
    let mut transform = create(modify_flow(vec![Modification {
      matcher: TagTree::from_tag(dictionary::PATIENT_NAME.tag),
      value_fn: Box::new(|_| b"Doe^Jane".to_vec()),
      insert_if_missing: false,
    }]));

    let mut output = vec![];
    for part in element_parts(dictionary::PATIENT_NAME.tag, b"John^Doe") {
      output.extend(transform.add_part(&part).unwrap());
    }
    output.extend(transform.finish().unwrap());
    output.retain(|part| !part.is_marker());

    assert_eq!(
      output,
      element_parts(dictionary::PATIENT_NAME.tag, b"Doe^Jane")
    );
  }

  #[test]
  fn inserts_missing_elements_in_tag_order_test() {
    let mut transform = create(modify_flow(vec![Modification {
      matcher: TagTree::from_tag(dictionary::PATIENT_ID.tag),
      value_fn: Box::new(|_| b"12".to_vec()),
      insert_if_missing: true,
    }]));

    let mut output = vec![];
    for part in element_parts(dictionary::PATIENT_NAME.tag, b"John^Doe") {
      output.extend(transform.add_part(&part).unwrap());
    }
    for part in element_parts(dictionary::PATIENT_AGE.tag, b"042Y") {
      output.extend(transform.add_part(&part).unwrap());
    }
    output.extend(transform.finish().unwrap());
    output.retain(|part| !part.is_marker());

    // '(0010,0020) Patient ID' lands between the name and the age
    let expected: Vec<DicomPart> =
      element_parts(dictionary::PATIENT_NAME.tag, b"John^Doe")
        .into_iter()
        .chain(element_parts(dictionary::PATIENT_ID.tag, b"12"))
        .chain(element_parts(dictionary::PATIENT_AGE.tag, b"042Y"))
        .collect();

    assert_eq!(output, expected);
  }
}
