//! An elements builder materializes a stream of DICOM parts into an
//! in-memory [`Elements`] data set.
//!
//! Most commonly the stream of parts originates from reading raw DICOM P10
//! bytes with the [`crate::p10_read`] module.

use byteorder::ByteOrder;

use dcmstream_core::element_set::sequence::Item;
use dcmstream_core::{
  DataElementTag, ElementSet, Elements, Fragment, Fragments, RcByteSlice,
  Sequence, ValueElement, ValueRepresentation,
};

use crate::{DicomPart, P10Error};

/// A builder that can be fed a stream of DICOM parts and materialize them
/// into an in-memory data set.
///
/// The builder tracks the remaining byte count of determinate-length
/// sequences and items itself, so it accepts part streams both with and
/// without synthesized delimitations.
///
#[derive(Debug)]
pub struct ElementsBuilder {
  file_preamble: Option<RcByteSlice>,
  location: Vec<BuilderLocation>,
  pending_element: Option<PendingElement>,
  is_complete: bool,
}

/// Tracks where in the data set the builder is currently at, specifically
/// the sequences, items, and pixel data fragments currently in the process
/// of being built.
///
#[derive(Debug)]
enum BuilderLocation {
  RootDataSet {
    elements: Elements,
  },
  Sequence {
    tag: DataElementTag,
    declared_length: Option<u32>,
    big_endian: bool,
    explicit_vr: bool,
    items: Vec<Item>,
    bytes_remaining: Option<u64>,
  },
  SequenceItem {
    declared_length: Option<u32>,
    elements: Elements,
    bytes_remaining: Option<u64>,
  },
  Fragments {
    tag: DataElementTag,
    vr: ValueRepresentation,
    big_endian: bool,
    explicit_vr: bool,
    offsets: Option<Vec<u32>>,
    fragments: Vec<Fragment>,
  },
}

/// The pending element is a data element or fragments item for which a
/// header part has been received, but whose final value chunk is still
/// pending.
///
#[derive(Debug)]
enum PendingElement {
  DataElement {
    tag: DataElementTag,
    vr: ValueRepresentation,
    big_endian: bool,
    explicit_vr: bool,
    data: Vec<RcByteSlice>,
  },
  FragmentsItem {
    index: usize,
    big_endian: bool,
    data: Vec<RcByteSlice>,
  },
}

impl Default for ElementsBuilder {
  fn default() -> Self {
    Self::new()
  }
}

impl ElementsBuilder {
  /// Creates a new builder that can be given DICOM parts to be materialized
  /// into an in-memory data set.
  ///
  pub fn new() -> Self {
    Self {
      file_preamble: None,
      location: vec![BuilderLocation::RootDataSet {
        elements: Elements::new(),
      }],
      pending_element: None,
      is_complete: false,
    }
  }

  /// Returns whether the builder is complete, i.e. [`Self::end`] has been
  /// called or an end marker part has been received.
  ///
  pub fn is_complete(&self) -> bool {
    self.is_complete
  }

  /// Returns the File Preamble read by this builder, if one was present in
  /// the part stream. The preamble is always 132 bytes: the 128
  /// application-defined bytes plus the "DICM" prefix.
  ///
  pub fn file_preamble(&self) -> Option<&RcByteSlice> {
    self.file_preamble.as_ref()
  }

  /// Marks the end of the incoming parts. Any sequences and items still
  /// open, e.g. because the stream was truncated on a data element
  /// boundary, are closed.
  ///
  pub fn end(&mut self) {
    self.pending_element = None;

    while self.location.len() > 1 {
      match self.location.last() {
        Some(BuilderLocation::SequenceItem { .. }) => self.close_item(),
        Some(BuilderLocation::Sequence { .. }) => self.close_sequence(),
        Some(BuilderLocation::Fragments { .. }) => self.close_fragments(),
        _ => break,
      }
    }

    self.is_complete = true;
  }

  /// Returns the final data set constructed by this builder, or an error if
  /// the part stream hasn't ended yet.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn final_elements(&mut self) -> Result<Elements, ()> {
    match (self.is_complete, self.location.as_mut_slice()) {
      (true, [BuilderLocation::RootDataSet { elements }]) => {
        Ok(std::mem::take(elements))
      }
      _ => Err(()),
    }
  }

  /// Adds the next DICOM part to this builder. This function is responsible
  /// for progressively constructing a data set from the parts received, and
  /// also checks that the parts are received in a valid order.
  ///
  pub fn add_part(&mut self, part: &DicomPart) -> Result<(), P10Error> {
    if self.is_complete {
      return Err(P10Error::PartStreamInvalid {
        when: "Building data set".to_string(),
        details: "Part received after the part stream has ended".to_string(),
        part: part.clone(),
      });
    }

    // Bytes of this part count against the remaining lengths of all open
    // determinate-length containers. This happens before any new container
    // the part opens is pushed.
    let part_size = part.byte_size();
    for entry in self.location.iter_mut() {
      match entry {
        BuilderLocation::Sequence {
          bytes_remaining: Some(bytes_remaining),
          ..
        }
        | BuilderLocation::SequenceItem {
          bytes_remaining: Some(bytes_remaining),
          ..
        } => {
          *bytes_remaining = bytes_remaining.saturating_sub(part_size);
        }

        _ => (),
      }
    }

    self.handle_part(part)?;

    // Close any determinate-length containers whose bytes have all been
    // received
    loop {
      if self.pending_element.is_some() {
        break;
      }

      match self.location.last() {
        Some(BuilderLocation::SequenceItem {
          bytes_remaining: Some(0),
          ..
        }) => self.close_item(),

        Some(BuilderLocation::Sequence {
          bytes_remaining: Some(0),
          ..
        }) => self.close_sequence(),

        _ => break,
      }
    }

    Ok(())
  }

  fn handle_part(&mut self, part: &DicomPart) -> Result<(), P10Error> {
    match part {
      DicomPart::StartMarker => Ok(()),

      DicomPart::EndMarker => {
        self.end();
        Ok(())
      }

      DicomPart::FilePreamble { bytes } => {
        self.file_preamble = Some(bytes.clone());
        Ok(())
      }

      DicomPart::DataElementHeader {
        tag,
        vr,
        big_endian,
        explicit_vr,
        ..
      } => {
        if self.pending_element.is_some() {
          return self.unexpected_part_error(part);
        }

        self.pending_element = Some(PendingElement::DataElement {
          tag: *tag,
          vr: *vr,
          big_endian: *big_endian,
          explicit_vr: *explicit_vr,
          data: vec![],
        });

        Ok(())
      }

      DicomPart::DataElementValueChunk { data, last, .. } => {
        match self.pending_element.as_mut() {
          Some(
            PendingElement::DataElement { data: chunks, .. }
            | PendingElement::FragmentsItem { data: chunks, .. },
          ) => {
            chunks.push(data.clone());

            if *last {
              self.finish_pending_element(part)?;
            }

            Ok(())
          }

          None => self.unexpected_part_error(part),
        }
      }

      DicomPart::SequenceStart {
        tag,
        length,
        big_endian,
        explicit_vr,
        ..
      } => {
        let declared_length = length.defined();

        self.location.push(BuilderLocation::Sequence {
          tag: *tag,
          declared_length,
          big_endian: *big_endian,
          explicit_vr: *explicit_vr,
          items: vec![],
          bytes_remaining: declared_length.map(u64::from),
        });

        Ok(())
      }

      DicomPart::SequenceItemStart { length, .. } => {
        match self.location.last() {
          Some(BuilderLocation::Sequence { .. }) => {
            let declared_length = length.defined();

            self.location.push(BuilderLocation::SequenceItem {
              declared_length,
              elements: Elements::new(),
              bytes_remaining: declared_length.map(u64::from),
            });

            Ok(())
          }

          _ => self.unexpected_part_error(part),
        }
      }

      DicomPart::SequenceItemDelimitation { .. } => {
        match self.location.last() {
          Some(BuilderLocation::SequenceItem { .. }) => {
            self.close_item();
            Ok(())
          }

          // The item was already closed by its determinate length
          Some(BuilderLocation::Sequence { .. }) => Ok(()),

          _ => self.unexpected_part_error(part),
        }
      }

      DicomPart::SequenceDelimitation { .. } => match self.location.last() {
        Some(BuilderLocation::Sequence { .. }) => {
          self.close_sequence();
          Ok(())
        }

        // The sequence was already closed by its determinate length
        Some(
          BuilderLocation::RootDataSet { .. }
          | BuilderLocation::SequenceItem { .. },
        ) => Ok(()),

        _ => self.unexpected_part_error(part),
      },

      DicomPart::FragmentsStart {
        tag,
        vr,
        big_endian,
        explicit_vr,
        ..
      } => {
        self.location.push(BuilderLocation::Fragments {
          tag: *tag,
          vr: *vr,
          big_endian: *big_endian,
          explicit_vr: *explicit_vr,
          offsets: None,
          fragments: vec![],
        });

        Ok(())
      }

      DicomPart::FragmentsItem {
        index, big_endian, ..
      } => match self.location.last() {
        Some(BuilderLocation::Fragments { .. }) => {
          self.pending_element = Some(PendingElement::FragmentsItem {
            index: *index,
            big_endian: *big_endian,
            data: vec![],
          });

          Ok(())
        }

        _ => self.unexpected_part_error(part),
      },

      DicomPart::FragmentsDelimitation { .. } => match self.location.last() {
        Some(BuilderLocation::Fragments { .. }) => {
          self.close_fragments();
          Ok(())
        }

        _ => self.unexpected_part_error(part),
      },

      DicomPart::DeflatedChunk { .. } | DicomPart::Unknown { .. } => {
        Err(P10Error::PartStreamInvalid {
          when: "Building data set".to_string(),
          details: "Raw chunk parts can't be materialized into a data set"
            .to_string(),
          part: part.clone(),
        })
      }
    }
  }

  /// Turns the pending element and its accumulated value chunks into a
  /// value element or pixel data fragment at the current location.
  ///
  fn finish_pending_element(
    &mut self,
    part: &DicomPart,
  ) -> Result<(), P10Error> {
    match self.pending_element.take() {
      Some(PendingElement::DataElement {
        tag,
        vr,
        big_endian,
        explicit_vr,
        data,
      }) => {
        let element = ValueElement::new_unchecked(
          tag,
          vr,
          concatenate_chunks(data),
          big_endian,
          explicit_vr,
        );

        self.insert_element(ElementSet::Value(element), part)
      }

      Some(PendingElement::FragmentsItem {
        index,
        big_endian,
        data,
      }) => {
        let bytes = concatenate_chunks(data);

        match self.location.last_mut() {
          Some(BuilderLocation::Fragments {
            offsets, fragments, ..
          }) => {
            // The first item holds the basic offset table; subsequent items
            // are the pixel data fragments
            if index == 1 {
              let mut offset_values =
                Vec::with_capacity(bytes.len() / 4);

              for chunk in bytes.chunks_exact(4) {
                let offset = if big_endian {
                  byteorder::BigEndian::read_u32(chunk)
                } else {
                  byteorder::LittleEndian::read_u32(chunk)
                };

                offset_values.push(offset);
              }

              *offsets = Some(offset_values);
            } else {
              fragments.push(Fragment { bytes });
            }

            Ok(())
          }

          _ => self.unexpected_part_error(part),
        }
      }

      None => self.unexpected_part_error(part),
    }
  }

  /// Inserts a completed element set into the data set at the head of the
  /// location.
  ///
  fn insert_element(
    &mut self,
    element: ElementSet,
    part: &DicomPart,
  ) -> Result<(), P10Error> {
    match self.location.last_mut() {
      Some(
        BuilderLocation::RootDataSet { elements }
        | BuilderLocation::SequenceItem { elements, .. },
      ) => {
        elements.insert_in_place(element);
        Ok(())
      }

      _ => self.unexpected_part_error(part),
    }
  }

  /// Closes the item at the head of the location, pushing it onto its
  /// enclosing sequence.
  ///
  fn close_item(&mut self) {
    if let Some(BuilderLocation::SequenceItem {
      declared_length,
      elements,
      ..
    }) = self.location.pop()
    {
      if let Some(BuilderLocation::Sequence { items, .. }) =
        self.location.last_mut()
      {
        items.push(Item {
          declared_length,
          elements,
        });
      }
    }
  }

  /// Closes the sequence at the head of the location, inserting it into the
  /// enclosing data set.
  ///
  fn close_sequence(&mut self) {
    if let Some(BuilderLocation::Sequence {
      tag,
      declared_length,
      big_endian,
      explicit_vr,
      items,
      ..
    }) = self.location.pop()
    {
      let sequence = Sequence {
        tag,
        declared_length,
        big_endian,
        explicit_vr,
        items,
      };

      let _ = self.insert_element(
        ElementSet::Sequence(sequence),
        &DicomPart::EndMarker,
      );
    }
  }

  /// Closes the encapsulated pixel data at the head of the location,
  /// inserting it into the enclosing data set.
  ///
  fn close_fragments(&mut self) {
    if let Some(BuilderLocation::Fragments {
      tag,
      vr,
      big_endian,
      explicit_vr,
      offsets,
      fragments,
    }) = self.location.pop()
    {
      let fragments = Fragments {
        tag,
        vr,
        big_endian,
        explicit_vr,
        offsets,
        fragments,
      };

      let _ = self.insert_element(
        ElementSet::Fragments(fragments),
        &DicomPart::EndMarker,
      );
    }
  }

  /// The error returned when an unexpected DICOM part is received.
  ///
  fn unexpected_part_error(&self, part: &DicomPart) -> Result<(), P10Error> {
    Err(P10Error::PartStreamInvalid {
      when: "Building data set".to_string(),
      details: format!(
        "Received unexpected part at location: {}",
        location_to_string(&self.location)
      ),
      part: part.clone(),
    })
  }
}

/// Concatenates the value chunks received for a single value into one byte
/// slice, avoiding a copy when there is only one chunk.
///
fn concatenate_chunks(mut chunks: Vec<RcByteSlice>) -> RcByteSlice {
  if chunks.len() == 1 {
    return chunks.pop().unwrap();
  }

  let total_length = chunks.iter().fold(0, |total, c| total + c.len());

  let mut bytes = Vec::with_capacity(total_length);
  for chunk in chunks {
    bytes.extend_from_slice(&chunk);
  }

  bytes.into()
}

/// Converts a builder location to a human-readable string for error
/// reporting and debugging purposes.
///
fn location_to_string(location: &[BuilderLocation]) -> String {
  location
    .iter()
    .map(|entry| match entry {
      BuilderLocation::RootDataSet { .. } => "RootDataSet".to_string(),
      BuilderLocation::Sequence { tag, .. } => format!("Sequence{tag}"),
      BuilderLocation::SequenceItem { .. } => "SequenceItem".to_string(),
      BuilderLocation::Fragments { tag, .. } => format!("Fragments{tag}"),
    })
    .collect::<Vec<String>>()
    .join(".")
}
