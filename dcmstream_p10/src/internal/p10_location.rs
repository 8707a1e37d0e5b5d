//! A location used by a DICOM P10 read context to track where in the
//! hierarchy of sequences, items, and pixel data fragments the read is up
//! to.
//!
//! The following are tracked in the location during a DICOM P10 read:
//!
//! 1. The end offset of defined-length sequences and items. The read
//!    context pops these entries silently once their bytes are consumed;
//!    no delimitation parts are synthesized at the parse level.
//!
//! 2. The 1-based index of the next item in the current sequence or
//!    fragments.
//!
//! 3. Whether an enclosing sequence has forced the use of the 'Implicit VR
//!    Little Endian' transfer syntax, which occurs for an explicit VR of
//!    `UN` (Unknown) with undefined length. Ref: DICOM CP-246.

use dcmstream_core::DataElementTag;

/// A P10 location is a list of location entries, with the current/most
/// recently added one at the end of the vector.
///
#[derive(Debug)]
pub struct P10Location {
  entries: Vec<LocationEntry>,
}

#[derive(Debug)]
enum LocationEntry {
  RootDataSet {
    last_data_element_tag: DataElementTag,
  },
  Sequence {
    tag: DataElementTag,
    forces_implicit_vr: bool,
    ends_at: Option<u64>,
    item_count: usize,
  },
  Item {
    index: usize,
    ends_at: Option<u64>,
    last_data_element_tag: DataElementTag,
  },
  Fragments {
    item_count: usize,
  },
}

impl P10Location {
  /// Creates a new P10 location with an initial entry for the root data
  /// set.
  ///
  pub fn new() -> Self {
    Self {
      entries: vec![LocationEntry::RootDataSet {
        last_data_element_tag: DataElementTag::ZERO,
      }],
    }
  }

  /// Returns whether the location is currently at the root data set.
  ///
  pub fn is_at_root(&self) -> bool {
    self.entries.len() == 1
  }

  /// Returns the number of sequences currently open.
  ///
  pub fn sequence_depth(&self) -> usize {
    self
      .entries
      .iter()
      .filter(|entry| matches!(entry, LocationEntry::Sequence { .. }))
      .count()
  }

  /// Returns whether there is a sequence in the location that has forced
  /// the use of the 'Implicit VR Little Endian' transfer syntax.
  ///
  pub fn is_implicit_vr_forced(&self) -> bool {
    self.entries.iter().any(|entry| {
      matches!(
        entry,
        LocationEntry::Sequence {
          forces_implicit_vr: true,
          ..
        }
      )
    })
  }

  /// Pops all defined-length sequences and items whose end offset has been
  /// reached by the given read position. Returns the number of item entries
  /// that were popped.
  ///
  pub fn pop_ended(&mut self, bytes_read: u64) -> usize {
    let mut items_popped = 0;

    loop {
      match self.entries.last() {
        Some(LocationEntry::Sequence {
          ends_at: Some(ends_at),
          ..
        }) if *ends_at <= bytes_read => {
          self.entries.pop();
        }

        Some(LocationEntry::Item {
          ends_at: Some(ends_at),
          ..
        }) if *ends_at <= bytes_read => {
          self.entries.pop();
          items_popped += 1;
        }

        _ => return items_popped,
      }
    }
  }

  /// Checks that the specified data element tag is greater than the
  /// previous one at the current P10 location. In DICOM P10 data, data
  /// elements in a data set and sequence item must appear in ascending
  /// order.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn check_data_element_ordering(
    &mut self,
    tag: DataElementTag,
  ) -> Result<(), ()> {
    match self.entries.last_mut() {
      Some(LocationEntry::RootDataSet {
        last_data_element_tag,
      })
      | Some(LocationEntry::Item {
        last_data_element_tag,
        ..
      }) => {
        if tag > *last_data_element_tag {
          *last_data_element_tag = tag;
          Ok(())
        } else {
          Err(())
        }
      }

      _ => Ok(()),
    }
  }

  /// Adds a new sequence to a P10 location.
  ///
  pub fn add_sequence(
    &mut self,
    tag: DataElementTag,
    forces_implicit_vr: bool,
    ends_at: Option<u64>,
  ) -> Result<(), String> {
    match self.entries.last() {
      Some(LocationEntry::RootDataSet { .. })
      | Some(LocationEntry::Item { .. }) => {
        self.entries.push(LocationEntry::Sequence {
          tag,
          forces_implicit_vr,
          ends_at,
          item_count: 0,
        });

        Ok(())
      }

      _ => Err(format!(
        "Sequence data element '{}' encountered outside of the root data \
         set or an item",
        tag
      )),
    }
  }

  /// Returns the tag of the sequence at the head of the location, i.e. the
  /// sequence that new items belong to.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn current_sequence_tag(&self) -> Result<DataElementTag, ()> {
    match self.entries.last() {
      Some(LocationEntry::Sequence { tag, .. }) => Ok(*tag),
      _ => Err(()),
    }
  }

  /// Ends the current sequence for a P10 location and returns its tag.
  ///
  pub fn end_sequence(&mut self) -> Result<DataElementTag, String> {
    match self.entries.last() {
      Some(LocationEntry::Sequence { tag, .. }) => {
        let tag = *tag;
        self.entries.pop();
        Ok(tag)
      }

      _ => {
        Err("Sequence delimiter encountered outside of a sequence".to_string())
      }
    }
  }

  /// Adds a new item to a P10 location. The 1-based index of the new item
  /// is returned.
  ///
  pub fn add_item(&mut self, ends_at: Option<u64>) -> Result<usize, String> {
    match self.entries.last_mut() {
      Some(LocationEntry::Sequence { item_count, .. }) => {
        *item_count += 1;
        let index = *item_count;

        self.entries.push(LocationEntry::Item {
          index,
          ends_at,
          last_data_element_tag: DataElementTag::ZERO,
        });

        Ok(index)
      }

      _ => Err("Item encountered outside of a sequence".to_string()),
    }
  }

  /// Ends the current item for a P10 location and returns its 1-based
  /// index.
  ///
  pub fn end_item(&mut self) -> Result<usize, String> {
    match self.entries.last() {
      Some(LocationEntry::Item { index, .. }) => {
        let index = *index;
        self.entries.pop();
        Ok(index)
      }

      _ => Err("Item delimiter encountered outside of an item".to_string()),
    }
  }

  /// Adds an encapsulated pixel data sequence to a P10 location.
  ///
  pub fn add_fragments(&mut self) -> Result<(), String> {
    match self.entries.last() {
      Some(LocationEntry::RootDataSet { .. })
      | Some(LocationEntry::Item { .. }) => {
        self.entries.push(LocationEntry::Fragments { item_count: 0 });

        Ok(())
      }

      _ => Err(
        "Encapsulated pixel data encountered outside of the root data set \
         or an item"
          .to_string(),
      ),
    }
  }

  /// Records the next item of the current encapsulated pixel data sequence
  /// and returns its 1-based index.
  ///
  pub fn add_fragments_item(&mut self) -> Result<usize, String> {
    match self.entries.last_mut() {
      Some(LocationEntry::Fragments { item_count }) => {
        *item_count += 1;
        Ok(*item_count)
      }

      _ => Err(
        "Fragments item encountered outside of encapsulated pixel data"
          .to_string(),
      ),
    }
  }

  /// Ends the current encapsulated pixel data sequence.
  ///
  pub fn end_fragments(&mut self) -> Result<(), String> {
    match self.entries.last() {
      Some(LocationEntry::Fragments { .. }) => {
        self.entries.pop();
        Ok(())
      }

      _ => Err(
        "Fragments delimiter encountered outside of encapsulated pixel data"
          .to_string(),
      ),
    }
  }
}
