//! Sequence data elements and their items.

use crate::{DataElementTag, Elements};

/// A single item in a sequence. An item owns its own nested [`Elements`].
///
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
  /// The declared byte length of the item, or `None` when the item was
  /// encoded with indeterminate length.
  pub declared_length: Option<u32>,

  pub elements: Elements,
}

impl Item {
  /// Creates a new indeterminate-length item holding the given elements.
  ///
  pub fn new(elements: Elements) -> Self {
    Self {
      declared_length: None,
      elements,
    }
  }
}

/// A sequence data element, holding an ordered list of items, each of which
/// is itself a nested data set.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Sequence {
  pub tag: DataElementTag,

  /// The declared byte length of the sequence, or `None` when the sequence
  /// was encoded with indeterminate length.
  pub declared_length: Option<u32>,

  pub big_endian: bool,
  pub explicit_vr: bool,
  pub items: Vec<Item>,
}

impl Sequence {
  /// Creates a new indeterminate-length, little endian, explicit VR
  /// sequence with the given items.
  ///
  pub fn new(tag: DataElementTag, items: Vec<Item>) -> Self {
    Self {
      tag,
      declared_length: None,
      big_endian: false,
      explicit_vr: true,
      items,
    }
  }

  /// Returns the number of items in this sequence.
  ///
  pub fn item_count(&self) -> usize {
    self.items.len()
  }

  /// Returns the item at the given 1-based index.
  ///
  pub fn item(&self, index: usize) -> Option<&Item> {
    if index == 0 {
      return None;
    }

    self.items.get(index - 1)
  }
}
