//! The values that can be stored against a tag in an [`crate::Elements`]
//! data set: plain data element values, sequences of items, and encapsulated
//! pixel data fragments.

pub mod attribute_tag;
pub mod date;
pub mod date_time;
pub mod decimal_string;
pub mod fragments;
pub mod integer_string;
pub mod person_name;
pub mod sequence;
pub mod time;
pub mod unique_identifier;
pub mod value_element;

use crate::{DataElementTag, ValueRepresentation};

use fragments::Fragments;
use sequence::Sequence;
use value_element::ValueElement;

/// One entry in an `Elements` data set.
///
#[derive(Clone, Debug, PartialEq)]
pub enum ElementSet {
  /// A data element value holding raw bytes for a specific VR.
  Value(ValueElement),

  /// A sequence of items, each of which is a nested data set.
  Sequence(Sequence),

  /// Encapsulated pixel data fragments with an optional offset table.
  Fragments(Fragments),
}

impl ElementSet {
  /// Returns the data element tag of this element set.
  ///
  pub fn tag(&self) -> DataElementTag {
    match self {
      ElementSet::Value(value) => value.tag,
      ElementSet::Sequence(sequence) => sequence.tag,
      ElementSet::Fragments(fragments) => fragments.tag,
    }
  }

  /// Returns the value representation of this element set.
  ///
  pub fn value_representation(&self) -> ValueRepresentation {
    match self {
      ElementSet::Value(value) => value.vr,
      ElementSet::Sequence(_) => ValueRepresentation::Sequence,
      ElementSet::Fragments(fragments) => fragments.vr,
    }
  }

  /// For element sets that hold a plain value, returns it.
  ///
  pub fn value(&self) -> Option<&ValueElement> {
    match self {
      ElementSet::Value(value) => Some(value),
      _ => None,
    }
  }

  /// For element sets that hold a sequence, returns it.
  ///
  pub fn sequence(&self) -> Option<&Sequence> {
    match self {
      ElementSet::Sequence(sequence) => Some(sequence),
      _ => None,
    }
  }

  /// For element sets that hold pixel data fragments, returns them.
  ///
  pub fn fragments(&self) -> Option<&Fragments> {
    match self {
      ElementSet::Fragments(fragments) => Some(fragments),
      _ => None,
    }
  }
}

impl From<ValueElement> for ElementSet {
  fn from(value: ValueElement) -> Self {
    ElementSet::Value(value)
  }
}

impl From<Sequence> for ElementSet {
  fn from(sequence: Sequence) -> Self {
    ElementSet::Sequence(sequence)
  }
}

impl From<Fragments> for ElementSet {
  fn from(fragments: Fragments) -> Self {
    ElementSet::Fragments(fragments)
  }
}
