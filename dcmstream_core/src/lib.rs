//! Core DICOM concepts for the dcmstream streaming toolkit: data element
//! tags, value representations, transfer syntaxes, the tag path and tag tree
//! calculus used to address locations inside data sets, and the `Elements`
//! aggregate that holds a fully decoded data set in memory.

pub mod data_element_tag;
pub mod data_error;
pub mod dictionary;
pub mod element_set;
pub mod elements;
pub mod error;
pub mod tag_path;
pub mod tag_tree;
pub mod transfer_syntax;
pub mod utils;
pub mod value_multiplicity;
pub mod value_representation;

pub use data_element_tag::DataElementTag;
pub use data_error::DataError;
pub use element_set::fragments::{Fragment, Fragments};
pub use element_set::person_name::StructuredPersonName;
pub use element_set::sequence::{Item, Sequence};
pub use element_set::value_element::ValueElement;
pub use element_set::ElementSet;
pub use element_set::{
  date::StructuredDate, date_time::StructuredDateTime, time::StructuredTime,
};
pub use elements::Elements;
pub use error::DcmError;
pub use tag_path::{TagPath, TagPathNode};
pub use tag_tree::{TagTree, TagTreeNode};
pub use transfer_syntax::TransferSyntax;
pub use utils::RcByteSlice;
pub use value_multiplicity::ValueMultiplicity;
pub use value_representation::ValueRepresentation;
