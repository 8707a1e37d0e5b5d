//! dcmstream is a collection of libraries for reading, transforming, and
//! writing DICOM, the international standard for medical images and related
//! information, as a stream of structured parts under strict memory bounds.

/// Provides core DICOM concepts including data element tags, value
/// representations, transfer syntaxes, the tag path and tag tree calculus,
/// and the `Elements` in-memory data set.
///
/// This module is a re-export of the `dcmstream_core` crate.
///
pub mod core {
  pub use dcmstream_core::*;
}

/// Decodes DICOM string values that use a specific character set, including
/// ISO 2022 escape-based code element switching, into UTF-8.
///
/// This module is a re-export of the `dcmstream_character_set` crate.
///
pub mod character_set {
  pub use dcmstream_character_set::*;
}

/// Reads and writes the DICOM Part 10 (P10) binary format used to store and
/// transmit DICOM-based medical imaging information, as a stream of DICOM
/// parts.
///
/// This module is a re-export of the `dcmstream_p10` crate.
///
pub mod p10 {
  pub use dcmstream_p10::*;
}

/// Composable, stateful transformations over streams of DICOM parts:
/// filtering, group length handling, sequence length rewriting, UTF-8
/// transcoding, transfer syntax normalization, deflating, context
/// validation, value modification, and element collection.
///
/// This module is a re-export of the `dcmstream_flows` crate.
///
pub mod flows {
  pub use dcmstream_flows::*;
}

mod integration_tests;
