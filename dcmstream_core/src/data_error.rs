//! Provides the [`DataError`] type that describes the errors that can occur
//! when working with data elements and the `Elements` aggregate.

use crate::{DcmError, TagPath, ValueRepresentation};

/// An error that occurred when retrieving or creating data element values.
/// An error can be one of the following types:
///
/// 1. **Tag not present**. When retrieving a value, the requested tag path
///    was not present.
///
/// 2. **Value not present**. When retrieving a value, the requested type is
///    not present. E.g. tried to retrieve an integer value when the element
///    holds a string.
///
/// 3. **Multiplicity mismatch**. When retrieving a value, it did not have
///    the required multiplicity.
///
/// 4. **Value invalid**. When retrieving a value, there was an error
///    decoding its bytes. When creating a value, the supplied input was not
///    valid for the type of value being created.
///
/// 5. **Value length invalid**. When creating a value, the supplied data did
///    not meet a required length constraint for the value representation.
///
#[derive(Clone, Debug, PartialEq)]
pub enum DataError {
  TagNotPresent {
    path: TagPath,
  },
  ValueNotPresent {
    path: Option<TagPath>,
  },
  MultiplicityMismatch {
    path: Option<TagPath>,
  },
  ValueInvalid {
    details: String,
    path: Option<TagPath>,
  },
  ValueLengthInvalid {
    vr: ValueRepresentation,
    length: u64,
    details: String,
    path: Option<TagPath>,
  },
}

impl std::fmt::Display for DataError {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    fn optional_path_to_string(path: &Option<TagPath>) -> String {
      path
        .as_ref()
        .map(|path| path.to_string())
        .unwrap_or("<unknown>".to_string())
    }

    let error = match &self {
      Self::TagNotPresent { path } => {
        format!("Tag not present at {}", path)
      }
      Self::ValueNotPresent { path } => {
        format!("Value not present at {}", optional_path_to_string(path))
      }
      Self::MultiplicityMismatch { path } => {
        format!("Multiplicity mismatch at {}", optional_path_to_string(path))
      }
      Self::ValueInvalid { details, path } => {
        format!(
          "Invalid value at {}, details: {}",
          optional_path_to_string(path),
          details
        )
      }
      Self::ValueLengthInvalid { details, path, .. } => {
        format!(
          "Invalid value length at {}, details: {}",
          optional_path_to_string(path),
          details
        )
      }
    };

    write!(f, "DICOM Data Error: {error}")
  }
}

impl DataError {
  /// Constructs a new 'Tag not present' data error.
  ///
  pub fn new_tag_not_present() -> Self {
    Self::TagNotPresent {
      path: TagPath::new(),
    }
  }

  /// Constructs a new 'Value not present' data error.
  ///
  pub fn new_value_not_present() -> Self {
    Self::ValueNotPresent { path: None }
  }

  /// Constructs a new 'Multiplicity mismatch' data error.
  ///
  pub fn new_multiplicity_mismatch() -> Self {
    Self::MultiplicityMismatch { path: None }
  }

  /// Constructs a new 'Value invalid' data error.
  ///
  pub fn new_value_invalid(details: String) -> Self {
    Self::ValueInvalid {
      details,
      path: None,
    }
  }

  /// Constructs a new 'Value length invalid' data error.
  ///
  pub fn new_value_length_invalid(
    vr: ValueRepresentation,
    length: u64,
    details: String,
  ) -> Self {
    Self::ValueLengthInvalid {
      vr,
      length,
      details,
      path: None,
    }
  }

  /// Adds a tag path to a data error. This indicates the exact location
  /// that a data error occurred, and should be included wherever possible to
  /// make troubleshooting easier.
  ///
  pub fn with_path(self, path: &TagPath) -> Self {
    match self {
      Self::TagNotPresent { .. } => Self::TagNotPresent { path: path.clone() },
      Self::ValueNotPresent { .. } => Self::ValueNotPresent {
        path: Some(path.clone()),
      },
      Self::MultiplicityMismatch { .. } => Self::MultiplicityMismatch {
        path: Some(path.clone()),
      },
      Self::ValueInvalid { details, .. } => Self::ValueInvalid {
        details,
        path: Some(path.clone()),
      },
      Self::ValueLengthInvalid {
        vr,
        length,
        details,
        ..
      } => Self::ValueLengthInvalid {
        vr,
        length,
        details,
        path: Some(path.clone()),
      },
    }
  }

  /// Returns the name of a data error as a human-readable string.
  ///
  pub fn name(&self) -> &'static str {
    match &self {
      Self::TagNotPresent { .. } => "Tag not present",
      Self::ValueNotPresent { .. } => "Value not present",
      Self::MultiplicityMismatch { .. } => "Multiplicity mismatch",
      Self::ValueInvalid { .. } => "Invalid value",
      Self::ValueLengthInvalid { .. } => "Invalid value length",
    }
  }

  /// Returns the `details` field of the error, if one exists.
  ///
  pub fn details(&self) -> &str {
    match self {
      Self::TagNotPresent { .. } => "",
      Self::ValueNotPresent { .. } => "",
      Self::MultiplicityMismatch { .. } => "",
      Self::ValueInvalid { details, .. } => details,
      Self::ValueLengthInvalid { details, .. } => details,
    }
  }
}

impl DcmError for DataError {
  /// Returns lines of text that describe a DICOM data error in a
  /// human-readable format.
  ///
  fn to_lines(&self, task_description: &str) -> Vec<String> {
    let mut lines = vec![
      format!("DICOM data error {}", task_description),
      "".to_string(),
      format!("  Error: {}", self.name()),
    ];

    match &self {
      Self::TagNotPresent { path, .. }
      | Self::ValueNotPresent {
        path: Some(path), ..
      }
      | Self::MultiplicityMismatch {
        path: Some(path), ..
      }
      | Self::ValueInvalid {
        path: Some(path), ..
      }
      | Self::ValueLengthInvalid {
        path: Some(path), ..
      } => {
        lines.push(format!("  Path: {path}"));
      }
      _ => (),
    };

    match &self {
      Self::ValueInvalid { details, .. } => {
        lines.push(format!("  Details: {details}"))
      }
      Self::ValueLengthInvalid {
        vr,
        length,
        details,
        ..
      } => {
        lines.push(format!("  VR: {vr}"));
        lines.push(format!("  Length: {length} bytes"));
        lines.push(format!("  Details: {details}"));
      }
      _ => (),
    };

    lines
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn to_lines_test() {
    assert_eq!(
      DataError::new_value_not_present()
        .to_lines("testing")
        .join("\n"),
      "DICOM data error testing\n\n  Error: Value not present"
    );

    assert_eq!(
      DataError::new_value_length_invalid(
        ValueRepresentation::AgeString,
        5,
        "Test 123".to_string(),
      )
      .to_lines("testing")
      .join("\n"),
      "DICOM data error testing\n\n  Error: Invalid value length\n  VR: AS\n  \
       Length: 5 bytes\n  Details: Test 123"
    );
  }
}
