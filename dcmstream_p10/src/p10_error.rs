//! Defines the type used to describe errors that can occur when reading and
//! writing DICOM P10 data.

use dcmstream_core::{DcmError, TagPath};

use crate::DicomPart;

/// An error that occurred when reading, transforming, or writing a DICOM
/// part stream.
///
#[derive(Clone, Debug, PartialEq)]
pub enum P10Error {
  /// This error occurs when a read context is supplied data that specifies
  /// a DICOM transfer syntax that isn't supported, and strict validation is
  /// enabled.
  TransferSyntaxNotSupported { transfer_syntax_uid: String },

  /// This error occurs when a read context requires more data to be added
  /// to it before the next part can be read.
  DataRequired { when: String },

  /// This error occurs when a read context reaches the end of its data
  /// while reading the next part, and no more data is able to be added.
  /// This means the provided data is malformed or truncated.
  DataEndedUnexpectedly {
    when: String,
    path: TagPath,
    offset: u64,
  },

  /// This error occurs when the next part can't be read because the
  /// supplied data is invalid, e.g. a header that violates the wire format
  /// or declares an illegal indeterminate length.
  DataInvalid {
    when: String,
    details: String,
    path: TagPath,
    offset: u64,
  },

  /// This error occurs when one of the configured maximums is exceeded,
  /// e.g. the buffered byte bound of a collecting flow. These maximums are
  /// used to control memory usage.
  MaximumExceeded {
    details: String,
    path: TagPath,
    offset: u64,
  },

  /// This error occurs when a stream of [`DicomPart`]s is being ingested
  /// and a part is received that is invalid at the current location in the
  /// part stream, e.g. a value chunk that does not follow a data element
  /// header.
  PartStreamInvalid {
    when: String,
    details: String,
    part: DicomPart,
  },

  /// This error occurs when a context validation flow rejects the stream's
  /// combination of SOP class and transfer syntax.
  ContextValidationFailed { details: String },

  /// This error occurs when bytes are written to a read context after its
  /// final bytes have already been written.
  WriteAfterCompletion,

  /// This error occurs when there is an error with an underlying file or
  /// byte stream.
  FileError { when: String, details: String },

  /// A fallback/general-purpose error for cases not covered by the other
  /// error variants.
  OtherError { error_type: String, details: String },
}

impl std::fmt::Display for P10Error {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "DICOM P10 error: {}", self.name())
  }
}

impl P10Error {
  /// Returns the name of the error as a human-readable string.
  ///
  pub fn name(&self) -> &str {
    match self {
      Self::TransferSyntaxNotSupported { .. } => {
        "Transfer syntax not supported"
      }
      Self::DataRequired { .. } => "Data required",
      Self::DataEndedUnexpectedly { .. } => "Unexpected end of data",
      Self::DataInvalid { .. } => "Invalid data",
      Self::MaximumExceeded { .. } => "Maximum exceeded",
      Self::PartStreamInvalid { .. } => "Part stream invalid",
      Self::ContextValidationFailed { .. } => "Context validation failed",
      Self::WriteAfterCompletion => "Write after completion",
      Self::FileError { .. } => "File I/O failure",
      Self::OtherError { error_type, .. } => error_type,
    }
  }

  /// Returns the `details` field of the error, if one exists.
  ///
  pub fn details(&self) -> &str {
    match self {
      Self::TransferSyntaxNotSupported { .. } => "",
      Self::DataRequired { .. } => "",
      Self::DataEndedUnexpectedly { .. } => "",
      Self::DataInvalid { details, .. } => details,
      Self::MaximumExceeded { details, .. } => details,
      Self::PartStreamInvalid { details, .. } => details,
      Self::ContextValidationFailed { details } => details,
      Self::WriteAfterCompletion => "",
      Self::FileError { details, .. } => details,
      Self::OtherError { details, .. } => details,
    }
  }
}

impl DcmError for P10Error {
  /// Returns lines of text that describe a DICOM P10 error in a
  /// human-readable format.
  ///
  fn to_lines(&self, task_description: &str) -> Vec<String> {
    let mut lines = vec![];

    lines.push(format!("DICOM P10 error {task_description}"));
    lines.push("".to_string());

    lines.push(format!("  Error: {}", self.name()));

    match self {
      P10Error::DataRequired { when }
      | P10Error::DataEndedUnexpectedly { when, .. }
      | P10Error::DataInvalid { when, .. }
      | P10Error::PartStreamInvalid { when, .. }
      | P10Error::FileError { when, .. } => {
        lines.push(format!("  When: {when}"));
      }

      _ => (),
    };

    match self {
      P10Error::TransferSyntaxNotSupported {
        transfer_syntax_uid,
      } => {
        lines.push(format!("  Transfer syntax UID: {transfer_syntax_uid}"));
      }

      P10Error::PartStreamInvalid { details, part, .. } => {
        lines.push(format!("  Details: {details}"));
        lines.push(format!("  Part: {part}"));
      }

      P10Error::DataInvalid { details, .. }
      | P10Error::MaximumExceeded { details, .. }
      | P10Error::ContextValidationFailed { details }
      | P10Error::FileError { details, .. }
      | P10Error::OtherError { details, .. } => {
        lines.push(format!("  Details: {details}"));
      }

      _ => (),
    };

    match self {
      P10Error::DataEndedUnexpectedly { offset, path, .. }
      | P10Error::DataInvalid { path, offset, .. }
      | P10Error::MaximumExceeded { offset, path, .. } => {
        lines.push(format!("  Path: {path}"));
        lines.push(format!("  Offset: 0x{offset:X}"));
      }

      _ => (),
    };

    lines
  }
}
