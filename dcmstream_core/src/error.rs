//! Defines a trait implemented by all error types in dcmstream.

/// Error trait implemented by all error types in dcmstream.
///
pub trait DcmError {
  /// Returns lines of text that describe an error in a human-readable
  /// format.
  ///
  fn to_lines(&self, task_description: &str) -> Vec<String>;

  /// Prints details on the error to stderr. This will include all details
  /// and contextual information stored in the error.
  ///
  fn print(&self, task_description: &str) {
    eprintln!();

    for line in self.to_lines(task_description) {
      eprintln!("{line}");
    }

    eprintln!();
  }
}
