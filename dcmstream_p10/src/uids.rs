//! Defines dcmstream's root UID prefix and the implementation details that
//! are stored into the File Meta Information of DICOM P10 data it
//! serializes.

use std::sync::LazyLock;

/// dcmstream's unique root UID prefix.
///
pub const ROOT_UID_PREFIX: &str = "1.2.826.0.1.3680043.9.7634";

/// dcmstream's implementation class UID that is included in the File Meta
/// Information header of DICOM P10 data it serializes. This is the root UID
/// prefix followed by `.1.` and the numeric library version.
///
pub static IMPLEMENTATION_CLASS_UID: LazyLock<String> = LazyLock::new(|| {
  let numeric_version: String = env!("CARGO_PKG_VERSION")
    .chars()
    .filter(|c| c.is_ascii_digit())
    .collect();

  format!("{ROOT_UID_PREFIX}.1.{numeric_version}")
});

/// dcmstream's implementation version name that is included in the File
/// Meta Information header of DICOM P10 data it serializes.
///
pub static IMPLEMENTATION_VERSION_NAME: LazyLock<String> =
  LazyLock::new(|| format!("DCMSTREAM_{}", env!("CARGO_PKG_VERSION")));

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn implementation_uids_test() {
    assert!(
      IMPLEMENTATION_CLASS_UID.starts_with("1.2.826.0.1.3680043.9.7634.1.")
    );

    assert!(IMPLEMENTATION_VERSION_NAME.starts_with("DCMSTREAM_"));
  }
}
