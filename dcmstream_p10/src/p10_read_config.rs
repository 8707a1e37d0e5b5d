/// Configuration used when reading DICOM P10 data.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct P10ReadConfig {
  pub(crate) max_part_size: u32,
  pub(crate) max_sequence_depth: usize,
  pub(crate) require_preamble: bool,
  pub(crate) require_ordered_data_elements: bool,
  pub(crate) inflate_deflated: bool,
  pub(crate) strict: bool,
}

impl Default for P10ReadConfig {
  fn default() -> Self {
    Self {
      max_part_size: 8192,
      max_sequence_depth: 10_000,
      require_preamble: false,
      require_ordered_data_elements: false,
      inflate_deflated: false,
      strict: false,
    }
  }
}

impl P10ReadConfig {
  /// The maximum size in bytes of the `data` carried by a single value
  /// chunk part. Data element values with a length exceeding this size will
  /// be split across multiple chunks, with `last` set on the final one.
  /// This is the primary control on memory usage during a streaming read.
  ///
  /// Default: 8192 bytes.
  ///
  pub fn max_part_size(mut self, value: u32) -> Self {
    // Chunk sizes are kept a multiple of 8 so that byte swapping of binary
    // values never straddles a chunk boundary
    self.max_part_size = std::cmp::max(value / 8 * 8, 8);
    self
  }

  /// The maximum sequence depth that can be read by a read context. This
  /// can be used to control memory usage during a streaming read, as well
  /// as to reject malformed or malicious DICOM P10 data.
  ///
  /// By default the maximum sequence depth is set to ten thousand, i.e. no
  /// meaningful maximum is enforced.
  ///
  pub fn max_sequence_depth(mut self, value: usize) -> Self {
    self.max_sequence_depth = value;
    self
  }

  /// Whether to require input data to have 'DICM' at bytes 128-132. This is
  /// required for well-formed DICOM P10 data, but it may be absent in some
  /// cases. If this is set to `false` then such data will be readable and
  /// its transfer syntax detected from its first data element.
  ///
  /// By default the preamble is not required.
  ///
  pub fn require_preamble(mut self, value: bool) -> Self {
    self.require_preamble = value;
    self
  }

  /// Whether to error if data elements are not in ascending order at a
  /// data set level. Such data is malformed but is still able to be read,
  /// however doing so can lead to incorrect results, e.g. when the
  /// *'(0008,0005) Specific Character Set'* data element appears after
  /// data elements that use an encoded string VR.
  ///
  /// By default this requirement is not enforced.
  ///
  pub fn require_ordered_data_elements(mut self, value: bool) -> Self {
    self.require_ordered_data_elements = value;
    self
  }

  /// Whether to transparently inflate streams that use a deflated transfer
  /// syntax and continue to parse the contained data elements. When not
  /// enabled, all bytes following the File Meta Information of a deflated
  /// stream are emitted as raw deflated chunk parts without being
  /// inflated.
  ///
  /// By default deflated streams are emitted as deflated chunk parts.
  ///
  pub fn inflate_deflated(mut self, value: bool) -> Self {
    self.inflate_deflated = value;
    self
  }

  /// Whether to enable strict validation. When enabled:
  ///
  /// 1. An unrecognized transfer syntax UID in the File Meta Information is
  ///    an error rather than falling back to the current transfer syntax.
  ///
  /// 2. The *'(0002,0000) File Meta Information Group Length'* value must
  ///    exactly match the byte length of the File Meta Information that
  ///    follows it.
  ///
  /// 3. Bytes trailing a well-formed dataset are an error rather than being
  ///    silently ignored.
  ///
  /// By default strict validation is not enabled.
  ///
  pub fn strict(mut self, value: bool) -> Self {
    self.strict = value;
    self
  }
}
