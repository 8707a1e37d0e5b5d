//! Reads and writes the DICOM Part 10 (P10) binary format used to store and
//! transmit DICOM-based medical imaging information, as a stream of DICOM
//! parts.

pub mod elements_builder;
pub mod p10_error;
pub mod p10_read;
pub mod p10_read_config;
pub mod p10_write;
pub mod p10_write_config;
pub mod part;
pub mod uids;

pub mod internal;

use dcmstream_core::{Elements, RcByteSlice};

pub use elements_builder::ElementsBuilder;
pub use internal::data_element_header::DataElementHeader;
pub use internal::value_length::ValueLength;
pub use p10_error::P10Error;
pub use p10_read::P10ReadContext;
pub use p10_read_config::P10ReadConfig;
pub use p10_write::P10WriteContext;
pub use p10_write_config::P10WriteConfig;
pub use part::DicomPart;

/// Returns whether the given bytes contain DICOM P10 data by checking for
/// the presence of the 'DICM' prefix at offset 128.
///
pub fn is_valid_bytes(bytes: &[u8]) -> bool {
  bytes.len() >= 132 && bytes[128..132] == *b"DICM".as_slice()
}

/// Reads DICOM P10 data from a vector of bytes into an in-memory data set.
///
pub fn read_bytes(bytes: RcByteSlice) -> Result<Elements, P10Error> {
  read_bytes_with_config(bytes, P10ReadConfig::default().inflate_deflated(true))
}

/// Reads DICOM P10 data from a vector of bytes into an in-memory data set
/// using the given read config.
///
pub fn read_bytes_with_config(
  bytes: RcByteSlice,
  config: P10ReadConfig,
) -> Result<Elements, P10Error> {
  let mut context = P10ReadContext::new(Some(config));
  let mut builder = ElementsBuilder::new();

  context.write_bytes(bytes, true)?;

  while !context.is_complete() {
    for part in context.read_parts()? {
      builder.add_part(&part)?;
    }
  }

  builder.end();

  builder
    .final_elements()
    .map_err(|_| P10Error::OtherError {
      error_type: "Data set incomplete".to_string(),
      details: "The part stream ended with an incomplete data set"
        .to_string(),
    })
}

/// Reads DICOM P10 data from a read stream into an in-memory data set. This
/// will attempt to consume all data available in the read stream, reading
/// it in 256 KiB chunks.
///
pub fn read_stream(
  stream: &mut dyn std::io::Read,
) -> Result<Elements, P10Error> {
  let mut context =
    P10ReadContext::new(Some(P10ReadConfig::default().inflate_deflated(true)));
  let mut builder = ElementsBuilder::new();

  while !context.is_complete() {
    for part in read_parts_from_stream(stream, &mut context)? {
      builder.add_part(&part)?;
    }
  }

  builder.end();

  builder
    .final_elements()
    .map_err(|_| P10Error::OtherError {
      error_type: "Data set incomplete".to_string(),
      details: "The part stream ended with an incomplete data set"
        .to_string(),
    })
}

/// Reads the next DICOM parts from a read stream. This repeatedly reads
/// bytes from the read stream in 256 KiB chunks until at least one DICOM
/// part is made available by the read context, the stream completes, or an
/// error occurs.
///
pub fn read_parts_from_stream(
  stream: &mut dyn std::io::Read,
  context: &mut P10ReadContext,
) -> Result<Vec<DicomPart>, P10Error> {
  loop {
    match context.read_parts() {
      Ok(parts) => {
        if parts.is_empty() && !context.is_complete() {
          continue;
        }

        return Ok(parts);
      }

      // If the read context needs more data then read bytes from the
      // stream, write them to the read context, and try again
      Err(P10Error::DataRequired { .. }) => {
        let mut buffer = vec![0u8; 256 * 1024];
        match stream.read(&mut buffer) {
          Ok(0) => context.write_bytes(RcByteSlice::empty(), true)?,

          Ok(bytes_count) => {
            buffer.resize(bytes_count, 0);
            context.write_bytes(buffer.into(), false)?;
          }

          Err(e) => {
            return Err(P10Error::FileError {
              when: "Reading from stream".to_string(),
              details: e.to_string(),
            });
          }
        }
      }

      e => return e,
    }
  }
}

/// Writes a data set as DICOM P10 bytes directly to a write stream.
///
pub fn write_stream(
  stream: &mut dyn std::io::Write,
  elements: &Elements,
  config: Option<P10WriteConfig>,
) -> Result<(), P10Error> {
  let bytes =
    p10_write::elements_to_bytes(elements, &config.unwrap_or_default())?;

  stream.write_all(&bytes).map_err(|e| P10Error::FileError {
    when: "Writing DICOM P10 data to stream".to_string(),
    details: e.to_string(),
  })?;

  stream.flush().map_err(|e| P10Error::FileError {
    when: "Writing DICOM P10 data to stream".to_string(),
    details: e.to_string(),
  })
}

/// Adds functions to [`Elements`] for converting to and from the DICOM P10
/// format.
///
pub trait ElementsP10Extensions
where
  Self: Sized,
{
  /// Reads DICOM P10 data from a vector of bytes into an in-memory data
  /// set.
  ///
  fn read_p10_bytes(bytes: RcByteSlice) -> Result<Self, P10Error>;

  /// Reads DICOM P10 data from a read stream into an in-memory data set.
  /// This will attempt to consume all data available in the read stream.
  ///
  fn read_p10_stream(stream: &mut dyn std::io::Read)
    -> Result<Self, P10Error>;

  /// Writes a data set as DICOM P10 bytes directly to a write stream.
  ///
  fn write_p10_stream(
    &self,
    stream: &mut dyn std::io::Write,
    config: Option<P10WriteConfig>,
  ) -> Result<(), P10Error>;

  /// Converts a data set to DICOM parts that are returned via the passed
  /// callback.
  ///
  fn to_p10_parts(
    &self,
    part_callback: &mut impl FnMut(&DicomPart) -> Result<(), P10Error>,
  ) -> Result<(), P10Error>;

  /// Converts a data set to complete DICOM P10 bytes, including the File
  /// Preamble and regenerated File Meta Information, using the canonical
  /// indeterminate-length encoding for all sequences and items.
  ///
  fn to_p10_bytes(
    &self,
    config: Option<P10WriteConfig>,
  ) -> Result<Vec<u8>, P10Error>;
}

impl ElementsP10Extensions for Elements {
  fn read_p10_bytes(bytes: RcByteSlice) -> Result<Self, P10Error> {
    read_bytes(bytes)
  }

  fn read_p10_stream(
    stream: &mut dyn std::io::Read,
  ) -> Result<Self, P10Error> {
    read_stream(stream)
  }

  fn write_p10_stream(
    &self,
    stream: &mut dyn std::io::Write,
    config: Option<P10WriteConfig>,
  ) -> Result<(), P10Error> {
    write_stream(stream, self, config)
  }

  fn to_p10_parts(
    &self,
    part_callback: &mut impl FnMut(&DicomPart) -> Result<(), P10Error>,
  ) -> Result<(), P10Error> {
    p10_write::elements_to_p10_parts(
      self,
      &P10WriteConfig::default(),
      part_callback,
    )
  }

  fn to_p10_bytes(
    &self,
    config: Option<P10WriteConfig>,
  ) -> Result<Vec<u8>, P10Error> {
    p10_write::elements_to_bytes(self, &config.unwrap_or_default())
  }
}
