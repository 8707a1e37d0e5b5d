//! Flow that deflates the main data set of a part stream.

use dcmstream_core::RcByteSlice;
use dcmstream_p10::{DicomPart, P10Error};

use crate::DicomFlow;

/// Data is compressed into output chunks of this size.
///
const ZLIB_DEFLATE_CHUNK_SIZE: usize = 64 * 1024;

/// Flow that compresses all dataset-scope parts with a raw deflater and
/// emits the result as deflated chunk parts, as used by the deflated
/// transfer syntaxes. The File Preamble and File Meta Information pass
/// through unchanged.
///
/// Any residual deflater output is flushed when the stream ends, including
/// for streams whose data set is empty.
///
pub struct DeflateDatasetFlow {
  deflater: flate2::Compress,
  is_inside_fmi_value: bool,
}

/// Creates a new [`DeflateDatasetFlow`] using the given zlib compression
/// level (0-9).
///
pub fn deflate_dataset_flow(compression_level: u32) -> DeflateDatasetFlow {
  DeflateDatasetFlow {
    deflater: flate2::Compress::new(
      flate2::Compression::new(compression_level.clamp(0, 9)),
      false,
    ),
    is_inside_fmi_value: false,
  }
}

impl DeflateDatasetFlow {
  /// Passes bytes into the deflater and returns the deflated chunk parts
  /// for whatever output it produces.
  ///
  fn deflate(
    &mut self,
    bytes: &[u8],
    finish: bool,
  ) -> Result<Vec<DicomPart>, P10Error> {
    let mut output = vec![];
    let mut bytes_remaining = bytes;

    loop {
      let mut buffer = vec![0u8; ZLIB_DEFLATE_CHUNK_SIZE];

      let initial_total_in = self.deflater.total_in();
      let initial_total_out = self.deflater.total_out();

      let flush = if finish {
        flate2::FlushCompress::Finish
      } else {
        flate2::FlushCompress::None
      };

      let status = self
        .deflater
        .compress(bytes_remaining, &mut buffer, flush)
        .map_err(|e| P10Error::OtherError {
          error_type: "Zlib deflate failure".to_string(),
          details: e.to_string(),
        })?;

      let bytes_consumed =
        (self.deflater.total_in() - initial_total_in) as usize;
      let bytes_produced =
        (self.deflater.total_out() - initial_total_out) as usize;

      bytes_remaining = &bytes_remaining[bytes_consumed..];

      if bytes_produced > 0 {
        buffer.resize(bytes_produced, 0);
        output.push(DicomPart::DeflatedChunk {
          big_endian: false,
          data: buffer.into(),
        });
      }

      let is_finished = if finish {
        status == flate2::Status::StreamEnd
      } else {
        bytes_remaining.is_empty()
      };

      if is_finished {
        return Ok(output);
      }
    }
  }
}

impl DicomFlow for DeflateDatasetFlow {
  type Out = DicomPart;

  fn on_part(&mut self, part: &DicomPart) -> Result<Vec<DicomPart>, P10Error> {
    match part {
      DicomPart::StartMarker => Ok(vec![part.clone()]),

      // The File Preamble and File Meta Information stay uncompressed
      DicomPart::FilePreamble { .. } => Ok(vec![part.clone()]),

      DicomPart::DataElementHeader { is_fmi: true, .. } => {
        self.is_inside_fmi_value = true;
        Ok(vec![part.clone()])
      }

      DicomPart::DataElementValueChunk { last, .. }
        if self.is_inside_fmi_value =>
      {
        self.is_inside_fmi_value = !last;
        Ok(vec![part.clone()])
      }

      DicomPart::EndMarker => {
        let mut output = self.deflate(&[], true)?;
        output.push(part.clone());

        Ok(output)
      }

      _ => {
        let bytes: RcByteSlice = part.bytes();

        self.deflate(&bytes, false)
      }
    }
  }
}
