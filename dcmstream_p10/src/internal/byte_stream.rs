//! The incremental byte reservoir that the DICOM P10 parser reads from.
//!
//! Incoming chunks of raw bytes are appended as whole segments and are not
//! copied on arrival. Reads consume a prefix of the logical stream; a read
//! that can't be served yet reports whether more input can still arrive,
//! which is what drives backpressure in the surrounding pipeline.

use std::collections::VecDeque;

use dcmstream_core::RcByteSlice;

/// Inflated output is produced in chunks of at most this size, bounding the
/// memory a hostile deflated stream can make the reservoir allocate in one
/// step.
///
const INFLATE_OUTPUT_CHUNK_SIZE: usize = 64 * 1024;

/// An incremental reservoir of bytes. Written chunks are kept as a queue of
/// reference counted segments, and the read side tracks its position with an
/// offset into the head segment, so consuming bytes never rewrites segment
/// contents. A read that falls inside the head segment is served as a slice
/// of it without copying.
///
/// When a deflated DICOM transfer syntax is encountered the reservoir
/// switches into inflating mode, after which written bytes are queued as
/// deflated input and inflated on demand to serve reads.
///
#[derive(Debug)]
pub struct ByteStream {
  segments: VecDeque<RcByteSlice>,
  head_offset: usize,
  unread_bytes: u64,
  read_offset: u64,
  writing_done: bool,

  inflater: Option<flate2::Decompress>,
  deflated: VecDeque<RcByteSlice>,
  deflated_offset: usize,
  inflate_finished: bool,
}

#[derive(Debug)]
pub enum ByteStreamError {
  /// The requested bytes aren't available yet and more input can still be
  /// written. The caller should supply further chunks and retry.
  DataRequired,

  /// The requested bytes aren't available and the final input chunk has
  /// already been written, so they never will be.
  DataEnd,

  /// The deflated input couldn't be inflated.
  ZlibDataError,

  /// A write was attempted after the final input chunk.
  WriteAfterCompletion,
}

impl ByteStream {
  /// Creates an empty reservoir.
  ///
  pub fn new() -> ByteStream {
    ByteStream {
      segments: VecDeque::new(),
      head_offset: 0,
      unread_bytes: 0,
      read_offset: 0,
      writing_done: false,
      inflater: None,
      deflated: VecDeque::new(),
      deflated_offset: 0,
      inflate_finished: false,
    }
  }

  /// Returns the total number of bytes consumed so far, i.e. the stream
  /// offset that the next read starts at.
  ///
  pub fn bytes_read(&self) -> u64 {
    self.read_offset
  }

  /// Returns the number of bytes currently available to read.
  ///
  pub fn bytes_available(&self) -> u64 {
    self.unread_bytes
  }

  /// Returns whether the final input chunk has been written.
  ///
  pub fn is_writing_finished(&self) -> bool {
    self.writing_done
  }

  /// Returns whether every byte of the stream has been consumed: all input
  /// has been written, nothing is left unread, and in inflating mode no
  /// deflated input remains to be inflated.
  ///
  pub fn is_fully_consumed(&self) -> bool {
    if self.unread_bytes > 0 || !self.writing_done {
      return false;
    }

    match self.inflater {
      None => true,
      Some(_) => self.inflate_finished || self.deflated.is_empty(),
    }
  }

  /// Appends a chunk of input to the reservoir. Passing `done` marks it as
  /// the final chunk, after which any further write is an error.
  ///
  pub fn write(
    &mut self,
    data: RcByteSlice,
    done: bool,
  ) -> Result<(), ByteStreamError> {
    if self.writing_done {
      return Err(ByteStreamError::WriteAfterCompletion);
    }

    self.writing_done = done;

    if data.is_empty() {
      return Ok(());
    }

    if self.inflater.is_some() {
      self.deflated.push_back(data);
    } else {
      self.unread_bytes += data.len() as u64;
      self.segments.push_back(data);
    }

    Ok(())
  }

  /// Consumes and returns the next `byte_count` bytes of the stream.
  ///
  pub fn read(
    &mut self,
    byte_count: usize,
  ) -> Result<RcByteSlice, ByteStreamError> {
    if byte_count == 0 {
      return Ok(RcByteSlice::empty());
    }

    self.refill_inflated(byte_count)?;

    if byte_count as u64 > self.unread_bytes {
      return Err(self.starved_error());
    }

    self.unread_bytes -= byte_count as u64;
    self.read_offset += byte_count as u64;

    // A read that the head segment can serve alone is a slice of it
    let head = self.segments.front().unwrap();

    if byte_count <= head.len() - self.head_offset {
      let result = head.slice(self.head_offset, self.head_offset + byte_count);
      self.advance_read_position(byte_count);

      return Ok(result);
    }

    // Otherwise the read spans segments and is gathered into a new buffer
    let mut gathered = Vec::with_capacity(byte_count);

    while gathered.len() < byte_count {
      let head = self.segments.front().unwrap();

      let start = self.head_offset;
      let end = head.len().min(start + byte_count - gathered.len());

      gathered.extend_from_slice(&head[start..end]);
      self.advance_read_position(end - start);
    }

    Ok(gathered.into())
  }

  /// Returns the next `byte_count` bytes of the stream without consuming
  /// them.
  ///
  pub fn peek(
    &mut self,
    byte_count: usize,
  ) -> Result<Vec<u8>, ByteStreamError> {
    self.refill_inflated(byte_count)?;

    if byte_count as u64 > self.unread_bytes {
      return Err(self.starved_error());
    }

    let mut bytes = Vec::with_capacity(byte_count);
    let mut offset = self.head_offset;

    for segment in self.segments.iter() {
      let end = segment.len().min(offset + byte_count - bytes.len());
      bytes.extend_from_slice(&segment[offset..end]);
      offset = 0;

      if bytes.len() == byte_count {
        break;
      }
    }

    Ok(bytes)
  }

  /// Switches the reservoir into inflating mode: all unread and future
  /// bytes are treated as a raw deflate stream that is inflated to serve
  /// reads. Used on transition to a deflated DICOM transfer syntax.
  ///
  pub fn start_zlib_inflate(&mut self) {
    // Bytes that haven't been read yet become the start of the deflated
    // input
    if self.head_offset > 0 {
      if let Some(head) = self.segments.front_mut() {
        *head = head.drop(self.head_offset);
      }

      self.head_offset = 0;
    }

    self.deflated = std::mem::take(&mut self.segments);
    self.unread_bytes = 0;
    self.inflater = Some(flate2::Decompress::new(false));
  }

  /// Advances the read position within the head segment, dropping the
  /// segment once it is fully consumed.
  ///
  fn advance_read_position(&mut self, byte_count: usize) {
    self.head_offset += byte_count;

    if let Some(head) = self.segments.front() {
      if self.head_offset >= head.len() {
        self.segments.pop_front();
        self.head_offset = 0;
      }
    }
  }

  /// The error for a read that can't be served, depending on whether more
  /// input can still arrive.
  ///
  fn starved_error(&self) -> ByteStreamError {
    if self.writing_done {
      ByteStreamError::DataEnd
    } else {
      ByteStreamError::DataRequired
    }
  }

  /// In inflating mode, runs the inflater until at least `wanted` bytes are
  /// ready to read, the deflated input runs dry, or the deflate stream
  /// ends. Output is produced in bounded chunks so that a zlib bomb can't
  /// force a large allocation.
  ///
  fn refill_inflated(&mut self, wanted: usize) -> Result<(), ByteStreamError> {
    let Some(inflater) = self.inflater.as_mut() else {
      return Ok(());
    };

    while !self.inflate_finished && self.unread_bytes < wanted as u64 {
      let Some(front) = self.deflated.front() else {
        return Ok(());
      };

      let input = &front[self.deflated_offset..];
      let mut output = vec![0u8; INFLATE_OUTPUT_CHUNK_SIZE];

      let in_before = inflater.total_in();
      let out_before = inflater.total_out();

      let status = inflater
        .decompress(input, &mut output, flate2::FlushDecompress::None)
        .map_err(|_| ByteStreamError::ZlibDataError)?;

      let consumed = (inflater.total_in() - in_before) as usize;
      let produced = (inflater.total_out() - out_before) as usize;

      // Track how far into the front input segment the inflater has read,
      // dropping the segment once it is exhausted
      self.deflated_offset += consumed;
      if self.deflated_offset >= self.deflated.front().unwrap().len() {
        self.deflated.pop_front();
        self.deflated_offset = 0;
      }

      if produced > 0 {
        output.truncate(produced);
        self.unread_bytes += produced as u64;
        self.segments.push_back(output.into());
      }

      if status == flate2::Status::StreamEnd {
        self.inflate_finished = true;
      } else if consumed == 0 && produced == 0 {
        // No forward progress is possible until more input arrives
        return Ok(());
      }
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn segmented_read_test() {
    let mut stream = ByteStream::new();

    assert!(matches!(stream.read(1), Err(ByteStreamError::DataRequired)));

    stream.write(vec![10, 20, 30, 40].into(), false).unwrap();
    stream.write(vec![50, 60].into(), false).unwrap();

    // A read inside the head segment
    assert_eq!(&*stream.read(3).unwrap(), &[10, 20, 30]);
    assert_eq!(stream.bytes_read(), 3);
    assert_eq!(stream.bytes_available(), 3);

    // A read spanning both segments
    assert_eq!(&*stream.read(3).unwrap(), &[40, 50, 60]);
    assert_eq!(stream.bytes_read(), 6);

    assert!(matches!(stream.read(1), Err(ByteStreamError::DataRequired)));
  }

  #[test]
  fn peek_does_not_consume_test() {
    let mut stream = ByteStream::new();

    stream.write(vec![1, 2].into(), false).unwrap();
    stream.write(vec![3, 4].into(), false).unwrap();

    // Peeking past the head segment, repeatedly, leaves the stream alone
    assert_eq!(stream.peek(3).unwrap(), vec![1, 2, 3]);
    assert_eq!(stream.peek(3).unwrap(), vec![1, 2, 3]);
    assert_eq!(stream.bytes_read(), 0);

    // A peek starting mid-segment sees the unread remainder
    stream.read(1).unwrap();
    assert_eq!(stream.peek(3).unwrap(), vec![2, 3, 4]);
  }

  #[test]
  fn end_of_input_test() {
    let mut stream = ByteStream::new();

    stream.write(vec![7, 8, 9].into(), true).unwrap();

    // Over-long reads fail permanently once the final chunk is in
    assert!(matches!(stream.read(4), Err(ByteStreamError::DataEnd)));

    assert_eq!(&*stream.read(3).unwrap(), &[7, 8, 9]);
    assert!(stream.is_fully_consumed());

    assert!(matches!(
      stream.write(vec![10].into(), true),
      Err(ByteStreamError::WriteAfterCompletion)
    ));
  }

  #[test]
  fn zero_length_read_test() {
    let mut stream = ByteStream::new();

    assert_eq!(&*stream.read(0).unwrap(), &[] as &[u8]);
    assert_eq!(stream.peek(0).unwrap(), Vec::<u8>::new());
  }

  #[test]
  fn inflates_deflated_input_test() {
    use std::io::Write;

    let mut encoder = flate2::write::DeflateEncoder::new(
      Vec::new(),
      flate2::Compression::default(),
    );
    encoder.write_all(b"streaming inflate works").unwrap();
    let deflated = encoder.finish().unwrap();

    let (first_half, second_half) = deflated.split_at(deflated.len() / 2);

    let mut stream = ByteStream::new();
    stream.start_zlib_inflate();

    // Half of the deflated input can't serve a read of the whole text
    stream.write(first_half.to_vec().into(), false).unwrap();
    assert!(matches!(stream.read(23), Err(ByteStreamError::DataRequired)));

    stream.write(second_half.to_vec().into(), true).unwrap();
    assert_eq!(&*stream.read(23).unwrap(), b"streaming inflate works");

    assert!(stream.is_fully_consumed());
  }

  #[test]
  fn inflate_midstream_test() {
    use std::io::Write;

    let mut encoder = flate2::write::DeflateEncoder::new(
      Vec::new(),
      flate2::Compression::default(),
    );
    encoder.write_all(b"post-switch payload").unwrap();
    let deflated = encoder.finish().unwrap();

    let mut input = b"raw:".to_vec();
    input.extend_from_slice(&deflated);

    let mut stream = ByteStream::new();
    stream.write(input.into(), true).unwrap();

    assert_eq!(&*stream.read(4).unwrap(), b"raw:");

    // Switching mid-segment treats the unread remainder as deflated input
    stream.start_zlib_inflate();

    assert_eq!(&*stream.read(19).unwrap(), b"post-switch payload");
    assert!(stream.is_fully_consumed());
  }
}
