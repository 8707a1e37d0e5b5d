//! Defines the parts of a DICOM stream that are read out of raw DICOM P10
//! data by the `p10_read` module and passed through flows.

use dcmstream_core::transfer_syntax::Endianness;
use dcmstream_core::{
  dictionary, DataElementTag, RcByteSlice, ValueRepresentation,
};

use crate::internal::data_element_header::DataElementHeader;
use crate::internal::value_length::ValueLength;

/// A DICOM part is the smallest piece of structured DICOM stream data. A
/// stream of these parts is most commonly the result of progressive reading
/// of raw DICOM P10 bytes, or of the projection of an in-memory data set for
/// transmission or serialization.
///
/// Parts that correspond to bytes on the wire carry those bytes, so
/// serializing a part stream is a concatenation. Parts synthesized by the
/// pipeline, e.g. the delimitations created for determinate-length
/// containers, carry empty bytes.
///
#[derive(Clone, Debug, PartialEq)]
pub enum DicomPart {
  /// The 128-byte File Preamble plus the "DICM" prefix, when present at the
  /// start of the stream. Always 132 bytes.
  FilePreamble { bytes: RcByteSlice },

  /// The header of the next data element. This part is always followed by
  /// one or more [`DicomPart::DataElementValueChunk`] parts containing the
  /// value bytes for the data element.
  DataElementHeader {
    tag: DataElementTag,
    vr: ValueRepresentation,
    length: ValueLength,
    is_fmi: bool,
    big_endian: bool,
    explicit_vr: bool,
    bytes: RcByteSlice,
  },

  /// A contiguous slice of the value of the current data element or
  /// fragments item. `last` is true on exactly the final chunk of each
  /// value, including for zero-length values which emit a single empty
  /// chunk.
  DataElementValueChunk {
    big_endian: bool,
    data: RcByteSlice,
    last: bool,
  },

  /// The start of a new sequence.
  SequenceStart {
    tag: DataElementTag,
    length: ValueLength,
    big_endian: bool,
    explicit_vr: bool,
    bytes: RcByteSlice,
  },

  /// The end of the current sequence.
  SequenceDelimitation { big_endian: bool, bytes: RcByteSlice },

  /// The start of a new item in the current sequence. Items are numbered
  /// 1-based within their sequence.
  SequenceItemStart {
    index: usize,
    length: ValueLength,
    big_endian: bool,
    bytes: RcByteSlice,
  },

  /// The end of the current sequence item.
  SequenceItemDelimitation {
    index: usize,
    big_endian: bool,
    bytes: RcByteSlice,
  },

  /// The start of an encapsulated pixel data sequence. The VR is either
  /// [`ValueRepresentation::OtherByteString`] or
  /// [`ValueRepresentation::OtherWordString`].
  FragmentsStart {
    tag: DataElementTag,
    vr: ValueRepresentation,
    big_endian: bool,
    explicit_vr: bool,
    bytes: RcByteSlice,
  },

  /// The start of a new item in the current encapsulated pixel data
  /// sequence, numbered 1-based. The first item holds the basic offset
  /// table when one is present. The item's data follows in one or more
  /// [`DicomPart::DataElementValueChunk`] parts.
  FragmentsItem {
    index: usize,
    length: u32,
    big_endian: bool,
    bytes: RcByteSlice,
  },

  /// The end of the current encapsulated pixel data sequence.
  FragmentsDelimitation { big_endian: bool, bytes: RcByteSlice },

  /// Raw, still-compressed bytes following the File Meta Information of a
  /// stream that uses a deflated transfer syntax.
  DeflatedChunk { big_endian: bool, data: RcByteSlice },

  /// A chunk of bytes that was not recognized at the dataset level.
  Unknown { big_endian: bool, data: RcByteSlice },

  /// Synthetic marker emitted ahead of all stream parts by the pipeline.
  /// Never present in parsed data.
  StartMarker,

  /// Synthetic marker emitted after all stream parts by the pipeline.
  /// Never present in parsed data.
  EndMarker,
}

impl DicomPart {
  /// Returns the wire bytes this part corresponds to. Pipeline markers and
  /// synthetic delimitations return empty bytes.
  ///
  pub fn bytes(&self) -> RcByteSlice {
    match self {
      DicomPart::FilePreamble { bytes }
      | DicomPart::DataElementHeader { bytes, .. }
      | DicomPart::SequenceStart { bytes, .. }
      | DicomPart::SequenceDelimitation { bytes, .. }
      | DicomPart::SequenceItemStart { bytes, .. }
      | DicomPart::SequenceItemDelimitation { bytes, .. }
      | DicomPart::FragmentsStart { bytes, .. }
      | DicomPart::FragmentsItem { bytes, .. }
      | DicomPart::FragmentsDelimitation { bytes, .. } => bytes.clone(),

      DicomPart::DataElementValueChunk { data, .. }
      | DicomPart::DeflatedChunk { data, .. }
      | DicomPart::Unknown { data, .. } => data.clone(),

      DicomPart::StartMarker | DicomPart::EndMarker => RcByteSlice::empty(),
    }
  }

  /// Returns the number of stream bytes this part represents. This is what
  /// delimitation synthesis subtracts from the remaining byte count of
  /// enclosing determinate-length containers.
  ///
  pub fn byte_size(&self) -> u64 {
    match self {
      DicomPart::FilePreamble { bytes }
      | DicomPart::DataElementHeader { bytes, .. }
      | DicomPart::SequenceStart { bytes, .. }
      | DicomPart::SequenceDelimitation { bytes, .. }
      | DicomPart::SequenceItemStart { bytes, .. }
      | DicomPart::SequenceItemDelimitation { bytes, .. }
      | DicomPart::FragmentsStart { bytes, .. }
      | DicomPart::FragmentsItem { bytes, .. }
      | DicomPart::FragmentsDelimitation { bytes, .. } => bytes.len() as u64,

      DicomPart::DataElementValueChunk { data, .. }
      | DicomPart::DeflatedChunk { data, .. }
      | DicomPart::Unknown { data, .. } => data.len() as u64,

      DicomPart::StartMarker | DicomPart::EndMarker => 0,
    }
  }

  /// Returns whether this part is one of the pipeline-synthetic stream
  /// markers.
  ///
  pub fn is_marker(&self) -> bool {
    matches!(self, DicomPart::StartMarker | DicomPart::EndMarker)
  }

  /// Returns whether this part belongs to the File Meta Information, i.e.
  /// it is the File Preamble or an FMI data element header.
  ///
  pub fn is_fmi_part(&self) -> bool {
    matches!(
      self,
      DicomPart::FilePreamble { .. }
        | DicomPart::DataElementHeader { is_fmi: true, .. }
    )
  }
}

impl std::fmt::Display for DicomPart {
  /// Converts a DICOM part to a human-readable string.
  ///
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    let s = match self {
      DicomPart::FilePreamble { .. } => "FilePreamble".to_string(),

      DicomPart::DataElementHeader {
        tag, vr, length, ..
      } => format!(
        "DataElementHeader: {}, name: {}, vr: {}, length: {}",
        tag,
        dictionary::tag_name(*tag),
        vr,
        length
      ),

      DicomPart::DataElementValueChunk { data, last, .. } => format!(
        "DataElementValueChunk: {} bytes of data, last: {}",
        data.len(),
        last
      ),

      DicomPart::SequenceStart { tag, length, .. } => format!(
        "SequenceStart: {}, name: {}, length: {}",
        tag,
        dictionary::tag_name(*tag),
        length
      ),

      DicomPart::SequenceDelimitation { .. } => {
        "SequenceDelimitation".to_string()
      }

      DicomPart::SequenceItemStart { index, length, .. } => {
        format!("SequenceItemStart: item {index}, length: {length}")
      }

      DicomPart::SequenceItemDelimitation { index, .. } => {
        format!("SequenceItemDelimitation: item {index}")
      }

      DicomPart::FragmentsStart { tag, vr, .. } => format!(
        "FragmentsStart: {}, name: {}, vr: {}",
        tag,
        dictionary::tag_name(*tag),
        vr
      ),

      DicomPart::FragmentsItem { index, length, .. } => {
        format!("FragmentsItem: item {index}, {length} bytes")
      }

      DicomPart::FragmentsDelimitation { .. } => {
        "FragmentsDelimitation".to_string()
      }

      DicomPart::DeflatedChunk { data, .. } => {
        format!("DeflatedChunk: {} bytes of data", data.len())
      }

      DicomPart::Unknown { data, .. } => {
        format!("Unknown: {} bytes of data", data.len())
      }

      DicomPart::StartMarker => "StartMarker".to_string(),
      DicomPart::EndMarker => "EndMarker".to_string(),
    };

    write!(f, "{s}")
  }
}

/// Creates a sequence delimitation part carrying its 8-byte wire form.
///
pub fn sequence_delimitation(big_endian: bool) -> DicomPart {
  DicomPart::SequenceDelimitation {
    big_endian,
    bytes: delimitation_bytes(
      dictionary::SEQUENCE_DELIMITATION_ITEM.tag,
      big_endian,
    ),
  }
}

/// Creates an item delimitation part carrying its 8-byte wire form.
///
pub fn item_delimitation(index: usize, big_endian: bool) -> DicomPart {
  DicomPart::SequenceItemDelimitation {
    index,
    big_endian,
    bytes: delimitation_bytes(
      dictionary::ITEM_DELIMITATION_ITEM.tag,
      big_endian,
    ),
  }
}

/// Creates a sequence delimitation part with empty bytes, as synthesized by
/// the pipeline to close a determinate-length sequence.
///
pub fn synthetic_sequence_delimitation(big_endian: bool) -> DicomPart {
  DicomPart::SequenceDelimitation {
    big_endian,
    bytes: RcByteSlice::empty(),
  }
}

/// Creates an item delimitation part with empty bytes, as synthesized by the
/// pipeline to close a determinate-length item.
///
pub fn synthetic_item_delimitation(
  index: usize,
  big_endian: bool,
) -> DicomPart {
  DicomPart::SequenceItemDelimitation {
    index,
    big_endian,
    bytes: RcByteSlice::empty(),
  }
}

fn delimitation_bytes(tag: DataElementTag, big_endian: bool) -> RcByteSlice {
  let endianness = if big_endian {
    Endianness::BigEndian
  } else {
    Endianness::LittleEndian
  };

  DataElementHeader {
    tag,
    vr: None,
    length: ValueLength::ZERO,
  }
  .to_bytes(endianness)
  .unwrap()
  .into()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn byte_size_test() {
    assert_eq!(sequence_delimitation(false).byte_size(), 8);
    assert_eq!(synthetic_sequence_delimitation(false).byte_size(), 0);
    assert_eq!(DicomPart::StartMarker.byte_size(), 0);
  }

  #[test]
  fn delimitation_bytes_test() {
    assert_eq!(
      &*sequence_delimitation(false).bytes(),
      &[0xFE, 0xFF, 0xDD, 0xE0, 0, 0, 0, 0]
    );

    assert_eq!(
      &*item_delimitation(1, true).bytes(),
      &[0xFF, 0xFE, 0xE0, 0x0D, 0, 0, 0, 0]
    );
  }
}
