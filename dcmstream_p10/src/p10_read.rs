//! Converts incoming chunks of binary DICOM P10 data into DICOM parts.
//!
//! This conversion is done in a streaming fashion, where chunks of incoming
//! raw binary data are added to a read context, and DICOM parts are then
//! progressively made available as their data comes in. See the
//! [`DicomPart`] type for details on the different parts that are emitted.
//!
//! If DICOM P10 data already exists fully in memory it can be added to a new
//! read context as one complete and final chunk, and then have its parts
//! read out, i.e. there is no requirement to use a read context in a
//! streaming fashion.
//!
//! Additional configuration for controlling memory usage and validation
//! strictness is available via [`P10ReadConfig`].

use byteorder::ByteOrder;

use dcmstream_core::transfer_syntax::{self, Endianness, VrSerialization};
use dcmstream_core::{
  dictionary, DataElementTag, RcByteSlice, TagPath, TagPathNode,
  TransferSyntax, ValueRepresentation,
};

use crate::internal::byte_stream::{ByteStream, ByteStreamError};
use crate::internal::data_element_header::{
  DataElementHeader, ValueLengthSize,
};
use crate::internal::p10_location::P10Location;
use crate::internal::value_length::ValueLength;
use crate::{DicomPart, P10Error, P10ReadConfig};

/// A read context holds the current state of an in-progress DICOM P10 read.
/// Raw DICOM P10 bytes are added to a read context with
/// [`Self::write_bytes`], and DICOM parts are then read out with
/// [`Self::read_parts`].
///
#[derive(Debug)]
pub struct P10ReadContext {
  config: P10ReadConfig,
  stream: ByteStream,
  next_action: NextAction,
  transfer_syntax: &'static TransferSyntax,
  location: P10Location,
  path: TagPath,
}

/// The next action specifies what will be attempted to be read next from a
/// read context by `read_parts`.
///
#[derive(Debug)]
enum NextAction {
  ReadFilePreamble,
  ReadFileMetaInformation {
    starts_at: u64,
    ends_at: Option<u64>,
    transfer_syntax: TransferSyntaxState,
  },
  ReadDataElementHeader,
  ReadValueBytes {
    vr: ValueRepresentation,
    length: u32,
    bytes_remaining: u32,
    in_fragments: bool,
  },
  ReadFragmentsItem,
  ReadDeflatedChunks,
  ReadUnknownChunks,
  Complete,
}

/// Tracks what the File Meta Information has declared about the data set's
/// transfer syntax so far.
///
#[derive(Clone, Copy, Debug)]
enum TransferSyntaxState {
  /// No *'(0002,0010) Transfer Syntax UID'* element has been seen.
  Undeclared,

  /// A recognized transfer syntax has been declared and adopted.
  Declared,

  /// The declared transfer syntax UID isn't recognized, so the data set's
  /// bytes will be passed through as unknown chunks.
  Unrecognized,
}

impl P10ReadContext {
  /// Creates a new read context for reading DICOM P10 data.
  ///
  pub fn new(config: Option<P10ReadConfig>) -> P10ReadContext {
    P10ReadContext {
      config: config.unwrap_or_default(),
      stream: ByteStream::new(),
      next_action: NextAction::ReadFilePreamble,
      transfer_syntax: &transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN,
      location: P10Location::new(),
      path: TagPath::new(),
    }
  }

  /// Returns the transfer syntax for a P10 read context. This defaults to
  /// 'Implicit VR Little Endian' and is updated when a transfer syntax is
  /// read from the File Meta Information, or detected from the first data
  /// element of streams without File Meta Information.
  ///
  pub fn transfer_syntax(&self) -> &'static TransferSyntax {
    self.transfer_syntax
  }

  /// Returns whether the read context has read the entire DICOM stream and
  /// no further parts will be emitted.
  ///
  pub fn is_complete(&self) -> bool {
    matches!(self.next_action, NextAction::Complete)
  }

  /// Writes raw DICOM P10 bytes to a read context that will be parsed into
  /// DICOM parts by subsequent calls to [`Self::read_parts`]. If `done` is
  /// true this indicates the end of the incoming DICOM P10 data to be
  /// parsed, after which any further calls to this function will error.
  ///
  pub fn write_bytes(
    &mut self,
    bytes: RcByteSlice,
    done: bool,
  ) -> Result<(), P10Error> {
    match self.stream.write(bytes, done) {
      Ok(_) => Ok(()),
      Err(e) => {
        Err(self.map_byte_stream_error(e, "Writing data to read context"))
      }
    }
  }

  /// Reads the next DICOM parts from a read context. On success, zero or
  /// more parts are returned and the function can be called again to read
  /// further parts.
  ///
  /// On error, a value of [`P10Error::DataRequired`] means the read context
  /// does not have enough data to return the next part, i.e. further calls
  /// to [`Self::write_bytes`] are required before the next part is able to
  /// be read.
  ///
  pub fn read_parts(&mut self) -> Result<Vec<DicomPart>, P10Error> {
    match self.next_action {
      NextAction::ReadFilePreamble => self.read_file_preamble_part(),

      NextAction::ReadFileMetaInformation { .. } => {
        self.read_file_meta_information_part()
      }

      NextAction::ReadDataElementHeader => {
        self.read_data_element_header_part()
      }

      NextAction::ReadValueBytes {
        vr,
        length,
        bytes_remaining,
        in_fragments,
      } => self.read_value_bytes_part(vr, length, bytes_remaining, in_fragments),

      NextAction::ReadFragmentsItem => self.read_fragments_item_part(),

      NextAction::ReadDeflatedChunks => self.read_raw_chunk(false),

      NextAction::ReadUnknownChunks => self.read_raw_chunk(true),

      NextAction::Complete => Ok(vec![]),
    }
  }

  /// Reads the 128-byte File Preamble and the 4-byte `DICM` prefix
  /// following it. If the `DICM` bytes aren't present at the expected
  /// offset then it is assumed that the File Preamble is not present in the
  /// input and no preamble part is emitted.
  ///
  fn read_file_preamble_part(&mut self) -> Result<Vec<DicomPart>, P10Error> {
    let fmi_action = |starts_at| NextAction::ReadFileMetaInformation {
      starts_at,
      ends_at: None,
      transfer_syntax: TransferSyntaxState::Undeclared,
    };

    match self.stream.peek(132) {
      Ok(data) => {
        if &data[128..132] == b"DICM" {
          let bytes = self.stream.read(132).map_err(|e| {
            self.map_byte_stream_error(e, "Reading file preamble")
          })?;

          self.next_action = fmi_action(self.stream.bytes_read());

          Ok(vec![DicomPart::FilePreamble { bytes }])
        } else if self.config.require_preamble {
          Err(P10Error::DataInvalid {
            when: "Reading file preamble".to_string(),
            details: "'DICM' prefix is not present at offset 128".to_string(),
            path: TagPath::new(),
            offset: 0,
          })
        } else {
          // No preamble, so move straight on to detecting whether File Meta
          // Information is present
          self.next_action = fmi_action(0);

          Ok(vec![])
        }
      }

      // If the end of the data is encountered when trying to read the first
      // 132 bytes then there is no File Preamble
      Err(ByteStreamError::DataEnd) if !self.config.require_preamble => {
        self.next_action = fmi_action(0);

        Ok(vec![])
      }

      Err(e) => Err(self.map_byte_stream_error(e, "Reading file preamble")),
    }
  }

  /// Reads the next File Meta Information data element and emits it as
  /// header and value chunk parts. The *'(0002,0000) File Meta Information
  /// Group Length'* value, when present, determines where the File Meta
  /// Information ends; otherwise it ends at the first data element with a
  /// group other than 0x0002.
  ///
  fn read_file_meta_information_part(
    &mut self,
  ) -> Result<Vec<DicomPart>, P10Error> {
    let NextAction::ReadFileMetaInformation {
      starts_at,
      ends_at,
      transfer_syntax: transfer_syntax_state,
    } = self.next_action
    else {
      unreachable!();
    };

    // Check whether the end of the File Meta Information has been reached
    if let Some(ends_at) = ends_at {
      if self.stream.bytes_read() >= ends_at {
        if self.config.strict && self.stream.bytes_read() != ends_at {
          return Err(P10Error::DataInvalid {
            when: "Reading File Meta Information".to_string(),
            details: "Group length does not match the observed File Meta \
                      Information length"
              .to_string(),
            path: TagPath::new(),
            offset: self.stream.bytes_read(),
          });
        }

        return self.start_reading_data_set(transfer_syntax_state);
      }
    }

    // Peek the next 8 bytes that contain the group, element, VR, and two
    // bytes that contain the value length if the VR has a 16-bit length
    // field
    let data = match self.stream.peek(8) {
      Ok(data) => data,

      // When the stream ends cleanly at the FMI boundary with no group
      // length present, move on to the main data set
      Err(ByteStreamError::DataEnd) if ends_at.is_none() => {
        return self.start_reading_data_set(transfer_syntax_state);
      }

      Err(e) => {
        return Err(
          self.map_byte_stream_error(e, "Reading File Meta Information"),
        );
      }
    };

    let group = byteorder::LittleEndian::read_u16(&data[0..2]);
    let element = byteorder::LittleEndian::read_u16(&data[2..4]);
    let tag = DataElementTag::new(group, element);

    // If the FMI length isn't known and the group isn't 0x0002 then this is
    // the end of the File Meta Information
    if tag.group != 0x0002 && ends_at.is_none() {
      return self.start_reading_data_set(transfer_syntax_state);
    }

    // A data element inside the File Meta Information must have a group of
    // 0x0002
    if tag.group != 0x0002 && ends_at.is_some() {
      return Err(P10Error::DataInvalid {
        when: "Reading File Meta Information".to_string(),
        details: format!(
          "Data element '{}' does not have the group 0x0002",
          tag
        ),
        path: TagPath::from_tag(tag),
        offset: self.stream.bytes_read(),
      });
    }

    // Get the VR for the data element
    let vr = ValueRepresentation::from_bytes(&data[4..6]).map_err(|_| {
      P10Error::DataInvalid {
        when: "Reading File Meta Information".to_string(),
        details: "Data element has invalid VR".to_string(),
        path: TagPath::from_tag(tag),
        offset: self.stream.bytes_read(),
      }
    })?;

    // Sequences aren't allowed in the File Meta Information
    if vr == ValueRepresentation::Sequence {
      return Err(P10Error::DataInvalid {
        when: "Reading File Meta Information".to_string(),
        details: "Data element in File Meta Information is a sequence"
          .to_string(),
        path: TagPath::from_tag(tag),
        offset: self.stream.bytes_read(),
      });
    }

    // Read the value length based on whether the VR has a 16-bit or 32-bit
    // length stored
    let (header_size, value_length) =
      match DataElementHeader::value_length_size(vr) {
        ValueLengthSize::U16 =>

          (8usize, byteorder::LittleEndian::read_u16(&data[6..8]) as usize),

        ValueLengthSize::U32 => {
          let data = self.stream.peek(12).map_err(|e| {
            self.map_byte_stream_error(e, "Reading File Meta Information")
          })?;

          (12, byteorder::LittleEndian::read_u32(&data[8..12]) as usize)
        }
      };

    // Read the full header and value
    let header_bytes = self.stream.read(header_size).map_err(|e| {
      self.map_byte_stream_error(e, "Reading File Meta Information")
    })?;

    let value_bytes = self.stream.read(value_length).map_err(|e| {
      self.map_byte_stream_error(
        e,
        "Reading File Meta Information data element value",
      )
    })?;

    let mut ends_at = ends_at;
    let mut transfer_syntax_state = transfer_syntax_state;

    // If this data element specifies the File Meta Information group's
    // length then use it to calculate its end offset
    if tag == dictionary::FILE_META_INFORMATION_GROUP_LENGTH.tag
      && ends_at.is_none()
    {
      if value_bytes.len() != 4 {
        return Err(P10Error::DataInvalid {
          when: "Reading File Meta Information".to_string(),
          details: "Group length value is invalid".to_string(),
          path: TagPath::from_tag(tag),
          offset: self.stream.bytes_read(),
        });
      }

      let group_length = byteorder::LittleEndian::read_u32(&value_bytes);
      ends_at = Some(starts_at + 12 + u64::from(group_length));
    }

    // If this data element specifies the transfer syntax to use then set it
    // in the read context
    if tag == dictionary::TRANSFER_SYNTAX_UID.tag {
      let uid = std::str::from_utf8(&value_bytes)
        .map(|s| s.trim_end_matches(['\0', ' ']))
        .unwrap_or("");

      match TransferSyntax::from_uid(uid) {
        Ok(transfer_syntax) => {
          self.transfer_syntax = transfer_syntax;
          transfer_syntax_state = TransferSyntaxState::Declared;
        }

        Err(()) => {
          if self.config.strict {
            return Err(P10Error::TransferSyntaxNotSupported {
              transfer_syntax_uid: uid.to_string(),
            });
          }

          // The data set's bytes can't be interpreted, so they will be
          // passed through as unknown chunks
          transfer_syntax_state = TransferSyntaxState::Unrecognized;
        }
      }
    }

    self.next_action = NextAction::ReadFileMetaInformation {
      starts_at,
      ends_at,
      transfer_syntax: transfer_syntax_state,
    };

    let header_part = DicomPart::DataElementHeader {
      tag,
      vr,
      length: ValueLength::new(value_length as u32),
      is_fmi: true,
      big_endian: false,
      explicit_vr: true,
      bytes: header_bytes,
    };

    let value_part = DicomPart::DataElementValueChunk {
      big_endian: false,
      data: value_bytes,
      last: true,
    };

    Ok(vec![header_part, value_part])
  }

  /// Transitions the read context from the File Meta Information to the
  /// main data set, adopting the declared transfer syntax, or detecting one
  /// when none was declared.
  ///
  fn start_reading_data_set(
    &mut self,
    transfer_syntax_state: TransferSyntaxState,
  ) -> Result<Vec<DicomPart>, P10Error> {
    match transfer_syntax_state {
      TransferSyntaxState::Declared => (),

      // An unrecognized transfer syntax passes the rest of the stream
      // through as unknown chunks
      TransferSyntaxState::Unrecognized => {
        self.next_action = NextAction::ReadUnknownChunks;
        return Ok(vec![]);
      }

      TransferSyntaxState::Undeclared => {
        if self.config.strict {
          return Err(P10Error::DataInvalid {
            when: "Reading File Meta Information".to_string(),
            details: "Transfer Syntax UID is not present".to_string(),
            path: TagPath::new(),
            offset: self.stream.bytes_read(),
          });
        }

        self.transfer_syntax = self.detect_transfer_syntax()?;
      }
    }

    // If the transfer syntax is deflated then either inflate transparently
    // or emit the raw deflated bytes as parts
    if self.transfer_syntax.is_deflated {
      if self.config.inflate_deflated {
        self.stream.start_zlib_inflate();
        self.next_action = NextAction::ReadDataElementHeader;
      } else {
        self.next_action = NextAction::ReadDeflatedChunks;
      }
    } else {
      self.next_action = NextAction::ReadDataElementHeader;
    }

    Ok(vec![])
  }

  /// Detects the transfer syntax of a data set that has no File Meta
  /// Information by checking whether the first data element leads with a
  /// valid explicit VR.
  ///
  fn detect_transfer_syntax(
    &mut self,
  ) -> Result<&'static TransferSyntax, P10Error> {
    match self.stream.peek(6) {
      Ok(data) => match ValueRepresentation::from_bytes(&data[4..6]) {
        Ok(_) => Ok(&transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN),
        Err(()) => Ok(&transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN),
      },

      // An empty or nearly-empty stream defaults to implicit VR
      Err(ByteStreamError::DataEnd) => {
        Ok(&transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN)
      }

      Err(e) => Err(self.map_byte_stream_error(e, "Detecting transfer syntax")),
    }
  }

  /// Reads the header of the next data element in the main data set and
  /// emits the part that starts it: a plain data element header, a sequence
  /// or item boundary, or the start of encapsulated pixel data.
  ///
  fn read_data_element_header_part(
    &mut self,
  ) -> Result<Vec<DicomPart>, P10Error> {
    // Silently close any defined-length sequences and items whose bytes
    // have been consumed
    let items_popped = self.location.pop_ended(self.stream.bytes_read());
    for _ in 0..items_popped {
      self.path.pop();
    }

    // Detect the end of the DICOM data. Truncation inside sequences or
    // items is tolerated unless strict validation is enabled.
    if self.stream.is_fully_consumed() {
      if self.config.strict && !self.location.is_at_root() {
        return Err(P10Error::DataEndedUnexpectedly {
          when: "Reading data element header".to_string(),
          path: self.path.clone(),
          offset: self.stream.bytes_read(),
        });
      }

      self.next_action = NextAction::Complete;

      return Ok(vec![]);
    }

    let (header, header_bytes) = self.read_data_element_header()?;

    let big_endian = self.active_transfer_syntax().is_big_endian();
    let explicit_vr = self.active_transfer_syntax().is_explicit_vr();

    match (header.tag, header.vr, header.length) {
      // The start of a new sequence
      (tag, Some(ValueRepresentation::Sequence), length)
      | (tag, Some(ValueRepresentation::Unknown), length @ ValueLength::Undefined) => {
        self.check_data_element_ordering(&header)?;

        let ends_at = length
          .defined()
          .map(|length| self.stream.bytes_read() + u64::from(length));

        // When the VR is UN with undefined length, the sequence's content
        // is read as 'Implicit VR Little Endian'. Ref: DICOM CP-246.
        let forces_implicit_vr =
          header.vr == Some(ValueRepresentation::Unknown);

        self
          .location
          .add_sequence(tag, forces_implicit_vr, ends_at)
          .map_err(|details| self.data_invalid(details))?;

        if self.location.sequence_depth() > self.config.max_sequence_depth {
          return Err(P10Error::MaximumExceeded {
            details: "Maximum allowed sequence depth reached".to_string(),
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          });
        }

        Ok(vec![DicomPart::SequenceStart {
          tag,
          length,
          big_endian,
          explicit_vr,
          bytes: header_bytes,
        }])
      }

      // The start of a new item in a sequence
      (tag, None, length) if tag == dictionary::ITEM.tag => {
        let ends_at = length
          .defined()
          .map(|length| self.stream.bytes_read() + u64::from(length));

        let sequence_tag = self.location.current_sequence_tag();

        let index = self
          .location
          .add_item(ends_at)
          .map_err(|details| self.data_invalid(details))?;

        if let Ok(sequence_tag) = sequence_tag {
          let _ = self.path.push(TagPathNode::Item {
            tag: sequence_tag,
            index,
          });
        }

        Ok(vec![DicomPart::SequenceItemStart {
          index,
          length,
          big_endian,
          bytes: header_bytes,
        }])
      }

      // The start of encapsulated pixel data
      (tag, Some(vr), ValueLength::Undefined)
        if tag == dictionary::PIXEL_DATA.tag
          && (vr == ValueRepresentation::OtherByteString
            || vr == ValueRepresentation::OtherWordString) =>
      {
        self.check_data_element_ordering(&header)?;

        self
          .location
          .add_fragments()
          .map_err(|details| self.data_invalid(details))?;

        self.next_action = NextAction::ReadFragmentsItem;

        Ok(vec![DicomPart::FragmentsStart {
          tag,
          vr,
          big_endian,
          explicit_vr,
          bytes: header_bytes,
        }])
      }

      // A sequence delimitation item ends the current sequence. Rogue
      // sequence delimiters outside of any sequence have been observed in
      // the wild and are skipped.
      (tag, None, ValueLength::ZERO)
        if tag == dictionary::SEQUENCE_DELIMITATION_ITEM.tag =>
      {
        match self.location.end_sequence() {
          Ok(_) => Ok(vec![DicomPart::SequenceDelimitation {
            big_endian,
            bytes: header_bytes,
          }]),

          Err(_) => Ok(vec![]),
        }
      }

      // An item delimitation item ends the current item
      (tag, None, ValueLength::ZERO)
        if tag == dictionary::ITEM_DELIMITATION_ITEM.tag =>
      {
        let index = self
          .location
          .end_item()
          .map_err(|details| self.data_invalid(details))?;

        self.path.pop();

        Ok(vec![DicomPart::SequenceItemDelimitation {
          index,
          big_endian,
          bytes: header_bytes,
        }])
      }

      // A standard data element that has its value bytes read next
      (tag, Some(vr), ValueLength::Defined { length }) => {
        self.check_data_element_ordering(&header)?;

        self.next_action = NextAction::ReadValueBytes {
          vr,
          length,
          bytes_remaining: length,
          in_fragments: false,
        };

        Ok(vec![DicomPart::DataElementHeader {
          tag,
          vr,
          length: ValueLength::new(length),
          is_fmi: false,
          big_endian,
          explicit_vr,
          bytes: header_bytes,
        }])
      }

      // Indeterminate length is not legal on any other data element
      (_, _, _) => Err(self.data_invalid(format!(
        "Invalid data element '{}'",
        header
      ))),
    }
  }

  /// Reads a data element header. Depending on the transfer syntax and the
  /// specific VR (for explicit VR transfer syntaxes), this reads either 8
  /// or 12 bytes in total. The raw header bytes are returned alongside.
  ///
  fn read_data_element_header(
    &mut self,
  ) -> Result<(DataElementHeader, RcByteSlice), P10Error> {
    let transfer_syntax = self.active_transfer_syntax();

    // Peek the 4 bytes containing the tag
    let tag = match self.stream.peek(4) {
      Ok(data) => {
        let (group, element) = match transfer_syntax.endianness {
          Endianness::LittleEndian => (
            byteorder::LittleEndian::read_u16(&data[0..2]),
            byteorder::LittleEndian::read_u16(&data[2..4]),
          ),

          Endianness::BigEndian => (
            byteorder::BigEndian::read_u16(&data[0..2]),
            byteorder::BigEndian::read_u16(&data[2..4]),
          ),
        };

        Ok(DataElementTag::new(group, element))
      }

      Err(e) => {
        Err(self.map_byte_stream_error(e, "Reading data element header"))
      }
    }?;

    // File Meta Information data elements aren't allowed in the root of the
    // main data set
    if tag.group == 0x0002 && self.location.is_at_root() {
      return Err(P10Error::DataInvalid {
        when: "Reading data element header".to_string(),
        details: format!(
          "File Meta Information data element '{}' found in the main data \
           set",
          tag
        ),
        path: TagPath::from_tag(tag),
        offset: self.stream.bytes_read(),
      });
    }

    // The item and delimitation tags always use implicit VRs
    let vr_serialization = if tag == dictionary::ITEM.tag
      || tag == dictionary::ITEM_DELIMITATION_ITEM.tag
      || tag == dictionary::SEQUENCE_DELIMITATION_ITEM.tag
    {
      VrSerialization::VrImplicit
    } else {
      transfer_syntax.vr_serialization
    };

    match vr_serialization {
      VrSerialization::VrExplicit => self.read_explicit_vr_and_length(tag),
      VrSerialization::VrImplicit => self.read_implicit_vr_and_length(tag),
    }
  }

  /// Reads the (implicit) VR and value length following a data element tag
  /// when the transfer syntax is 'Implicit VR Little Endian'. The VR comes
  /// from the data element dictionary.
  ///
  fn read_implicit_vr_and_length(
    &mut self,
    tag: DataElementTag,
  ) -> Result<(DataElementHeader, RcByteSlice), P10Error> {
    match self.stream.read(8) {
      Ok(data) => {
        let value_length = match self.active_transfer_syntax().endianness {
          Endianness::LittleEndian => {
            byteorder::LittleEndian::read_u32(&data[4..8])
          }
          Endianness::BigEndian => byteorder::BigEndian::read_u32(&data[4..8]),
        };

        // Return the VR as `None` for those tags that don't support one
        let vr = if tag == dictionary::ITEM.tag
          || tag == dictionary::ITEM_DELIMITATION_ITEM.tag
          || tag == dictionary::SEQUENCE_DELIMITATION_ITEM.tag
        {
          None
        } else {
          Some(dictionary::vr_of(tag))
        };

        let header = DataElementHeader {
          tag,
          vr,
          length: ValueLength::new(value_length),
        };

        Ok((header, data))
      }

      Err(e) => {
        Err(self.map_byte_stream_error(e, "Reading data element header"))
      }
    }
  }

  /// Reads the explicit VR and value length following a data element tag
  /// when the transfer syntax is not 'Implicit VR Little Endian'.
  ///
  fn read_explicit_vr_and_length(
    &mut self,
    tag: DataElementTag,
  ) -> Result<(DataElementHeader, RcByteSlice), P10Error> {
    // Peek and validate the explicit VR
    let vr = match self.stream.peek(6) {
      Ok(data) => {
        let vr_bytes = &data[4..6];

        match ValueRepresentation::from_bytes(vr_bytes) {
          Ok(vr) => Ok(vr),

          // If the VR is two spaces or two NULL characters then treat it as
          // UN. This is not part of the DICOM P10 spec, but such data has
          // been observed in the wild.
          _ => match vr_bytes {
            [0x00, 0x00] | [0x20, 0x20] => Ok(ValueRepresentation::Unknown),

            _ => Err(P10Error::DataInvalid {
              when: "Reading data element VR".to_string(),
              details: format!(
                "Unrecognized VR {:?} for tag '{}'",
                vr_bytes,
                dictionary::tag_with_name(tag)
              ),
              path: self.path.clone(),
              offset: self.stream.bytes_read(),
            }),
          },
        }
      }

      Err(e) =>

        Err(self.map_byte_stream_error(e, "Reading data element header")),
    }?;

    let header_size = match DataElementHeader::value_length_size(vr) {
      ValueLengthSize::U32 => 12,
      ValueLengthSize::U16 => 8,
    };

    // Read the full header, including the tag, VR, and value length
    match self.stream.read(header_size) {
      Ok(data) => {
        let length = match header_size {
          12 => match self.active_transfer_syntax().endianness {
            Endianness::LittleEndian => {
              byteorder::LittleEndian::read_u32(&data[8..12])
            }
            Endianness::BigEndian => {
              byteorder::BigEndian::read_u32(&data[8..12])
            }
          },
          _ => match self.active_transfer_syntax().endianness {
            Endianness::LittleEndian => {
              byteorder::LittleEndian::read_u16(&data[6..8]).into()
            }
            Endianness::BigEndian => {
              byteorder::BigEndian::read_u16(&data[6..8]).into()
            }
          },
        };

        let header = DataElementHeader {
          tag,
          vr: Some(vr),
          length: ValueLength::new(length),
        };

        Ok((header, data))
      }

      Err(e) => {
        Err(self.map_byte_stream_error(e, "Reading data element header"))
      }
    }
  }

  /// Reads the next chunk of value bytes for the current data element or
  /// fragments item. Chunks are capped at the configured max part size and
  /// the final chunk has `last` set. A zero-length value emits exactly one
  /// empty chunk with `last` set.
  ///
  fn read_value_bytes_part(
    &mut self,
    vr: ValueRepresentation,
    length: u32,
    bytes_remaining: u32,
    in_fragments: bool,
  ) -> Result<Vec<DicomPart>, P10Error> {
    let bytes_to_read =
      std::cmp::min(bytes_remaining, self.config.max_part_size);

    match self.stream.read(bytes_to_read as usize) {
      Ok(data) => {
        let bytes_remaining = bytes_remaining - bytes_to_read;
        let last = bytes_remaining == 0;

        let part = DicomPart::DataElementValueChunk {
          big_endian: self.active_transfer_syntax().is_big_endian(),
          data,
          last,
        };

        self.next_action = if last {
          if in_fragments {
            NextAction::ReadFragmentsItem
          } else {
            NextAction::ReadDataElementHeader
          }
        } else {
          NextAction::ReadValueBytes {
            vr,
            length,
            bytes_remaining,
            in_fragments,
          }
        };

        Ok(vec![part])
      }

      Err(e) => {
        let when =
          format!("Reading {bytes_to_read} data element value bytes, VR: {vr}");

        Err(self.map_byte_stream_error(e, &when))
      }
    }
  }

  /// Reads the header of the next encapsulated pixel data item, or the
  /// sequence delimitation that ends the encapsulated pixel data.
  ///
  fn read_fragments_item_part(&mut self) -> Result<Vec<DicomPart>, P10Error> {
    let (header, header_bytes) = self.read_data_element_header()?;

    let big_endian = self.active_transfer_syntax().is_big_endian();

    match header {
      // Pixel data items must have no VR and a defined length
      DataElementHeader {
        tag,
        vr: None,
        length: ValueLength::Defined { length },
      } if tag == dictionary::ITEM.tag => {
        let index = self
          .location
          .add_fragments_item()
          .map_err(|details| self.data_invalid(details))?;

        self.next_action = NextAction::ReadValueBytes {
          vr: ValueRepresentation::OtherByteString,
          length,
          bytes_remaining: length,
          in_fragments: true,
        };

        Ok(vec![DicomPart::FragmentsItem {
          index,
          length,
          big_endian,
          bytes: header_bytes,
        }])
      }

      DataElementHeader {
        tag,
        vr: None,
        length: ValueLength::ZERO,
      } if tag == dictionary::SEQUENCE_DELIMITATION_ITEM.tag => {
        self
          .location
          .end_fragments()
          .map_err(|details| self.data_invalid(details))?;

        self.next_action = NextAction::ReadDataElementHeader;

        Ok(vec![DicomPart::FragmentsDelimitation {
          big_endian,
          bytes: header_bytes,
        }])
      }

      header => Err(self.data_invalid(format!(
        "Invalid data element '{}' in encapsulated pixel data",
        header
      ))),
    }
  }

  /// Reads a chunk of bytes that isn't parsed as data elements: either the
  /// raw deflated bytes of a deflated transfer syntax, or the opaque bytes
  /// of an unrecognized transfer syntax.
  ///
  fn read_raw_chunk(
    &mut self,
    is_unknown: bool,
  ) -> Result<Vec<DicomPart>, P10Error> {
    let available = std::cmp::min(
      self.stream.bytes_available(),
      u64::from(self.config.max_part_size),
    );

    if available == 0 {
      if self.stream.is_writing_finished() {
        self.next_action = NextAction::Complete;
        return Ok(vec![]);
      }

      return Err(P10Error::DataRequired {
        when: "Reading raw chunk".to_string(),
      });
    }

    let data = self
      .stream
      .read(available as usize)
      .map_err(|e| self.map_byte_stream_error(e, "Reading raw chunk"))?;

    let big_endian = self.transfer_syntax.is_big_endian();

    let part = if is_unknown {
      DicomPart::Unknown { big_endian, data }
    } else {
      DicomPart::DeflatedChunk { big_endian, data }
    };

    Ok(vec![part])
  }

  /// Returns the transfer syntax that should be used to decode the current
  /// data. This will always be the transfer syntax specified in the File
  /// Meta Information, except when an enclosing UN sequence has forced
  /// 'Implicit VR Little Endian'. Ref: DICOM CP-246.
  ///
  fn active_transfer_syntax(&self) -> &'static TransferSyntax {
    if self.location.is_implicit_vr_forced() {
      &transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN
    } else {
      self.transfer_syntax
    }
  }

  /// Checks that the specified data element tag is greater than the
  /// previous one at the current P10 location, when enabled by config.
  ///
  fn check_data_element_ordering(
    &mut self,
    header: &DataElementHeader,
  ) -> Result<(), P10Error> {
    if !self.config.require_ordered_data_elements {
      return Ok(());
    }

    self
      .location
      .check_data_element_ordering(header.tag)
      .map_err(|_| P10Error::DataInvalid {
        when: "Reading data element header".to_string(),
        details: format!("Data element '{}' is not in ascending order", header),
        path: self.path.clone(),
        offset: self.stream.bytes_read(),
      })
  }

  fn data_invalid(&self, details: String) -> P10Error {
    P10Error::DataInvalid {
      when: "Reading data element header".to_string(),
      details,
      path: self.path.clone(),
      offset: self.stream.bytes_read(),
    }
  }

  /// Takes an error from the byte stream and maps it through to a P10
  /// error.
  ///
  fn map_byte_stream_error(
    &self,
    error: ByteStreamError,
    when: &str,
  ) -> P10Error {
    let offset = self.stream.bytes_read();

    match error {
      ByteStreamError::DataRequired => P10Error::DataRequired {
        when: when.to_string(),
      },

      ByteStreamError::DataEnd => P10Error::DataEndedUnexpectedly {
        when: when.to_string(),
        path: self.path.clone(),
        offset,
      },

      ByteStreamError::ZlibDataError => P10Error::DataInvalid {
        when: when.to_string(),
        details: "Zlib data is invalid".to_string(),
        path: self.path.clone(),
        offset,
      },

      ByteStreamError::WriteAfterCompletion => P10Error::WriteAfterCompletion,
    }
  }
}

impl Default for P10ReadContext {
  fn default() -> Self {
    Self::new(None)
  }
}
