//! Flow that transcodes string values to UTF-8.

use dcmstream_character_set::{SpecificCharacterSet, StringType};
use dcmstream_core::transfer_syntax::Endianness;
use dcmstream_core::{dictionary, RcByteSlice, TagPath, ValueRepresentation};
use dcmstream_p10::internal::data_element_header::DataElementHeader;
use dcmstream_p10::{DicomPart, P10Error, ValueLength};

use crate::{DicomFlow, GuaranteedDelimitationEvents, GuaranteedValueEvent};

/// The transcoding half of [`to_utf8_flow`].
///
/// Values whose VR is subject to the specific character set are buffered in
/// full, decoded using the active character set stack, and re-emitted as
/// UTF-8 with an updated value length. The *'(0008,0005) Specific Character
/// Set'* data element itself updates the active stack and is rewritten to
/// `"ISO_IR 192"`. A character set declared inside a sequence item applies
/// only within that item.
///
/// Values of VRs that use the default repertoire (`CS`, `AE`, `AS`, `DA`,
/// `DS`, `DT`, `IS`, `TM`, `UI`, `UR`) and all binary VRs pass through
/// unchanged.
///
struct Utf8Transcoder {
  charset_stack: Vec<SpecificCharacterSet>,
  pending_value: Option<PendingValue>,
}

struct PendingValue {
  tag: dcmstream_core::DataElementTag,
  vr: ValueRepresentation,
  is_fmi: bool,
  big_endian: bool,
  explicit_vr: bool,
  data: Vec<RcByteSlice>,
}

impl Utf8Transcoder {
  fn new() -> Self {
    Self {
      charset_stack: vec![SpecificCharacterSet::default()],
      pending_value: None,
    }
  }

  fn active_charset(&self) -> &SpecificCharacterSet {
    self.charset_stack.last().unwrap()
  }

  /// Transcodes a fully buffered value and emits its rewritten header and
  /// value chunk.
  ///
  fn finish_pending_value(
    &mut self,
    pending: PendingValue,
  ) -> Result<Vec<DicomPart>, P10Error> {
    let mut bytes = Vec::new();
    for chunk in pending.data.iter() {
      bytes.extend_from_slice(chunk);
    }

    let new_bytes: Vec<u8> =
      if pending.tag == dictionary::SPECIFIC_CHARACTER_SET.tag {
        let term = String::from_utf8_lossy(&bytes);

        let charsets = SpecificCharacterSet::from_string(&term).map_err(
          |details| P10Error::DataInvalid {
            when: "Decoding Specific Character Set".to_string(),
            details,
            path: TagPath::from_tag(pending.tag),
            offset: 0,
          },
        )?;

        *self.charset_stack.last_mut().unwrap() = charsets;

        b"ISO_IR 192".to_vec()
      } else {
        let string_type = string_type_for_vr(pending.vr);

        let mut decoded = self
          .active_charset()
          .decode_bytes(&bytes, string_type)
          .into_bytes();

        pending.vr.pad_bytes_to_even_length(&mut decoded);

        decoded
      };

    let endianness = if pending.big_endian {
      Endianness::BigEndian
    } else {
      Endianness::LittleEndian
    };

    let header = DataElementHeader {
      tag: pending.tag,
      vr: pending.explicit_vr.then_some(pending.vr),
      length: ValueLength::new(new_bytes.len() as u32),
    };

    let header_bytes =
      header
        .to_bytes(endianness)
        .map_err(|_| P10Error::DataInvalid {
          when: "Transcoding value to UTF-8".to_string(),
          details: format!(
            "Length of {} bytes exceeds the maximum for VR {} after \
             conversion to UTF-8",
            new_bytes.len(),
            pending.vr
          ),
          path: TagPath::from_tag(pending.tag),
          offset: 0,
        })?;

    Ok(vec![
      DicomPart::DataElementHeader {
        tag: pending.tag,
        vr: pending.vr,
        length: ValueLength::new(new_bytes.len() as u32),
        is_fmi: pending.is_fmi,
        big_endian: pending.big_endian,
        explicit_vr: pending.explicit_vr,
        bytes: header_bytes.into(),
      },
      DicomPart::DataElementValueChunk {
        big_endian: pending.big_endian,
        data: new_bytes.into(),
        last: true,
      },
    ])
  }
}

impl DicomFlow for Utf8Transcoder {
  type Out = DicomPart;

  fn on_part(&mut self, part: &DicomPart) -> Result<Vec<DicomPart>, P10Error> {
    match part {
      DicomPart::DataElementHeader { tag, vr, .. } => {
        let needs_transcoding = *tag == dictionary::SPECIFIC_CHARACTER_SET.tag
          || (vr.is_encoded_string()
            && !self.active_charset().is_utf8_compatible());

        if !needs_transcoding {
          return Ok(vec![part.clone()]);
        }

        if let DicomPart::DataElementHeader {
          tag,
          vr,
          is_fmi,
          big_endian,
          explicit_vr,
          ..
        } = part
        {
          self.pending_value = Some(PendingValue {
            tag: *tag,
            vr: *vr,
            is_fmi: *is_fmi,
            big_endian: *big_endian,
            explicit_vr: *explicit_vr,
            data: vec![],
          });
        }

        Ok(vec![])
      }

      DicomPart::DataElementValueChunk { data, last, .. } => {
        match self.pending_value.as_mut() {
          Some(pending) => {
            pending.data.push(data.clone());

            if *last {
              let pending = self.pending_value.take().unwrap();
              self.finish_pending_value(pending)
            } else {
              Ok(vec![])
            }
          }

          None => Ok(vec![part.clone()]),
        }
      }

      // A character set declared inside an item applies only within it
      DicomPart::SequenceItemStart { .. } => {
        self.charset_stack.push(self.active_charset().clone());
        Ok(vec![part.clone()])
      }

      DicomPart::SequenceItemDelimitation { .. } => {
        if self.charset_stack.len() > 1 {
          self.charset_stack.pop();
        }

        Ok(vec![part.clone()])
      }

      _ => Ok(vec![part.clone()]),
    }
  }
}

/// Returns the string type that applies to an encoded string VR, which
/// determines its delimiter characters during decoding.
///
fn string_type_for_vr(vr: ValueRepresentation) -> StringType {
  match vr {
    ValueRepresentation::PersonName => StringType::PersonName,

    ValueRepresentation::LongString
    | ValueRepresentation::ShortString
    | ValueRepresentation::UnlimitedCharacters => StringType::MultiValue,

    _ => StringType::SingleValue,
  }
}

/// Creates a flow that transcodes all string values subject to the specific
/// character set into UTF-8, rewriting the *'(0008,0005) Specific Character
/// Set'* data element to `"ISO_IR 192"`. Streams already encoded in UTF-8
/// pass through unchanged.
///
pub fn to_utf8_flow() -> impl DicomFlow<Out = DicomPart> {
  GuaranteedDelimitationEvents::new(GuaranteedValueEvent::new(
    Utf8Transcoder::new(),
  ))
}
