//! Flow that validates a stream's SOP class and transfer syntax
//! combination.

use dcmstream_core::{dictionary, DataElementTag};
use dcmstream_p10::{DicomPart, P10Error};

use crate::DicomFlow;

/// A SOP class UID and transfer syntax UID pair that a stream is allowed to
/// use.
///
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationContext {
  pub sop_class_uid: String,
  pub transfer_syntax_uid: String,
}

/// Flow that captures the stream's SOP class UID (from *'(0002,0002) Media
/// Storage SOP Class UID'* or *'(0008,0016) SOP Class UID'*) and its
/// *'(0002,0010) Transfer Syntax UID'*, and fails the stream once both are
/// known unless their combination is in the allowed set. Parts pass through
/// unchanged until the validation fails.
///
/// A stream that ends without declaring both values also fails validation.
///
pub struct ValidateContextFlow {
  contexts: Vec<ValidationContext>,
  capturing_tag: Option<DataElementTag>,
  captured_bytes: Vec<u8>,
  sop_class_uid: Option<String>,
  transfer_syntax_uid: Option<String>,
  is_validated: bool,
}

/// Creates a new [`ValidateContextFlow`] allowing the given contexts.
///
pub fn validate_context_flow(
  contexts: Vec<ValidationContext>,
) -> ValidateContextFlow {
  ValidateContextFlow {
    contexts,
    capturing_tag: None,
    captured_bytes: vec![],
    sop_class_uid: None,
    transfer_syntax_uid: None,
    is_validated: false,
  }
}

impl ValidateContextFlow {
  /// Checks the captured UID pair against the allowed contexts once both
  /// have been seen.
  ///
  fn validate(&mut self) -> Result<(), P10Error> {
    if self.is_validated {
      return Ok(());
    }

    let (Some(sop_class_uid), Some(transfer_syntax_uid)) =
      (&self.sop_class_uid, &self.transfer_syntax_uid)
    else {
      return Ok(());
    };

    let is_allowed = self.contexts.iter().any(|context| {
      context.sop_class_uid == *sop_class_uid
        && context.transfer_syntax_uid == *transfer_syntax_uid
    });

    if !is_allowed {
      return Err(P10Error::ContextValidationFailed {
        details: format!(
          "The combination of SOP class '{}' and transfer syntax '{}' is \
           not in the accepted presentation contexts",
          sop_class_uid, transfer_syntax_uid
        ),
      });
    }

    self.is_validated = true;

    Ok(())
  }

  fn store_captured_value(&mut self) {
    let value = String::from_utf8_lossy(&self.captured_bytes)
      .trim_end_matches(['\0', ' '])
      .to_string();

    match self.capturing_tag {
      Some(tag) if tag == dictionary::TRANSFER_SYNTAX_UID.tag => {
        self.transfer_syntax_uid = Some(value);
      }

      Some(_) => {
        self.sop_class_uid = Some(value);
      }

      None => (),
    }

    self.capturing_tag = None;
    self.captured_bytes.clear();
  }
}

impl DicomFlow for ValidateContextFlow {
  type Out = DicomPart;

  fn on_part(&mut self, part: &DicomPart) -> Result<Vec<DicomPart>, P10Error> {
    match part {
      DicomPart::DataElementHeader { tag, .. }
        if *tag == dictionary::TRANSFER_SYNTAX_UID.tag
          || *tag == dictionary::MEDIA_STORAGE_SOP_CLASS_UID.tag
          || *tag == dictionary::SOP_CLASS_UID.tag =>
      {
        self.capturing_tag = Some(*tag);
        self.captured_bytes.clear();
      }

      DicomPart::DataElementValueChunk { data, last, .. }
        if self.capturing_tag.is_some() =>
      {
        self.captured_bytes.extend_from_slice(data);

        if *last {
          self.store_captured_value();
          self.validate()?;
        }
      }

      DicomPart::EndMarker => {
        if !self.is_validated {
          return Err(P10Error::ContextValidationFailed {
            details: "The stream ended before both a SOP class UID and a \
                      transfer syntax UID were seen"
              .to_string(),
          });
        }
      }

      _ => (),
    }

    Ok(vec![part.clone()])
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::flow::create;

  use dcmstream_core::ValueRepresentation;
  use dcmstream_p10::ValueLength;

  fn uid_parts(tag: DataElementTag, uid: &str) -> Vec<DicomPart> {
    vec![
      DicomPart::DataElementHeader {
        tag,
        vr: ValueRepresentation::UniqueIdentifier,
        length: ValueLength::new(uid.len() as u32),
        is_fmi: tag.is_file_meta_information(),
        big_endian: false,
        explicit_vr: true,
        bytes: vec![0; 8].into(),
      },
      DicomPart::DataElementValueChunk {
        big_endian: false,
        data: uid.as_bytes().to_vec().into(),
        last: true,
      },
    ]
  }

  #[test]
  fn accepts_allowed_context_test() {
    let mut transform = create(validate_context_flow(vec![ValidationContext {
      sop_class_uid: "1.2.840.10008.5.1.4.1.1.2".to_string(),
      transfer_syntax_uid: "1.2.840.10008.1.2.1".to_string(),
    }]));

    for part in uid_parts(
      dictionary::MEDIA_STORAGE_SOP_CLASS_UID.tag,
      "1.2.840.10008.5.1.4.1.1.2",
    ) {
      transform.add_part(&part).unwrap();
    }

    for part in
      uid_parts(dictionary::TRANSFER_SYNTAX_UID.tag, "1.2.840.10008.1.2.1")
    {
      transform.add_part(&part).unwrap();
    }

    assert!(transform.finish().is_ok());
  }

  #[test]
  fn rejects_disallowed_context_test() {
    let mut transform = create(validate_context_flow(vec![ValidationContext {
      sop_class_uid: "1.2.840.10008.5.1.4.1.1.2".to_string(),
      transfer_syntax_uid: "1.2.840.10008.1.2.1".to_string(),
    }]));

    for part in uid_parts(
      dictionary::MEDIA_STORAGE_SOP_CLASS_UID.tag,
      "1.2.840.10008.5.1.4.1.1.2",
    ) {
      transform.add_part(&part).unwrap();
    }

    let mut result = Ok(vec![]);
    for part in
      uid_parts(dictionary::TRANSFER_SYNTAX_UID.tag, "1.2.840.10008.1.2")
    {
      result = transform.add_part(&part);
    }

    assert!(matches!(
      result,
      Err(P10Error::ContextValidationFailed { .. })
    ));
  }
}
