#[cfg(test)]
mod tests {
  const RNG_SEED: u64 = 1023;

  use std::io::Read;

  use rand::rngs::SmallRng;
  use rand::{Rng, SeedableRng};

  use dcmstream_core::element_set::person_name::PersonNameComponents;
  use dcmstream_core::*;
  use dcmstream_flows::*;
  use dcmstream_p10::*;

  /// Parses a complete in-memory byte vector into its DICOM parts.
  ///
  fn parse_bytes(bytes: &[u8]) -> Vec<DicomPart> {
    let mut context = P10ReadContext::new(None);
    context.write_bytes(bytes.to_vec().into(), true).unwrap();

    let mut parts = vec![];
    while !context.is_complete() {
      parts.extend(context.read_parts().unwrap());
    }

    parts
  }

  /// Runs a list of parts through a flow, including the stream markers the
  /// transform adds around them.
  ///
  fn run_flow(
    flow: impl DicomFlow<Out = DicomPart>,
    parts: &[DicomPart],
  ) -> Vec<DicomPart> {
    let mut transform = create(flow);

    let mut output = transform.add_parts(parts).unwrap();
    output.extend(transform.finish().unwrap());

    output
  }

  /// Materializes a list of parts into an in-memory data set.
  ///
  fn build_elements(parts: &[DicomPart]) -> Elements {
    let mut builder = ElementsBuilder::new();

    for part in parts {
      builder.add_part(part).unwrap();
    }

    builder.end();
    builder.final_elements().unwrap()
  }

  /// Returns the 128-byte File Preamble plus the "DICM" prefix.
  ///
  fn preamble_bytes() -> Vec<u8> {
    let mut bytes = vec![0u8; 132];
    bytes[128..132].copy_from_slice(b"DICM");
    bytes
  }

  /// Encodes a complete data element in the explicit VR little endian 8-byte
  /// header form.
  ///
  fn short_element(
    group: u16,
    element: u16,
    vr: &[u8; 2],
    value: &[u8],
  ) -> Vec<u8> {
    let mut bytes = vec![];
    bytes.extend_from_slice(&group.to_le_bytes());
    bytes.extend_from_slice(&element.to_le_bytes());
    bytes.extend_from_slice(vr);
    bytes.extend_from_slice(&(value.len() as u16).to_le_bytes());
    bytes.extend_from_slice(value);
    bytes
  }

  /// Encodes an explicit VR little endian 12-byte header.
  ///
  fn long_header(
    group: u16,
    element: u16,
    vr: &[u8; 2],
    length: u32,
  ) -> Vec<u8> {
    let mut bytes = vec![];
    bytes.extend_from_slice(&group.to_le_bytes());
    bytes.extend_from_slice(&element.to_le_bytes());
    bytes.extend_from_slice(vr);
    bytes.extend_from_slice(&[0, 0]);
    bytes.extend_from_slice(&length.to_le_bytes());
    bytes
  }

  /// Encodes an implicit-form little endian header, as used by items and
  /// delimitation items.
  ///
  fn implicit_header(group: u16, element: u16, length: u32) -> Vec<u8> {
    let mut bytes = vec![];
    bytes.extend_from_slice(&group.to_le_bytes());
    bytes.extend_from_slice(&element.to_le_bytes());
    bytes.extend_from_slice(&length.to_le_bytes());
    bytes
  }

  fn item_header(length: u32) -> Vec<u8> {
    implicit_header(0xFFFE, 0xE000, length)
  }

  fn data_element_header(
    tag: DataElementTag,
    vr: ValueRepresentation,
    length: u32,
    is_fmi: bool,
    bytes: Vec<u8>,
  ) -> DicomPart {
    DicomPart::DataElementHeader {
      tag,
      vr,
      length: ValueLength::new(length),
      is_fmi,
      big_endian: false,
      explicit_vr: true,
      bytes: bytes.into(),
    }
  }

  fn value_chunk(data: &[u8]) -> DicomPart {
    DicomPart::DataElementValueChunk {
      big_endian: false,
      data: data.to_vec().into(),
      last: true,
    }
  }

  /// The data set used by the round trip, jittered read, and deflate tests.
  ///
  fn test_data_set() -> Elements {
    let nested = Elements::new().set(ElementSet::Value(
      ValueElement::new_long_string(dictionary::PATIENT_ID.tag, &["pid-1"])
        .unwrap(),
    ));

    Elements::new()
      .set(ElementSet::Value(
        ValueElement::new(
          dictionary::STUDY_DATE.tag,
          ValueRepresentation::Date,
          b"20041230".to_vec().into(),
        )
        .unwrap(),
      ))
      .set(ElementSet::Value(
        ValueElement::new(
          dictionary::PATIENT_NAME.tag,
          ValueRepresentation::PersonName,
          b"John^Doe".to_vec().into(),
        )
        .unwrap(),
      ))
      .set_sequence(Sequence::new(
        dictionary::DERIVATION_CODE_SEQUENCE.tag,
        vec![element_set::sequence::Item::new(nested)],
      ))
      .set(ElementSet::Fragments(Fragments::new(
        dictionary::PIXEL_DATA.tag,
        ValueRepresentation::OtherByteString,
        Some(vec![0, 4]),
        vec![
          Fragment {
            bytes: vec![1, 2, 3, 4].into(),
          },
          Fragment {
            bytes: vec![5, 6, 7, 8].into(),
          },
        ],
      )))
  }

  /// The File Preamble, File Meta Information, and one data element parse
  /// into the expected sequence of parts. The declared group length is
  /// smaller than the actual File Meta Information, which is tolerated
  /// outside of strict mode.
  ///
  #[test]
  fn reads_preamble_fmi_and_data_set_test() {
    let group_length = short_element(0x0002, 0x0000, b"UL", &[0x14, 0, 0, 0]);
    let transfer_syntax =
      short_element(0x0002, 0x0010, b"UI", b"1.2.840.10008.1.2.1\0");
    let patient_name = short_element(0x0010, 0x0010, b"PN", b"John^Doe");

    let mut input = preamble_bytes();
    input.extend(&group_length);
    input.extend(&transfer_syntax);
    input.extend(&patient_name);

    let parts = parse_bytes(&input);

    assert_eq!(
      parts,
      vec![
        DicomPart::FilePreamble {
          bytes: preamble_bytes().into()
        },
        data_element_header(
          dictionary::FILE_META_INFORMATION_GROUP_LENGTH.tag,
          ValueRepresentation::UnsignedLong,
          4,
          true,
          group_length[..8].to_vec(),
        ),
        value_chunk(&[0x14, 0, 0, 0]),
        data_element_header(
          dictionary::TRANSFER_SYNTAX_UID.tag,
          ValueRepresentation::UniqueIdentifier,
          20,
          true,
          transfer_syntax[..8].to_vec(),
        ),
        value_chunk(b"1.2.840.10008.1.2.1\0"),
        data_element_header(
          dictionary::PATIENT_NAME.tag,
          ValueRepresentation::PersonName,
          8,
          false,
          patient_name[..8].to_vec(),
        ),
        value_chunk(b"John^Doe"),
      ]
    );
  }

  /// A determinate-length sequence holding a determinate-length item and an
  /// indeterminate-length item receives synthesized delimitations for the
  /// containers that have none on the wire, while the real item delimitation
  /// passes through.
  ///
  #[test]
  fn synthesizes_delimitations_for_determinate_sequence_test() {
    let sequence_header = long_header(0x0008, 0x9215, b"SQ", 0x38);
    let item_1_header = item_header(0x10);
    let date_element = short_element(0x0008, 0x0020, b"DA", b"20041230");
    let item_2_header = item_header(0xFFFFFFFF);
    let item_delimitation = implicit_header(0xFFFE, 0xE00D, 0);

    let mut input = vec![];
    input.extend(&sequence_header);
    input.extend(&item_1_header);
    input.extend(&date_element);
    input.extend(&item_2_header);
    input.extend(&date_element);
    input.extend(&item_delimitation);

    let parts = parse_bytes(&input);

    let mut output =
      run_flow(GuaranteedDelimitationEvents::new(IdentityFlow), &parts);
    output.retain(|part| !part.is_marker());

    assert_eq!(
      output,
      vec![
        DicomPart::SequenceStart {
          tag: dictionary::DERIVATION_CODE_SEQUENCE.tag,
          length: ValueLength::new(0x38),
          big_endian: false,
          explicit_vr: true,
          bytes: sequence_header.into(),
        },
        DicomPart::SequenceItemStart {
          index: 1,
          length: ValueLength::new(0x10),
          big_endian: false,
          bytes: item_1_header.into(),
        },
        data_element_header(
          dictionary::STUDY_DATE.tag,
          ValueRepresentation::Date,
          8,
          false,
          date_element[..8].to_vec(),
        ),
        value_chunk(b"20041230"),
        part::synthetic_item_delimitation(1, false),
        DicomPart::SequenceItemStart {
          index: 2,
          length: ValueLength::Undefined,
          big_endian: false,
          bytes: item_2_header.into(),
        },
        data_element_header(
          dictionary::STUDY_DATE.tag,
          ValueRepresentation::Date,
          8,
          false,
          date_element[..8].to_vec(),
        ),
        value_chunk(b"20041230"),
        DicomPart::SequenceItemDelimitation {
          index: 2,
          big_endian: false,
          bytes: item_delimitation.into(),
        },
        part::synthetic_sequence_delimitation(false),
      ]
    );
  }

  /// Encapsulated pixel data materializes with its basic offset table, and
  /// the frame iterator slices frames at the offset table boundaries rather
  /// than at fragment boundaries.
  ///
  #[test]
  fn reads_encapsulated_pixel_data_test() {
    let mut input = long_header(0x7FE0, 0x0010, b"OW", 0xFFFFFFFF);
    input.extend(item_header(8));
    input.extend(&[0, 0, 0, 0, 6, 0, 0, 0]);
    input.extend(item_header(4));
    input.extend(&[1, 2, 3, 4]);
    input.extend(item_header(4));
    input.extend(&[5, 6, 7, 8]);
    input.extend(implicit_header(0xFFFE, 0xE0DD, 0));

    let elements = build_elements(&parse_bytes(&input));

    let fragments = elements
      .get(dictionary::PIXEL_DATA.tag)
      .unwrap()
      .fragments()
      .unwrap();

    assert_eq!(fragments.offsets, Some(vec![0, 6]));
    assert_eq!(fragments.fragments.len(), 2);

    let frames: Vec<Vec<u8>> = fragments.frame_iterator().collect();
    assert_eq!(frames, vec![vec![1, 2, 3, 4, 5, 6], vec![7, 8]]);
  }

  /// An ISO 2022 encoded person name transcodes to UTF-8 and the specific
  /// character set is rewritten to ISO_IR 192.
  ///
  #[test]
  fn transcodes_stream_to_utf8_test() {
    let name_bytes = [
      0xD4, 0xCF, 0xC0, 0xDE, 0x5E, 0xC0, 0xDB, 0xB3, 0x3D, 0x1B, 0x24, 0x42,
      0x3B, 0x33, 0x45, 0x44, 0x1B, 0x28, 0x42, 0x5E, 0x1B, 0x24, 0x42, 0x42,
      0x40, 0x4F, 0x3A, 0x1B, 0x28, 0x42, 0x3D, 0x1B, 0x24, 0x42, 0x24, 0x64,
      0x24, 0x5E, 0x24, 0x40, 0x1B, 0x28, 0x42, 0x5E, 0x1B, 0x24, 0x42, 0x24,
      0x3F, 0x24, 0x6D, 0x24, 0x26, 0x1B, 0x28, 0x42,
    ];

    let mut input = short_element(
      0x0008,
      0x0005,
      b"CS",
      b"ISO 2022 IR 13\\ISO 2022 IR 87 ",
    );
    input.extend(short_element(0x0010, 0x0010, b"PN", &name_bytes));

    let mut output = run_flow(to_utf8_flow(), &parse_bytes(&input));
    output.retain(|part| !part.is_marker());

    let elements = build_elements(&output);

    assert_eq!(
      elements.get_strings(dictionary::SPECIFIC_CHARACTER_SET.tag),
      vec!["ISO_IR 192".to_string()]
    );

    assert_eq!(
      elements.get_single_person_name(dictionary::PATIENT_NAME.tag),
      Some(StructuredPersonName {
        alphabetic: Some(PersonNameComponents {
          family_name: "ﾔﾏﾀﾞ".to_string(),
          given_name: "ﾀﾛｳ".to_string(),
          ..Default::default()
        }),
        ideographic: Some(PersonNameComponents {
          family_name: "山田".to_string(),
          given_name: "太郎".to_string(),
          ..Default::default()
        }),
        phonetic: Some(PersonNameComponents {
          family_name: "やまだ".to_string(),
          given_name: "たろう".to_string(),
          ..Default::default()
        }),
      })
    );

    // A second pass over the already transcoded stream changes nothing
    assert_eq!(
      build_elements(&run_flow(to_utf8_flow(), &output)),
      elements
    );
  }

  /// An incorrect File Meta Information group length is replaced with the
  /// true byte length of the FMI data elements that follow it.
  ///
  #[test]
  fn recomputes_fmi_group_length_test() {
    let mut input = preamble_bytes();
    input.extend(short_element(0x0002, 0x0000, b"UL", &[0x14, 0, 0, 0]));
    input
      .extend(short_element(0x0002, 0x0010, b"UI", b"1.2.840.10008.1.2.1\0"));
    input.extend(short_element(0x0010, 0x0010, b"PN", b"John^Doe"));

    let mut output = run_flow(fmi_group_length_flow(), &parse_bytes(&input));
    output.retain(|part| !part.is_marker());

    // The corrected group length element follows the preamble. The transfer
    // syntax UID element is 8 header bytes plus a 20-byte value.
    match &output[1..3] {
      [DicomPart::DataElementHeader { tag, .. }, DicomPart::DataElementValueChunk { data, .. }] =>
      {
        assert_eq!(*tag, dictionary::FILE_META_INFORMATION_GROUP_LENGTH.tag);
        assert_eq!(&**data, &[28, 0, 0, 0]);
      }

      parts => panic!("Unexpected parts: {parts:?}"),
    }
  }

  /// A data set round trips through the canonical indeterminate-length
  /// encoding, and a second cycle through that encoding changes nothing.
  ///
  #[test]
  fn data_set_round_trips_through_canonical_encoding_test() {
    let original = test_data_set();

    let bytes = original.to_p10_bytes(None).unwrap();
    assert!(is_valid_bytes(&bytes));

    let reread = Elements::read_p10_bytes(bytes.into()).unwrap();

    assert_eq!(
      reread.filter_tags(|tag| !tag.is_file_meta_information()),
      original
    );

    // The regenerated File Meta Information declares the canonical transfer
    // syntax
    assert_eq!(
      reread.get_strings(dictionary::TRANSFER_SYNTAX_UID.tag),
      vec!["1.2.840.10008.1.2.1".to_string()]
    );

    let reread_again =
      Elements::read_p10_bytes(reread.to_p10_bytes(None).unwrap().into())
        .unwrap();

    assert_eq!(reread_again, reread);
  }

  /// Every sequence, item, and fragments start in a delimitation-guaranteed
  /// part stream is closed by a matching delimitation at the same nesting
  /// depth.
  ///
  #[test]
  fn delimitation_events_balance_test() {
    let bytes = test_data_set().to_p10_bytes(None).unwrap();

    let output = run_flow(
      GuaranteedDelimitationEvents::new(IdentityFlow),
      &parse_bytes(&bytes),
    );

    let mut depth = 0i64;
    for part in &output {
      match part {
        DicomPart::SequenceStart { .. }
        | DicomPart::SequenceItemStart { .. }
        | DicomPart::FragmentsStart { .. } => depth += 1,

        DicomPart::SequenceDelimitation { .. }
        | DicomPart::SequenceItemDelimitation { .. }
        | DicomPart::FragmentsDelimitation { .. } => {
          depth -= 1;
          assert!(depth >= 0);
        }

        _ => (),
      }
    }

    assert_eq!(depth, 0);
  }

  /// Reading a stream in chunks of any size produces the same data set as
  /// reading it in one piece, regardless of where the chunk boundaries fall.
  ///
  #[test]
  fn jittered_read_matches_complete_read_test() {
    let bytes = test_data_set().to_p10_bytes(None).unwrap();

    let complete = read_bytes(bytes.clone().into()).unwrap();

    assert_eq!(jittered_read(&bytes, &mut || 15), complete);

    let mut rng = SmallRng::seed_from_u64(RNG_SEED);
    assert_eq!(
      jittered_read(&bytes, &mut || rng.gen_range(1..256)),
      complete
    );
  }

  fn jittered_read(
    bytes: &[u8],
    next_chunk_size: &mut impl FnMut() -> usize,
  ) -> Elements {
    let mut cursor = std::io::Cursor::new(bytes);

    let mut context = P10ReadContext::new(None);
    let mut builder = ElementsBuilder::new();

    while !context.is_complete() {
      match context.read_parts() {
        Ok(parts) => {
          for part in parts {
            builder.add_part(&part).unwrap();
          }
        }

        Err(P10Error::DataRequired { .. }) => {
          let mut buffer = vec![0u8; next_chunk_size()];

          match cursor.read(&mut buffer).unwrap() {
            0 => context.write_bytes(RcByteSlice::empty(), true).unwrap(),

            bytes_count => {
              buffer.resize(bytes_count, 0);
              context.write_bytes(buffer.into(), false).unwrap();
            }
          }
        }

        Err(e) => panic!("Jittered read failed: {e}"),
      }
    }

    builder.end();
    builder.final_elements().unwrap()
  }

  /// A data set deflated by the deflating flow reads back transparently when
  /// inflation is enabled, and arrives as raw deflated chunks when it isn't.
  ///
  #[test]
  fn deflates_and_inflates_data_set_test() {
    let elements = test_data_set().set(ElementSet::Value(
      ValueElement::new_unique_identifier(
        dictionary::TRANSFER_SYNTAX_UID.tag,
        &[transfer_syntax::DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN.uid],
      )
      .unwrap(),
    ));

    let mut parts: Vec<DicomPart> = vec![];
    p10_write::elements_to_p10_parts(
      &elements,
      &P10WriteConfig::default(),
      &mut |part: &DicomPart| -> Result<(), P10Error> {
        parts.push(part.clone());
        Ok(())
      },
    )
    .unwrap();

    let deflated_parts = run_flow(deflate_dataset_flow(6), &parts);
    assert!(deflated_parts
      .iter()
      .any(|part| matches!(part, DicomPart::DeflatedChunk { .. })));

    let bytes = p10_write::parts_to_bytes(&deflated_parts).unwrap();

    // Transparent inflation on read restores the original data set
    let reread = read_bytes(bytes.clone().into()).unwrap();
    assert_eq!(
      reread.filter_tags(|tag| !tag.is_file_meta_information()),
      test_data_set()
    );

    // Without inflation the data set arrives as raw deflated chunks
    let mut context = P10ReadContext::new(None);
    context.write_bytes(bytes.into(), true).unwrap();

    let mut raw_parts = vec![];
    while !context.is_complete() {
      raw_parts.extend(context.read_parts().unwrap());
    }

    assert!(raw_parts
      .iter()
      .any(|part| matches!(part, DicomPart::DeflatedChunk { .. })));
    assert!(!raw_parts
      .iter()
      .any(|part| matches!(part, DicomPart::DataElementHeader { is_fmi: false, .. })));
  }

  /// A zero-length value emits exactly one empty value chunk with `last`
  /// set.
  ///
  #[test]
  fn zero_length_value_emits_single_empty_last_chunk_test() {
    let input = short_element(0x0010, 0x0010, b"PN", b"");

    let parts = parse_bytes(&input);

    assert_eq!(parts.len(), 2);
    assert_eq!(parts[1], value_chunk(b""));
  }

  /// An empty determinate-length sequence receives a synthesized sequence
  /// delimitation and contains no items.
  ///
  #[test]
  fn empty_sequence_test() {
    let sequence_header = long_header(0x0008, 0x9215, b"SQ", 0);

    let parts = parse_bytes(&sequence_header);

    let mut output =
      run_flow(GuaranteedDelimitationEvents::new(IdentityFlow), &parts);
    output.retain(|part| !part.is_marker());

    assert_eq!(
      output,
      vec![
        DicomPart::SequenceStart {
          tag: dictionary::DERIVATION_CODE_SEQUENCE.tag,
          length: ValueLength::ZERO,
          big_endian: false,
          explicit_vr: true,
          bytes: sequence_header.into(),
        },
        part::synthetic_sequence_delimitation(false),
      ]
    );

    let elements = build_elements(&output);
    let sequence = elements
      .get(dictionary::DERIVATION_CODE_SEQUENCE.tag)
      .unwrap()
      .sequence()
      .unwrap();

    assert_eq!(sequence.item_count(), 0);
  }
}
