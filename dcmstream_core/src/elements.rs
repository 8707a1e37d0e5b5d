//! An in-memory DICOM data set: an immutable ordered mapping from data
//! element tags to element sets, together with the decoding state that
//! applies to its string and date/time values.

use std::collections::BTreeMap;

use dcmstream_character_set::{SpecificCharacterSet, StringType};

use crate::element_set::sequence::Item;
use crate::{
  dictionary, DataElementTag, ElementSet, Sequence, StructuredDate,
  StructuredDateTime, StructuredPersonName, StructuredTime, TagPath,
  TagPathNode, ValueElement, ValueRepresentation,
};

/// An immutable mapping of data element tags to element sets at one data set
/// level, iterated in ascending tag order. Items of sequences own their own
/// nested `Elements`.
///
/// An `Elements` additionally owns the active character set stack used to
/// decode its string values, and the default time zone applied to its
/// `DateTime` values that don't carry an explicit offset. Both update
/// automatically when the corresponding data elements are inserted.
///
/// All mutating operations return a new `Elements` value, leaving the
/// original untouched.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Elements {
  data: BTreeMap<DataElementTag, ElementSet>,
  character_sets: SpecificCharacterSet,
  zone_offset: Option<i16>,
}

impl Default for Elements {
  fn default() -> Self {
    Self::new()
  }
}

impl Elements {
  /// Returns a new empty data set using the default character repertoire
  /// and no default time zone.
  ///
  pub fn new() -> Self {
    Self {
      data: BTreeMap::new(),
      character_sets: SpecificCharacterSet::default(),
      zone_offset: None,
    }
  }

  /// Returns the number of data elements at this level.
  ///
  pub fn size(&self) -> usize {
    self.data.len()
  }

  /// Returns whether this data set contains no data elements.
  ///
  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  /// Returns whether a data element with the specified tag exists.
  ///
  pub fn has(&self, tag: DataElementTag) -> bool {
    self.data.contains_key(&tag)
  }

  /// Returns the tags at this level, in ascending order.
  ///
  pub fn tags(&self) -> Vec<DataElementTag> {
    self.data.keys().copied().collect()
  }

  /// Returns an iterator over the data elements at this level, in ascending
  /// tag order.
  ///
  pub fn iter(
    &self,
  ) -> std::collections::btree_map::Iter<'_, DataElementTag, ElementSet> {
    self.data.iter()
  }

  /// Returns the active character set stack for this data set.
  ///
  pub fn character_sets(&self) -> &SpecificCharacterSet {
    &self.character_sets
  }

  /// Returns the default time zone offset for this data set, in `±HHMM`
  /// form, e.g. `-500` for UTC-05:00.
  ///
  pub fn zone_offset(&self) -> Option<i16> {
    self.zone_offset
  }

  /// Returns the element set with the specified tag at this level.
  ///
  pub fn get(&self, tag: DataElementTag) -> Option<&ElementSet> {
    self.data.get(&tag)
  }

  /// Returns the element set at the given tag path. The path must consist
  /// of item nodes ending in a plain data element node.
  ///
  pub fn get_at_path(&self, path: &TagPath) -> Option<&ElementSet> {
    let (level, final_tag) = self.level_for_path(path)?;

    level.get(final_tag)
  }

  /// Returns the nested `Elements` of the item at the given tag path. The
  /// path must be empty or end in an item node.
  ///
  pub fn nested_at_path(&self, path: &TagPath) -> Option<&Elements> {
    let mut level = self;

    for node in path.nodes() {
      match node {
        TagPathNode::Item { tag, index } => {
          let sequence = level.get(*tag)?.sequence()?;
          level = &sequence.item(*index)?.elements;
        }
        _ => return None,
      }
    }

    Some(level)
  }

  /// Inserts or replaces an element set at this level, preserving tag
  /// order. Returns the updated data set.
  ///
  pub fn set(&self, element: ElementSet) -> Elements {
    let mut new = self.clone();
    new.insert_in_place(element);
    new
  }

  /// Inserts or replaces the element set at the given tag path. Missing
  /// items and sequences along the path are not created: in that case the
  /// data set is returned unchanged.
  ///
  pub fn set_at_path(&self, path: &TagPath, element: ElementSet) -> Elements {
    let item_nodes: Vec<(DataElementTag, usize)> = match path_item_spine(path)
    {
      Some(spine) => spine,
      None => return self.clone(),
    };

    self.update_nested(&item_nodes, &mut |level| {
      level.set(element.clone())
    })
  }

  /// Inserts or replaces an entire sequence at this level.
  ///
  pub fn set_sequence(&self, sequence: Sequence) -> Elements {
    self.set(ElementSet::Sequence(sequence))
  }

  /// Appends an item to the sequence at the given tag path. The path's
  /// final node must name the sequence. If no sequence exists at the path
  /// then the data set is returned unchanged.
  ///
  pub fn add_item(&self, path: &TagPath, item: Item) -> Elements {
    let mut nodes = path.nodes().to_vec();

    let sequence_tag = match nodes.pop() {
      Some(TagPathNode::Tag { tag }) => tag,
      _ => return self.clone(),
    };

    let item_nodes = match item_spine_of(&nodes) {
      Some(spine) => spine,
      None => return self.clone(),
    };

    self.update_nested(&item_nodes, &mut |level| {
      match level.get(sequence_tag) {
        Some(ElementSet::Sequence(sequence)) => {
          let mut sequence = sequence.clone();
          sequence.items.push(item.clone());
          level.set(ElementSet::Sequence(sequence))
        }
        _ => level.clone(),
      }
    })
  }

  /// Replaces the `Elements` inside the item at the given tag path. The
  /// path must end in an item node; missing items are not created.
  ///
  pub fn set_nested(&self, path: &TagPath, elements: Elements) -> Elements {
    let item_nodes = match item_spine_of(path.nodes()) {
      Some(spine) if !spine.is_empty() => spine,
      _ => return self.clone(),
    };

    let (parent_items, last) = item_nodes.split_at(item_nodes.len() - 1);
    let (sequence_tag, item_index) = last[0];

    self.update_nested(parent_items, &mut |level| {
      match level.get(sequence_tag) {
        Some(ElementSet::Sequence(sequence)) => {
          if item_index == 0 || item_index > sequence.items.len() {
            return level.clone();
          }

          let mut sequence = sequence.clone();
          sequence.items[item_index - 1].elements = elements.clone();
          level.set(ElementSet::Sequence(sequence))
        }
        _ => level.clone(),
      }
    })
  }

  /// Removes the data element with the specified tag at this level. Does
  /// nothing when the tag is absent.
  ///
  pub fn remove(&self, tag: DataElementTag) -> Elements {
    let mut new = self.clone();
    new.data.remove(&tag);
    new
  }

  /// Removes the data element at the given tag path. Does nothing when the
  /// path doesn't name an existing element.
  ///
  pub fn remove_at_path(&self, path: &TagPath) -> Elements {
    let mut nodes = path.nodes().to_vec();

    let final_tag = match nodes.pop() {
      Some(TagPathNode::Tag { tag }) => tag,
      _ => return self.clone(),
    };

    let item_nodes = match item_spine_of(&nodes) {
      Some(spine) => spine,
      None => return self.clone(),
    };

    self.update_nested(&item_nodes, &mut |level| level.remove(final_tag))
  }

  /// Retains only the data elements matching the given predicate.
  ///
  pub fn filter(
    &self,
    predicate: impl Fn(&DataElementTag, &ElementSet) -> bool,
  ) -> Elements {
    let mut new = self.clone();
    new.data.retain(|tag, element| predicate(tag, element));
    new
  }

  /// Retains only the data elements whose tags match the given predicate.
  ///
  pub fn filter_tags(
    &self,
    predicate: impl Fn(&DataElementTag) -> bool,
  ) -> Elements {
    self.filter(|tag, _| predicate(tag))
  }

  /// Returns a new data set containing the File Meta Information data
  /// elements at this level, i.e. those with a group of 0x0002.
  ///
  pub fn file_meta_information(&self) -> Elements {
    self.filter_tags(|tag| tag.is_file_meta_information())
  }

  /// Returns the string values of the data element with the specified tag.
  /// Values in a non-UTF-8 character set are decoded using this data set's
  /// character set stack. Returns an empty list when the tag is absent or
  /// its value can't be decoded as strings.
  ///
  pub fn get_strings(&self, tag: DataElementTag) -> Vec<String> {
    let value = match self.value_element(tag) {
      Some(value) => value,
      None => return vec![],
    };

    if value.vr.is_encoded_string()
      && !self.character_sets.is_utf8_compatible()
    {
      let string_type = string_type_for_vr(value.vr);
      let decoded = self.character_sets.decode_bytes(&value.bytes, string_type);

      return match string_type {
        StringType::SingleValue => vec![decoded],
        _ => decoded.split('\\').map(|s| s.to_string()).collect(),
      };
    }

    match value.vr {
      ValueRepresentation::ApplicationEntity
      | ValueRepresentation::LongText
      | ValueRepresentation::ShortText
      | ValueRepresentation::UniversalResourceIdentifier
      | ValueRepresentation::UnlimitedText => match value.get_string() {
        Ok(s) => vec![s.to_string()],
        Err(_) => vec![],
      },

      _ => match value.get_strings() {
        Ok(strings) => strings.iter().map(|s| s.to_string()).collect(),
        Err(_) => vec![],
      },
    }
  }

  /// Returns the single string value of the data element with the specified
  /// tag, or `None` when it doesn't hold exactly one string.
  ///
  pub fn get_single_string(&self, tag: DataElementTag) -> Option<String> {
    match self.get_strings(tag).as_slice() {
      [s] => Some(s.clone()),
      _ => None,
    }
  }

  /// Returns the 32-bit integer values of the data element with the
  /// specified tag. Returns an empty list on absence or decode failure.
  ///
  pub fn get_ints(&self, tag: DataElementTag) -> Vec<i32> {
    self
      .value_element(tag)
      .and_then(|value| value.get_ints().ok())
      .unwrap_or_default()
  }

  /// Returns the single 32-bit integer value of the data element with the
  /// specified tag.
  ///
  pub fn get_single_int(&self, tag: DataElementTag) -> Option<i32> {
    match self.get_ints(tag).as_slice() {
      [i] => Some(*i),
      _ => None,
    }
  }

  /// Returns the 16-bit integer values of the data element with the
  /// specified tag. Returns an empty list on absence or decode failure.
  ///
  pub fn get_shorts(&self, tag: DataElementTag) -> Vec<i16> {
    self
      .value_element(tag)
      .and_then(|value| value.get_ints().ok())
      .unwrap_or_default()
  }

  /// Returns the single 16-bit integer value of the data element with the
  /// specified tag.
  ///
  pub fn get_single_short(&self, tag: DataElementTag) -> Option<i16> {
    match self.get_shorts(tag).as_slice() {
      [i] => Some(*i),
      _ => None,
    }
  }

  /// Returns the 64-bit integer values of the data element with the
  /// specified tag. Returns an empty list on absence or decode failure.
  ///
  pub fn get_longs(&self, tag: DataElementTag) -> Vec<i64> {
    self
      .value_element(tag)
      .and_then(|value| value.get_ints().ok())
      .unwrap_or_default()
  }

  /// Returns the single 64-bit integer value of the data element with the
  /// specified tag.
  ///
  pub fn get_single_long(&self, tag: DataElementTag) -> Option<i64> {
    match self.get_longs(tag).as_slice() {
      [i] => Some(*i),
      _ => None,
    }
  }

  /// Returns the single precision float values of the data element with the
  /// specified tag. Returns an empty list on absence or decode failure.
  ///
  pub fn get_floats(&self, tag: DataElementTag) -> Vec<f32> {
    self
      .get_doubles(tag)
      .into_iter()
      .map(|f| f as f32)
      .collect()
  }

  /// Returns the single float value of the data element with the specified
  /// tag.
  ///
  pub fn get_single_float(&self, tag: DataElementTag) -> Option<f32> {
    match self.get_floats(tag).as_slice() {
      [f] => Some(*f),
      _ => None,
    }
  }

  /// Returns the double precision float values of the data element with the
  /// specified tag. Returns an empty list on absence or decode failure.
  ///
  pub fn get_doubles(&self, tag: DataElementTag) -> Vec<f64> {
    self
      .value_element(tag)
      .and_then(|value| value.get_floats().ok())
      .unwrap_or_default()
  }

  /// Returns the single double precision float value of the data element
  /// with the specified tag.
  ///
  pub fn get_single_double(&self, tag: DataElementTag) -> Option<f64> {
    match self.get_doubles(tag).as_slice() {
      [f] => Some(*f),
      _ => None,
    }
  }

  /// Returns the dates of the data element with the specified tag. Values
  /// that fail to parse are skipped.
  ///
  pub fn get_dates(&self, tag: DataElementTag) -> Vec<StructuredDate> {
    self
      .value_element(tag)
      .and_then(|value| value.get_dates().ok())
      .unwrap_or_default()
  }

  /// Returns the single date of the data element with the specified tag.
  ///
  pub fn get_single_date(&self, tag: DataElementTag) -> Option<StructuredDate> {
    match self.get_dates(tag).as_slice() {
      [date] => Some(date.clone()),
      _ => None,
    }
  }

  /// Returns the times of the data element with the specified tag. Values
  /// that fail to parse are skipped.
  ///
  pub fn get_times(&self, tag: DataElementTag) -> Vec<StructuredTime> {
    self
      .value_element(tag)
      .and_then(|value| value.get_times().ok())
      .unwrap_or_default()
  }

  /// Returns the single time of the data element with the specified tag.
  ///
  pub fn get_single_time(&self, tag: DataElementTag) -> Option<StructuredTime> {
    match self.get_times(tag).as_slice() {
      [time] => Some(time.clone()),
      _ => None,
    }
  }

  /// Returns the date/times of the data element with the specified tag.
  /// Values without an explicit time zone offset receive this data set's
  /// default zone offset. Values that fail to parse are skipped.
  ///
  pub fn get_date_times(&self, tag: DataElementTag) -> Vec<StructuredDateTime> {
    self
      .value_element(tag)
      .and_then(|value| value.get_date_times().ok())
      .unwrap_or_default()
      .iter()
      .map(|date_time| {
        date_time.with_default_time_zone_offset(self.zone_offset)
      })
      .collect()
  }

  /// Returns the single date/time of the data element with the specified
  /// tag.
  ///
  pub fn get_single_date_time(
    &self,
    tag: DataElementTag,
  ) -> Option<StructuredDateTime> {
    match self.get_date_times(tag).as_slice() {
      [date_time] => Some(date_time.clone()),
      _ => None,
    }
  }

  /// Returns the person names of the data element with the specified tag.
  /// Values in a non-UTF-8 character set are decoded using this data set's
  /// character set stack.
  ///
  pub fn get_person_names(
    &self,
    tag: DataElementTag,
  ) -> Vec<StructuredPersonName> {
    let value = match self.value_element(tag) {
      Some(value) if value.vr == ValueRepresentation::PersonName => value,
      _ => return vec![],
    };

    if self.character_sets.is_utf8_compatible() {
      value.get_person_names().unwrap_or_default()
    } else {
      let decoded = self
        .character_sets
        .decode_bytes(&value.bytes, StringType::PersonName);

      crate::element_set::person_name::from_bytes(decoded.as_bytes())
        .unwrap_or_default()
    }
  }

  /// Returns the single person name of the data element with the specified
  /// tag.
  ///
  pub fn get_single_person_name(
    &self,
    tag: DataElementTag,
  ) -> Option<StructuredPersonName> {
    match self.get_person_names(tag).as_slice() {
      [person_name] => Some(person_name.clone()),
      _ => None,
    }
  }

  /// Returns the URI of the data element with the specified tag, or `None`
  /// on absence or parse failure.
  ///
  pub fn get_uri(&self, tag: DataElementTag) -> Option<String> {
    self
      .value_element(tag)
      .and_then(|value| value.get_uri().ok())
      .map(|uri| uri.to_string())
  }

  /// Converts this data set to a list of printable lines, one per data
  /// element, recursing into sequences. The lines are returned via a
  /// callback.
  ///
  pub fn to_lines(&self, callback: &mut impl FnMut(String)) {
    self.to_lines_at_depth(callback, 0)
  }

  fn to_lines_at_depth(
    &self,
    callback: &mut impl FnMut(String),
    depth: usize,
  ) {
    let indent = "  ".repeat(depth);

    for (tag, element) in self.iter() {
      match element {
        ElementSet::Value(value) => callback(format!(
          "{}{} {} {}: {}",
          indent,
          tag,
          value.vr,
          dictionary::tag_name(*tag),
          value.to_preview_string(76)
        )),

        ElementSet::Sequence(sequence) => {
          callback(format!(
            "{}{} SQ {}: {} items",
            indent,
            tag,
            dictionary::tag_name(*tag),
            sequence.items.len()
          ));

          for item in sequence.items.iter() {
            item.elements.to_lines_at_depth(callback, depth + 1);
          }
        }

        ElementSet::Fragments(fragments) => callback(format!(
          "{}{} {} {}: {} fragments, {} bytes",
          indent,
          tag,
          fragments.vr,
          dictionary::tag_name(*tag),
          fragments.fragments.len(),
          fragments.total_fragment_length()
        )),
      }
    }
  }

  /// Looks up the value element with the given tag at this level.
  ///
  fn value_element(&self, tag: DataElementTag) -> Option<&ValueElement> {
    self.data.get(&tag).and_then(ElementSet::value)
  }

  /// Inserts an element set in place, updating the character set stack and
  /// default zone offset when the relevant data elements are inserted.
  ///
  pub fn insert_in_place(&mut self, element: ElementSet) {
    let tag = element.tag();

    if let ElementSet::Value(value) = &element {
      if tag == dictionary::SPECIFIC_CHARACTER_SET.tag {
        if let Ok(term) = std::str::from_utf8(&value.bytes) {
          if let Ok(charsets) = SpecificCharacterSet::from_string(term) {
            self.character_sets = charsets;
          }
        }
      } else if tag == dictionary::TIMEZONE_OFFSET_FROM_UTC.tag {
        if let Ok(s) = std::str::from_utf8(&value.bytes) {
          self.zone_offset = parse_zone_offset(s.trim());
        }
      }
    }

    self.data.insert(tag, element);
  }

  /// Resolves a tag path to the data set level it addresses and the tag of
  /// its final data element node.
  ///
  fn level_for_path(
    &self,
    path: &TagPath,
  ) -> Option<(&Elements, DataElementTag)> {
    let mut nodes = path.nodes().to_vec();

    let final_tag = match nodes.pop()? {
      TagPathNode::Tag { tag } => tag,
      _ => return None,
    };

    let mut level = self;
    for node in nodes {
      match node {
        TagPathNode::Item { tag, index } => {
          let sequence = level.get(tag)?.sequence()?;
          level = &sequence.item(index)?.elements;
        }
        _ => return None,
      }
    }

    Some((level, final_tag))
  }

  /// Applies an update function to the data set level addressed by the
  /// given item spine, rebuilding the spine of sequences on the way back
  /// up. When the spine doesn't resolve the data set is returned unchanged.
  ///
  fn update_nested(
    &self,
    item_nodes: &[(DataElementTag, usize)],
    update: &mut dyn FnMut(&Elements) -> Elements,
  ) -> Elements {
    match item_nodes {
      [] => update(self),

      [(tag, index), rest @ ..] => match self.get(*tag) {
        Some(ElementSet::Sequence(sequence)) => {
          let item = match sequence.item(*index) {
            Some(item) => item,
            None => return self.clone(),
          };

          let updated_elements = item.elements.update_nested(rest, update);

          let mut sequence = sequence.clone();
          sequence.items[*index - 1].elements = updated_elements;

          self.set(ElementSet::Sequence(sequence))
        }

        _ => self.clone(),
      },
    }
  }
}

impl FromIterator<ElementSet> for Elements {
  fn from_iter<T: IntoIterator<Item = ElementSet>>(iter: T) -> Self {
    let mut elements = Elements::new();

    for element in iter {
      elements.insert_in_place(element);
    }

    elements
  }
}

/// Returns the `(tag, index)` item spine of a path that must consist of
/// item nodes followed by a final data element node.
///
fn path_item_spine(path: &TagPath) -> Option<Vec<(DataElementTag, usize)>> {
  let mut nodes = path.nodes().to_vec();

  match nodes.pop()? {
    TagPathNode::Tag { .. } => item_spine_of(&nodes),
    _ => None,
  }
}

/// Returns the `(tag, index)` pairs of a node list that must consist solely
/// of item nodes.
///
fn item_spine_of(
  nodes: &[TagPathNode],
) -> Option<Vec<(DataElementTag, usize)>> {
  nodes
    .iter()
    .map(|node| match node {
      TagPathNode::Item { tag, index } => Some((*tag, *index)),
      _ => None,
    })
    .collect()
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

/// Parses a `±HHMM` time zone offset string, e.g. `"+0200"`, into its
/// numeric form.
///
fn parse_zone_offset(s: &str) -> Option<i16> {
  if s.len() != 5 {
    return None;
  }

  let sign = match s.as_bytes()[0] {
    b'+' => 1,
    b'-' => -1,
    _ => return None,
  };

  let digits = s[1..].parse::<i16>().ok()?;

  Some(sign * digits)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::element_set::person_name::PersonNameComponents;

  fn patient_name_element() -> ElementSet {
    ElementSet::Value(
      ValueElement::new(
        dictionary::PATIENT_NAME.tag,
        ValueRepresentation::PersonName,
        b"John^Doe".to_vec().into(),
      )
      .unwrap(),
    )
  }

  #[test]
  fn set_and_get_test() {
    let elements = Elements::new().set(patient_name_element());

    assert!(elements.has(dictionary::PATIENT_NAME.tag));

    assert_eq!(
      elements.get_person_names(dictionary::PATIENT_NAME.tag),
      vec![StructuredPersonName {
        alphabetic: Some(PersonNameComponents {
          family_name: "John".to_string(),
          given_name: "Doe".to_string(),
          ..Default::default()
        }),
        ideographic: None,
        phonetic: None
      }]
    );

    // The original value is untouched
    let original = Elements::new();
    let _ = original.set(patient_name_element());
    assert!(original.is_empty());
  }

  #[test]
  fn iteration_order_test() {
    let elements = Elements::new()
      .set(patient_name_element())
      .set(ElementSet::Value(
        ValueElement::new_code_string(dictionary::MODALITY.tag, &["CT"])
          .unwrap(),
      ));

    assert_eq!(
      elements.tags(),
      vec![dictionary::MODALITY.tag, dictionary::PATIENT_NAME.tag]
    );
  }

  #[test]
  fn nested_path_test() {
    let nested =
      Elements::new().set(patient_name_element());

    let sequence = Sequence::new(
      dictionary::DERIVATION_CODE_SEQUENCE.tag,
      vec![Item::new(nested)],
    );

    let elements = Elements::new().set_sequence(sequence);

    let path =
      TagPath::from_item(dictionary::DERIVATION_CODE_SEQUENCE.tag, 1)
        .then_tag(dictionary::PATIENT_NAME.tag)
        .unwrap();

    assert!(elements.get_at_path(&path).is_some());

    // Every element's own path resolves back to the element
    let replacement = ElementSet::Value(
      ValueElement::new(
        dictionary::PATIENT_NAME.tag,
        ValueRepresentation::PersonName,
        b"Jane^Doe".to_vec().into(),
      )
      .unwrap(),
    );

    let updated = elements.set_at_path(&path, replacement.clone());
    assert_eq!(updated.get_at_path(&path), Some(&replacement));

    // Paths through missing items are a no-op
    let missing_path =
      TagPath::from_item(dictionary::DERIVATION_CODE_SEQUENCE.tag, 2)
        .then_tag(dictionary::PATIENT_NAME.tag)
        .unwrap();

    assert_eq!(
      elements.set_at_path(&missing_path, replacement.clone()),
      elements
    );
  }

  #[test]
  fn character_set_adoption_test() {
    let charset_element = ElementSet::Value(
      ValueElement::new_code_string(
        dictionary::SPECIFIC_CHARACTER_SET.tag,
        &["ISO_IR 100"],
      )
      .unwrap(),
    );

    let elements = Elements::new().set(charset_element);

    assert!(!elements.character_sets().is_utf8_compatible());

    // Latin-1 bytes now decode through the adopted character set
    let name_element = ElementSet::Value(ValueElement::new_unchecked(
      dictionary::PATIENT_NAME.tag,
      ValueRepresentation::PersonName,
      vec![0x42, 0x75, 0x63, 0x5E, 0x4A, 0xE9, 0x72, 0xF4, 0x6D, 0x65].into(),
      false,
      true,
    ));

    let elements = elements.set(name_element);

    assert_eq!(
      elements.get_person_names(dictionary::PATIENT_NAME.tag),
      vec![StructuredPersonName {
        alphabetic: Some(PersonNameComponents {
          family_name: "Buc".to_string(),
          given_name: "Jérôme".to_string(),
          ..Default::default()
        }),
        ideographic: None,
        phonetic: None
      }]
    );
  }

  #[test]
  fn zone_offset_adoption_test() {
    let offset_element = ElementSet::Value(
      ValueElement::new_short_string(
        dictionary::TIMEZONE_OFFSET_FROM_UTC.tag,
        &["+0200"],
      )
      .unwrap(),
    );

    let date_time_element = ElementSet::Value(
      ValueElement::new(
        dictionary::ACQUISITION_DATE.tag,
        ValueRepresentation::DateTime,
        b"1997070421".to_vec().into(),
      )
      .unwrap(),
    );

    let elements = Elements::new().set(offset_element).set(date_time_element);

    assert_eq!(elements.zone_offset(), Some(200));

    assert_eq!(
      elements
        .get_single_date_time(dictionary::ACQUISITION_DATE.tag)
        .unwrap()
        .time_zone_offset,
      Some(200)
    );
  }

  #[test]
  fn remove_and_filter_test() {
    let elements = Elements::new()
      .set(patient_name_element())
      .set(ElementSet::Value(
        ValueElement::new_code_string(dictionary::MODALITY.tag, &["CT"])
          .unwrap(),
      ));

    assert!(!elements
      .remove(dictionary::PATIENT_NAME.tag)
      .has(dictionary::PATIENT_NAME.tag));

    // Removing a missing tag is a no-op
    assert_eq!(elements.remove(dictionary::ROWS.tag), elements);

    let filtered =
      elements.filter_tags(|tag| *tag == dictionary::MODALITY.tag);
    assert_eq!(filtered.tags(), vec![dictionary::MODALITY.tag]);
  }
}
