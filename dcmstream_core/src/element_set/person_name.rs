//! Work with the DICOM `PersonName` value representation.

use crate::DataError;

/// The components of a single person name.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PersonNameComponents {
  pub family_name: String,
  pub given_name: String,
  pub middle_name: String,
  pub prefix: String,
  pub suffix: String,
}

/// A structured person name that can be converted to/from a `PersonName`
/// value. Person name values have three component groups: alphabetic,
/// ideographic, and phonetic. All groups are optional, however it is common
/// for only the alphabetic group to be used.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StructuredPersonName {
  pub alphabetic: Option<PersonNameComponents>,
  pub ideographic: Option<PersonNameComponents>,
  pub phonetic: Option<PersonNameComponents>,
}

/// Converts a `PersonName` value to a list of structured person names.
///
pub fn from_bytes(
  bytes: &[u8],
) -> Result<Vec<StructuredPersonName>, DataError> {
  let person_name_string = std::str::from_utf8(bytes).map_err(|_| {
    DataError::new_value_invalid("PersonName is invalid UTF-8".to_string())
  })?;

  let person_names = person_name_string
    .split('\\')
    .map(parse_person_name_string)
    .collect::<Result<Vec<StructuredPersonName>, _>>()?;

  Ok(person_names)
}

/// Parses a `PersonName` value by splitting it on the '=' character to find
/// the list of component groups, then splitting each component group on the
/// '^' character to find the individual components of each name variant.
///
fn parse_person_name_string(
  person_name_string: &str,
) -> Result<StructuredPersonName, DataError> {
  let component_groups: Vec<&str> = person_name_string.split('=').collect();

  let component_group_count = component_groups.len();

  if component_group_count > 3 {
    return Err(DataError::new_value_invalid(format!(
      "PersonName has too many component groups: {component_group_count}"
    )));
  }

  let mut person_names = component_groups
    .iter()
    .map(|s| parse_person_name_component_group(s))
    .collect::<Result<Vec<Option<PersonNameComponents>>, _>>()?;

  person_names.resize(3, None);

  Ok(StructuredPersonName {
    alphabetic: person_names[0].clone(),
    ideographic: person_names[1].clone(),
    phonetic: person_names[2].clone(),
  })
}

fn parse_person_name_component_group(
  component_group: &str,
) -> Result<Option<PersonNameComponents>, DataError> {
  let mut components: Vec<&str> = component_group
    .split('^')
    .map(|s| s.trim_end_matches(' '))
    .collect();

  if components.len() > 5 {
    return Err(DataError::new_value_invalid(format!(
      "PersonName has too many components: {}",
      components.len()
    )));
  }

  // If all components of the name are empty then don't return anything
  if components.iter().all(|c| c.is_empty()) {
    return Ok(None);
  }

  components.resize(5, "");

  Ok(Some(PersonNameComponents {
    family_name: components[0].to_string(),
    given_name: components[1].to_string(),
    middle_name: components[2].to_string(),
    prefix: components[3].to_string(),
    suffix: components[4].to_string(),
  }))
}

/// Converts a list of structured person names to a `PersonName` value.
///
pub fn to_bytes(values: &[StructuredPersonName]) -> Result<Vec<u8>, DataError> {
  let names: Result<Vec<String>, DataError> = values
    .iter()
    .map(|value| {
      let groups: Result<Vec<String>, _> =
        [&value.alphabetic, &value.ideographic, &value.phonetic]
          .iter()
          .map(|component_group| match component_group {
            Some(components) => components_to_string(components),
            None => Ok("".to_string()),
          })
          .collect();

      Ok(groups?.join("=").trim_end_matches('=').to_string())
    })
    .collect();

  let mut bytes = names?.join("\\").into_bytes();

  if bytes.len() % 2 == 1 {
    bytes.push(0x20);
  }

  Ok(bytes)
}

fn components_to_string(
  components: &PersonNameComponents,
) -> Result<String, DataError> {
  let components: [&str; 5] = [
    components.family_name.trim_end_matches(' '),
    components.given_name.trim_end_matches(' '),
    components.middle_name.trim_end_matches(' '),
    components.prefix.trim_end_matches(' '),
    components.suffix.trim_end_matches(' '),
  ];

  for component in components {
    if component.len() > 64 {
      return Err(DataError::new_value_invalid(
        "PersonName component is too long".to_string(),
      ));
    }

    if component.contains(['^', '=', '\\']) {
      return Err(DataError::new_value_invalid(
        "PersonName component has disallowed characters".to_string(),
      ));
    }
  }

  Ok(components.join("^").trim_end_matches(['^']).to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_bytes_test() {
    assert_eq!(
      from_bytes(b"A^B^^^"),
      Ok(vec![StructuredPersonName {
        alphabetic: Some(PersonNameComponents {
          family_name: "A".to_string(),
          given_name: "B".to_string(),
          ..Default::default()
        }),
        ideographic: None,
        phonetic: None
      }])
    );

    assert_eq!(
      from_bytes("John^Doe=山田^太郎".as_bytes()),
      Ok(vec![StructuredPersonName {
        alphabetic: Some(PersonNameComponents {
          family_name: "John".to_string(),
          given_name: "Doe".to_string(),
          ..Default::default()
        }),
        ideographic: Some(PersonNameComponents {
          family_name: "山田".to_string(),
          given_name: "太郎".to_string(),
          ..Default::default()
        }),
        phonetic: None
      }])
    );

    assert_eq!(
      from_bytes(b"A=B=C=D"),
      Err(DataError::new_value_invalid(
        "PersonName has too many component groups: 4".to_string()
      ))
    );

    assert_eq!(
      from_bytes(b"A^B^C^D^E^F"),
      Err(DataError::new_value_invalid(
        "PersonName has too many components: 6".to_string()
      ))
    );
  }

  #[test]
  fn to_bytes_test() {
    assert_eq!(
      to_bytes(&[StructuredPersonName {
        alphabetic: Some(PersonNameComponents {
          family_name: "A".to_string(),
          given_name: "B".to_string(),
          middle_name: "C".to_string(),
          prefix: "D".to_string(),
          suffix: "E".to_string()
        }),
        ideographic: None,
        phonetic: None,
      }]),
      Ok(b"A^B^C^D^E ".to_vec())
    );

    assert_eq!(
      to_bytes(&[StructuredPersonName {
        alphabetic: Some(PersonNameComponents {
          family_name: "^".to_string(),
          ..Default::default()
        }),
        ideographic: None,
        phonetic: None,
      }]),
      Err(DataError::new_value_invalid(
        "PersonName component has disallowed characters".to_string()
      ))
    );
  }
}
