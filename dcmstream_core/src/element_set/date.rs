//! Work with the DICOM `Date` value representation.

use std::sync::LazyLock;

use regex::Regex;

use crate::DataError;

/// A structured date that can be converted to/from a `Date` value.
///
#[derive(Clone, Debug, PartialEq)]
pub struct StructuredDate {
  pub year: u16,
  pub month: u8,
  pub day: u8,
}

// The legacy ACR-NEMA period-separated form is still seen in the wild and is
// accepted on read
static PARSE_DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new("^(\\d{4})\\.?(\\d\\d)\\.?(\\d\\d)$").unwrap()
});

impl StructuredDate {
  /// Converts a `Date` value into a structured date. Both the `YYYYMMDD`
  /// form and the legacy `YYYY.MM.DD` form are accepted.
  ///
  pub fn from_bytes(bytes: &[u8]) -> Result<Self, DataError> {
    let date_string = std::str::from_utf8(bytes).map_err(|_| {
      DataError::new_value_invalid("Date is invalid UTF-8".to_string())
    })?;

    let date_string = date_string.trim_matches('\0').trim();

    match PARSE_DATE_REGEX.captures(date_string) {
      Some(caps) => {
        let year = caps.get(1).unwrap().as_str().parse::<u16>().unwrap();
        let month = caps.get(2).unwrap().as_str().parse::<u8>().unwrap();
        let day = caps.get(3).unwrap().as_str().parse::<u8>().unwrap();

        Ok(Self { year, month, day })
      }

      _ => Err(DataError::new_value_invalid(format!(
        "Date is invalid: '{date_string}'"
      ))),
    }
  }

  /// Converts a structured date to a `Date` value.
  ///
  pub fn to_bytes(&self) -> Result<Vec<u8>, DataError> {
    Ok(
      Self::components_to_string(self.year, Some(self.month), Some(self.day))?
        .into_bytes(),
    )
  }

  /// Builds the content of a `Date` data element value where both the month
  /// and day are optional. The month value is required if there is a day
  /// specified.
  ///
  pub fn components_to_string(
    year: u16,
    month: Option<u8>,
    day: Option<u8>,
  ) -> Result<String, DataError> {
    let has_day_without_month = day.is_some() && month.is_none();
    if has_day_without_month {
      return Err(DataError::new_value_invalid(
        "Date's month must be present when there is a day value".to_string(),
      ));
    }

    if year > 9999 {
      return Err(DataError::new_value_invalid(format!(
        "Date's year is invalid: {year}"
      )));
    }
    let year = format!("{year:04}");

    let month = match month {
      Some(month) => {
        if !(1..=12).contains(&month) {
          return Err(DataError::new_value_invalid(format!(
            "Date's month is invalid: {month}"
          )));
        }

        format!("{month:02}")
      }

      None => "".to_string(),
    };

    let day = match day {
      Some(day) => {
        if !(1..=31).contains(&day) {
          return Err(DataError::new_value_invalid(format!(
            "Date's day is invalid: {day}"
          )));
        }

        format!("{day:02}")
      }

      None => "".to_string(),
    };

    Ok(format!("{year}{month}{day}"))
  }

  /// Formats a structured date as an ISO 8601 date.
  ///
  pub fn to_iso8601(&self) -> String {
    format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
  }
}
