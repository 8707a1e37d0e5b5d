//! Work with the DICOM `DateTime` value representation.

use std::sync::LazyLock;

use regex::Regex;

use crate::element_set::date::StructuredDate;
use crate::{utils, DataError, StructuredTime};

/// A structured date/time that can be converted to/from a `DateTime` value.
/// Any truncation from the right is legal, so only the year is required. The
/// time zone offset is stored in `±HHMM` form as a signed integer, e.g.
/// `-500` for UTC-05:00.
///
#[derive(Clone, Debug, PartialEq)]
pub struct StructuredDateTime {
  pub year: u16,
  pub month: Option<u8>,
  pub day: Option<u8>,
  pub hour: Option<u8>,
  pub minute: Option<u8>,
  pub second: Option<f64>,
  pub time_zone_offset: Option<i16>,
}

static PARSE_DATE_TIME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    "^(\\d{4})((\\d{2})((\\d{2})((\\d{2})((\\d{2})((\\d{2})(\\.\\d{1,6})?)?\
     )?)?)?)?([\\+\\-]\\d{4})?$",
  )
  .unwrap()
});

impl StructuredDateTime {
  /// Converts a `DateTime` value into a structured date/time.
  ///
  pub fn from_bytes(bytes: &[u8]) -> Result<StructuredDateTime, DataError> {
    let date_time_string = std::str::from_utf8(bytes).map_err(|_| {
      DataError::new_value_invalid("DateTime is invalid UTF-8".to_string())
    })?;

    let date_time_string = utils::trim_end_whitespace(date_time_string);

    match PARSE_DATE_TIME_REGEX.captures(date_time_string) {
      Some(caps) => {
        let year = caps.get(1).unwrap().as_str().parse::<u16>().unwrap();
        let month = caps.get(3).map(|m| m.as_str().parse::<u8>().unwrap());
        let day = caps.get(5).map(|d| d.as_str().parse::<u8>().unwrap());
        let hour = caps.get(7).map(|h| h.as_str().parse::<u8>().unwrap());
        let minute = caps.get(9).map(|m| m.as_str().parse::<u8>().unwrap());
        let second = caps.get(10).map(|s| s.as_str().parse::<f64>().unwrap());
        let time_zone_offset =
          caps.get(13).map(|o| o.as_str().parse::<i16>().unwrap());

        Ok(StructuredDateTime {
          year,
          month,
          day,
          hour,
          minute,
          second,
          time_zone_offset,
        })
      }

      _ => Err(DataError::new_value_invalid(format!(
        "DateTime is invalid: '{date_time_string}'"
      ))),
    }
  }

  /// Converts a structured date/time to a `DateTime` value.
  ///
  pub fn to_bytes(&self) -> Result<Vec<u8>, DataError> {
    let has_hour_without_day = self.hour.is_some() && self.day.is_none();
    if has_hour_without_day {
      return Err(DataError::new_value_invalid(
        "DateTime day value must be present when there is an hour value"
          .to_string(),
      ));
    }

    let date =
      StructuredDate::components_to_string(self.year, self.month, self.day)?;

    let time = match self.hour {
      Some(hour) => StructuredTime {
        hour,
        minute: self.minute,
        second: self.second,
      }
      .to_time_string(),
      _ => Ok("".to_string()),
    }?;

    let time_zone_offset = match self.time_zone_offset {
      Some(offset) => {
        let is_offset_valid =
          (-1200..=1400).contains(&offset) && (offset % 100 < 60);

        if !is_offset_valid {
          return Err(DataError::new_value_invalid(format!(
            "DateTime time zone offset is invalid: {offset}"
          )));
        }

        let sign = if offset < 0 { "-" } else { "+" };

        format!("{}{:04}", sign, offset.abs())
      }

      None => "".to_string(),
    };

    let mut bytes =
      format!("{date}{time}{time_zone_offset}").into_bytes();

    if bytes.len() % 2 == 1 {
      bytes.push(0x20);
    }

    Ok(bytes)
  }

  /// Returns a copy of this date/time with the given time zone offset
  /// applied if it doesn't already specify one.
  ///
  pub fn with_default_time_zone_offset(&self, offset: Option<i16>) -> Self {
    let mut date_time = self.clone();

    if date_time.time_zone_offset.is_none() {
      date_time.time_zone_offset = offset;
    }

    date_time
  }

  /// Formats a structured date/time as an ISO 8601 string. Components that
  /// aren't specified are omitted.
  ///
  pub fn to_iso8601(&self) -> String {
    let mut s = format!("{:04}", self.year);

    if let Some(month) = self.month {
      s.push_str(&format!("-{month:02}"));

      if let Some(day) = self.day {
        s.push_str(&format!("-{day:02}"));

        if let Some(hour) = self.hour {
          let time = StructuredTime {
            hour,
            minute: self.minute,
            second: self.second,
          };

          s.push('T');
          s.push_str(&time.to_iso8601());
        }
      }
    }

    if let Some(time_zone_offset) = self.time_zone_offset {
      s.push(if time_zone_offset < 0 { '-' } else { '+' });
      s.push_str(&format!("{:04}", time_zone_offset.abs()));
    }

    s
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_bytes_test() {
    assert_eq!(
      StructuredDateTime::from_bytes(b"1997"),
      Ok(StructuredDateTime {
        year: 1997,
        month: None,
        day: None,
        hour: None,
        minute: None,
        second: None,
        time_zone_offset: None
      })
    );

    assert_eq!(
      StructuredDateTime::from_bytes(b"1997070421-0500"),
      Ok(StructuredDateTime {
        year: 1997,
        month: Some(7),
        day: Some(4),
        hour: Some(21),
        minute: None,
        second: None,
        time_zone_offset: Some(-500)
      })
    );

    assert_eq!(
      StructuredDateTime::from_bytes(b"19970704213000.125+1000"),
      Ok(StructuredDateTime {
        year: 1997,
        month: Some(7),
        day: Some(4),
        hour: Some(21),
        minute: Some(30),
        second: Some(0.125),
        time_zone_offset: Some(1000)
      })
    );

    assert_eq!(
      StructuredDateTime::from_bytes(b"199"),
      Err(DataError::new_value_invalid(
        "DateTime is invalid: '199'".to_string()
      ))
    );
  }

  #[test]
  fn to_bytes_test() {
    assert_eq!(
      StructuredDateTime {
        year: 1997,
        month: Some(7),
        day: Some(4),
        hour: Some(21),
        minute: Some(30),
        second: None,
        time_zone_offset: Some(-500)
      }
      .to_bytes(),
      Ok(b"199707042130-0500 ".to_vec())
    );
  }

  #[test]
  fn with_default_time_zone_offset_test() {
    let date_time = StructuredDateTime::from_bytes(b"1997070421").unwrap();

    assert_eq!(
      date_time.with_default_time_zone_offset(Some(200)).time_zone_offset,
      Some(200)
    );

    let date_time = StructuredDateTime::from_bytes(b"1997070421+0100").unwrap();

    assert_eq!(
      date_time.with_default_time_zone_offset(Some(200)).time_zone_offset,
      Some(100)
    );
  }

  #[test]
  fn to_iso8601_test() {
    assert_eq!(
      StructuredDateTime {
        year: 2024,
        month: Some(7),
        day: Some(2),
        hour: Some(9),
        minute: Some(40),
        second: Some(2.5),
        time_zone_offset: Some(-400)
      }
      .to_iso8601(),
      "2024-07-02T09:40:02.5-0400"
    );
  }
}
