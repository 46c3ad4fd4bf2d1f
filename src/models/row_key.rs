//! Sortable row keys of the form `STATION#YYYY-MM-DD#HH`.
//!
//! Byte ordering of two keys with the same station prefix equals the
//! chronological ordering of their `(date, hour)` pairs. Range bounds that
//! span whole days or months use out-of-domain suffixes (`#99` for the hour,
//! `31` for the day) so the upper bound sorts after every real key.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, TableError};
use crate::utils::constants::{DAY_SENTINEL, HOUR_SENTINEL, KEY_SEPARATOR, MAX_HOUR};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowKey(String);

impl RowKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RowKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The components a row key was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyParts {
    pub station: String,
    pub date: String,
    pub hour: u32,
}

/// A scan window: `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRange {
    pub start: String,
    pub end: String,
}

impl KeyRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        key >= self.start.as_str() && key < self.end.as_str()
    }
}

impl fmt::Display for KeyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Build the row key for one station-hour.
pub fn encode(station: &str, date: &str, hour: u32) -> Result<RowKey> {
    check_station(station)?;
    check_calendar_date(date)?;
    if hour > MAX_HOUR {
        return Err(TableError::InvalidKeyComponent(format!(
            "hour {} is outside 0-{}",
            hour, MAX_HOUR
        )));
    }

    Ok(RowKey(format!(
        "{station}{sep}{date}{sep}{hour:02}",
        sep = KEY_SEPARATOR
    )))
}

/// Split a row key back into its components.
pub fn decode(key: &str) -> Result<KeyParts> {
    let mut parts = key.split(KEY_SEPARATOR);
    let (Some(station), Some(date), Some(hour), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TableError::InvalidKeyComponent(format!(
            "'{}' is not of the form STATION#YYYY-MM-DD#HH",
            key
        )));
    };

    if hour.len() != 2 {
        return Err(TableError::InvalidKeyComponent(format!(
            "hour '{}' in key '{}' is not two digits",
            hour, key
        )));
    }
    let hour = hour.parse::<u32>().map_err(|_| {
        TableError::InvalidKeyComponent(format!("hour '{}' in key '{}' is not numeric", hour, key))
    })?;

    let key_parts = KeyParts {
        station: station.to_string(),
        date: date.to_string(),
        hour,
    };
    // Round-trip through encode so decode accepts exactly what encode produces
    encode(&key_parts.station, &key_parts.date, key_parts.hour)?;

    Ok(key_parts)
}

/// Inclusive lower bound for a one-day scan.
pub fn range_start(station: &str, date: &str) -> Result<String> {
    check_station(station)?;
    check_date_shape(date)?;
    Ok(format!("{}{}{}", station, KEY_SEPARATOR, date))
}

/// Exclusive upper bound for a one-day scan, using the hour sentinel.
pub fn range_end(station: &str, date: &str) -> Result<String> {
    check_station(station)?;
    check_date_shape(date)?;
    Ok(format!(
        "{station}{sep}{date}{sep}{HOUR_SENTINEL}",
        sep = KEY_SEPARATOR
    ))
}

/// All hours of one day at one station.
pub fn day_range(station: &str, date: &str) -> Result<KeyRange> {
    Ok(KeyRange::new(
        range_start(station, date)?,
        range_end(station, date)?,
    ))
}

/// Every hour from `start_date` through `end_date`.
///
/// `end_date` only has to be shaped like a date, so sentinel days such as
/// `2022-09-31` are accepted as the upper bound.
pub fn range_across_dates(station: &str, start_date: &str, end_date: &str) -> Result<KeyRange> {
    let start = range_start(station, start_date)?;
    let end = range_end(station, end_date)?;
    if start > end {
        return Err(TableError::InvalidKeyComponent(format!(
            "start date {} is after end date {}",
            start_date, end_date
        )));
    }
    Ok(KeyRange::new(start, end))
}

/// Every hour of a calendar month given as `YYYY-MM`.
pub fn month_range(station: &str, month: &str) -> Result<KeyRange> {
    check_month(month)?;
    range_across_dates(
        station,
        &format!("{}-01", month),
        &format!("{}-{}", month, DAY_SENTINEL),
    )
}

/// Hours `from_hour..=to_hour` of one day.
pub fn hour_range(station: &str, date: &str, from_hour: u32, to_hour: u32) -> Result<KeyRange> {
    if from_hour > to_hour {
        return Err(TableError::InvalidKeyComponent(format!(
            "hour window {}..={} is empty",
            from_hour, to_hour
        )));
    }
    let start = encode(station, date, from_hour)?;
    encode(station, date, to_hour)?;
    // Hour 24 is never stored, so it is a tight exclusive bound after 23
    let end = format!(
        "{station}{sep}{date}{sep}{next:02}",
        sep = KEY_SEPARATOR,
        next = to_hour + 1
    );
    Ok(KeyRange::new(start.into_string(), end))
}

fn check_station(station: &str) -> Result<()> {
    if station.is_empty() {
        return Err(TableError::InvalidKeyComponent(
            "station code is empty".to_string(),
        ));
    }
    if station.contains(KEY_SEPARATOR) || station.chars().any(char::is_whitespace) {
        return Err(TableError::InvalidKeyComponent(format!(
            "station code '{}' contains a separator or whitespace",
            station
        )));
    }
    Ok(())
}

fn check_date_shape(date: &str) -> Result<()> {
    let bytes = date.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return Err(TableError::InvalidKeyComponent(format!(
            "date '{}' is not YYYY-MM-DD",
            date
        )));
    }
    Ok(())
}

pub(crate) fn check_calendar_date(date: &str) -> Result<()> {
    check_date_shape(date)?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
        TableError::InvalidKeyComponent(format!("date '{}' is not a calendar date", date))
    })?;
    Ok(())
}

fn check_month(month: &str) -> Result<()> {
    let bytes = month.as_bytes();
    let shaped = bytes.len() == 7
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    let in_range = shaped && matches!(month[5..].parse::<u32>(), Ok(1..=12));
    if !in_range {
        return Err(TableError::InvalidKeyComponent(format!(
            "month '{}' is not YYYY-MM",
            month
        )));
    }
    Ok(())
}
