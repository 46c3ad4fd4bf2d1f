use tracing::debug;
use validator::Validate;

use crate::models::row_key;
use crate::models::Observation;
use crate::utils::constants::{MAX_HOUR, MIN_FIELDS};

/// Why a data line produced no observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    TooFewFields(usize),
    InvalidDate(String),
    InvalidHour(String),
    InvalidRecord(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Record(Observation),
    Skip(SkipReason),
}

impl ParseOutcome {
    pub fn into_record(self) -> Option<Observation> {
        match self {
            ParseOutcome::Record(observation) => Some(observation),
            ParseOutcome::Skip(_) => None,
        }
    }
}

/// Turns station CSV data lines into observations for one station.
///
/// Expected columns: ordinal, date, time, temperature, dewpoint, humidity,
/// windspeed, gust, pressure, ... Extra trailing columns are ignored.
pub struct RecordParser {
    station: String,
}

impl RecordParser {
    pub fn new(station: impl Into<String>) -> Self {
        Self {
            station: station.into(),
        }
    }

    /// Parse a single data line (header lines already consumed).
    pub fn parse_line(&self, line: &str) -> ParseOutcome {
        let parts: Vec<&str> = line.split(',').map(str::trim).collect();

        if parts.len() < MIN_FIELDS {
            debug!(
                "{}: skipping line with {} fields: {:?}",
                self.station,
                parts.len(),
                line
            );
            return ParseOutcome::Skip(SkipReason::TooFewFields(parts.len()));
        }

        let date = parts[1];
        if row_key::check_calendar_date(date).is_err() {
            debug!("{}: skipping line with invalid date '{}'", self.station, date);
            return ParseOutcome::Skip(SkipReason::InvalidDate(date.to_string()));
        }

        let time = parts[2];
        let hour = match parse_hour(time) {
            Some(hour) => hour,
            None => {
                debug!("{}: skipping line with invalid time '{}'", self.station, time);
                return ParseOutcome::Skip(SkipReason::InvalidHour(time.to_string()));
            }
        };

        let observation = Observation {
            station: self.station.clone(),
            date: date.to_string(),
            hour,
            temperature: parts[3].to_string(),
            dewpoint: parts[4].to_string(),
            humidity: parts[5].to_string(),
            windspeed: parts[6].to_string(),
            gust: parts[7].to_string(),
            pressure: parts[8].to_string(),
        };
        if let Err(e) = observation.validate() {
            debug!("{}: skipping invalid record: {}", self.station, e);
            return ParseOutcome::Skip(SkipReason::InvalidRecord(e.to_string()));
        }

        ParseOutcome::Record(observation)
    }
}

/// Hour is the integer before the first ':' of `HH:MM`.
fn parse_hour(time: &str) -> Option<u32> {
    let prefix = time.split(':').next()?.trim();
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse::<u32>().ok().filter(|h| *h <= MAX_HOUR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let parser = RecordParser::new("SEA");
        let line = "1, 2022-10-02, 01:53, 52, 48, 86, 5, 0, 30.12, extra";

        let obs = parser.parse_line(line).into_record().unwrap();

        assert_eq!(obs.station, "SEA");
        assert_eq!(obs.date, "2022-10-02");
        assert_eq!(obs.hour, 1);
        assert_eq!(obs.temperature, "52");
        assert_eq!(obs.dewpoint, "48");
        assert_eq!(obs.humidity, "86");
        assert_eq!(obs.windspeed, "5");
        assert_eq!(obs.gust, "0");
        assert_eq!(obs.pressure, "30.12");
        assert_eq!(obs.hour_key(), "2022-10-02#01");
    }

    #[test]
    fn test_missing_marker_is_kept_verbatim() {
        let parser = RecordParser::new("PDX");
        let obs = parser
            .parse_line("7,2022-09-14,23:00,M,M,M,M,M,M")
            .into_record()
            .unwrap();
        assert_eq!(obs.temperature, "M");
        assert_eq!(obs.windspeed, "M");
        assert_eq!(obs.hour, 23);
    }

    #[test]
    fn test_short_line_is_skipped() {
        let parser = RecordParser::new("SEA");
        assert_eq!(
            parser.parse_line("1,2022-10-02,01:00,52,48,86,5,0"),
            ParseOutcome::Skip(SkipReason::TooFewFields(8))
        );
        assert_eq!(
            parser.parse_line(""),
            ParseOutcome::Skip(SkipReason::TooFewFields(1))
        );
    }

    #[test]
    fn test_bad_time_or_date_is_skipped() {
        let parser = RecordParser::new("SEA");
        assert!(matches!(
            parser.parse_line("1,2022-10-02,xx:00,52,48,86,5,0,30.1"),
            ParseOutcome::Skip(SkipReason::InvalidHour(_))
        ));
        assert!(matches!(
            parser.parse_line("1,2022-10-02,24:00,52,48,86,5,0,30.1"),
            ParseOutcome::Skip(SkipReason::InvalidHour(_))
        ));
        assert!(matches!(
            parser.parse_line("1,10/02/2022,01:00,52,48,86,5,0,30.1"),
            ParseOutcome::Skip(SkipReason::InvalidDate(_))
        ));
    }

    #[test]
    fn test_date_must_match_row_key_format() {
        let parser = RecordParser::new("SEA");
        for date in ["2022-10- 2", "+2022-10-1", "2022-02-30", "2022-1-02"] {
            let line = format!("1,{},01:00,52,48,86,5,0,30.1", date);
            assert_eq!(
                parser.parse_line(&line),
                ParseOutcome::Skip(SkipReason::InvalidDate(date.to_string())),
                "date {:?}",
                date
            );
        }
    }

    #[test]
    fn test_empty_station_is_invalid_record() {
        let parser = RecordParser::new("");
        assert!(matches!(
            parser.parse_line("1,2022-10-02,01:00,52,48,86,5,0,30.1"),
            ParseOutcome::Skip(SkipReason::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_single_digit_hour() {
        let parser = RecordParser::new("YVR");
        let obs = parser
            .parse_line("3,2022-10-01,9:30,48,44,90,3,0,30.00")
            .into_record()
            .unwrap();
        assert_eq!(obs.hour, 9);
        assert_eq!(obs.row_key().unwrap().as_str(), "YVR#2022-10-01#09");
    }
}
