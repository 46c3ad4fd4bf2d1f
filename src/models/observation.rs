use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::error::{Result, TableError};
use crate::models::row_key::{self, RowKey};
use crate::utils::constants::{
    COL_DATE, COL_DEWPOINT, COL_GUST, COL_HOUR, COL_HUMIDITY, COL_PRESSURE, COL_TEMPERATURE,
    COL_WINDSPEED, KEY_SEPARATOR,
};

/// Columns stored in the sensor family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Temperature,
    Dewpoint,
    Humidity,
    Windspeed,
    Gust,
    Pressure,
    Date,
    Hour,
}

impl Column {
    pub const ALL: [Column; 8] = [
        Column::Temperature,
        Column::Dewpoint,
        Column::Humidity,
        Column::Windspeed,
        Column::Gust,
        Column::Pressure,
        Column::Date,
        Column::Hour,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Temperature => COL_TEMPERATURE,
            Column::Dewpoint => COL_DEWPOINT,
            Column::Humidity => COL_HUMIDITY,
            Column::Windspeed => COL_WINDSPEED,
            Column::Gust => COL_GUST,
            Column::Pressure => COL_PRESSURE,
            Column::Date => COL_DATE,
            Column::Hour => COL_HOUR,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Column {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Column::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| TableError::InvalidColumn(s.to_string()))
    }
}

/// One station-hour reading. Measurements stay as the raw CSV text so the
/// missing-value marker survives until query time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Observation {
    #[validate(length(min = 1))]
    pub station: String,

    #[validate(length(equal = 10))]
    pub date: String,

    #[validate(range(max = 23))]
    pub hour: u32,

    pub temperature: String,
    pub dewpoint: String,
    pub humidity: String,
    pub windspeed: String,
    pub gust: String,
    pub pressure: String,
}

impl Observation {
    /// Deduplication key: one observation is kept per `date#hour`.
    pub fn hour_key(&self) -> String {
        format!("{}{}{:02}", self.date, KEY_SEPARATOR, self.hour)
    }

    pub fn row_key(&self) -> Result<RowKey> {
        row_key::encode(&self.station, &self.date, self.hour)
    }

    /// Zero-padded hour as written to the `hour` column.
    pub fn hour_text(&self) -> String {
        format!("{:02}", self.hour)
    }

    pub fn value(&self, column: Column) -> String {
        match column {
            Column::Temperature => self.temperature.clone(),
            Column::Dewpoint => self.dewpoint.clone(),
            Column::Humidity => self.humidity.clone(),
            Column::Windspeed => self.windspeed.clone(),
            Column::Gust => self.gust.clone(),
            Column::Pressure => self.pressure.clone(),
            Column::Date => self.date.clone(),
            Column::Hour => self.hour_text(),
        }
    }

    /// Column/value pairs in the order they are written to the store.
    pub fn cells(&self) -> Vec<(&'static str, String)> {
        Column::ALL
            .into_iter()
            .map(|c| (c.as_str(), self.value(c)))
            .collect()
    }
}
