use std::fmt;

use crate::analyzers::range_query::{ProjectionRow, RangeQueryEngine};
use crate::models::row_key;
use crate::models::Column;
use crate::utils::constants::{CROSS_PARTITION_BASELINE, DEFAULT_MAX_BASELINE};

/// The canonical report queries run after a full load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPreset {
    /// Temperature at Vancouver, 2022-10-01 10:00
    VancouverMorningTemperature,
    /// Highest wind speed in Portland during September 2022
    PortlandSeptemberMaxWind,
    /// Every reading at SeaTac on 2022-10-02
    SeatacDailyReadings,
    /// Highest summer 2022 temperature across all three stations
    SummerPeakTemperature,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetOutcome {
    Value(i64),
    Rows(Vec<ProjectionRow>),
}

impl QueryPreset {
    pub const ALL: [QueryPreset; 4] = [
        QueryPreset::VancouverMorningTemperature,
        QueryPreset::PortlandSeptemberMaxWind,
        QueryPreset::SeatacDailyReadings,
        QueryPreset::SummerPeakTemperature,
    ];

    pub fn number(&self) -> usize {
        match self {
            QueryPreset::VancouverMorningTemperature => 1,
            QueryPreset::PortlandSeptemberMaxWind => 2,
            QueryPreset::SeatacDailyReadings => 3,
            QueryPreset::SummerPeakTemperature => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QueryPreset::VancouverMorningTemperature => "Temperature",
            QueryPreset::PortlandSeptemberMaxWind => "Windspeed",
            QueryPreset::SeatacDailyReadings => "Readings",
            QueryPreset::SummerPeakTemperature => "Temperature",
        }
    }

    pub fn run(&self, engine: &RangeQueryEngine<'_>) -> PresetOutcome {
        match self {
            QueryPreset::VancouverMorningTemperature => PresetOutcome::Value(engine.point_lookup(
                "YVR",
                "2022-10-01",
                10,
                Column::Temperature,
            )),
            QueryPreset::PortlandSeptemberMaxWind => PresetOutcome::Value(
                engine.max_between_dates(
                    "PDX",
                    "2022-09-01",
                    "2022-09-30",
                    Column::Windspeed,
                    DEFAULT_MAX_BASELINE,
                ),
            ),
            QueryPreset::SeatacDailyReadings => PresetOutcome::Rows(
                row_key::day_range("SEA", "2022-10-02")
                    .map(|range| engine.projection_scan(&range))
                    .unwrap_or_default(),
            ),
            QueryPreset::SummerPeakTemperature => PresetOutcome::Value(engine.max_across_partitions(
                &["PDX", "SEA", "YVR"],
                &["2022-07", "2022-08"],
                Column::Temperature,
                CROSS_PARTITION_BASELINE,
            )),
        }
    }
}

impl fmt::Display for PresetOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetOutcome::Value(value) => write!(f, "{}", value),
            PresetOutcome::Rows(rows) => {
                for row in rows {
                    writeln!(
                        f,
                        "{} {} {} {} {} {} {}",
                        row.date,
                        row.hour,
                        row.temperature,
                        row.dewpoint,
                        row.humidity,
                        row.windspeed,
                        row.pressure
                    )?;
                }
                Ok(())
            }
        }
    }
}
