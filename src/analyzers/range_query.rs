//! Read-side queries over the station-hour row keys.
//!
//! Every public query is best-effort: store failures are logged and the
//! query returns its default, or whatever it had accumulated before a scan
//! broke off. Bounds are always built with [`crate::models::row_key`], the
//! same codec the ingestor writes with.

use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::models::row_key::{self, KeyRange};
use crate::models::Column;
use crate::store::{Row, Store};
use crate::utils::constants::{COLUMN_FAMILY, MISSING_VALUE};

/// One row of a projection scan, in scan order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectionRow {
    pub date: String,
    pub hour: String,
    pub temperature: i64,
    pub dewpoint: i64,
    pub humidity: String,
    pub windspeed: String,
    pub pressure: String,
}

pub struct RangeQueryEngine<'a> {
    store: &'a dyn Store,
    family: String,
    missing_value: String,
}

impl<'a> RangeQueryEngine<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self {
            store,
            family: COLUMN_FAMILY.to_string(),
            missing_value: MISSING_VALUE.to_string(),
        }
    }

    pub fn with_column_family(mut self, family: impl Into<String>) -> Self {
        self.family = family.into();
        self
    }

    pub fn with_missing_value(mut self, missing_value: impl Into<String>) -> Self {
        self.missing_value = missing_value.into();
        self
    }

    /// Raw cell text for one station-hour, `None` when the row or the
    /// column is absent.
    pub fn point_value(
        &self,
        station: &str,
        date: &str,
        hour: u32,
        column: Column,
    ) -> Result<Option<String>> {
        let key = row_key::encode(station, date, hour)?;
        let row = self.store.get_row(key.as_str())?;
        if row.is_none() {
            info!("Row not found for: {}", key);
        }
        Ok(row.and_then(|r| self.cell(&r, column).map(str::to_string)))
    }

    /// Integer reading for one station-hour. Missing rows, missing cells and
    /// unparsable values all yield 0.
    pub fn point_lookup(&self, station: &str, date: &str, hour: u32, column: Column) -> i64 {
        match self.point_value(station, date, hour, column) {
            Ok(value) => value
                .as_deref()
                .and_then(|v| self.parse_reading(v))
                .unwrap_or(0),
            Err(e) => {
                error!("Point lookup {}#{}#{:02} failed: {}", station, date, hour, e);
                0
            }
        }
    }

    /// Largest integer value of `column` in `range`, ignoring the missing
    /// marker and unparsable cells. `baseline` is returned when nothing
    /// qualifies.
    pub fn max_over_range(&self, range: &KeyRange, column: Column, baseline: i64) -> i64 {
        let mut max = baseline;
        if let Err(e) = self.fold_max(range, column, &mut max) {
            error!("Max over {} failed: {}", range, e);
        }
        max
    }

    /// Max of `column` for one station between two dates, inclusive.
    pub fn max_between_dates(
        &self,
        station: &str,
        start_date: &str,
        end_date: &str,
        column: Column,
        baseline: i64,
    ) -> i64 {
        match row_key::range_across_dates(station, start_date, end_date) {
            Ok(range) => self.max_over_range(&range, column, baseline),
            Err(e) => {
                error!("Invalid date window for {}: {}", station, e);
                baseline
            }
        }
    }

    /// Date, hour and the main readings of every row in `range`.
    /// Unparsable temperature or dewpoint values become 0 individually.
    pub fn projection_scan(&self, range: &KeyRange) -> Vec<ProjectionRow> {
        let mut rows = Vec::new();
        let result = self.store.scan(range).and_then(|stream| {
            for row in stream {
                rows.push(self.project(&row?));
            }
            Ok(())
        });
        if let Err(e) = result {
            error!("Projection scan over {} failed: {}", range, e);
        }
        rows
    }

    /// One scan per (station, month) pair, folded into a single maximum.
    /// Months are `YYYY-MM`.
    pub fn max_across_partitions<S: AsRef<str>, M: AsRef<str>>(
        &self,
        stations: &[S],
        months: &[M],
        column: Column,
        baseline: i64,
    ) -> i64 {
        let mut max = baseline;
        for station in stations {
            for month in months {
                let (station, month) = (station.as_ref(), month.as_ref());
                let scanned = row_key::month_range(station, month)
                    .and_then(|range| self.fold_max(&range, column, &mut max));
                if let Err(e) = scanned {
                    error!("Scan of {} {} failed: {}", station, month, e);
                    return max;
                }
            }
        }
        max
    }

    fn fold_max(&self, range: &KeyRange, column: Column, max: &mut i64) -> Result<()> {
        let mut scanned = 0usize;
        let mut skipped = 0usize;
        for row in self.store.scan(range)? {
            let row = row?;
            scanned += 1;
            match self.cell(&row, column).and_then(|v| self.parse_reading(v)) {
                Some(value) if value > *max => *max = value,
                Some(_) => {}
                None => skipped += 1,
            }
        }
        debug!(
            "Scanned {} rows in {} for {} ({} without a usable value)",
            scanned, range, column, skipped
        );
        Ok(())
    }

    fn project(&self, row: &Row) -> ProjectionRow {
        let text = |column: Column| self.cell(row, column).unwrap_or("").to_string();
        let number = |column: Column| {
            self.cell(row, column)
                .and_then(|v| self.parse_reading(v))
                .unwrap_or(0)
        };

        ProjectionRow {
            date: text(Column::Date),
            hour: text(Column::Hour),
            temperature: number(Column::Temperature),
            dewpoint: number(Column::Dewpoint),
            humidity: text(Column::Humidity),
            windspeed: text(Column::Windspeed),
            pressure: text(Column::Pressure),
        }
    }

    fn cell<'r>(&self, row: &'r Row, column: Column) -> Option<&'r str> {
        row.cell(&self.family, column.as_str())
    }

    /// `None` for the missing marker or anything that is not an integer.
    fn parse_reading(&self, raw: &str) -> Option<i64> {
        let raw = raw.trim();
        if raw == self.missing_value {
            return None;
        }
        raw.parse::<i64>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TableError;
    use crate::models::row_key::{day_range, encode, month_range};
    use crate::store::{MemoryStore, RowMutation, RowStream};

    fn put(store: &MemoryStore, station: &str, date: &str, hour: u32, cells: &[(&str, &str)]) {
        let key = encode(station, date, hour).unwrap();
        let mutation = cells
            .iter()
            .fold(RowMutation::new(&key, "sensor"), |m, (q, v)| m.set_cell(*q, *v))
            .set_cell("date", date)
            .set_cell("hour", format!("{:02}", hour));
        store.put_batch(vec![mutation]).unwrap();
    }

    /// Fails every scan after `fail_after` rows.
    struct FlakyStore {
        inner: MemoryStore,
        fail_after: usize,
    }

    impl Store for FlakyStore {
        fn put_batch(&self, mutations: Vec<RowMutation>) -> Result<()> {
            self.inner.put_batch(mutations)
        }

        fn get_row(&self, _key: &str) -> Result<Option<Row>> {
            Err(TableError::ReadFailure("connection reset".to_string()))
        }

        fn scan_range<'a>(&'a self, start: &str, end: &str) -> Result<RowStream<'a>> {
            let rows = self.inner.scan_range(start, end)?.take(self.fail_after);
            let failure = std::iter::once(Err(TableError::ScanFailure("stream reset".to_string())));
            Ok(Box::new(rows.chain(failure)))
        }
    }

    #[test]
    fn test_point_lookup() {
        let store = MemoryStore::new("weather", &["sensor"]);
        put(&store, "YVR", "2022-10-01", 10, &[("temperature", "48")]);
        let engine = RangeQueryEngine::new(&store);

        assert_eq!(engine.point_lookup("YVR", "2022-10-01", 10, Column::Temperature), 48);
        assert_eq!(
            engine
                .point_value("YVR", "2022-10-01", 10, Column::Temperature)
                .unwrap(),
            Some("48".to_string())
        );
    }

    #[test]
    fn test_point_lookup_missing_row_is_zero() {
        let store = MemoryStore::new("weather", &["sensor"]);
        let engine = RangeQueryEngine::new(&store);

        assert_eq!(engine.point_lookup("YVR", "2022-10-01", 10, Column::Temperature), 0);
        assert_eq!(
            engine
                .point_value("YVR", "2022-10-01", 10, Column::Temperature)
                .unwrap(),
            None
        );
        assert_eq!(engine.point_lookup("", "2022-10-01", 10, Column::Temperature), 0);
    }

    #[test]
    fn test_max_skips_missing_marker() {
        let store = MemoryStore::new("weather", &["sensor"]);
        for (hour, wind) in [(0, "12"), (1, "M"), (2, "31"), (3, "9")] {
            put(&store, "PDX", "2022-09-14", hour, &[("windspeed", wind)]);
        }
        put(&store, "PDX", "2022-10-01", 0, &[("windspeed", "80")]);
        put(&store, "SEA", "2022-09-14", 0, &[("windspeed", "70")]);
        let engine = RangeQueryEngine::new(&store);

        let range = month_range("PDX", "2022-09").unwrap();
        assert_eq!(engine.max_over_range(&range, Column::Windspeed, 0), 31);
        assert_eq!(
            engine.max_between_dates("PDX", "2022-09-01", "2022-09-30", Column::Windspeed, 0),
            31
        );
    }

    #[test]
    fn test_max_skips_unparsable_values() {
        let store = MemoryStore::new("weather", &["sensor"]);
        put(&store, "PDX", "2022-09-14", 0, &[("windspeed", "12")]);
        put(&store, "PDX", "2022-09-14", 1, &[("windspeed", "4.5")]);
        put(&store, "PDX", "2022-09-14", 2, &[("windspeed", "calm")]);
        let engine = RangeQueryEngine::new(&store);

        let range = day_range("PDX", "2022-09-14").unwrap();
        assert_eq!(engine.max_over_range(&range, Column::Windspeed, 0), 12);
    }

    #[test]
    fn test_max_empty_range_returns_baseline() {
        let store = MemoryStore::new("weather", &["sensor"]);
        let engine = RangeQueryEngine::new(&store);

        let range = month_range("PDX", "2022-09").unwrap();
        assert_eq!(engine.max_over_range(&range, Column::Windspeed, 0), 0);
        assert_eq!(engine.max_over_range(&range, Column::Temperature, -100), -100);
    }

    #[test]
    fn test_projection_zeroes_only_the_bad_field() {
        let store = MemoryStore::new("weather", &["sensor"]);
        let full = |t: &'static str, d: &'static str| {
            vec![
                ("temperature", t),
                ("dewpoint", d),
                ("humidity", "80"),
                ("windspeed", "5"),
                ("pressure", "30.01"),
            ]
        };
        put(&store, "SEA", "2022-10-02", 2, &full("52", "46"));
        put(&store, "SEA", "2022-10-02", 0, &full("50", "47"));
        put(&store, "SEA", "2022-10-02", 1, &full("x1", "48"));
        let engine = RangeQueryEngine::new(&store);

        let rows = engine.projection_scan(&day_range("SEA", "2022-10-02").unwrap());

        assert_eq!(rows.len(), 3);
        let hours: Vec<&str> = rows.iter().map(|r| r.hour.as_str()).collect();
        assert_eq!(hours, vec!["00", "01", "02"]);
        assert_eq!(rows[1].temperature, 0);
        assert_eq!(rows[1].dewpoint, 48);
        assert_eq!(rows[1].humidity, "80");
        assert_eq!(rows[0].temperature, 50);
        assert_eq!(rows[2].temperature, 52);
        assert_eq!(rows[2].pressure, "30.01");
    }

    #[test]
    fn test_cross_partition_max() {
        let store = MemoryStore::new("weather", &["sensor"]);
        put(&store, "PDX", "2022-07-20", 15, &[("temperature", "101")]);
        put(&store, "SEA", "2022-08-10", 16, &[("temperature", "M")]);
        put(&store, "SEA", "2022-08-11", 16, &[("temperature", "94")]);
        put(&store, "YVR", "2022-08-01", 14, &[("temperature", "85")]);
        put(&store, "PDX", "2022-06-30", 14, &[("temperature", "110")]);
        let engine = RangeQueryEngine::new(&store);

        let max = engine.max_across_partitions(
            &["PDX", "SEA", "YVR"],
            &["2022-07", "2022-08"],
            Column::Temperature,
            -100,
        );
        assert_eq!(max, 101);

        let none = engine.max_across_partitions(&["SEA"], &["2021-01"], Column::Temperature, -100);
        assert_eq!(none, -100);
    }

    #[test]
    fn test_failures_return_partial_results() {
        let inner = MemoryStore::new("weather", &["sensor"]);
        for (hour, temp) in [(0, "50"), (1, "55"), (2, "60")] {
            put(&inner, "SEA", "2022-10-02", hour, &[("temperature", temp)]);
        }
        let store = FlakyStore {
            inner,
            fail_after: 2,
        };
        let engine = RangeQueryEngine::new(&store);
        let range = day_range("SEA", "2022-10-02").unwrap();

        assert_eq!(engine.point_lookup("SEA", "2022-10-02", 0, Column::Temperature), 0);
        assert_eq!(engine.max_over_range(&range, Column::Temperature, 0), 55);
        assert_eq!(engine.projection_scan(&range).len(), 2);
    }
}
