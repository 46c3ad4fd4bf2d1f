use tracing::debug;

use crate::models::Observation;

/// Keeps the first row of each hour in a time-sorted station file.
///
/// Only the immediately preceding accepted hour is remembered, so an hour
/// that reappears after a different hour is accepted again. One instance
/// belongs to exactly one station load.
#[derive(Debug, Default)]
pub struct Deduplicator {
    last_hour_key: Option<String>,
    duplicates: usize,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when `candidate` should be written.
    pub fn accept(&mut self, candidate: &Observation) -> bool {
        let hour_key = candidate.hour_key();
        if self.last_hour_key.as_deref() == Some(hour_key.as_str()) {
            self.duplicates += 1;
            debug!("{}: dropping duplicate hour {}", candidate.station, hour_key);
            return false;
        }
        self.last_hour_key = Some(hour_key);
        true
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}
