use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{error, info};
use validator::Validate;

use crate::error::{Result, TableError};
use crate::processors::{BatchWriter, Deduplicator};
use crate::readers::{ParseOutcome, RecordParser, SourceLocator, StationFile};
use crate::store::Store;
use crate::utils::constants::{COLUMN_FAMILY, DEFAULT_BATCH_SIZE};
use crate::utils::progress::ProgressReporter;

/// A station code and the CSV file holding its readings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct StationSource {
    #[validate(length(min = 1))]
    pub station: String,

    #[validate(length(min = 1))]
    pub file: String,
}

impl StationSource {
    pub fn new(station: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            station: station.into(),
            file: file.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub station: String,
    pub source: PathBuf,
    /// Data lines read after the header, including skipped ones
    pub lines_processed: usize,
    pub rows_written: usize,
    pub batches_flushed: usize,
    pub malformed_lines: usize,
    pub duplicate_lines: usize,
}

impl IngestSummary {
    pub fn summary(&self) -> String {
        format!(
            "{}: {} lines processed, {} rows written in {} batches ({} malformed, {} duplicate hours skipped)",
            self.station,
            self.lines_processed,
            self.rows_written,
            self.batches_flushed,
            self.malformed_lines,
            self.duplicate_lines
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationFailure {
    pub station: String,
    pub message: String,
}

/// Outcome of loading several stations. A failed station never undoes the
/// batches already written for the others.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub summaries: Vec<IngestSummary>,
    pub failures: Vec<StationFailure>,
}

impl LoadReport {
    pub fn total_rows(&self) -> usize {
        self.summaries.iter().map(|s| s.rows_written).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, station: &str, result: Result<IngestSummary>) {
        match result {
            Ok(summary) => self.summaries.push(summary),
            Err(e) => {
                error!("Failed to load station {}: {}", station, e);
                self.failures.push(StationFailure {
                    station: station.to_string(),
                    message: e.to_string(),
                });
            }
        }
    }
}

/// Streams station files through parse, dedup and batched writes.
pub struct Ingestor<'a> {
    store: &'a dyn Store,
    locator: SourceLocator,
    family: String,
    batch_size: usize,
}

impl<'a> Ingestor<'a> {
    pub fn new(store: &'a dyn Store, locator: SourceLocator) -> Self {
        Self {
            store,
            locator,
            family: COLUMN_FAMILY.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_column_family(mut self, family: impl Into<String>) -> Self {
        self.family = family.into();
        self
    }

    /// Locate the station's file among the candidate directories and load it.
    pub fn ingest_station(
        &self,
        source: &StationSource,
        progress: Option<&ProgressReporter>,
    ) -> Result<IngestSummary> {
        source.validate()?;
        let path = self.locator.locate(Path::new(&source.file))?;
        self.ingest_file(&source.station, &path, progress)
    }

    /// Load one station from an explicit file path.
    pub fn ingest_file(
        &self,
        station: &str,
        path: &Path,
        progress: Option<&ProgressReporter>,
    ) -> Result<IngestSummary> {
        info!("Loading data for {} from {}", station, path.display());

        let lines = StationFile::open(path)?;
        let parser = RecordParser::new(station);
        let mut dedup = Deduplicator::new();
        let mut writer = BatchWriter::new(self.store, self.family.as_str(), self.batch_size);

        let mut lines_processed = 0;
        let mut malformed_lines = 0;

        for line in lines {
            let line = line?;
            lines_processed += 1;

            let observation = match parser.parse_line(&line) {
                ParseOutcome::Record(observation) => observation,
                ParseOutcome::Skip(_) => {
                    malformed_lines += 1;
                    continue;
                }
            };
            if !dedup.accept(&observation) {
                continue;
            }

            if writer.push(&observation)? {
                info!("Loaded {} rows for {}", lines_processed, station);
                if let Some(p) = progress {
                    p.set_message(&format!("Loaded {} rows for {}", lines_processed, station));
                }
            }
        }

        let stats = writer.finish()?;
        let summary = IngestSummary {
            station: station.to_string(),
            source: path.to_path_buf(),
            lines_processed,
            rows_written: stats.rows_written,
            batches_flushed: stats.batches_flushed,
            malformed_lines,
            duplicate_lines: dedup.duplicates(),
        };

        info!(
            "Finished loading data for {}: {} total rows processed",
            station, lines_processed
        );
        Ok(summary)
    }

    /// Load every station in order, continuing past failed stations.
    pub fn load_all(
        &self,
        sources: &[StationSource],
        progress: Option<&ProgressReporter>,
    ) -> LoadReport {
        let mut report = LoadReport::default();
        for source in sources {
            if let Some(p) = progress {
                p.set_message(&format!("Loading data for {}", source.station));
            }
            report.record(&source.station, self.ingest_station(source, progress));
        }
        report
    }

    /// Load stations concurrently, one station per task. Each task owns its
    /// own parser, deduplicator and batch writer.
    pub fn load_all_parallel(
        &self,
        sources: &[StationSource],
        max_workers: usize,
        progress: Option<&ProgressReporter>,
    ) -> Result<LoadReport> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_workers.max(1))
            .build()
            .map_err(|e| TableError::WorkerPool(e.to_string()))?;

        let finished = AtomicUsize::new(0);
        let results: Vec<(String, Result<IngestSummary>)> = pool.install(|| {
            sources
                .par_iter()
                .map(|source| {
                    let result = self.ingest_station(source, None);

                    let count = finished.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(p) = progress {
                        p.increment(1);
                        p.set_message(&format!(
                            "Loaded {} of {} stations",
                            count,
                            sources.len()
                        ));
                    }

                    (source.station.clone(), result)
                })
                .collect()
        });

        let mut report = LoadReport::default();
        for (station, result) in results {
            report.record(&station, result);
        }
        Ok(report)
    }
}
