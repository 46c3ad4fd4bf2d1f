use tracing::info;

use crate::error::Result;
use crate::models::Observation;
use crate::store::{RowMutation, Store};

/// Counters reported when a writer is finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub rows_written: usize,
    pub batches_flushed: usize,
}

/// Buffers observations and writes them to the store in batches of at most
/// `threshold` rows.
///
/// A batch is handed to the store exactly once; if the store rejects it the
/// rows are dropped and the error is returned to the caller.
pub struct BatchWriter<'a> {
    store: &'a dyn Store,
    family: String,
    threshold: usize,
    pending: Vec<RowMutation>,
    stats: BatchStats,
}

impl<'a> BatchWriter<'a> {
    pub fn new(store: &'a dyn Store, family: impl Into<String>, threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            store,
            family: family.into(),
            threshold,
            pending: Vec::with_capacity(threshold),
            stats: BatchStats::default(),
        }
    }

    /// Queue one observation. Returns `true` if this push filled the batch
    /// and it was flushed.
    pub fn push(&mut self, observation: &Observation) -> Result<bool> {
        let key = observation.row_key()?;
        let mutation = observation
            .cells()
            .into_iter()
            .fold(RowMutation::new(&key, self.family.as_str()), |m, (q, v)| {
                m.set_cell(q, v)
            });
        self.pending.push(mutation);

        if self.pending.len() >= self.threshold {
            self.flush()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Write whatever is pending. A no-op on an empty batch.
    pub fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let batch = std::mem::replace(&mut self.pending, Vec::with_capacity(self.threshold));
        let size = batch.len();
        self.store.put_batch(batch)?;

        self.stats.rows_written += size;
        self.stats.batches_flushed += 1;
        info!(
            "Flushed batch {} ({} rows, {} written so far)",
            self.stats.batches_flushed, size, self.stats.rows_written
        );
        Ok(())
    }

    /// Flush the trailing partial batch and return the totals.
    pub fn finish(mut self) -> Result<BatchStats> {
        self.flush()?;
        Ok(self.stats)
    }
}
