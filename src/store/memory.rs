use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::ops::Bound;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

use crate::error::{Result, TableError};
use crate::store::{Row, RowMutation, RowStream, Store};
use crate::utils::constants::DEFAULT_BUFFER_SIZE;

type Table = BTreeMap<String, Row>;

/// In-process table ordered by raw key bytes.
///
/// Scans iterate a point-in-time snapshot of the table; writers copy the
/// table only while a scan still holds the previous snapshot.
pub struct MemoryStore {
    table_id: String,
    families: BTreeSet<String>,
    rows: RwLock<Arc<Table>>,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    table_id: String,
    families: BTreeSet<String>,
    rows: Vec<Row>,
}

impl MemoryStore {
    pub fn new(table_id: &str, families: &[&str]) -> Self {
        Self {
            table_id: table_id.to_string(),
            families: families.iter().map(|f| f.to_string()).collect(),
            rows: RwLock::new(Arc::new(Table::new())),
        }
    }

    /// Open a snapshot written by [`MemoryStore::save`], or start an empty
    /// table when the file does not exist yet.
    pub fn open_or_create(path: &Path, table_id: &str, families: &[&str]) -> Result<Self> {
        if !path.exists() {
            debug!("No snapshot at {}, starting empty table", path.display());
            return Ok(Self::new(table_id, families));
        }

        let file = File::open(path)?;
        let snapshot: Snapshot =
            serde_json::from_reader(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file))?;

        let mut store_families = snapshot.families;
        store_families.extend(families.iter().map(|f| f.to_string()));
        let rows: Table = snapshot
            .rows
            .into_iter()
            .map(|row| (row.key.clone(), row))
            .collect();

        info!(
            "Opened table {} with {} rows from {}",
            snapshot.table_id,
            rows.len(),
            path.display()
        );

        Ok(Self {
            table_id: snapshot.table_id,
            families: store_families,
            rows: RwLock::new(Arc::new(rows)),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let table = self.snapshot()?;
        let snapshot = Snapshot {
            table_id: self.table_id.clone(),
            families: self.families.clone(),
            rows: table.values().cloned().collect(),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, File::create(path)?);
        serde_json::to_writer(&mut writer, &snapshot)?;
        writer.flush()?;

        info!("Saved {} rows to {}", snapshot.rows.len(), path.display());
        Ok(())
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    /// Drop every row, keeping the table and its families.
    pub fn clear(&self) -> Result<()> {
        let mut guard = self
            .rows
            .write()
            .map_err(|_| TableError::WriteFailure("table lock poisoned".to_string()))?;
        *guard = Arc::new(Table::new());
        info!("Cleared table {}", self.table_id);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.snapshot().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Result<Arc<Table>> {
        self.rows
            .read()
            .map(|guard| Arc::clone(&guard))
            .map_err(|_| TableError::ReadFailure("table lock poisoned".to_string()))
    }
}

impl Store for MemoryStore {
    fn put_batch(&self, mutations: Vec<RowMutation>) -> Result<()> {
        if let Some(bad) = mutations
            .iter()
            .find(|m| !self.families.contains(&m.family))
        {
            return Err(TableError::WriteFailure(format!(
                "column family '{}' does not exist in table {}",
                bad.family, self.table_id
            )));
        }

        let mut guard = self
            .rows
            .write()
            .map_err(|_| TableError::WriteFailure("table lock poisoned".to_string()))?;
        let table = Arc::make_mut(&mut guard);
        for mutation in mutations {
            table
                .entry(mutation.key.clone())
                .or_insert_with(|| Row::new(mutation.key.clone()))
                .apply(mutation);
        }
        Ok(())
    }

    fn get_row(&self, key: &str) -> Result<Option<Row>> {
        Ok(self.snapshot()?.get(key).cloned())
    }

    fn scan_range<'a>(&'a self, start: &str, end: &str) -> Result<RowStream<'a>> {
        let table = self
            .snapshot()
            .map_err(|e| TableError::ScanFailure(e.to_string()))?;
        Ok(Box::new(ScanIter {
            table,
            next_from: Bound::Included(start.to_string()),
            end: end.to_string(),
            done: start >= end,
        }))
    }
}

/// Walks a snapshot one key at a time, resuming after the last key returned.
struct ScanIter {
    table: Arc<Table>,
    next_from: Bound<String>,
    end: String,
    done: bool,
}

impl Iterator for ScanIter {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let lower = match &self.next_from {
            Bound::Included(k) => Bound::Included(k.as_str()),
            Bound::Excluded(k) => Bound::Excluded(k.as_str()),
            Bound::Unbounded => Bound::Unbounded,
        };
        let found = self
            .table
            .range::<str, _>((lower, Bound::Excluded(self.end.as_str())))
            .next()
            .map(|(_, row)| row.clone());

        match found {
            Some(row) => {
                self.next_from = Bound::Excluded(row.key.clone());
                Some(Ok(row))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}
