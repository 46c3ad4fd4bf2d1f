//! Contract for the sorted wide-column store that holds observations.
//!
//! Rows are ordered by the raw bytes of their key. Each row holds cells
//! grouped into named column families. Implementations must be shareable
//! across threads so stations can be loaded concurrently.

pub mod memory;

pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::models::{KeyRange, RowKey};

/// Lazily produced rows of a range scan, in ascending key order.
pub type RowStream<'a> = Box<dyn Iterator<Item = Result<Row>> + 'a>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub key: String,
    /// family -> qualifier -> value
    pub families: BTreeMap<String, BTreeMap<String, String>>,
}

impl Row {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            families: BTreeMap::new(),
        }
    }

    pub fn cell(&self, family: &str, qualifier: &str) -> Option<&str> {
        self.families
            .get(family)
            .and_then(|cells| cells.get(qualifier))
            .map(String::as_str)
    }

    /// Upsert the cells of `mutation` into this row.
    pub fn apply(&mut self, mutation: RowMutation) {
        let cells = self.families.entry(mutation.family).or_default();
        for (qualifier, value) in mutation.cells {
            cells.insert(qualifier, value);
        }
    }
}

/// Cells to set on one row within a single column family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMutation {
    pub key: String,
    pub family: String,
    pub cells: Vec<(String, String)>,
}

impl RowMutation {
    pub fn new(key: &RowKey, family: impl Into<String>) -> Self {
        Self {
            key: key.as_str().to_string(),
            family: family.into(),
            cells: Vec::new(),
        }
    }

    pub fn set_cell(mut self, qualifier: impl Into<String>, value: impl Into<String>) -> Self {
        self.cells.push((qualifier.into(), value.into()));
        self
    }
}

pub trait Store: Send + Sync {
    /// Upsert every mutation. Each row is applied atomically; there is no
    /// guarantee across rows of the same batch.
    fn put_batch(&self, mutations: Vec<RowMutation>) -> Result<()>;

    /// Point read. A missing key is `Ok(None)`, never an error.
    fn get_row(&self, key: &str) -> Result<Option<Row>>;

    /// Rows with `start <= key < end`, ascending.
    fn scan_range<'a>(&'a self, start: &str, end: &str) -> Result<RowStream<'a>>;

    fn scan(&self, range: &KeyRange) -> Result<RowStream<'_>> {
        self.scan_range(&range.start, &range.end)
    }
}
