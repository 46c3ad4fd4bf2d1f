pub mod observation;
pub mod row_key;

pub use observation::{Column, Observation};
pub use row_key::{KeyParts, KeyRange, RowKey};
