use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TableError>;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Snapshot serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Could not locate data file '{filename}' (searched: {searched})")]
    SourceNotFound { filename: String, searched: String },

    #[error("Failed to read {}: {source}", path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid row key component: {0}")]
    InvalidKeyComponent(String),

    #[error("Unknown column: {0}")]
    InvalidColumn(String),

    #[error("Store write failed: {0}")]
    WriteFailure(String),

    #[error("Store read failed: {0}")]
    ReadFailure(String),

    #[error("Store scan failed: {0}")]
    ScanFailure(String),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}
