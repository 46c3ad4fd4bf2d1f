pub mod batch_writer;
pub mod deduplicator;
pub mod ingestor;

pub use batch_writer::{BatchStats, BatchWriter};
pub use deduplicator::Deduplicator;
pub use ingestor::{IngestSummary, Ingestor, LoadReport, StationFailure, StationSource};
