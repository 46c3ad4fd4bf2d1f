pub mod record_parser;
pub mod station_file;

pub use record_parser::{ParseOutcome, RecordParser, SkipReason};
pub use station_file::{SourceLocator, StationFile};
