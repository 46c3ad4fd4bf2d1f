pub mod presets;
pub mod range_query;

pub use presets::{PresetOutcome, QueryPreset};
pub use range_query::{ProjectionRow, RangeQueryEngine};
