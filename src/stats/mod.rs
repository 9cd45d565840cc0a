//! Interpretation of battle-report OCR output.
//!
//! Pipeline: `classify` splits a line into name and stat tokens, `record`
//! maps tokens onto the schema with confidences, `aggregate` merges passes
//! into one record per player, and `rank` orders the result for display.

pub mod aggregate;
pub mod classify;
pub mod rank;
pub mod record;
pub mod schema;

pub use aggregate::{AggregatedCollection, MergeSummary};
pub use rank::{kd_ratio, rank, SortColumn, SortDirection, SortState};
pub use record::{CorrectionTable, ParsePolicy, RecordBuilder};
pub use schema::{PlayerRecord, StatField, StatKey, StatValue};
