//! Session handling around the stats pipeline.
//!
//! This module provides:
//! - The persisted analysis session (aggregated table + sort state)
//! - Saved history of past analyses
//! - XML/CSV/JSON export
//! - Text table rendering with review markers

pub mod export;
pub mod history;
pub mod report;
pub mod session;

pub use export::{export_records, ExportFormat};
pub use history::History;
pub use report::render_table;
pub use session::AnalysisSession;
