//! Result export module
//!
//! This module writes measurement, colocalization and flagged rows as
//! delimited text that spreadsheets open directly.

mod delimited_writer;
pub mod types;
mod writer;

pub use delimited_writer::{COLUMNS, DelimitedResultWriter};
pub use types::{ExportRow, FlaggedRow};
pub use writer::ResultWriter;
