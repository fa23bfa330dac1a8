//! Export row types

use crate::analysis_pipeline::coloc::types::ColocRecord;
use crate::analysis_pipeline::measure::types::MeasurementRecord;

/// A measurement that could not be produced, kept in the results instead of
/// aborting the run.
#[derive(Debug, Clone, PartialEq)]
pub struct FlaggedRow {
    pub roi_id: String,
    pub label: String,
    pub channel: Option<String>,
    pub reason: String,
}

/// One row of the exported results table.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportRow {
    Measurement(MeasurementRecord),
    Colocalization(ColocRecord),
    Flagged(FlaggedRow),
}

impl ExportRow {
    pub fn is_flagged(&self) -> bool {
        matches!(self, ExportRow::Flagged(_))
    }
}
