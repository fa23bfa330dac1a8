use std::io::Write;

use crate::analysis_pipeline::common::error::Result;
use crate::analysis_pipeline::config::types::AnalysisConfig;
use crate::analysis_pipeline::export::types::ExportRow;

pub trait ResultWriter {
    fn write_results(&self, rows: &[ExportRow], output: &mut dyn Write, config: &AnalysisConfig) -> Result<()>;
}
