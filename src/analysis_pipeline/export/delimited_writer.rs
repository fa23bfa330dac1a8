use std::io::Write;

use tracing::debug;

use crate::analysis_pipeline::common::error::Result;
use crate::analysis_pipeline::config::types::AnalysisConfig;
use crate::analysis_pipeline::export::types::ExportRow;
use crate::analysis_pipeline::export::writer::ResultWriter;

pub const COLUMNS: [&str; 17] = [
    "Type",
    "Label",
    "ROI_ID",
    "Channel",
    "PixelCount",
    "Area",
    "Unit",
    "IntDen",
    "Mean",
    "Min",
    "Max",
    "BgMean",
    "CorrectedMean",
    "PCC",
    "M1",
    "M2",
    "Status",
];

const BOM: &str = "\u{FEFF}";

/// Spreadsheet-friendly delimited text: UTF-8 with a byte-order mark and CRLF
/// row endings.
pub struct DelimitedResultWriter;

fn escape(field: &str, delimiter: char) -> String {
    if field.contains(delimiter) || field.contains(['"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn number(value: f64) -> String {
    format!("{}", value)
}

fn optional(value: Option<f64>) -> String {
    value.map(number).unwrap_or_default()
}

fn fields(row: &ExportRow) -> [String; 17] {
    match row {
        ExportRow::Measurement(r) => [
            "Measurement".to_string(),
            r.label.clone(),
            r.roi_id.clone(),
            r.channel_id.clone(),
            r.pixel_count.to_string(),
            number(r.area),
            r.area_unit.clone(),
            number(r.sum),
            number(r.mean),
            number(r.min),
            number(r.max),
            optional(r.background),
            optional(r.corrected_mean),
            String::new(),
            String::new(),
            String::new(),
            "OK".to_string(),
        ],
        ExportRow::Colocalization(r) => [
            "Colocalization".to_string(),
            r.label.clone(),
            r.roi_id.clone(),
            format!("{} vs {}", r.channel_a, r.channel_b),
            r.result.pixel_count.to_string(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            number(r.result.pcc),
            number(r.result.m1),
            number(r.result.m2),
            "OK".to_string(),
        ],
        ExportRow::Flagged(r) => {
            let mut out: [String; 17] = Default::default();
            out[0] = "Flagged".to_string();
            out[1] = r.label.clone();
            out[2] = r.roi_id.clone();
            out[3] = r.channel.clone().unwrap_or_default();
            out[16] = r.reason.clone();
            out
        }
    }
}

fn push_line<I, S>(buffer: &mut String, cells: I, delimiter: char)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for (i, cell) in cells.into_iter().enumerate() {
        if i > 0 {
            buffer.push(delimiter);
        }
        buffer.push_str(&escape(cell.as_ref(), delimiter));
    }
    buffer.push_str("\r\n");
}

impl ResultWriter for DelimitedResultWriter {
    fn write_results(&self, rows: &[ExportRow], output: &mut dyn Write, config: &AnalysisConfig) -> Result<()> {
        debug!("Writing {} result rows", rows.len());

        let mut buffer = String::from(BOM);
        push_line(&mut buffer, COLUMNS, config.delimiter);
        for row in rows {
            push_line(&mut buffer, fields(row), config.delimiter);
        }

        output.write_all(buffer.as_bytes())?;

        debug!("Result export complete, {} bytes", buffer.len());
        Ok(())
    }
}
