use std::io::Write;
use std::path::Path;

use tracing::{info, instrument, warn};

use crate::analysis_pipeline::{
    channel::{ChannelBuffer, ChannelReader, TiffChannelReader},
    coloc::{self, ColocRecord, ColocResult},
    common::error::{AnalysisError, Result},
    config::AnalysisConfig,
    export::{DelimitedResultWriter, ExportRow, FlaggedRow, ResultWriter},
    measure::{MeasureEngine, MeasurementHistory},
    roi::{Roi, rasterize},
};

/// Reads channels, measures ROIs on them and writes the result table.
///
/// The pipeline owns the measurement history, so measuring the same ROI
/// twice through one pipeline appends a second, suffixed set of rows.
pub struct RoiAnalysisPipeline<R: ChannelReader, W: ResultWriter> {
    reader: R,
    writer: W,
    config: AnalysisConfig,
    history: MeasurementHistory,
}

impl RoiAnalysisPipeline<TiffChannelReader, DelimitedResultWriter> {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.calibration.validate()?;
        Ok(Self {
            reader: TiffChannelReader,
            writer: DelimitedResultWriter,
            config,
            history: MeasurementHistory::new(),
        })
    }
}

impl<R: ChannelReader, W: ResultWriter> RoiAnalysisPipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, config: AnalysisConfig) -> Self {
        Self {
            reader,
            writer,
            config,
            history: MeasurementHistory::new(),
        }
    }

    fn validate_dimensions(&self, channels: &[ChannelBuffer]) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        let Some(first) = channels.first() else {
            return Ok(());
        };
        for channel in channels {
            let (width, height) = channel.dimensions();
            if width == 0 || height == 0 {
                return Err(AnalysisError::InvalidDimensions(width, height));
            }
            if channel.dimensions() != first.dimensions() {
                warn!(
                    "Channel {} is {}x{}, expected {}x{}",
                    channel.id, width, height, first.width, first.height
                );
                return Err(AnalysisError::DimensionMismatch {
                    expected: first.dimensions(),
                    actual: channel.dimensions(),
                });
            }
        }

        Ok(())
    }

    fn find_channel<'a>(channels: &'a [ChannelBuffer], id: &str) -> Result<&'a ChannelBuffer> {
        channels
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| AnalysisError::UnknownChannel(id.to_string()))
    }

    #[instrument(skip(self, input_data), fields(input_size = input_data.len()))]
    pub fn load_channel(&self, input_data: &[u8], channel_id: &str) -> Result<ChannelBuffer> {
        let channel = {
            let _span = tracing::info_span!("decode_channel").entered();
            self.reader.read_channel(input_data, channel_id)?
        };

        info!(
            channel = %channel.id,
            width = channel.width,
            height = channel.height,
            bits = channel.bits_per_sample,
            "Channel loaded"
        );
        Ok(channel)
    }

    #[instrument(skip(self, input_path))]
    pub fn load_channel_file<P: AsRef<Path>>(&self, input_path: P, channel_id: &str) -> Result<ChannelBuffer> {
        let input_path = input_path.as_ref();

        let input_data = {
            let _span = tracing::info_span!("read_input_file").entered();
            std::fs::read(input_path).map_err(|e| {
                AnalysisError::InputReadError(format!("{}: {}", input_path.display(), e))
            })?
        };

        self.load_channel(&input_data, channel_id)
    }

    /// Colocalization of two channels inside one ROI.
    pub fn colocalize(&self, roi: &Roi, a: &ChannelBuffer, b: &ChannelBuffer) -> Result<ColocResult> {
        let mask = rasterize(&roi.shape, a.width, a.height)?;
        coloc::analyze(a, b, &mask, &self.config.thresholds)
    }

    /// Measures every ROI on every channel and, when a channel pair is
    /// configured, colocalizes it within every ROI.
    ///
    /// Geometry, empty-mask and degenerate-channel failures become flagged
    /// rows; any other failure aborts the analysis.
    #[instrument(skip(self, rois, channels), fields(rois = rois.len(), channels = channels.len()))]
    pub fn analyze(&mut self, rois: &[Roi], channels: &[ChannelBuffer]) -> Result<Vec<ExportRow>> {
        info!("Starting ROI analysis");

        {
            let _span = tracing::info_span!("validate_inputs").entered();
            self.config.calibration.validate()?;
            self.validate_dimensions(channels)?;
        }

        let pair = match &self.config.coloc_channels {
            Some((a, b)) => Some((Self::find_channel(channels, a)?, Self::find_channel(channels, b)?)),
            None => None,
        };

        let results = {
            let _span = tracing::info_span!("measure").entered();
            MeasureEngine::new(self.config.background).measure_batch(rois, channels, &self.config.calibration)
        };

        let mut rows = Vec::new();
        let mut flagged = 0usize;
        for (roi, result) in rois.iter().zip(results) {
            let label = match result {
                Ok(records) => {
                    let stored = self.history.record_event(records);
                    rows.extend(stored.iter().cloned().map(ExportRow::Measurement));
                    stored.first().map(|r| r.label.clone())
                }
                Err(e) if e.is_recoverable() => {
                    warn!(roi = %roi.id, "Measurement flagged: {}", e);
                    flagged += 1;
                    rows.push(ExportRow::Flagged(FlaggedRow {
                        roi_id: roi.id.clone(),
                        label: roi.label.clone(),
                        channel: None,
                        reason: e.to_string(),
                    }));
                    None
                }
                Err(e) => return Err(e),
            };

            let Some((a, b)) = pair else {
                continue;
            };
            let label = label.unwrap_or_else(|| roi.label.clone());
            let _span = tracing::info_span!("colocalize", roi = %roi.id).entered();
            match self.colocalize(roi, a, b) {
                Ok(result) => rows.push(ExportRow::Colocalization(ColocRecord {
                    roi_id: roi.id.clone(),
                    label,
                    channel_a: a.id.clone(),
                    channel_b: b.id.clone(),
                    result,
                })),
                Err(e) if e.is_recoverable() => {
                    warn!(roi = %roi.id, "Colocalization flagged: {}", e);
                    flagged += 1;
                    rows.push(ExportRow::Flagged(FlaggedRow {
                        roi_id: roi.id.clone(),
                        label,
                        channel: Some(format!("{} vs {}", a.id, b.id)),
                        reason: e.to_string(),
                    }));
                }
                Err(e) => return Err(e),
            }
        }

        info!(rows = rows.len(), flagged, "Analysis complete");
        Ok(rows)
    }

    #[instrument(skip(self, rows, output), fields(rows = rows.len()))]
    pub fn export(&self, rows: &[ExportRow], output: &mut dyn Write) -> Result<()> {
        let _span = tracing::info_span!("write_results").entered();
        self.writer.write_results(rows, output, &self.config)
    }

    #[instrument(skip(self, rows, output_path))]
    pub fn export_file<P: AsRef<Path>>(&self, rows: &[ExportRow], output_path: P) -> Result<()> {
        let output_path = output_path.as_ref();

        let mut output_file = {
            let _span = tracing::info_span!("create_output_file").entered();
            std::fs::File::create(output_path).map_err(|e| {
                AnalysisError::OutputWriteError(format!("{}: {}", output_path.display(), e))
            })?
        };

        self.export(rows, &mut output_file)?;
        info!(output = %output_path.display(), "Results written");
        Ok(())
    }

    /// Loads each `(channel_id, path)` input, analyzes `rois` and writes the
    /// table to `output_path`.
    #[instrument(skip(self, inputs, rois, output_path))]
    pub fn run_files<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        inputs: &[(String, P)],
        rois: &[Roi],
        output_path: Q,
    ) -> Result<Vec<ExportRow>> {
        let channels = inputs
            .iter()
            .map(|(id, path)| self.load_channel_file(path, id))
            .collect::<Result<Vec<_>>>()?;

        let rows = self.analyze(rois, &channels)?;
        self.export_file(&rows, output_path)?;
        Ok(rows)
    }

    pub fn history(&self) -> &MeasurementHistory {
        &self.history
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: AnalysisConfig) {
        self.config = config;
    }
}
