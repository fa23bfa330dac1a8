//! Analysis configuration types

use crate::analysis_pipeline::coloc::types::ColocThresholds;
use crate::analysis_pipeline::measure::types::{BackgroundMethod, Calibration};

/// Configuration for ROI measurement and export
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Physical pixel size used for areas
    pub calibration: Calibration,
    /// Background correction applied to every measurement
    pub background: BackgroundMethod,
    /// Whether all channels must share the same raw dimensions
    pub validate_dimensions: bool,
    /// Manders thresholds for colocalization
    pub thresholds: ColocThresholds,
    /// Channel pair to colocalize within every ROI, if any
    pub coloc_channels: Option<(String, String)>,
    /// Field delimiter of the exported table
    pub delimiter: char,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            calibration: Calibration::default(),
            background: BackgroundMethod::None,
            validate_dimensions: true,
            thresholds: ColocThresholds::default(),
            coloc_channels: None,
            delimiter: ',',
        }
    }
}

impl AnalysisConfig {
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }
}

/// Builder for AnalysisConfig
#[derive(Default)]
pub struct AnalysisConfigBuilder {
    calibration: Option<Calibration>,
    background: Option<BackgroundMethod>,
    validate_dimensions: Option<bool>,
    thresholds: Option<ColocThresholds>,
    coloc_channels: Option<Option<(String, String)>>,
    delimiter: Option<char>,
}

impl AnalysisConfigBuilder {
    pub fn calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = Some(calibration);
        self
    }

    pub fn background(mut self, background: BackgroundMethod) -> Self {
        self.background = Some(background);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn thresholds(mut self, thresholds: ColocThresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    pub fn coloc_channels(mut self, channel_a: impl Into<String>, channel_b: impl Into<String>) -> Self {
        self.coloc_channels = Some(Some((channel_a.into(), channel_b.into())));
        self
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn build(self) -> AnalysisConfig {
        let default = AnalysisConfig::default();
        AnalysisConfig {
            calibration: self.calibration.unwrap_or(default.calibration),
            background: self.background.unwrap_or(default.background),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
            thresholds: self.thresholds.unwrap_or(default.thresholds),
            coloc_channels: self.coloc_channels.unwrap_or(default.coloc_channels),
            delimiter: self.delimiter.unwrap_or(default.delimiter),
        }
    }
}
