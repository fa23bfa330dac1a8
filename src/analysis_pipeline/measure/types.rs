//! Measurement value types

use crate::analysis_pipeline::common::error::{AnalysisError, Result};

/// Physical pixel size set through a "Set Scale" operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    /// Physical width of one pixel
    pub pixel_size_x: f64,
    /// Physical height of one pixel
    pub pixel_size_y: f64,
    /// Length unit of the pixel sizes, e.g. "µm"
    pub unit: String,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            pixel_size_x: 1.0,
            pixel_size_y: 1.0,
            unit: "px".to_string(),
        }
    }
}

impl Calibration {
    pub fn new(pixel_size_x: f64, pixel_size_y: f64, unit: impl Into<String>) -> Result<Self> {
        let calibration = Self {
            pixel_size_x,
            pixel_size_y,
            unit: unit.into(),
        };
        calibration.validate()?;
        Ok(calibration)
    }

    /// Square pixels of side `pixel_size`.
    pub fn isotropic(pixel_size: f64, unit: impl Into<String>) -> Result<Self> {
        Self::new(pixel_size, pixel_size, unit)
    }

    pub fn validate(&self) -> Result<()> {
        for (axis, size) in [("x", self.pixel_size_x), ("y", self.pixel_size_y)] {
            if !size.is_finite() || size <= 0.0 {
                return Err(AnalysisError::InvalidCalibration(format!(
                    "pixel size {} must be positive and finite, got {}",
                    axis, size
                )));
            }
        }
        Ok(())
    }

    pub fn pixel_area(&self) -> f64 {
        self.pixel_size_x * self.pixel_size_y
    }

    /// Unit of areas, e.g. "µm²".
    pub fn area_unit(&self) -> String {
        format!("{}²", self.unit)
    }
}

/// Background estimate subtracted from the ROI mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundMethod {
    /// No correction
    #[default]
    None,
    /// Minimum of the whole channel
    GlobalMin,
    /// Mean of a ring of `width` pixels around the ROI
    LocalRing { width: usize },
}

/// Statistics of one channel restricted to one mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelStats {
    pub pixel_count: usize,
    /// Integrated density
    pub sum: f64,
    pub mean: f64,
    /// Smallest raw sample, exact in the native range
    pub min: f64,
    /// Largest raw sample, exact in the native range
    pub max: f64,
    /// `pixel_count` times the calibrated pixel area
    pub area: f64,
}

/// One row of the measurement history.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    pub roi_id: String,
    /// ROI label, suffixed with ` (n)` for the n-th measurement of the same ROI
    pub label: String,
    pub channel_id: String,
    pub pixel_count: usize,
    pub sum: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub area: f64,
    pub area_unit: String,
    pub background: Option<f64>,
    pub corrected_mean: Option<f64>,
}

impl MeasurementRecord {
    pub fn new(roi_id: &str, label: &str, channel_id: &str, stats: &ChannelStats, area_unit: String) -> Self {
        Self {
            roi_id: roi_id.to_string(),
            label: label.to_string(),
            channel_id: channel_id.to_string(),
            pixel_count: stats.pixel_count,
            sum: stats.sum,
            mean: stats.mean,
            min: stats.min,
            max: stats.max,
            area: stats.area,
            area_unit,
            background: None,
            corrected_mean: None,
        }
    }

    pub fn with_background(mut self, background: f64) -> Self {
        self.background = Some(background);
        self.corrected_mean = Some(self.mean - background);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_calibration_is_one_pixel() {
        let calibration = Calibration::default();
        assert_eq!(calibration.pixel_area(), 1.0);
        assert_eq!(calibration.area_unit(), "px²");
    }

    #[test]
    fn anisotropic_pixel_area() {
        let calibration = Calibration::new(0.5, 0.25, "µm").unwrap();
        assert_eq!(calibration.pixel_area(), 0.125);
    }

    #[test]
    fn rejects_non_positive_sizes() {
        assert!(Calibration::isotropic(0.0, "µm").is_err());
        assert!(Calibration::new(1.0, f64::NAN, "µm").is_err());
        assert!(matches!(
            Calibration::new(-1.0, 1.0, "µm"),
            Err(AnalysisError::InvalidCalibration(_))
        ));
    }
}
