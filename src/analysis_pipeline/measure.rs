//! Measurement module
//!
//! This module computes intensity statistics of raw channels inside ROI masks
//! and keeps the append-only measurement history.

mod engine;
mod history;
mod overlap;
mod profile;
pub mod types;

pub use engine::{MeasureEngine, measure_channel};
pub use history::MeasurementHistory;
pub use overlap::{RegionStats, RoiOverlap, analyze_overlap};
pub use profile::{sample_bilinear, sample_line_profile};
pub use types::{BackgroundMethod, Calibration, ChannelStats, MeasurementRecord};
