//! Fluorescence analysis pipeline module
//!
//! This module provides a structured approach to quantitative ROI analysis,
//! with separate modules for channel loading, ROI rasterization, measurement,
//! colocalization, result export and workflow orchestration.

pub mod channel;
pub mod coloc;
pub mod common;
pub mod config;
pub mod export;
pub mod measure;
pub mod roi;
pub mod workflows;

pub use common::{AnalysisError, Result};

pub use channel::{ChannelBuffer, ChannelReader, SampleData, TiffChannelReader};

pub use roi::{MarkerStyle, Point, Roi, RoiMask, RoiShape, WandParams, magic_wand, rasterize};

pub use measure::{
    BackgroundMethod, Calibration, ChannelStats, MeasureEngine, MeasurementHistory, MeasurementRecord,
    RoiOverlap, analyze_overlap, measure_channel, sample_line_profile,
};

pub use coloc::{ColocRecord, ColocResult, ColocThresholds};

pub use config::{AnalysisConfig, AnalysisConfigBuilder};

pub use export::{DelimitedResultWriter, ExportRow, FlaggedRow, ResultWriter};

pub use workflows::RoiAnalysisPipeline;
