//! Analysis workflows module
//!
//! This module contains orchestration logic that ties channel loading,
//! measurement and export together.

mod roi_analysis;


pub use roi_analysis::RoiAnalysisPipeline;
