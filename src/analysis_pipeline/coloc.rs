//! Colocalization module
//!
//! This module compares two raw channels inside a shared ROI mask.

mod analyzer;
pub mod types;

pub use analyzer::{analyze, manders, pearson};
pub use types::{ColocRecord, ColocResult, ColocThresholds};
