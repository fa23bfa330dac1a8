//! ROI module
//!
//! This module turns ROI outlines into binary masks at raw image resolution,
//! and provides mask-producing selection tools.

pub mod geometry;
mod mask;
mod morphology;
mod rasterizer;
pub mod types;
mod wand;

pub use mask::RoiMask;
pub use morphology::{dilate_ellipse, ring_mask};
pub use rasterizer::rasterize;
pub use types::{MarkerStyle, Point, Roi, RoiShape};
pub use wand::{WandParams, magic_wand};
