//! Geometric and intensity overlap between two ROIs.

use tracing::instrument;

use crate::analysis_pipeline::channel::types::ChannelBuffer;
use crate::analysis_pipeline::common::error::Result;
use crate::analysis_pipeline::measure::engine::measure_channel;
use crate::analysis_pipeline::measure::types::{Calibration, ChannelStats};
use crate::analysis_pipeline::roi::{Point, Roi, RoiMask, rasterize};

/// Statistics of one channel within one overlap region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionStats {
    pub channel_id: String,
    pub stats: ChannelStats,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoiOverlap {
    pub label: String,
    pub overlap_area: f64,
    pub union_area: f64,
    pub area_a_only: f64,
    pub area_b_only: f64,
    /// Intersection over union
    pub iou: f64,
    /// Intersection relative to the smaller ROI
    pub overlap_ratio: f64,
    pub centroid: Option<Point>,
    pub intersection_stats: Vec<RegionStats>,
    pub a_only_stats: Vec<RegionStats>,
    pub b_only_stats: Vec<RegionStats>,
}

fn region_stats(
    mask: &RoiMask,
    channels: &[ChannelBuffer],
    calibration: &Calibration,
) -> Result<Vec<RegionStats>> {
    if mask.is_empty() {
        return Ok(Vec::new());
    }
    channels
        .iter()
        .map(|channel| {
            Ok(RegionStats {
                channel_id: channel.id.clone(),
                stats: measure_channel(channel, mask, calibration)?,
            })
        })
        .collect()
}

/// Compares two ROIs rasterized at `width × height`.
///
/// Areas come from pixel counts so they agree with the measured areas.
/// Intensity statistics are left empty for regions without pixels.
#[instrument(skip_all, fields(a = %a.id, b = %b.id))]
pub fn analyze_overlap(
    a: &Roi,
    b: &Roi,
    width: usize,
    height: usize,
    channels: &[ChannelBuffer],
    calibration: &Calibration,
) -> Result<RoiOverlap> {
    let mask_a = rasterize(&a.shape, width, height)?;
    let mask_b = rasterize(&b.shape, width, height)?;

    let intersection = mask_a.intersection(&mask_b)?;
    let a_only = mask_a.difference(&mask_b)?;
    let b_only = mask_b.difference(&mask_a)?;

    let pixel_area = calibration.pixel_area();
    let area_a = mask_a.pixel_count() as f64 * pixel_area;
    let area_b = mask_b.pixel_count() as f64 * pixel_area;
    let overlap_area = intersection.pixel_count() as f64 * pixel_area;
    let union_area = area_a + area_b - overlap_area;
    let smaller = area_a.min(area_b);

    Ok(RoiOverlap {
        label: format!("Overlap({}, {})", a.label, b.label),
        overlap_area,
        union_area,
        area_a_only: area_a - overlap_area,
        area_b_only: area_b - overlap_area,
        iou: if union_area > 0.0 { overlap_area / union_area } else { 0.0 },
        overlap_ratio: if smaller > 0.0 { overlap_area / smaller } else { 0.0 },
        centroid: intersection.centroid(),
        intersection_stats: region_stats(&intersection, channels, calibration)?,
        a_only_stats: region_stats(&a_only, channels, calibration)?,
        b_only_stats: region_stats(&b_only, channels, calibration)?,
    })
}
