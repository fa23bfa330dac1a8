//! Intensity profiles along line ROIs.

use crate::analysis_pipeline::channel::types::ChannelBuffer;
use crate::analysis_pipeline::common::error::{AnalysisError, Result};
use crate::analysis_pipeline::roi::Point;

/// Bilinear sample at a raw-image coordinate, clamped to the image.
///
/// Pixel centers sit at half-integer coordinates.
pub fn sample_bilinear(channel: &ChannelBuffer, p: Point) -> f64 {
    let (width, height) = channel.dimensions();
    if width == 0 || height == 0 {
        return 0.0;
    }
    let fx = (p.x - 0.5).clamp(0.0, (width - 1) as f64);
    let fy = (p.y - 0.5).clamp(0.0, (height - 1) as f64);
    let x0 = fx.floor() as usize;
    let y0 = fy.floor() as usize;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let tx = fx - x0 as f64;
    let ty = fy - y0 as f64;

    let at = |x: usize, y: usize| channel.value_at(x, y).unwrap_or(0.0);
    let top = at(x0, y0) * (1.0 - tx) + at(x1, y0) * tx;
    let bottom = at(x0, y1) * (1.0 - tx) + at(x1, y1) * tx;
    top * (1.0 - ty) + bottom * ty
}

/// Samples `channel` at evenly spaced points from `start` to `end`.
///
/// Without an explicit count, one sample per pixel of length is taken
/// (`floor(length) + 1`), never more than one per pixel of the image
/// diagonal. Fewer than two points return the single pixel under `start`.
pub fn sample_line_profile(
    channel: &ChannelBuffer,
    start: Point,
    end: Point,
    num_points: Option<usize>,
) -> Result<Vec<f64>> {
    for p in [start, end] {
        if !p.is_finite() {
            return Err(AnalysisError::InvalidGeometry(format!(
                "non-finite profile endpoint ({}, {})",
                p.x, p.y
            )));
        }
    }

    let (width, height) = channel.dimensions();
    if width == 0 || height == 0 {
        return Ok(Vec::new());
    }

    let n = num_points.unwrap_or_else(|| {
        let diagonal = (width as f64).hypot(height as f64);
        start.distance(end).min(diagonal).floor() as usize + 1
    });
    if n < 2 {
        let x = (start.x.floor().max(0.0) as usize).min(width - 1);
        let y = (start.y.floor().max(0.0) as usize).min(height - 1);
        return Ok(vec![channel.value_at(x, y).unwrap_or(0.0)]);
    }

    let step = 1.0 / (n - 1) as f64;
    Ok((0..n)
        .map(|i| {
            let t = i as f64 * step;
            let p = Point::new(
                start.x + (end.x - start.x) * t,
                start.y + (end.y - start.y) * t,
            );
            sample_bilinear(channel, p)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> ChannelBuffer {
        // value = 10 * x
        ChannelBuffer::from_u16("ramp", 5, 2, vec![0, 10, 20, 30, 40, 0, 10, 20, 30, 40]).unwrap()
    }

    #[test]
    fn samples_between_centers_interpolate() {
        let channel = ramp();
        assert_eq!(sample_bilinear(&channel, Point::new(0.5, 0.5)), 0.0);
        assert_eq!(sample_bilinear(&channel, Point::new(1.0, 0.5)), 5.0);
        assert_eq!(sample_bilinear(&channel, Point::new(9.0, 9.0)), 40.0);
    }

    #[test]
    fn default_count_is_one_per_pixel() {
        let profile = sample_line_profile(&ramp(), Point::new(0.5, 0.5), Point::new(4.5, 0.5), None).unwrap();
        assert_eq!(profile, vec![0.0, 10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn short_line_returns_single_pixel() {
        let profile = sample_line_profile(&ramp(), Point::new(3.2, 1.7), Point::new(3.4, 1.7), None).unwrap();
        assert_eq!(profile, vec![30.0]);
    }

    #[test]
    fn far_endpoint_is_capped_at_image_diagonal() {
        let profile = sample_line_profile(&ramp(), Point::new(0.0, 0.0), Point::new(1e30, 0.0), None).unwrap();
        // 5x2 image: diagonal 5.39, so at most 6 samples
        assert_eq!(profile.len(), 6);
        assert_eq!(profile[5], 40.0);
    }

    #[test]
    fn non_finite_endpoints_are_rejected() {
        for end in [Point::new(f64::INFINITY, 0.0), Point::new(1.0, f64::NAN)] {
            assert!(matches!(
                sample_line_profile(&ramp(), Point::new(0.5, 0.5), end, None),
                Err(AnalysisError::InvalidGeometry(_))
            ));
        }
    }
}
