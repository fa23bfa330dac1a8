//! Magic wand selection: region growing from a seed pixel.

use tracing::debug;

use crate::analysis_pipeline::channel::types::ChannelBuffer;
use crate::analysis_pipeline::common::error::{AnalysisError, Result};
use crate::analysis_pipeline::roi::mask::RoiMask;

#[derive(Debug, Clone, Copy)]
pub struct WandParams {
    /// Accepted deviation from the seed value, in raw intensity units or,
    /// when `relative` is set, in percent of the seed value
    pub tolerance: f64,
    /// Gaussian sigma applied before growing; 0 disables smoothing
    pub smoothing: f64,
    pub relative: bool,
}

impl WandParams {
    /// Rejects non-finite or negative values. Smoothing wider than the image
    /// is reduced to the image's larger dimension.
    fn validated(&self, width: usize, height: usize) -> Result<Self> {
        for (name, value) in [("tolerance", self.tolerance), ("smoothing", self.smoothing)] {
            if !value.is_finite() || value < 0.0 {
                return Err(AnalysisError::InvalidParameter(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(Self {
            smoothing: self.smoothing.min(width.max(height) as f64),
            ..*self
        })
    }
}

impl Default for WandParams {
    fn default() -> Self {
        Self {
            tolerance: 10.0,
            smoothing: 1.0,
            relative: false,
        }
    }
}

/// Grows a 4-connected region from `(seed_x, seed_y)` over pixels whose value
/// lies in `[seed - tolerance, seed + tolerance]`.
///
/// The range is fixed to the seed value rather than floating with each
/// neighbor. A seed outside the image yields an empty mask. Fails with
/// `InvalidParameter` for a negative or non-finite tolerance or smoothing.
pub fn magic_wand(channel: &ChannelBuffer, seed_x: i64, seed_y: i64, params: &WandParams) -> Result<RoiMask> {
    let (width, height) = channel.dimensions();
    let params = params.validated(width, height)?;
    let mut mask = RoiMask::new_empty(width, height);
    if seed_x < 0 || seed_y < 0 || seed_x as usize >= width || seed_y as usize >= height {
        return Ok(mask);
    }
    let (sx, sy) = (seed_x as usize, seed_y as usize);

    let values = if params.smoothing > 0.0 {
        gaussian_blur(&channel.to_f64_vec(), width, height, params.smoothing)
    } else {
        channel.to_f64_vec()
    };

    let seed_value = values[sy * width + sx];
    let tolerance = if params.relative {
        (seed_value * params.tolerance / 100.0).abs()
    } else {
        params.tolerance.abs()
    };
    let (lo, hi) = (seed_value - tolerance, seed_value + tolerance);

    let mut stack = vec![(sx, sy)];
    mask.set(sx, sy, true);
    while let Some((x, y)) = stack.pop() {
        let neighbors = [
            (x.wrapping_sub(1), y),
            (x + 1, y),
            (x, y.wrapping_sub(1)),
            (x, y + 1),
        ];
        for (nx, ny) in neighbors {
            if nx >= width || ny >= height || mask.get(nx, ny) {
                continue;
            }
            let v = values[ny * width + nx];
            if v >= lo && v <= hi {
                mask.set(nx, ny, true);
                stack.push((nx, ny));
            }
        }
    }

    debug!(
        "Magic wand from ({}, {}) selected {} pixels",
        sx,
        sy,
        mask.pixel_count()
    );
    Ok(mask)
}

fn reflect_101(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let mut i = index.rem_euclid(period);
    if i >= len as isize {
        i = period - i;
    }
    i as usize
}

fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (3.0 * sigma).round() as usize;
    let mut kernel: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let d = i as f64 - radius as f64;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);
    kernel
}

/// Separable Gaussian blur with reflect-101 borders.
fn gaussian_blur(values: &[f64], width: usize, height: usize, sigma: f64) -> Vec<f64> {
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;

    let mut horizontal = vec![0.0; values.len()];
    for y in 0..height {
        let row = &values[y * width..(y + 1) * width];
        for x in 0..width {
            horizontal[y * width + x] = kernel
                .iter()
                .enumerate()
                .map(|(k, w)| w * row[reflect_101(x as isize + k as isize - radius, width)])
                .sum();
        }
    }

    let mut out = vec![0.0; values.len()];
    for y in 0..height {
        for x in 0..width {
            out[y * width + x] = kernel
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    let sy = reflect_101(y as isize + k as isize - radius, height);
                    w * horizontal[sy * width + x]
                })
                .sum();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_smoothing(tolerance: f64) -> WandParams {
        WandParams {
            tolerance,
            smoothing: 0.0,
            relative: false,
        }
    }

    #[test]
    fn grows_over_connected_plateau_only() {
        #[rustfmt::skip]
        let data = vec![
            100, 100,   0, 100,
            100, 102,   0, 100,
              0,   0,   0, 100,
        ];
        let channel = ChannelBuffer::from_u16("ch", 4, 3, data).unwrap();

        let mask = magic_wand(&channel, 0, 0, &no_smoothing(5.0)).unwrap();

        assert_eq!(mask.pixel_count(), 4);
        assert!(mask.get(1, 1));
        assert!(!mask.get(3, 0), "right plateau is not 4-connected to the seed");
    }

    #[test]
    fn diagonal_neighbors_are_not_connected() {
        let data = vec![50u8, 0, 0, 50];
        let channel = ChannelBuffer::from_u8("ch", 2, 2, data).unwrap();

        let mask = magic_wand(&channel, 0, 0, &no_smoothing(1.0)).unwrap();
        assert_eq!(mask.pixel_count(), 1);
    }

    #[test]
    fn relative_tolerance_scales_with_seed() {
        let data = vec![1000u16, 1090, 1200];
        let channel = ChannelBuffer::from_u16("ch", 3, 1, data).unwrap();
        let params = WandParams {
            tolerance: 10.0,
            smoothing: 0.0,
            relative: true,
        };

        let mask = magic_wand(&channel, 0, 0, &params).unwrap();
        assert_eq!(mask.data(), &[true, true, false]);
    }

    #[test]
    fn seed_outside_image_selects_nothing() {
        let channel = ChannelBuffer::from_u8("ch", 2, 2, vec![1; 4]).unwrap();
        assert!(magic_wand(&channel, -1, 0, &WandParams::default()).unwrap().is_empty());
        assert!(magic_wand(&channel, 0, 2, &WandParams::default()).unwrap().is_empty());
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let channel = ChannelBuffer::from_u8("ch", 2, 2, vec![1; 4]).unwrap();
        let bad = [
            WandParams { smoothing: f64::INFINITY, ..WandParams::default() },
            WandParams { smoothing: f64::NAN, ..WandParams::default() },
            WandParams { smoothing: -1.0, ..WandParams::default() },
            WandParams { tolerance: f64::INFINITY, ..WandParams::default() },
            WandParams { tolerance: -3.0, ..WandParams::default() },
        ];
        for params in bad {
            assert!(matches!(
                magic_wand(&channel, 0, 0, &params),
                Err(AnalysisError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn huge_smoothing_is_limited_to_image_size() {
        let channel = ChannelBuffer::from_u16("ch", 3, 2, vec![5, 5, 5, 5, 5, 5]).unwrap();
        let params = WandParams {
            tolerance: 0.5,
            smoothing: 1e12,
            relative: false,
        };

        let mask = magic_wand(&channel, 1, 1, &params).unwrap();
        assert_eq!(mask.pixel_count(), 6);
    }

    #[test]
    fn blur_preserves_constant_image() {
        let values = vec![7.0; 20];
        let blurred = gaussian_blur(&values, 5, 4, 1.0);
        assert!(blurred.iter().all(|v| (v - 7.0).abs() < 1e-9));
    }

    #[test]
    fn reflect_101_mirrors_without_repeating_edge() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(3, 1), 0);
    }
}
