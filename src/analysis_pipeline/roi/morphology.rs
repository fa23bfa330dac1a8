//! Binary morphology on ROI masks.

use crate::analysis_pipeline::roi::mask::RoiMask;

/// Half-widths of each row of an elliptical structuring element of the given
/// radius, from `dy = -radius` to `dy = radius`.
fn ellipse_row_extents(radius: usize) -> Vec<usize> {
    let r = radius as f64;
    (0..=2 * radius)
        .map(|i| {
            let dy = i as f64 - r;
            (r * r - dy * dy).max(0.0).sqrt().round() as usize
        })
        .collect()
}

/// Dilates `mask` with a `(2r + 1) × (2r + 1)` elliptical structuring element.
pub fn dilate_ellipse(mask: &RoiMask, radius: usize) -> RoiMask {
    if radius == 0 {
        return mask.clone();
    }
    let (width, height) = mask.dimensions();
    let extents = ellipse_row_extents(radius);
    let mut out = RoiMask::new_empty(width, height);

    for index in mask.indices() {
        let (x, y) = (index % width, index / width);
        for (i, &dx) in extents.iter().enumerate() {
            let ny = y as isize + i as isize - radius as isize;
            if ny < 0 || ny >= height as isize {
                continue;
            }
            let x0 = x.saturating_sub(dx);
            let x1 = (x + dx).min(width - 1);
            out.fill_span(ny as usize, x0, x1);
        }
    }
    out
}

/// Band of pixels within `width` pixels outside the ROI, used as local
/// background.
pub fn ring_mask(mask: &RoiMask, width: usize) -> RoiMask {
    let mut ring = dilate_ellipse(mask, width);
    for index in mask.indices() {
        let (x, y) = (index % mask.width(), index / mask.width());
        ring.set(x, y, false);
    }
    ring
}
