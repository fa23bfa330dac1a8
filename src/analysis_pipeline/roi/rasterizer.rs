//! ROI rasterization without anti-aliasing.
//!
//! A pixel is part of the mask iff its center lies on or inside the outline.
//! Coverage fractions are never computed, so every pixel is wholly in or out
//! and repeated rasterizations of the same outline are bit-identical.

use tracing::debug;

use crate::analysis_pipeline::common::error::{AnalysisError, Result};
use crate::analysis_pipeline::roi::geometry::{catmull_rom_closed, validate_polygon};
use crate::analysis_pipeline::roi::mask::RoiMask;
use crate::analysis_pipeline::roi::types::{Point, RoiShape};

/// Rasterizes `shape` into a mask of the raw image size `width × height`.
///
/// Rectangles and ellipses with zero width or height enclose no pixel center
/// and produce an empty mask. Polygons must be simple with non-zero area.
pub fn rasterize(shape: &RoiShape, width: usize, height: usize) -> Result<RoiMask> {
    let mut mask = RoiMask::new_empty(width, height);
    if width == 0 || height == 0 {
        return Ok(mask);
    }

    match shape {
        RoiShape::Rectangle { a, b } => {
            ensure_finite(&[*a, *b])?;
            fill_rectangle(&mut mask, *a, *b);
        }
        RoiShape::Ellipse { a, b } => {
            ensure_finite(&[*a, *b])?;
            fill_ellipse(&mut mask, *a, *b);
        }
        RoiShape::Polygon(points) => {
            let vertices = validate_polygon(points)?;
            fill_polygon(&mut mask, &vertices);
        }
        RoiShape::SmoothPolygon(points) => {
            let vertices = validate_polygon(&catmull_rom_closed(points))?;
            fill_polygon(&mut mask, &vertices);
        }
    }

    debug!(
        "Rasterized ROI into {}x{} mask, {} pixels",
        width,
        height,
        mask.pixel_count()
    );
    Ok(mask)
}

fn ensure_finite(points: &[Point]) -> Result<()> {
    match points.iter().find(|p| !p.is_finite()) {
        Some(p) => Err(AnalysisError::InvalidGeometry(format!(
            "non-finite coordinate ({}, {})",
            p.x, p.y
        ))),
        None => Ok(()),
    }
}

/// Pixel index range whose centers fall inside `[lo, hi]`, clipped to `0..len`.
fn center_range(lo: f64, hi: f64, len: usize) -> Option<(usize, usize)> {
    let first = (lo - 0.5).ceil().max(0.0);
    let last = (hi - 0.5).floor().min(len as f64 - 1.0);
    if first > last {
        return None;
    }
    Some((first as usize, last as usize))
}

fn fill_rectangle(mask: &mut RoiMask, a: Point, b: Point) {
    let (x0, x1) = (a.x.min(b.x), a.x.max(b.x));
    let (y0, y1) = (a.y.min(b.y), a.y.max(b.y));
    if x0 == x1 || y0 == y1 {
        return;
    }
    let Some((cx0, cx1)) = center_range(x0, x1, mask.width()) else {
        return;
    };
    let Some((ry0, ry1)) = center_range(y0, y1, mask.height()) else {
        return;
    };
    for y in ry0..=ry1 {
        mask.fill_span(y, cx0, cx1);
    }
}

fn fill_ellipse(mask: &mut RoiMask, a: Point, b: Point) {
    let rx = (b.x - a.x).abs() / 2.0;
    let ry = (b.y - a.y).abs() / 2.0;
    if rx == 0.0 || ry == 0.0 {
        return;
    }
    let cx = (a.x + b.x) / 2.0;
    let cy = (a.y + b.y) / 2.0;

    let Some((ry0, ry1)) = center_range(cy - ry, cy + ry, mask.height()) else {
        return;
    };
    for y in ry0..=ry1 {
        let dy = (y as f64 + 0.5 - cy) / ry;
        let t = 1.0 - dy * dy;
        if t < 0.0 {
            continue;
        }
        let half = rx * t.sqrt();
        if let Some((x0, x1)) = center_range(cx - half, cx + half, mask.width()) {
            mask.fill_span(y, x0, x1);
        }
    }
}

/// Scanline fill of a simple polygon followed by a pass that adds pixels whose
/// centers lie exactly on an edge the half-open crossing rule skipped.
fn fill_polygon(mask: &mut RoiMask, vertices: &[Point]) {
    let n = vertices.len();
    let min_y = vertices.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = vertices.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
    let Some((ry0, ry1)) = center_range(min_y, max_y, mask.height()) else {
        return;
    };

    let mut crossings: Vec<f64> = Vec::with_capacity(n);
    for y in ry0..=ry1 {
        let yc = y as f64 + 0.5;
        crossings.clear();
        for i in 0..n {
            let (p, q) = (vertices[i], vertices[(i + 1) % n]);
            if (p.y <= yc && yc < q.y) || (q.y <= yc && yc < p.y) {
                crossings.push(p.x + (yc - p.y) * (q.x - p.x) / (q.y - p.y));
            }
        }
        crossings.sort_by(f64::total_cmp);
        for pair in crossings.chunks_exact(2) {
            if let Some((x0, x1)) = center_range(pair[0], pair[1], mask.width()) {
                mask.fill_span(y, x0, x1);
            }
        }
    }

    for i in 0..n {
        mark_edge_centers(mask, vertices[i], vertices[(i + 1) % n]);
    }
}

fn mark_edge_centers(mask: &mut RoiMask, p: Point, q: Point) {
    if p.y == q.y {
        let row = p.y - 0.5;
        if row.fract() != 0.0 || row < 0.0 || row >= mask.height() as f64 {
            return;
        }
        if let Some((x0, x1)) = center_range(p.x.min(q.x), p.x.max(q.x), mask.width()) {
            mask.fill_span(row as usize, x0, x1);
        }
        return;
    }

    let Some((ry0, ry1)) = center_range(p.y.min(q.y), p.y.max(q.y), mask.height()) else {
        return;
    };
    for y in ry0..=ry1 {
        let yc = y as f64 + 0.5;
        let x = p.x + (yc - p.y) * (q.x - p.x) / (q.y - p.y);
        let col = x - 0.5;
        if col.fract() == 0.0 && col >= 0.0 && col < mask.width() as f64 {
            mask.set(col as usize, y, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis_pipeline::roi::types::MarkerStyle;

    fn rows(mask: &RoiMask) -> Vec<String> {
        (0..mask.height())
            .map(|y| {
                (0..mask.width())
                    .map(|x| if mask.get(x, y) { '#' } else { '.' })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn rectangle_covers_enclosed_centers() {
        let mask = rasterize(&RoiShape::rectangle(1.0, 1.0, 2.0, 2.0), 4, 4).unwrap();
        assert_eq!(rows(&mask), vec!["....", ".##.", ".##.", "...."]);
    }

    #[test]
    fn rectangle_boundary_through_centers_is_inclusive() {
        // Edges pass exactly through the centers of columns 1 and 3.
        let mask = rasterize(&RoiShape::rectangle(1.5, 0.5, 2.0, 1.0), 5, 3).unwrap();
        assert_eq!(rows(&mask), vec![".###.", ".###.", "....."]);
    }

    #[test]
    fn corner_order_does_not_matter() {
        let a = rasterize(&RoiShape::rectangle(3.0, 3.0, -2.0, -2.0), 4, 4).unwrap();
        let b = rasterize(&RoiShape::rectangle(1.0, 1.0, 2.0, 2.0), 4, 4).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_area_rectangle_is_empty() {
        let mask = rasterize(&RoiShape::rectangle(1.5, 0.0, 0.0, 4.0), 4, 4).unwrap();
        assert!(mask.is_empty());
    }

    #[test]
    fn shapes_are_clipped_to_the_image() {
        let mask = rasterize(&RoiShape::rectangle(-10.0, -10.0, 11.0, 100.0), 3, 3).unwrap();
        assert_eq!(rows(&mask), vec!["#..", "#..", "#.."]);
    }

    #[test]
    fn ellipse_is_symmetric() {
        let mask = rasterize(&RoiShape::ellipse(0.0, 0.0, 5.0, 5.0), 5, 5).unwrap();
        assert_eq!(
            rows(&mask),
            vec![".###.", "#####", "#####", "#####", ".###."]
        );
    }

    #[test]
    fn markers_rasterize_by_style() {
        let center = Point::new(2.5, 2.5);
        let marker = |style| rasterize(&RoiShape::marker(center, 2.0, style), 5, 5).unwrap();

        assert_eq!(
            rows(&marker(MarkerStyle::Square)),
            vec!["#####", "#####", "#####", "#####", "#####"]
        );
        assert_eq!(
            rows(&marker(MarkerStyle::Circle)),
            vec!["..#..", ".###.", "#####", ".###.", "..#.."]
        );
        assert_eq!(
            rows(&marker(MarkerStyle::Triangle)),
            vec!["..#..", "..#..", ".###.", ".###.", "#####"]
        );
    }

    #[test]
    fn triangle_includes_vertices_on_centers() {
        let triangle = RoiShape::Polygon(vec![
            Point::new(0.5, 0.5),
            Point::new(4.5, 0.5),
            Point::new(0.5, 4.5),
        ]);
        let mask = rasterize(&triangle, 5, 5).unwrap();
        assert_eq!(
            rows(&mask),
            vec!["#####", "####.", "###..", "##...", "#...."]
        );
    }

    #[test]
    fn polygon_matches_equivalent_rectangle() {
        let poly = RoiShape::Polygon(vec![
            Point::new(1.0, 1.0),
            Point::new(3.0, 1.0),
            Point::new(3.0, 3.0),
            Point::new(1.0, 3.0),
        ]);
        let rect = RoiShape::rectangle(1.0, 1.0, 2.0, 2.0);
        assert_eq!(rasterize(&poly, 6, 6).unwrap(), rasterize(&rect, 6, 6).unwrap());
    }

    #[test]
    fn rasterization_is_deterministic() {
        let shape = RoiShape::SmoothPolygon(vec![
            Point::new(3.2, 1.1),
            Point::new(17.9, 4.4),
            Point::new(14.3, 18.7),
            Point::new(2.6, 12.0),
        ]);
        let first = rasterize(&shape, 20, 20).unwrap();
        let second = rasterize(&shape, 20, 20).unwrap();
        assert_eq!(first, second);
        assert!(first.pixel_count() > 0);
    }

    #[test]
    fn self_intersecting_polygon_is_invalid() {
        let figure_eight = RoiShape::Polygon(vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(4.0, 0.0),
            Point::new(0.0, 4.0),
            Point::new(-1.0, 2.0),
        ]);
        assert!(matches!(
            rasterize(&figure_eight, 8, 8),
            Err(AnalysisError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn nan_coordinates_are_invalid() {
        let shape = RoiShape::rectangle(f64::NAN, 0.0, 1.0, 1.0);
        assert!(matches!(
            rasterize(&shape, 4, 4),
            Err(AnalysisError::InvalidGeometry(_))
        ));
    }
}
