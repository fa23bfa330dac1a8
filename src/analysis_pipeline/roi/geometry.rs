//! Planar geometry helpers for ROI outlines.

use crate::analysis_pipeline::common::error::{AnalysisError, Result};
use crate::analysis_pipeline::roi::types::Point;

/// Line segments generated per spline span when flattening smooth outlines.
pub const SPLINE_SEGMENTS: usize = 16;

/// Signed shoelace area; positive for counter-clockwise vertex order in a
/// y-up frame.
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        twice_area += p.x * q.y - q.x * p.y;
    }
    twice_area / 2.0
}

/// Drops consecutive duplicates, including a closing vertex equal to the first.
pub fn dedup_vertices(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    while out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    out
}

/// Flattens the closed Catmull-Rom spline through `points` into a polygon.
///
/// Each span p1→p2 becomes the cubic Bézier with control points
/// `p1 + (p2 - p0) / 6` and `p2 - (p3 - p1) / 6`. Fewer than three control
/// points are returned unchanged.
pub fn catmull_rom_closed(points: &[Point]) -> Vec<Point> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    let mut out = Vec::with_capacity(n * SPLINE_SEGMENTS);
    for i in 0..n {
        let p0 = points[(i + n - 1) % n];
        let p1 = points[i];
        let p2 = points[(i + 1) % n];
        let p3 = points[(i + 2) % n];

        let c1 = Point::new(p1.x + (p2.x - p0.x) / 6.0, p1.y + (p2.y - p0.y) / 6.0);
        let c2 = Point::new(p2.x - (p3.x - p1.x) / 6.0, p2.y - (p3.y - p1.y) / 6.0);

        for step in 0..SPLINE_SEGMENTS {
            let t = step as f64 / SPLINE_SEGMENTS as f64;
            out.push(cubic_bezier(p1, c1, c2, p2, t));
        }
    }
    out
}

fn cubic_bezier(p0: Point, c1: Point, c2: Point, p1: Point, t: f64) -> Point {
    let u = 1.0 - t;
    let b0 = u * u * u;
    let b1 = 3.0 * u * u * t;
    let b2 = 3.0 * u * t * t;
    let b3 = t * t * t;
    Point::new(
        b0 * p0.x + b1 * c1.x + b2 * c2.x + b3 * p1.x,
        b0 * p0.y + b1 * c1.y + b2 * c2.y + b3 * p1.y,
    )
}

fn orientation(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn within_bounds(a: Point, b: Point, p: Point) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// True when the closed segments `a1-a2` and `b1-b2` share at least one point.
pub fn segments_intersect(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let d1 = orientation(b1, b2, a1);
    let d2 = orientation(b1, b2, a2);
    let d3 = orientation(a1, a2, b1);
    let d4 = orientation(a1, a2, b2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && within_bounds(b1, b2, a1))
        || (d2 == 0.0 && within_bounds(b1, b2, a2))
        || (d3 == 0.0 && within_bounds(a1, a2, b1))
        || (d4 == 0.0 && within_bounds(a1, a2, b2))
}

fn adjacent_edges(i: usize, j: usize, n: usize) -> bool {
    let d = i.abs_diff(j);
    d == 1 || d == n - 1
}

/// First pair of non-adjacent edges that touch, found by sweeping edge
/// bounding boxes along x so only edges with overlapping boxes are tested.
fn first_crossing(vertices: &[Point]) -> Option<(usize, usize)> {
    let n = vertices.len();
    let edge = |i: usize| (vertices[i], vertices[(i + 1) % n]);
    let min_x = |i: usize| {
        let (p, q) = edge(i);
        p.x.min(q.x)
    };

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| min_x(a).total_cmp(&min_x(b)));

    for (k, &i) in order.iter().enumerate() {
        let (a1, a2) = edge(i);
        let max_x = a1.x.max(a2.x);
        let (lo_y, hi_y) = (a1.y.min(a2.y), a1.y.max(a2.y));

        for &j in &order[k + 1..] {
            let (b1, b2) = edge(j);
            if b1.x.min(b2.x) > max_x {
                break;
            }
            if b1.y.max(b2.y) < lo_y || b1.y.min(b2.y) > hi_y || adjacent_edges(i, j, n) {
                continue;
            }
            if segments_intersect(a1, a2, b1, b2) {
                return Some((i.min(j), i.max(j)));
            }
        }
    }
    None
}

/// Checks that `points` form a simple polygon with non-zero area and returns
/// its cleaned vertex list.
pub fn validate_polygon(points: &[Point]) -> Result<Vec<Point>> {
    if let Some(p) = points.iter().find(|p| !p.is_finite()) {
        return Err(AnalysisError::InvalidGeometry(format!(
            "non-finite vertex ({}, {})",
            p.x, p.y
        )));
    }

    let vertices = dedup_vertices(points);
    if vertices.len() < 3 {
        return Err(AnalysisError::InvalidGeometry(format!(
            "polygon needs at least 3 distinct vertices, got {}",
            vertices.len()
        )));
    }

    if polygon_area(&vertices) == 0.0 {
        return Err(AnalysisError::InvalidGeometry(
            "polygon encloses zero area".to_string(),
        ));
    }

    if let Some((i, j)) = first_crossing(&vertices) {
        return Err(AnalysisError::InvalidGeometry(format!(
            "polygon edges {} and {} intersect",
            i, j
        )));
    }

    Ok(vertices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
        ]
    }

    #[test]
    fn shoelace_area() {
        assert_eq!(polygon_area(&square()), 16.0);
        let mut reversed = square();
        reversed.reverse();
        assert_eq!(polygon_area(&reversed), -16.0);
    }

    #[test]
    fn closing_vertex_is_dropped() {
        let mut closed = square();
        closed.push(Point::new(0.0, 0.0));
        assert_eq!(dedup_vertices(&closed).len(), 4);
    }

    #[test]
    fn bowtie_is_rejected() {
        let bowtie = vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(4.0, 0.0),
            Point::new(0.0, 4.0),
        ];
        assert!(matches!(
            validate_polygon(&bowtie),
            Err(AnalysisError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn collinear_points_are_rejected() {
        let line = vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0), Point::new(3.0, 3.0)];
        assert!(validate_polygon(&line).is_err());
    }

    #[test]
    fn crossing_between_distant_edges_is_found() {
        // Edge 0 runs along the bottom; edges 3 and 4 dip below it.
        let outline = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(6.0, 10.0),
            Point::new(5.0, -2.0),
            Point::new(4.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert!(matches!(first_crossing(&outline), Some((0, 3)) | Some((0, 4))));
        assert!(validate_polygon(&outline).is_err());
    }

    #[test]
    fn dense_outline_validates() {
        let n = 20_000;
        let circle: Vec<Point> = (0..n)
            .map(|i| {
                let angle = i as f64 * std::f64::consts::TAU / n as f64;
                Point::new(500.0 + 400.0 * angle.cos(), 500.0 + 400.0 * angle.sin())
            })
            .collect();
        assert_eq!(validate_polygon(&circle).unwrap().len(), n);
    }

    #[test]
    fn shared_vertex_of_adjacent_edges_is_not_a_crossing() {
        let triangle = vec![Point::new(0.0, 0.0), Point::new(4.0, 0.0), Point::new(0.0, 4.0)];
        assert_eq!(first_crossing(&triangle), None);
    }

    #[test]
    fn spline_passes_through_control_points() {
        let flat = catmull_rom_closed(&square());
        assert_eq!(flat.len(), 4 * SPLINE_SEGMENTS);
        assert_eq!(flat[0], Point::new(0.0, 0.0));
        assert_eq!(flat[SPLINE_SEGMENTS], Point::new(4.0, 0.0));
        assert!(validate_polygon(&flat).is_ok());
    }
}
