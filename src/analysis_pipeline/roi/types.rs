//! ROI geometry types
//!
//! All coordinates are raw-image pixel coordinates: the pixel at column `x`,
//! row `y` covers `[x, x + 1) × [y, y + 1)` and its center is `(x + 0.5, y + 0.5)`.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Outline drawn for a point-counter marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    Circle,
    Square,
    Triangle,
}

/// Closed ROI outline.
#[derive(Debug, Clone, PartialEq)]
pub enum RoiShape {
    /// Axis-aligned rectangle spanning two opposite corners (any order)
    Rectangle { a: Point, b: Point },
    /// Ellipse inscribed in the rectangle spanning two opposite corners
    Ellipse { a: Point, b: Point },
    /// Straight-edged closed polygon
    Polygon(Vec<Point>),
    /// Closed Catmull-Rom spline through the control points
    SmoothPolygon(Vec<Point>),
}

impl RoiShape {
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        RoiShape::Rectangle {
            a: Point::new(x, y),
            b: Point::new(x + width, y + height),
        }
    }

    pub fn ellipse(x: f64, y: f64, width: f64, height: f64) -> Self {
        RoiShape::Ellipse {
            a: Point::new(x, y),
            b: Point::new(x + width, y + height),
        }
    }

    /// Full-frame rectangle for a `width × height` image.
    pub fn full_frame(width: usize, height: usize) -> Self {
        Self::rectangle(0.0, 0.0, width as f64, height as f64)
    }

    /// Point-counter marker of the given radius centered on `center`.
    pub fn marker(center: Point, radius: f64, style: MarkerStyle) -> Self {
        let Point { x, y } = center;
        match style {
            MarkerStyle::Circle => Self::ellipse(x - radius, y - radius, 2.0 * radius, 2.0 * radius),
            MarkerStyle::Square => Self::rectangle(x - radius, y - radius, 2.0 * radius, 2.0 * radius),
            MarkerStyle::Triangle => RoiShape::Polygon(vec![
                Point::new(x, y - radius),
                Point::new(x + radius, y + radius),
                Point::new(x - radius, y + radius),
            ]),
        }
    }
}

/// Region of interest as drawn by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Roi {
    pub id: String,
    pub label: String,
    pub shape: RoiShape,
}

impl Roi {
    pub fn new(id: impl Into<String>, label: impl Into<String>, shape: RoiShape) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            shape,
        }
    }
}
