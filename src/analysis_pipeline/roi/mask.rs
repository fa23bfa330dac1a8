//! Binary ROI masks at raw image resolution.

use crate::analysis_pipeline::common::error::{AnalysisError, Result};
use crate::analysis_pipeline::roi::types::Point;

/// Row-major binary mask; `true` marks a pixel wholly inside the ROI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoiMask {
    width: usize,
    height: usize,
    data: Vec<bool>,
}

impl RoiMask {
    pub fn new_empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![false; width * height],
        }
    }

    pub fn new_full(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![true; width * height],
        }
    }

    pub fn from_vec(width: usize, height: usize, data: Vec<bool>) -> Result<Self> {
        let expected = width
            .checked_mul(height)
            .ok_or(AnalysisError::InvalidDimensions(width, height))?;
        if data.len() != expected {
            return Err(AnalysisError::SampleCountMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[bool] {
        &self.data
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.data[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = value;
        }
    }

    /// Sets pixels `x0..=x1` of row `y`; the span must already be clipped.
    pub(crate) fn fill_span(&mut self, y: usize, x0: usize, x1: usize) {
        let start = y * self.width;
        self.data[start + x0..=start + x1].fill(true);
    }

    pub fn pixel_count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.data.iter().any(|&v| v)
    }

    /// Row-major indices of set pixels.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.data
            .iter()
            .enumerate()
            .filter_map(|(i, &v)| if v { Some(i) } else { None })
    }

    pub fn ensure_dimensions(&self, width: usize, height: usize) -> Result<()> {
        if self.dimensions() != (width, height) {
            return Err(AnalysisError::DimensionMismatch {
                expected: (width, height),
                actual: self.dimensions(),
            });
        }
        Ok(())
    }

    fn combine(&self, other: &RoiMask, op: impl Fn(bool, bool) -> bool) -> Result<RoiMask> {
        other.ensure_dimensions(self.width, self.height)?;
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(&a, &b)| op(a, b))
            .collect();
        Ok(RoiMask {
            width: self.width,
            height: self.height,
            data,
        })
    }

    pub fn intersection(&self, other: &RoiMask) -> Result<RoiMask> {
        self.combine(other, |a, b| a && b)
    }

    pub fn union(&self, other: &RoiMask) -> Result<RoiMask> {
        self.combine(other, |a, b| a || b)
    }

    /// Pixels in `self` but not in `other`.
    pub fn difference(&self, other: &RoiMask) -> Result<RoiMask> {
        self.combine(other, |a, b| a && !b)
    }

    /// Inclusive pixel bounds `(x0, y0, x1, y1)` of the set pixels.
    pub fn bounding_box(&self) -> Option<(usize, usize, usize, usize)> {
        let mut bounds: Option<(usize, usize, usize, usize)> = None;
        for i in self.indices() {
            let (x, y) = (i % self.width, i / self.width);
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
        bounds
    }

    /// Mean of the set pixel centers.
    pub fn centroid(&self) -> Option<Point> {
        let (mut sx, mut sy, mut n) = (0.0f64, 0.0f64, 0usize);
        for i in self.indices() {
            sx += (i % self.width) as f64 + 0.5;
            sy += (i / self.width) as f64 + 0.5;
            n += 1;
        }
        if n == 0 {
            None
        } else {
            Some(Point::new(sx / n as f64, sy / n as f64))
        }
    }
}
