//! Channel buffer types

use crate::analysis_pipeline::common::error::{AnalysisError, Result};

/// Pixel samples at the depth they were decoded with.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleData {
    U8(Vec<u8>),
    U16(Vec<u16>),
    F32(Vec<f32>),
}

impl SampleData {
    pub fn len(&self) -> usize {
        match self {
            SampleData::U8(v) => v.len(),
            SampleData::U16(v) => v.len(),
            SampleData::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Native bit width of one sample.
    pub fn sample_bits(&self) -> u32 {
        match self {
            SampleData::U8(_) => 8,
            SampleData::U16(_) => 16,
            SampleData::F32(_) => 32,
        }
    }

    /// Returns the sample at `index` widened to f64 without rescaling.
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        match self {
            SampleData::U8(v) => v.get(index).map(|&s| s as f64),
            SampleData::U16(v) => v.get(index).map(|&s| s as f64),
            SampleData::F32(v) => v.get(index).map(|&s| s as f64),
        }
    }
}

/// One decoded fluorescence channel at raw resolution.
///
/// Buffers are never rescaled or downsampled after loading; every statistic
/// is computed against these samples.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelBuffer {
    /// Channel name, e.g. "DAPI" or "Ch1"
    pub id: String,
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// Row-major samples
    pub samples: SampleData,
    /// Bits per sample as stored in the source file
    pub bits_per_sample: u32,
}

impl ChannelBuffer {
    pub fn new(id: impl Into<String>, width: usize, height: usize, samples: SampleData) -> Result<Self> {
        let expected = width
            .checked_mul(height)
            .ok_or(AnalysisError::InvalidDimensions(width, height))?;
        if samples.len() != expected {
            return Err(AnalysisError::SampleCountMismatch {
                expected,
                actual: samples.len(),
            });
        }
        let bits_per_sample = samples.sample_bits();
        Ok(Self {
            id: id.into(),
            width,
            height,
            samples,
            bits_per_sample,
        })
    }

    pub fn from_u8(id: impl Into<String>, width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        Self::new(id, width, height, SampleData::U8(data))
    }

    pub fn from_u16(id: impl Into<String>, width: usize, height: usize, data: Vec<u16>) -> Result<Self> {
        Self::new(id, width, height, SampleData::U16(data))
    }

    pub fn from_f32(id: impl Into<String>, width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        Self::new(id, width, height, SampleData::F32(data))
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Sample at (x, y) as f64, or `None` outside the image.
    pub fn value_at(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.samples.get_f64(y * self.width + x)
    }

    /// Copies the whole buffer into f64, used by filters that need headroom.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match &self.samples {
            SampleData::U8(v) => v.iter().map(|&s| s as f64).collect(),
            SampleData::U16(v) => v.iter().map(|&s| s as f64).collect(),
            SampleData::F32(v) => v.iter().map(|&s| s as f64).collect(),
        }
    }

    /// Minimum over every pixel, ignoring NaN samples.
    pub fn global_min(&self) -> Option<f64> {
        match &self.samples {
            SampleData::U8(v) => v.iter().min().map(|&s| s as f64),
            SampleData::U16(v) => v.iter().min().map(|&s| s as f64),
            SampleData::F32(v) => v
                .iter()
                .filter(|s| !s.is_nan())
                .fold(None, |acc: Option<f32>, &s| Some(acc.map_or(s, |m| m.min(s))))
                .map(|s| s as f64),
        }
    }
}
