//! Channel reader implementation using the tiff library.
//!
//! Microscopy exports are overwhelmingly TIFF: single-page grayscale at 8 or
//! 16 bits, 32-bit float results of prior processing, RGB snapshots, and
//! multi-page Z-stacks. Every variant is reduced to one 2D buffer at its
//! native depth.

use std::io::Cursor;

use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tracing::{debug, warn};

use crate::analysis_pipeline::channel::reader::ChannelReader;
use crate::analysis_pipeline::channel::types::{ChannelBuffer, SampleData};
use crate::analysis_pipeline::common::error::{AnalysisError, Result};

/// Decoding buffer limit; full-resolution mosaics exceed the decoder's
/// 256 MiB default.
const DECODE_LIMIT_BYTES: usize = 1 << 31;

fn decoding_limits() -> Limits {
    let mut limits = Limits::default();
    limits.decoding_buffer_size = DECODE_LIMIT_BYTES;
    limits.ifd_value_size = DECODE_LIMIT_BYTES;
    limits.intermediate_buffer_size = DECODE_LIMIT_BYTES;
    limits
}

/// TIFF reader that keeps samples at the depth stored in the file.
///
/// - Gray (8/16-bit integer, 32-bit float): samples are used unchanged
/// - Gray + alpha: the gray sample is kept
/// - RGB / RGBA / multiband: per-pixel maximum over the color samples
/// - Multi-page stacks of equal size: per-pixel maximum over pages
pub struct TiffChannelReader;

/// How one page's interleaved samples collapse to a single value per pixel.
#[derive(Debug, Clone, Copy)]
struct PixelLayout {
    samples_per_pixel: usize,
    /// Number of leading samples that carry intensity
    intensity_samples: usize,
}

impl PixelLayout {
    fn from_color_type(color_type: ColorType) -> Result<Self> {
        let (samples_per_pixel, intensity_samples) = match color_type {
            ColorType::Gray(_) => (1, 1),
            ColorType::GrayA(_) => (2, 1),
            ColorType::RGB(_) => (3, 3),
            ColorType::RGBA(_) => (4, 3),
            ColorType::Multiband { num_samples, .. } => {
                let n = num_samples as usize;
                if n == 4 { (4, 3) } else { (n, n) }
            }
            other => {
                return Err(AnalysisError::UnsupportedFormat(format!(
                    "color type {:?} cannot be read as raw intensities",
                    other
                )));
            }
        };
        if samples_per_pixel == 0 {
            return Err(AnalysisError::UnsupportedFormat(
                "image declares zero samples per pixel".to_string(),
            ));
        }
        Ok(Self {
            samples_per_pixel,
            intensity_samples,
        })
    }
}

fn project<T: Copy + PartialOrd>(data: &[T], layout: PixelLayout) -> Vec<T> {
    if layout.samples_per_pixel == 1 {
        return data.to_vec();
    }
    data.chunks_exact(layout.samples_per_pixel)
        .map(|pixel| {
            let mut value = pixel[0];
            for &s in &pixel[1..layout.intensity_samples] {
                if s > value {
                    value = s;
                }
            }
            value
        })
        .collect()
}

fn max_in_place<T: Copy + PartialOrd>(acc: &mut [T], page: &[T]) {
    for (a, &p) in acc.iter_mut().zip(page) {
        if p > *a {
            *a = p;
        }
    }
}

fn merge_page(acc: &mut SampleData, page: SampleData) -> Result<()> {
    match (acc, page) {
        (SampleData::U8(a), SampleData::U8(p)) => max_in_place(a, &p),
        (SampleData::U16(a), SampleData::U16(p)) => max_in_place(a, &p),
        (SampleData::F32(a), SampleData::F32(p)) => max_in_place(a, &p),
        _ => {
            return Err(AnalysisError::UnsupportedFormat(
                "stack pages use different sample types".to_string(),
            ));
        }
    }
    Ok(())
}

impl TiffChannelReader {
    fn read_with_limits(data: &[u8], channel_id: &str, limits: Limits) -> Result<ChannelBuffer> {
        debug!("Decoding TIFF channel {}, {} bytes", channel_id, data.len());

        let mut decoder = Decoder::new(Cursor::new(data))
            .map_err(|e| AnalysisError::DecodeError(e.to_string()))?
            .with_limits(limits);

        let (width, height) = decoder
            .dimensions()
            .map_err(|e| AnalysisError::DecodeError(e.to_string()))?;
        let (width, height) = (width as usize, height as usize);
        if width == 0 || height == 0 {
            return Err(AnalysisError::InvalidDimensions(width, height));
        }

        let mut samples = Self::decode_page(&mut decoder, width, height)?;
        let mut pages = 1usize;

        while decoder.more_images() {
            decoder
                .next_image()
                .map_err(|e| AnalysisError::DecodeError(e.to_string()))?;
            let (w, h) = decoder
                .dimensions()
                .map_err(|e| AnalysisError::DecodeError(e.to_string()))?;
            if (w as usize, h as usize) != (width, height) {
                warn!(
                    "Ignoring page {}x{} in {}: stack pages must be {}x{}",
                    w, h, channel_id, width, height
                );
                continue;
            }
            let page = Self::decode_page(&mut decoder, width, height)?;
            merge_page(&mut samples, page)?;
            pages += 1;
        }

        if pages > 1 {
            debug!("Max-projected {} pages for channel {}", pages, channel_id);
        }
        debug!(
            "Decoded channel {}: {}x{}, {}-bit",
            channel_id,
            width,
            height,
            samples.sample_bits()
        );

        ChannelBuffer::new(channel_id, width, height, samples)
    }

    fn decode_page<R: std::io::Read + std::io::Seek>(
        decoder: &mut Decoder<R>,
        width: usize,
        height: usize,
    ) -> Result<SampleData> {
        let color_type = decoder
            .colortype()
            .map_err(|e| AnalysisError::DecodeError(e.to_string()))?;
        let layout = PixelLayout::from_color_type(color_type)?;

        let image = decoder
            .read_image()
            .map_err(|e| AnalysisError::DecodeError(e.to_string()))?;

        let samples = match image {
            DecodingResult::U8(values) => SampleData::U8(project(&values, layout)),
            DecodingResult::U16(values) => SampleData::U16(project(&values, layout)),
            DecodingResult::F32(values) => SampleData::F32(project(&values, layout)),
            _ => {
                return Err(AnalysisError::UnsupportedFormat(
                    "only 8-bit, 16-bit and 32-bit float samples are supported".to_string(),
                ));
            }
        };

        let expected = width * height;
        if samples.len() != expected {
            return Err(AnalysisError::SampleCountMismatch {
                expected,
                actual: samples.len(),
            });
        }
        Ok(samples)
    }
}

impl ChannelReader for TiffChannelReader {
    /// Decodes a TIFF file held in memory into a single channel buffer.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use fluoquant_rs::analysis_pipeline::{ChannelReader, TiffChannelReader};
    ///
    /// let bytes = std::fs::read("dapi.tif").unwrap();
    /// let channel = TiffChannelReader.read_channel(&bytes, "DAPI").unwrap();
    /// assert_eq!(channel.bits_per_sample, 16);
    /// ```
    fn read_channel(&self, data: &[u8], channel_id: &str) -> Result<ChannelBuffer> {
        Self::read_with_limits(data, channel_id, decoding_limits())
    }
}
