//! Intensity measurement over raw channel buffers.
//!
//! Samples are widened to f64 one at a time and accumulated in f64, so 8-bit,
//! 16-bit and float buffers share one code path and large 16-bit regions
//! cannot overflow.

use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::analysis_pipeline::channel::types::{ChannelBuffer, SampleData};
use crate::analysis_pipeline::common::error::{AnalysisError, Result};
use crate::analysis_pipeline::measure::types::{
    BackgroundMethod, Calibration, ChannelStats, MeasurementRecord,
};
use crate::analysis_pipeline::roi::{Roi, RoiMask, rasterize, ring_mask};

#[derive(Debug, Clone, Copy)]
struct Accumulator {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

fn accumulate<T: Copy + Into<f64>>(samples: &[T], mask: &[bool]) -> Accumulator {
    let mut acc = Accumulator::new();
    for (&sample, &inside) in samples.iter().zip(mask) {
        if !inside {
            continue;
        }
        let v: f64 = sample.into();
        acc.count += 1;
        acc.sum += v;
        acc.min = acc.min.min(v);
        acc.max = acc.max.max(v);
    }
    acc
}

fn accumulate_channel(channel: &ChannelBuffer, mask: &RoiMask) -> Result<Accumulator> {
    mask.ensure_dimensions(channel.width, channel.height)?;
    Ok(match &channel.samples {
        SampleData::U8(v) => accumulate(v, mask.data()),
        SampleData::U16(v) => accumulate(v, mask.data()),
        SampleData::F32(v) => accumulate(v, mask.data()),
    })
}

/// Measures `channel` inside `mask`.
///
/// Fails with `DimensionMismatch` when the mask was not rasterized at the
/// channel's raw size and with `EmptyMask` when no pixel is selected.
pub fn measure_channel(
    channel: &ChannelBuffer,
    mask: &RoiMask,
    calibration: &Calibration,
) -> Result<ChannelStats> {
    let acc = accumulate_channel(channel, mask)?;
    if acc.count == 0 {
        return Err(AnalysisError::EmptyMask);
    }
    Ok(ChannelStats {
        pixel_count: acc.count,
        sum: acc.sum,
        mean: acc.sum / acc.count as f64,
        min: acc.min,
        max: acc.max,
        area: acc.count as f64 * calibration.pixel_area(),
    })
}

/// Mean of `channel` over `mask`, or 0 when the mask is empty.
fn masked_mean_or_zero(channel: &ChannelBuffer, mask: &RoiMask) -> Result<f64> {
    let acc = accumulate_channel(channel, mask)?;
    if acc.count == 0 {
        Ok(0.0)
    } else {
        Ok(acc.sum / acc.count as f64)
    }
}

/// Multi-channel ROI measurement with optional background correction.
#[derive(Debug, Clone, Default)]
pub struct MeasureEngine {
    background: BackgroundMethod,
}

impl MeasureEngine {
    pub fn new(background: BackgroundMethod) -> Self {
        Self { background }
    }

    pub fn background(&self) -> BackgroundMethod {
        self.background
    }

    fn background_for(&self, channel: &ChannelBuffer, mask: &RoiMask) -> Result<Option<f64>> {
        match self.background {
            BackgroundMethod::None => Ok(None),
            BackgroundMethod::GlobalMin => Ok(Some(channel.global_min().unwrap_or(0.0))),
            BackgroundMethod::LocalRing { width } => {
                let ring = ring_mask(mask, width);
                masked_mean_or_zero(channel, &ring).map(Some)
            }
        }
    }

    /// Measures one ROI on every channel, one record per channel.
    ///
    /// The ROI is rasterized at each channel's own raw size, so channels of
    /// different resolution never share a mismatched mask.
    #[instrument(skip(self, roi, channels, calibration), fields(roi = %roi.id, channels = channels.len()))]
    pub fn measure_roi(
        &self,
        roi: &Roi,
        channels: &[ChannelBuffer],
        calibration: &Calibration,
    ) -> Result<Vec<MeasurementRecord>> {
        let mut masks: Vec<((usize, usize), RoiMask)> = Vec::new();
        let mut records = Vec::with_capacity(channels.len());

        for channel in channels {
            let dims = channel.dimensions();
            let mask = match masks.iter().position(|(d, _)| *d == dims) {
                Some(i) => &masks[i].1,
                None => {
                    masks.push((dims, rasterize(&roi.shape, dims.0, dims.1)?));
                    &masks[masks.len() - 1].1
                }
            };

            let stats = measure_channel(channel, mask, calibration)?;
            let mut record =
                MeasurementRecord::new(&roi.id, &roi.label, &channel.id, &stats, calibration.area_unit());
            if let Some(bg) = self.background_for(channel, mask)? {
                record = record.with_background(bg);
            }
            debug!(
                channel = %channel.id,
                pixels = stats.pixel_count,
                mean = stats.mean,
                "Measured channel"
            );
            records.push(record);
        }

        Ok(records)
    }

    /// Measures many ROIs in parallel; results keep the input order and each
    /// ROI fails independently.
    pub fn measure_batch(
        &self,
        rois: &[Roi],
        channels: &[ChannelBuffer],
        calibration: &Calibration,
    ) -> Vec<Result<Vec<MeasurementRecord>>> {
        rois.par_iter()
            .map(|roi| self.measure_roi(roi, channels, calibration))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis_pipeline::roi::RoiShape;

    fn ramp_4x4() -> ChannelBuffer {
        ChannelBuffer::from_u16("ramp", 4, 4, (0..16).collect()).unwrap()
    }

    #[test]
    fn full_frame_ramp() {
        let stats = measure_channel(&ramp_4x4(), &RoiMask::new_full(4, 4), &Calibration::default()).unwrap();

        assert_eq!(stats.pixel_count, 16);
        assert_eq!(stats.sum, 120.0);
        assert_eq!(stats.mean, 7.5);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 15.0);
        assert_eq!(stats.area, 16.0);
    }

    #[test]
    fn single_pixel_mask_reports_that_pixel() {
        let mut mask = RoiMask::new_empty(4, 4);
        mask.set(2, 3, true);

        let stats = measure_channel(&ramp_4x4(), &mask, &Calibration::default()).unwrap();
        assert_eq!(stats.pixel_count, 1);
        assert_eq!(stats.mean, 14.0);
        assert_eq!(stats.min, 14.0);
        assert_eq!(stats.max, 14.0);
    }

    #[test]
    fn large_16bit_area_does_not_lose_precision() {
        let (w, h) = (2048, 2048);
        let data: Vec<u16> = (0..w * h).map(|i| (i % 65536) as u16).collect();
        let expected_sum: f64 = data.iter().map(|&v| v as f64).sum();
        let channel = ChannelBuffer::from_u16("big", w, h, data).unwrap();

        let stats = measure_channel(&channel, &RoiMask::new_full(w, h), &Calibration::default()).unwrap();
        assert_eq!(stats.sum, expected_sum);
        assert_eq!(stats.mean, 32767.5);
        assert_eq!(stats.max, 65535.0);
    }

    #[test]
    fn full_frame_mean_matches_independent_mean_for_each_depth() {
        let u8_data: Vec<u8> = (0..100).map(|i| (i * 7 % 256) as u8).collect();
        let f32_data: Vec<f32> = (0..100).map(|i| i as f32 * 0.37 - 3.0).collect();
        let channels = [
            ChannelBuffer::from_u8("a", 10, 10, u8_data.clone()).unwrap(),
            ChannelBuffer::from_f32("b", 10, 10, f32_data.clone()).unwrap(),
        ];
        let expected = [
            u8_data.iter().map(|&v| v as f64).sum::<f64>() / 100.0,
            f32_data.iter().map(|&v| v as f64).sum::<f64>() / 100.0,
        ];

        for (channel, expected) in channels.iter().zip(expected) {
            let stats = measure_channel(channel, &RoiMask::new_full(10, 10), &Calibration::default()).unwrap();
            assert!((stats.mean - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn calibrated_area() {
        let calibration = Calibration::new(0.5, 2.0, "µm").unwrap();
        let stats = measure_channel(&ramp_4x4(), &RoiMask::new_full(4, 4), &calibration).unwrap();
        assert_eq!(stats.area, 16.0);

        let calibration = Calibration::isotropic(0.25, "µm").unwrap();
        let stats = measure_channel(&ramp_4x4(), &RoiMask::new_full(4, 4), &calibration).unwrap();
        assert_eq!(stats.area, 1.0);
    }

    #[test]
    fn empty_mask_is_an_error() {
        let result = measure_channel(&ramp_4x4(), &RoiMask::new_empty(4, 4), &Calibration::default());
        assert!(matches!(result, Err(AnalysisError::EmptyMask)));
    }

    #[test]
    fn mask_size_must_match_raw_size() {
        let result = measure_channel(&ramp_4x4(), &RoiMask::new_full(2, 2), &Calibration::default());
        assert!(matches!(result, Err(AnalysisError::DimensionMismatch { .. })));
    }

    #[test]
    fn zero_area_rectangle_fails_at_any_size() {
        let engine = MeasureEngine::default();
        for size in [1usize, 4, 33, 256] {
            let channel = ChannelBuffer::from_u8("ch", size, size, vec![9; size * size]).unwrap();
            let roi = Roi::new("r", "zero", RoiShape::rectangle(0.5, 0.5, 0.0, size as f64));
            let result = engine.measure_roi(&roi, &[channel], &Calibration::default());
            assert!(matches!(result, Err(AnalysisError::EmptyMask)), "size {}", size);
        }
    }

    #[test]
    fn roi_is_rasterized_per_channel_size() {
        let small = ChannelBuffer::from_u8("small", 2, 2, vec![1, 2, 3, 4]).unwrap();
        let large = ChannelBuffer::from_u8("large", 4, 4, vec![1; 16]).unwrap();
        let roi = Roi::new("r", "ROI", RoiShape::rectangle(0.0, 0.0, 2.0, 2.0));

        let records = MeasureEngine::default()
            .measure_roi(&roi, &[small, large], &Calibration::default())
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].channel_id, "small");
        assert_eq!(records[0].sum, 10.0);
        assert_eq!(records[1].pixel_count, 4);
        assert_eq!(records[1].background, None);
    }

    #[test]
    fn global_min_background() {
        let channel = ChannelBuffer::from_u16("ch", 3, 1, vec![5, 20, 30]).unwrap();
        let roi = Roi::new("r", "ROI", RoiShape::rectangle(1.0, 0.0, 2.0, 1.0));

        let records = MeasureEngine::new(BackgroundMethod::GlobalMin)
            .measure_roi(&roi, &[channel], &Calibration::default())
            .unwrap();

        assert_eq!(records[0].mean, 25.0);
        assert_eq!(records[0].background, Some(5.0));
        assert_eq!(records[0].corrected_mean, Some(20.0));
    }

    #[test]
    fn local_ring_background() {
        // 100 inside the central pixel, 10 around it, 1000 further out.
        #[rustfmt::skip]
        let data = vec![
            1000, 1000, 1000, 1000, 1000,
            1000,   10,   10,   10, 1000,
            1000,   10,  100,   10, 1000,
            1000,   10,   10,   10, 1000,
            1000, 1000, 1000, 1000, 1000,
        ];
        let channel = ChannelBuffer::from_u16("ch", 5, 5, data).unwrap();
        let roi = Roi::new("r", "ROI", RoiShape::rectangle(2.0, 2.0, 1.0, 1.0));

        let records = MeasureEngine::new(BackgroundMethod::LocalRing { width: 1 })
            .measure_roi(&roi, &[channel], &Calibration::default())
            .unwrap();

        assert_eq!(records[0].mean, 100.0);
        assert_eq!(records[0].background, Some(10.0));
        assert_eq!(records[0].corrected_mean, Some(90.0));
    }

    #[test]
    fn batch_keeps_order_and_isolates_failures() {
        let channel = ramp_4x4();
        let rois = vec![
            Roi::new("a", "A", RoiShape::rectangle(0.0, 0.0, 4.0, 1.0)),
            Roi::new("b", "B", RoiShape::rectangle(0.0, 0.0, 0.0, 0.0)),
            Roi::new("c", "C", RoiShape::rectangle(0.0, 3.0, 4.0, 1.0)),
        ];

        let results = MeasureEngine::default().measure_batch(&rois, &[channel], &Calibration::default());

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap()[0].sum, 6.0);
        assert!(matches!(results[1], Err(AnalysisError::EmptyMask)));
        assert_eq!(results[2].as_ref().unwrap()[0].sum, 54.0);
    }
}
