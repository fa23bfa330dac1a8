//! Pearson and Manders colocalization over masked channel pairs.
//!
//! Every statistic is computed in f64 on raw samples; neither channel is
//! normalized or rescaled first.

use tracing::debug;

use crate::analysis_pipeline::channel::types::ChannelBuffer;
use crate::analysis_pipeline::coloc::types::{ColocResult, ColocThresholds};
use crate::analysis_pipeline::common::error::{AnalysisError, Result};
use crate::analysis_pipeline::roi::RoiMask;

/// Masked samples of both channels, paired by pixel.
fn masked_pairs(a: &ChannelBuffer, b: &ChannelBuffer, mask: &RoiMask) -> Result<(Vec<f64>, Vec<f64>)> {
    if b.dimensions() != a.dimensions() {
        return Err(AnalysisError::DimensionMismatch {
            expected: a.dimensions(),
            actual: b.dimensions(),
        });
    }
    mask.ensure_dimensions(a.width, a.height)?;

    let mut va = Vec::new();
    let mut vb = Vec::new();
    for index in mask.indices() {
        if let (Some(x), Some(y)) = (a.samples.get_f64(index), b.samples.get_f64(index)) {
            va.push(x);
            vb.push(y);
        }
    }
    if va.is_empty() {
        return Err(AnalysisError::EmptyMask);
    }
    Ok((va, vb))
}

fn is_constant(values: &[f64]) -> bool {
    values.iter().all(|&v| v == values[0])
}

fn pearson_of(a: &[f64], b: &[f64], a_id: &str, b_id: &str) -> Result<f64> {
    for (values, id) in [(a, a_id), (b, b_id)] {
        if is_constant(values) {
            return Err(AnalysisError::DegenerateChannel(format!(
                "channel {} has zero variance in the mask",
                id
            )));
        }
    }

    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let (mut cov, mut ss_a, mut ss_b) = (0.0, 0.0, 0.0);
    for (&x, &y) in a.iter().zip(b) {
        let (dx, dy) = (x - mean_a, y - mean_b);
        cov += dx * dy;
        ss_a += dx * dx;
        ss_b += dy * dy;
    }
    Ok(cov / (ss_a * ss_b).sqrt())
}

fn manders_of(a: &[f64], b: &[f64], thresholds: &ColocThresholds, a_id: &str, b_id: &str) -> Result<(f64, f64)> {
    let total_a: f64 = a.iter().sum();
    let total_b: f64 = b.iter().sum();
    for (total, id) in [(total_a, a_id), (total_b, b_id)] {
        if total == 0.0 {
            return Err(AnalysisError::DegenerateChannel(format!(
                "channel {} has zero total intensity in the mask",
                id
            )));
        }
    }

    let (mut coloc_a, mut coloc_b) = (0.0, 0.0);
    for (&x, &y) in a.iter().zip(b) {
        if y > thresholds.channel_b {
            coloc_a += x;
        }
        if x > thresholds.channel_a {
            coloc_b += y;
        }
    }
    Ok((coloc_a / total_a, coloc_b / total_b))
}

/// Pearson's correlation coefficient of `a` and `b` inside `mask`.
pub fn pearson(a: &ChannelBuffer, b: &ChannelBuffer, mask: &RoiMask) -> Result<f64> {
    let (va, vb) = masked_pairs(a, b, mask)?;
    pearson_of(&va, &vb, &a.id, &b.id)
}

/// Manders' M1 and M2 of `a` and `b` inside `mask`.
pub fn manders(
    a: &ChannelBuffer,
    b: &ChannelBuffer,
    mask: &RoiMask,
    thresholds: &ColocThresholds,
) -> Result<(f64, f64)> {
    let (va, vb) = masked_pairs(a, b, mask)?;
    manders_of(&va, &vb, thresholds, &a.id, &b.id)
}

/// PCC, M1 and M2 from one pass over the masked pixels.
pub fn analyze(
    a: &ChannelBuffer,
    b: &ChannelBuffer,
    mask: &RoiMask,
    thresholds: &ColocThresholds,
) -> Result<ColocResult> {
    let (va, vb) = masked_pairs(a, b, mask)?;
    let pcc = pearson_of(&va, &vb, &a.id, &b.id)?;
    let (m1, m2) = manders_of(&va, &vb, thresholds, &a.id, &b.id)?;
    debug!(
        "Colocalization {} vs {}: pcc={:.4} m1={:.4} m2={:.4} over {} px",
        a.id,
        b.id,
        pcc,
        m1,
        m2,
        va.len()
    );
    Ok(ColocResult {
        pcc,
        m1,
        m2,
        pixel_count: va.len(),
    })
}
