//! Colocalization types

/// Intensity thresholds above which a channel counts as signal in Manders'
/// coefficients. Supplied by the caller; never estimated here.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColocThresholds {
    /// Threshold on channel A, used for M2
    pub channel_a: f64,
    /// Threshold on channel B, used for M1
    pub channel_b: f64,
}

impl ColocThresholds {
    pub fn new(channel_a: f64, channel_b: f64) -> Self {
        Self { channel_a, channel_b }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColocResult {
    /// Pearson's correlation coefficient
    pub pcc: f64,
    /// Fraction of A's intensity where B is above its threshold
    pub m1: f64,
    /// Fraction of B's intensity where A is above its threshold
    pub m2: f64,
    pub pixel_count: usize,
}

/// Colocalization of one channel pair within one ROI.
#[derive(Debug, Clone, PartialEq)]
pub struct ColocRecord {
    pub roi_id: String,
    pub label: String,
    pub channel_a: String,
    pub channel_b: String,
    pub result: ColocResult,
}
