use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid ROI geometry: {0}")]
    InvalidGeometry(String),

    #[error("ROI mask contains no pixels")]
    EmptyMask,

    #[error("Degenerate channel: {0}")]
    DegenerateChannel(String),

    #[error("Dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Sample count mismatch: expected {expected}, got {actual}")]
    SampleCountMismatch { expected: usize, actual: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Invalid calibration: {0}")]
    InvalidCalibration(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AnalysisError {
    /// Errors that are reported as flagged result rows instead of aborting
    /// the whole analysis.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AnalysisError::InvalidGeometry(_)
                | AnalysisError::EmptyMask
                | AnalysisError::DegenerateChannel(_)
                | AnalysisError::DimensionMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
