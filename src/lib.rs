pub mod analysis_pipeline;
pub mod logger;
