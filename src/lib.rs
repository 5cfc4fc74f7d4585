pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;

// Layered boundaries: application use cases and file adapters
pub mod app;
pub mod infra;

pub use app::feature_pipeline::{FeaturePipeline, FittedStatistics, PipelineInputs, PipelineOutput};
pub use config::PipelineConfig;
pub use error::{FeatureError, Result};
