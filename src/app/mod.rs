pub mod feature_pipeline;
pub mod feature_pipeline_use_case;
pub mod ports;
pub mod run_report;
