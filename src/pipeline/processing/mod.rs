// Pipeline processing: imputation, profile reshaping, classification, assembly

pub mod assembler;
pub mod employee_count;
pub mod founder_features;
pub mod growth_stage;
pub mod person_classifier;
pub mod profile_flattener;
pub mod stats;

pub use assembler::{FeatureRow, FeatureTable, FeatureTableAssembler, ResolvedCompany};
pub use employee_count::{
    EmployeeCountResolver, EmployeeRangeMeanTable, ImputationTier, ResolvedCount,
};
pub use founder_features::{CompanyAggregate, FounderFeatureAggregator, FounderSignals};
pub use growth_stage::{GrowthStageResolver, ResolvedStage, StageResolution};
pub use person_classifier::{technical_profile_batches, PersonClassifier, ScrapeTarget};
pub use profile_flattener::{FlattenedProfile, ProfileFlattener};
