//! Fit / transform orchestration over the processing stages.
//!
//! `fit` learns the frozen statistics from a reference company table;
//! `transform` applies them, never mutating them, and can be called any
//! number of times (including concurrently) with the same statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};
use uuid::Uuid;

use super::run_report::{RunReport, StageCounts, TierCounts};
use crate::config::PipelineConfig;
use crate::domain::CompanyRecord;
use crate::error::Result;
use crate::metrics::ImputationMetrics;
use crate::pipeline::ingestion::{CorrectionTable, IngestNormalizer, RawTable};
use crate::pipeline::processing::assembler::AgeStatistics;
use crate::pipeline::processing::{
    technical_profile_batches, EmployeeCountResolver, FeatureTable, FeatureTableAssembler,
    FlattenedProfile, FounderFeatureAggregator, GrowthStageResolver, PersonClassifier,
    ProfileFlattener, ResolvedCompany, ScrapeTarget,
};

/// Everything learned by a fit pass. Serializable so an external store can
/// keep it; this crate never writes it anywhere itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedStatistics {
    pub employees: EmployeeCountResolver,
    pub stages: GrowthStageResolver,
    pub ages: AgeStatistics,
    pub config_fingerprint: String,
    pub corrections_fingerprint: String,
    pub fitted_at: DateTime<Utc>,
}

/// The three raw tables a transform consumes.
pub struct PipelineInputs<'a> {
    pub companies: &'a RawTable,
    pub personnel: &'a RawTable,
    pub fragments: &'a RawTable,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub table: FeatureTable,
    pub report: RunReport,
    /// Technical profiles to hand to the external profile scraper
    pub scrape_batches: Vec<Vec<ScrapeTarget>>,
    /// One fixed-width row per scraped profile id
    pub profiles: Vec<FlattenedProfile>,
}

pub struct FeaturePipeline {
    config: PipelineConfig,
    config_fingerprint: String,
    normalizer: IngestNormalizer,
    classifier: PersonClassifier,
    flattener: ProfileFlattener,
    aggregator: FounderFeatureAggregator,
}

impl FeaturePipeline {
    pub fn new(config: PipelineConfig, corrections: CorrectionTable) -> Result<Self> {
        config.validate()?;
        let aggregator = FounderFeatureAggregator::new(&config.founder_signals)?;

        Ok(Self {
            config_fingerprint: config.fingerprint(),
            normalizer: IngestNormalizer::new(corrections),
            classifier: PersonClassifier::new(&config.keywords)?,
            flattener: ProfileFlattener::new(config.profiles.slot_capacity),
            aggregator,
            config,
        })
    }

    /// Build from a config, loading its correction table when one is configured.
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        let corrections = match &config.corrections_path {
            Some(path) => CorrectionTable::load(path)?,
            None => CorrectionTable::default(),
        };
        Self::new(config, corrections)
    }

    /// Normalise the reference company table and learn the frozen statistics.
    pub fn fit(&self, reference: &RawTable) -> Result<FittedStatistics> {
        let normalized = self.normalizer.normalize_companies(reference)?;
        Ok(self.fit_records(&normalized.records))
    }

    pub fn fit_records(&self, reference: &[CompanyRecord]) -> FittedStatistics {
        let _span = info_span!("fit", reference_rows = reference.len()).entered();

        let employees = EmployeeCountResolver::fit(reference, &self.config.imputation);
        let stages = GrowthStageResolver::fit(reference);
        let ages = AgeStatistics::fit(reference, self.config.imputation.reference_year);
        ImputationMetrics::record_fit(reference.len(), employees.cohorts().len());

        info!(
            cohorts = employees.cohorts().len(),
            stage_cohorts = stages.cohorts(),
            mean_age = ?ages.mean_age,
            "Statistics frozen"
        );

        FittedStatistics {
            employees,
            stages,
            ages,
            config_fingerprint: self.config_fingerprint.clone(),
            corrections_fingerprint: self.normalizer.corrections().fingerprint().to_string(),
            fitted_at: Utc::now(),
        }
    }

    /// Apply frozen statistics to the input tables.
    ///
    /// All three tables are schema-checked and normalised before any resolver
    /// runs, so a schema mismatch aborts with nothing computed.
    pub fn transform(
        &self,
        stats: &FittedStatistics,
        inputs: PipelineInputs<'_>,
    ) -> Result<PipelineOutput> {
        let run_id = Uuid::new_v4();
        let _span = info_span!("feature_pipeline", run_id = %run_id).entered();

        if stats.config_fingerprint != self.config_fingerprint {
            warn!(
                fitted = %stats.config_fingerprint,
                current = %self.config_fingerprint,
                "Statistics were fitted under a different configuration"
            );
        }
        if stats.corrections_fingerprint != self.normalizer.corrections().fingerprint() {
            warn!("Statistics were fitted with a different correction table");
        }

        let companies = self.normalizer.normalize_companies(inputs.companies)?;
        let personnel = self.normalizer.normalize_personnel(inputs.personnel)?;
        let fragments = self.normalizer.normalize_fragments(inputs.fragments)?;

        let mut report = RunReport::new(run_id);
        report.companies_in = inputs.companies.len();
        report.excluded_rows = companies.excluded_rows;
        report.rejected_rows =
            companies.rejected_rows + personnel.rejected_rows + fragments.rejected_rows;
        report.malformed_fields =
            companies.issues.len() + personnel.issues.len() + fragments.issues.len();

        // Imputation
        let counts = stats.employees.transform(&companies.records);
        let stages = stats.stages.transform(&companies.records);
        report.employee_tiers = TierCounts::tally(&counts);
        report.stage_resolutions = StageCounts::tally(&stages);

        // Personnel
        let persons = self.classifier.classify_all(&personnel.records);
        report.persons_classified = persons.len();
        report.technical_persons = persons.iter().filter(|p| p.technical).count();

        let scrape_batches =
            technical_profile_batches(&persons, self.config.profiles.scrape_batch_size);
        report.scrape_batches = scrape_batches.len();

        let flattened = self.flattener.flatten(&fragments.records);
        report.profiles_flattened = flattened.profiles.len();
        report.fragments_dropped = flattened.dropped_fragments;

        let aggregates = self.aggregator.aggregate(&persons, &flattened.profiles);

        // Assembly
        let resolved: Vec<ResolvedCompany> = companies
            .records
            .into_iter()
            .zip(counts)
            .zip(stages)
            .map(|((record, employees), stage)| ResolvedCompany { record, employees, stage })
            .collect();
        let assembler = FeatureTableAssembler::new(stats.ages, &self.config.features);
        let table = assembler.assemble(resolved, &aggregates);

        report.companies_out = table.len();
        report.companies_without_personnel = table.companies_without_personnel();
        report.publish_metrics();
        report.log();

        Ok(PipelineOutput {
            table,
            report,
            scrape_batches,
            profiles: flattened.profiles,
        })
    }

    /// Fit on the company table of `inputs`, then transform the same inputs.
    pub fn fit_transform(
        &self,
        inputs: PipelineInputs<'_>,
    ) -> Result<(FittedStatistics, PipelineOutput)> {
        let stats = self.fit(inputs.companies)?;
        let output = self.transform(&stats, inputs)?;
        Ok((stats, output))
    }
}
