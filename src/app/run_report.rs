use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::metrics::{ImputationMetrics, PersonnelMetrics};
use crate::pipeline::processing::{ImputationTier, ResolvedCount, ResolvedStage, StageResolution};

/// Employee counts per resolution tier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub observed: usize,
    pub range_mean: usize,
    pub cohort_median: usize,
    pub global_median: usize,
    pub unresolved: usize,
}

impl TierCounts {
    pub fn tally(counts: &[ResolvedCount]) -> Self {
        let mut tally = Self::default();
        for count in counts {
            match count.tier {
                ImputationTier::Observed => tally.observed += 1,
                ImputationTier::RangeMean => tally.range_mean += 1,
                ImputationTier::CohortMedian => tally.cohort_median += 1,
                ImputationTier::GlobalMedian => tally.global_median += 1,
                ImputationTier::Unresolved => tally.unresolved += 1,
            }
        }
        tally
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    pub observed: usize,
    pub imputed: usize,
    pub unresolved: usize,
}

impl StageCounts {
    pub fn tally(stages: &[ResolvedStage]) -> Self {
        let mut tally = Self::default();
        for stage in stages {
            match stage.resolution {
                StageResolution::Observed => tally.observed += 1,
                StageResolution::CohortMode => tally.imputed += 1,
                StageResolution::Unresolved => tally.unresolved += 1,
            }
        }
        tally
    }
}

/// Per-run data-quality summary of a transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub companies_in: usize,
    pub companies_out: usize,
    pub excluded_rows: usize,
    pub rejected_rows: usize,
    pub malformed_fields: usize,
    pub employee_tiers: TierCounts,
    pub stage_resolutions: StageCounts,
    pub persons_classified: usize,
    pub technical_persons: usize,
    pub scrape_batches: usize,
    pub profiles_flattened: usize,
    pub fragments_dropped: usize,
    pub companies_without_personnel: usize,
}

impl RunReport {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            companies_in: 0,
            companies_out: 0,
            excluded_rows: 0,
            rejected_rows: 0,
            malformed_fields: 0,
            employee_tiers: TierCounts::default(),
            stage_resolutions: StageCounts::default(),
            persons_classified: 0,
            technical_persons: 0,
            scrape_batches: 0,
            profiles_flattened: 0,
            fragments_dropped: 0,
            companies_without_personnel: 0,
        }
    }

    /// Mirror the tier and flattening counts into metrics. Classifier and
    /// assembler counters are recorded where they are computed.
    pub fn publish_metrics(&self) {
        let tiers = &self.employee_tiers;
        ImputationMetrics::record_employee_tiers(
            tiers.observed,
            tiers.range_mean,
            tiers.cohort_median,
            tiers.global_median,
            tiers.unresolved,
        );
        let stages = &self.stage_resolutions;
        ImputationMetrics::record_stage_resolutions(
            stages.observed,
            stages.imputed,
            stages.unresolved,
        );
        PersonnelMetrics::record_profiles_flattened(
            self.profiles_flattened,
            self.fragments_dropped,
        );
    }

    pub fn log(&self) {
        info!(
            run_id = %self.run_id,
            companies_in = self.companies_in,
            companies_out = self.companies_out,
            excluded = self.excluded_rows,
            rejected = self.rejected_rows,
            malformed_fields = self.malformed_fields,
            employees_observed = self.employee_tiers.observed,
            employees_range_mean = self.employee_tiers.range_mean,
            employees_cohort_median = self.employee_tiers.cohort_median,
            employees_global_median = self.employee_tiers.global_median,
            employees_unresolved = self.employee_tiers.unresolved,
            stages_observed = self.stage_resolutions.observed,
            stages_imputed = self.stage_resolutions.imputed,
            stages_unresolved = self.stage_resolutions.unresolved,
            persons = self.persons_classified,
            technical = self.technical_persons,
            profiles = self.profiles_flattened,
            fragments_dropped = self.fragments_dropped,
            without_personnel = self.companies_without_personnel,
            "Feature run summary"
        );
        if self.employee_tiers.unresolved > 0 {
            warn!(
                unresolved = self.employee_tiers.unresolved,
                "Employee counts left unresolved after every imputation tier"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_tally() {
        let counts = [
            ImputationTier::Observed,
            ImputationTier::RangeMean,
            ImputationTier::RangeMean,
            ImputationTier::Unresolved,
        ]
        .map(|tier| ResolvedCount { value: None, tier });
        let tally = TierCounts::tally(&counts);
        assert_eq!(tally.observed, 1);
        assert_eq!(tally.range_mean, 2);
        assert_eq!(tally.unresolved, 1);
        assert_eq!(tally.global_median, 0);
    }

    #[test]
    fn test_report_serializes() {
        let report = RunReport::new(Uuid::new_v4());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["employee_tiers"]["cohort_median"], 0);
        assert!(json["run_id"].is_string());
    }
}
