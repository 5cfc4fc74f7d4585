//! Mode-based imputation of missing growth stages, keyed by launch-year cohort.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::domain::{CompanyRecord, GrowthStage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageResolution {
    Observed,
    CohortMode,
    /// No launch year, or a cohort absent from the fit data
    Unresolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedStage {
    pub stage: Option<GrowthStage>,
    pub resolution: StageResolution,
}

/// Frozen cohort -> most frequent stage mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthStageResolver {
    modes: BTreeMap<i32, GrowthStage>,
}

impl GrowthStageResolver {
    /// Learn the modal stage of every cohort. Ties go to the stage seen
    /// first in `reference`.
    pub fn fit(reference: &[CompanyRecord]) -> Self {
        let mut first_seen: Vec<GrowthStage> = Vec::new();
        let mut contingency: HashMap<i32, HashMap<GrowthStage, usize>> = HashMap::new();

        for record in reference {
            let Some(stage) = record.growth_stage else { continue };
            if !first_seen.contains(&stage) {
                first_seen.push(stage);
            }
            if let Some(year) = record.launch_year {
                *contingency.entry(year).or_default().entry(stage).or_insert(0) += 1;
            }
        }

        let modes: BTreeMap<i32, GrowthStage> = contingency
            .iter()
            .filter_map(|(year, counts)| {
                let mut best: Option<(GrowthStage, usize)> = None;
                for stage in &first_seen {
                    let count = counts.get(stage).copied().unwrap_or(0);
                    if count > best.map_or(0, |(_, c)| c) {
                        best = Some((*stage, count));
                    }
                }
                best.map(|(stage, _)| (*year, stage))
            })
            .collect();

        info!(cohorts = modes.len(), stage_order = ?first_seen, "Growth stage modes fitted");
        Self { modes }
    }

    pub fn mode_for(&self, year: i32) -> Option<GrowthStage> {
        self.modes.get(&year).copied()
    }

    /// Present stages pass through untouched.
    pub fn resolve(&self, record: &CompanyRecord) -> ResolvedStage {
        if let Some(stage) = record.growth_stage {
            return ResolvedStage {
                stage: Some(stage),
                resolution: StageResolution::Observed,
            };
        }

        match record.launch_year.and_then(|year| self.mode_for(year)) {
            Some(stage) => ResolvedStage {
                stage: Some(stage),
                resolution: StageResolution::CohortMode,
            },
            None => {
                debug!(
                    id = %record.id,
                    launch_year = ?record.launch_year,
                    "Growth stage left unresolved"
                );
                ResolvedStage {
                    stage: None,
                    resolution: StageResolution::Unresolved,
                }
            }
        }
    }

    pub fn transform(&self, records: &[CompanyRecord]) -> Vec<ResolvedStage> {
        records.iter().map(|record| self.resolve(record)).collect()
    }

    pub fn cohorts(&self) -> usize {
        self.modes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(year: Option<i32>, stage: Option<GrowthStage>) -> CompanyRecord {
        let mut record = CompanyRecord::new("c");
        record.launch_year = year;
        record.growth_stage = stage;
        record
    }

    #[test]
    fn test_mode_per_cohort() {
        use GrowthStage::*;
        let reference = vec![
            company(Some(2015), Some(Seed)),
            company(Some(2015), Some(EarlyGrowth)),
            company(Some(2015), Some(EarlyGrowth)),
            company(Some(2010), Some(Mature)),
        ];
        let resolver = GrowthStageResolver::fit(&reference);
        assert_eq!(resolver.mode_for(2015), Some(EarlyGrowth));
        assert_eq!(resolver.mode_for(2010), Some(Mature));
        assert_eq!(resolver.mode_for(1990), None);
    }

    #[test]
    fn test_ties_break_on_first_seen_stage() {
        use GrowthStage::*;
        let reference = vec![
            company(None, Some(LateGrowth)),
            company(Some(2016), Some(Seed)),
            company(Some(2016), Some(LateGrowth)),
        ];
        let resolver = GrowthStageResolver::fit(&reference);
        // LateGrowth was seen first in the dataset, even though the 2016 cohort saw Seed first
        assert_eq!(resolver.mode_for(2016), Some(LateGrowth));
    }

    #[test]
    fn test_present_stage_never_overwritten() {
        use GrowthStage::*;
        let resolver = GrowthStageResolver::fit(&[company(Some(2015), Some(Mature))]);
        let resolved = resolver.resolve(&company(Some(2015), Some(Seed)));
        assert_eq!(resolved.stage, Some(Seed));
        assert_eq!(resolved.resolution, StageResolution::Observed);
    }

    #[test]
    fn test_unknown_cohort_stays_missing() {
        let resolver = GrowthStageResolver::fit(&[company(Some(2015), Some(GrowthStage::Seed))]);
        let resolved = resolver.transform(&[
            company(None, None),
            company(Some(2001), None),
            company(Some(2015), None),
        ]);
        assert_eq!(resolved[0].resolution, StageResolution::Unresolved);
        assert_eq!(resolved[0].stage, None);
        assert_eq!(resolved[1].resolution, StageResolution::Unresolved);
        assert_eq!(resolved[2].stage, Some(GrowthStage::Seed));
        assert_eq!(resolved[2].resolution, StageResolution::CohortMode);
    }
}
