//! Three-tier imputation of missing employee counts.
//!
//! 1. range mean: the mean of the integers in the record's employee range label
//! 2. cohort median: the median count of the record's launch-year cohort, for
//!    cohorts at or after the cutoff year
//! 3. fallback: the dataset-wide median (or, behind a flag, the last cohort
//!    median visited by tier 2)
//!
//! Statistics are learned once by [`EmployeeCountResolver::fit`] and frozen;
//! [`EmployeeCountResolver::transform`] only reads them.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use super::stats::median;
use crate::config::{ImputationConfig, Tier3Fallback};
use crate::domain::CompanyRecord;
use crate::pipeline::ingestion::fields::range_mean;

/// Which step produced a resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputationTier {
    Observed,
    RangeMean,
    CohortMedian,
    GlobalMedian,
    /// Every applicable statistic was undefined
    Unresolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCount {
    pub value: Option<f64>,
    pub tier: ImputationTier,
}

impl ResolvedCount {
    fn at(value: f64, tier: ImputationTier) -> Self {
        Self { value: Some(value), tier }
    }

    fn unresolved() -> Self {
        Self {
            value: None,
            tier: ImputationTier::Unresolved,
        }
    }
}

/// Range label -> mean of the integers it contains.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRangeMeanTable {
    means: BTreeMap<String, f64>,
}

impl EmployeeRangeMeanTable {
    /// Build from the observed labels. The sentinel is skipped, as are labels
    /// without any integer (no imputation is possible from them).
    pub fn build<'a>(labels: impl IntoIterator<Item = &'a str>, sentinel: &str) -> Self {
        let mut means = BTreeMap::new();
        for label in labels {
            if label == sentinel || means.contains_key(label) {
                continue;
            }
            match range_mean(label) {
                Some(mean) => {
                    means.insert(label.to_string(), mean);
                }
                None => debug!(label, "Range label without integers skipped"),
            }
        }
        Self { means }
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.means.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.means.len()
    }

    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }
}

/// Learned median for one launch-year cohort.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CohortMedian {
    pub year: i32,
    /// `None` when no record of the cohort had a tier-1 count
    pub median: Option<f64>,
}

/// Frozen employee-count statistics plus the policy to apply them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeCountResolver {
    range_means: EmployeeRangeMeanTable,
    /// Cohorts at or after the cutoff, in first-seen order of the fit data
    cohorts: Vec<CohortMedian>,
    dataset_median: Option<f64>,
    cutoff_year: i32,
    fallback: Tier3Fallback,
}

impl EmployeeCountResolver {
    pub fn fit(reference: &[CompanyRecord], config: &ImputationConfig) -> Self {
        let range_means = EmployeeRangeMeanTable::build(
            reference.iter().filter_map(|r| r.employee_range.as_deref()),
            &config.range_sentinel,
        );

        let tier1: Vec<Option<f64>> = reference
            .iter()
            .map(|record| Self::observed_or_range(&range_means, record))
            .collect();

        // Group tier-1 counts by launch year, remembering first-seen year order
        let mut year_order: Vec<i32> = Vec::new();
        let mut by_year: HashMap<i32, Vec<f64>> = HashMap::new();
        for (record, value) in reference.iter().zip(&tier1) {
            if let Some(year) = record.launch_year {
                let bucket = by_year.entry(year).or_insert_with(|| {
                    year_order.push(year);
                    Vec::new()
                });
                if let Some(v) = value {
                    bucket.push(*v);
                }
            }
        }

        let cohorts: Vec<CohortMedian> = year_order
            .iter()
            .filter(|year| **year >= config.cohort_cutoff_year)
            .map(|year| CohortMedian {
                year: *year,
                median: median(by_year.get(year).cloned().unwrap_or_default()),
            })
            .collect();

        // Dataset median over records with a known launch year, after tier 2
        let cohort_lookup: HashMap<i32, f64> = cohorts
            .iter()
            .filter_map(|c| c.median.map(|m| (c.year, m)))
            .collect();
        let dataset_median = median(reference.iter().zip(&tier1).filter_map(|(record, value)| {
            let year = record.launch_year?;
            value.or_else(|| cohort_lookup.get(&year).copied())
        }));

        let resolver = Self {
            range_means,
            cohorts,
            dataset_median,
            cutoff_year: config.cohort_cutoff_year,
            fallback: config.tier3_fallback,
        };

        info!(
            reference_rows = reference.len(),
            range_labels = resolver.range_means.len(),
            cohorts = resolver.cohorts.len(),
            dataset_median = ?resolver.dataset_median,
            fallback = ?resolver.fallback,
            "Employee count statistics fitted"
        );
        if resolver.dataset_median.is_none() {
            warn!(
                "No dataset-wide employee median could be learned; tier 3 will leave values missing"
            );
        }

        resolver
    }

    fn observed_or_range(
        range_means: &EmployeeRangeMeanTable,
        record: &CompanyRecord,
    ) -> Option<f64> {
        record
            .employees_latest
            .or_else(|| record.employee_range.as_deref().and_then(|label| range_means.get(label)))
    }

    /// Resolve one record against the frozen statistics.
    pub fn resolve(&self, record: &CompanyRecord) -> ResolvedCount {
        if let Some(observed) = record.employees_latest {
            return ResolvedCount::at(observed, ImputationTier::Observed);
        }

        let range_mean = record
            .employee_range
            .as_deref()
            .and_then(|label| self.range_means.get(label));
        if let Some(mean) = range_mean {
            return ResolvedCount::at(mean, ImputationTier::RangeMean);
        }

        if let Some(cohort_median) = record.launch_year.and_then(|year| self.cohort_median(year)) {
            return ResolvedCount::at(cohort_median, ImputationTier::CohortMedian);
        }

        match self.fallback_value() {
            Some(value) => ResolvedCount::at(value, ImputationTier::GlobalMedian),
            None => {
                debug!(id = %record.id, "Employee count unresolved after all tiers");
                ResolvedCount::unresolved()
            }
        }
    }

    pub fn transform(&self, records: &[CompanyRecord]) -> Vec<ResolvedCount> {
        records.iter().map(|record| self.resolve(record)).collect()
    }

    fn cohort_median(&self, year: i32) -> Option<f64> {
        if year < self.cutoff_year {
            return None;
        }
        self.cohorts.iter().find(|c| c.year == year).and_then(|c| c.median)
    }

    /// Statistic for values still missing after tier 2.
    pub fn fallback_value(&self) -> Option<f64> {
        match self.fallback {
            Tier3Fallback::DatasetMedian => self.dataset_median,
            Tier3Fallback::LastCohortMedian => self.cohorts.last().and_then(|c| c.median),
        }
    }

    pub fn range_means(&self) -> &EmployeeRangeMeanTable {
        &self.range_means
    }

    pub fn cohorts(&self) -> &[CohortMedian] {
        &self.cohorts
    }

    pub fn dataset_median(&self) -> Option<f64> {
        self.dataset_median
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(
        id: &str,
        year: Option<i32>,
        range: Option<&str>,
        count: Option<f64>,
    ) -> CompanyRecord {
        let mut record = CompanyRecord::new(id);
        record.launch_year = year;
        record.employee_range = range.map(|s| s.to_string());
        record.employees_latest = count;
        record
    }

    fn config(fallback: Tier3Fallback) -> ImputationConfig {
        ImputationConfig {
            cohort_cutoff_year: 2010,
            range_sentinel: "n.a.".to_string(),
            tier3_fallback: fallback,
            reference_year: 2020,
        }
    }

    fn reference() -> Vec<CompanyRecord> {
        vec![
            company("a", Some(2015), None, Some(10.0)),
            company("b", Some(2015), None, Some(30.0)),
            company("c", Some(2012), Some("51-200"), None),
            company("d", Some(2005), None, Some(1000.0)),
            company("e", Some(2018), Some("n.a."), Some(4.0)),
            company("f", None, None, Some(7.0)),
        ]
    }

    #[test]
    fn test_range_table_excludes_sentinel_and_blank_labels() {
        let labels = vec!["10-20 employees", "n.a.", "unknown", "10-20 employees"];
        let table = EmployeeRangeMeanTable::build(labels, "n.a.");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("10-20 employees"), Some(15.0));
        assert_eq!(table.get("n.a."), None);
        assert_eq!(table.get("unknown"), None);
    }

    #[test]
    fn test_range_mean_round_trip() {
        let reference = vec![
            company("a", Some(2015), Some("10-20 employees"), Some(12.0)),
            company("b", Some(2016), Some("n.a."), Some(3.0)),
        ];
        let resolver =
            EmployeeCountResolver::fit(&reference, &config(Tier3Fallback::DatasetMedian));

        let resolved = resolver.resolve(&company("x", None, Some("10-20 employees"), None));
        assert_eq!(resolved, ResolvedCount::at(15.0, ImputationTier::RangeMean));
    }

    #[test]
    fn test_fit_learns_cohort_and_dataset_medians() {
        let resolver =
            EmployeeCountResolver::fit(&reference(), &config(Tier3Fallback::DatasetMedian));

        let years: Vec<i32> = resolver.cohorts().iter().map(|c| c.year).collect();
        assert_eq!(years, vec![2015, 2012, 2018]);
        assert_eq!(resolver.cohorts()[0].median, Some(20.0));
        // 2012 cohort only has the range-imputed 125.5
        assert_eq!(resolver.cohorts()[1].median, Some(125.5));
        // known launch year: 10, 30, 125.5, 1000, 4 -> 30
        assert_eq!(resolver.dataset_median(), Some(30.0));
    }

    #[test]
    fn test_tiers_applied_in_order() {
        let resolver =
            EmployeeCountResolver::fit(&reference(), &config(Tier3Fallback::DatasetMedian));

        let inputs = vec![
            company("observed", Some(2015), Some("51-200"), Some(3.0)),
            company("range", Some(2015), Some("51-200"), None),
            company("cohort", Some(2015), Some("n.a."), None),
            company("old", Some(1999), None, None),
            company("unknown_cohort", Some(2019), None, None),
            company("no_year", None, None, None),
        ];
        let resolved = resolver.transform(&inputs);

        assert_eq!(resolved[0], ResolvedCount::at(3.0, ImputationTier::Observed));
        assert_eq!(resolved[1], ResolvedCount::at(125.5, ImputationTier::RangeMean));
        assert_eq!(resolved[2], ResolvedCount::at(20.0, ImputationTier::CohortMedian));
        assert_eq!(resolved[3], ResolvedCount::at(30.0, ImputationTier::GlobalMedian));
        assert_eq!(resolved[4], ResolvedCount::at(30.0, ImputationTier::GlobalMedian));
        assert_eq!(resolved[5], ResolvedCount::at(30.0, ImputationTier::GlobalMedian));
    }

    #[test]
    fn test_last_cohort_fallback_flag() {
        let resolver =
            EmployeeCountResolver::fit(&reference(), &config(Tier3Fallback::LastCohortMedian));
        // Last cohort visited is 2018, whose only count is 4
        assert_eq!(resolver.fallback_value(), Some(4.0));
        let resolved = resolver.resolve(&company("old", Some(1999), None, None));
        assert_eq!(resolved, ResolvedCount::at(4.0, ImputationTier::GlobalMedian));
    }

    #[test]
    fn test_transform_is_idempotent_with_frozen_statistics() {
        let resolver =
            EmployeeCountResolver::fit(&reference(), &config(Tier3Fallback::DatasetMedian));
        let inputs = reference();
        assert_eq!(resolver.transform(&inputs), resolver.transform(&inputs));
    }

    #[test]
    fn test_signal_bearing_records_always_resolve() {
        let resolver =
            EmployeeCountResolver::fit(&reference(), &config(Tier3Fallback::DatasetMedian));
        let inputs = vec![
            company("label_only", None, Some("2-10"), None),
            company("year_only", Some(1980), None, None),
            company("unseen_label", Some(2030), Some("5000+"), None),
        ];
        assert!(resolver.transform(&inputs).iter().all(|r| r.value.is_some()));
    }

    #[test]
    fn test_empty_reference_leaves_values_unresolved() {
        let resolver = EmployeeCountResolver::fit(&[], &config(Tier3Fallback::DatasetMedian));
        let resolved = resolver.resolve(&company("x", Some(2015), Some("11-50"), None));
        assert_eq!(resolved, ResolvedCount::unresolved());
    }
}
