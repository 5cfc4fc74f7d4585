//! Joins resolved company fields and personnel aggregates into the feature table.
//!
//! Personnel-derived features are zero-filled when a company has no matched
//! personnel rows, and `no_personnel_data` is set so a genuine zero stays
//! distinguishable from an absent signal.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use super::employee_count::{ImputationTier, ResolvedCount};
use super::founder_features::CompanyAggregate;
use super::growth_stage::{ResolvedStage, StageResolution};
use super::stats::mean;
use crate::config::FeatureConfig;
use crate::domain::{CompanyRecord, GrowthStage};
use crate::metrics::PersonnelMetrics;

/// A company record with its resolved count and stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCompany {
    pub record: CompanyRecord,
    pub employees: ResolvedCount,
    pub stage: ResolvedStage,
}

/// One row of the feature table handed to the model trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// Input columns; `nb_patents` is zero-filled
    #[serde(flatten)]
    pub company: CompanyRecord,
    pub employees_clean: Option<f64>,
    pub employees_tier: ImputationTier,
    pub growth_stage_imputed: Option<GrowthStage>,
    pub growth_stage_resolution: StageResolution,
    pub age: Option<f64>,
    pub funding_employees_ratio: Option<f64>,
    pub stage_age_ratio: Option<f64>,
    pub health_industry: bool,
    pub investors_type: bool,
    pub personnel_count: usize,
    pub technical_ratio: f64,
    pub degree_count: usize,
    pub founder_from_institute: u8,
    pub founder_has_degree: u8,
    pub founder_has_patents: u8,
    pub no_personnel_data: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn companies_without_personnel(&self) -> usize {
        self.rows.iter().filter(|r| r.no_personnel_data == 1).count()
    }
}

/// Company age statistics frozen at fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgeStatistics {
    pub reference_year: i32,
    /// Mean age over the fit records with a launch year
    pub mean_age: Option<f64>,
}

impl AgeStatistics {
    pub fn fit(reference: &[CompanyRecord], reference_year: i32) -> Self {
        let mean_age = mean(
            reference
                .iter()
                .filter_map(|r| r.launch_year)
                .map(|year| f64::from(reference_year - year)),
        );
        Self { reference_year, mean_age }
    }

    /// Observed age, else the fitted mean.
    pub fn age_of(&self, record: &CompanyRecord) -> Option<f64> {
        match record.launch_year {
            Some(year) => Some(f64::from(self.reference_year - year)),
            None => self.mean_age,
        }
    }
}

/// Funding per employee. Absent for a missing or zero count.
pub fn funding_employees_ratio(total_funding: Option<f64>, employees: Option<f64>) -> Option<f64> {
    match (total_funding, employees) {
        (Some(funding), Some(count)) if count != 0.0 => Some(funding / count),
        _ => None,
    }
}

/// Stage ordinal over age, with an age of 0 counted as 1.
pub fn stage_age_ratio(stage: Option<GrowthStage>, age: Option<f64>) -> Option<f64> {
    let ordinal = f64::from(stage?.ordinal());
    let age = age?;
    Some(ordinal / if age == 0.0 { 1.0 } else { age })
}

pub struct FeatureTableAssembler {
    ages: AgeStatistics,
    health_industry_tag: String,
    fund_investor_types: Vec<String>,
}

impl FeatureTableAssembler {
    pub fn new(ages: AgeStatistics, features: &FeatureConfig) -> Self {
        Self {
            ages,
            health_industry_tag: features.health_industry_tag.trim().to_lowercase(),
            fund_investor_types: features
                .fund_investor_types
                .iter()
                .map(|t| t.trim().to_lowercase())
                .collect(),
        }
    }

    /// True when the first listed industry is the health tag.
    pub fn is_health(&self, record: &CompanyRecord) -> bool {
        record
            .industries
            .first()
            .map_or(false, |name| name.trim().to_lowercase() == self.health_industry_tag)
    }

    /// True when the company has investors and one of them is a fund.
    pub fn has_fund_investor(&self, record: &CompanyRecord) -> bool {
        record.investors.as_ref().map_or(false, |inv| {
            inv.total > 0
                && inv
                    .types
                    .iter()
                    .any(|t| self.fund_investor_types.contains(&t.trim().to_lowercase()))
        })
    }

    fn row(&self, resolved: ResolvedCompany, aggregate: Option<&CompanyAggregate>) -> FeatureRow {
        let ResolvedCompany { mut record, employees, stage } = resolved;

        let age = self.ages.age_of(&record);
        let health_industry = self.is_health(&record);
        let investors_type = self.has_fund_investor(&record);
        let funding_ratio = funding_employees_ratio(record.total_funding, employees.value);
        record.nb_patents = Some(record.nb_patents.unwrap_or(0.0));

        let flag = |count: usize| u8::from(count > 0);
        let (personnel_count, technical_ratio, degree_count, institute, degree, patents, missing) =
            match aggregate {
                Some(a) => (
                    a.personnel_count,
                    a.technical_ratio,
                    a.degree_count,
                    flag(a.founders_from_institute),
                    flag(a.founders_with_degree),
                    flag(a.founders_with_patents),
                    0,
                ),
                None => (0, 0.0, 0, 0, 0, 0, 1),
            };

        FeatureRow {
            company: record,
            employees_clean: employees.value,
            employees_tier: employees.tier,
            growth_stage_imputed: stage.stage,
            growth_stage_resolution: stage.resolution,
            age,
            funding_employees_ratio: funding_ratio,
            stage_age_ratio: stage_age_ratio(stage.stage, age),
            health_industry,
            investors_type,
            personnel_count,
            technical_ratio,
            degree_count,
            founder_from_institute: institute,
            founder_has_degree: degree,
            founder_has_patents: patents,
            no_personnel_data: missing,
        }
    }

    /// Left-join aggregates onto the companies by company key. Output keeps
    /// the company order.
    pub fn assemble(
        &self,
        companies: Vec<ResolvedCompany>,
        aggregates: &[CompanyAggregate],
    ) -> FeatureTable {
        let by_key: HashMap<&str, &CompanyAggregate> =
            aggregates.iter().map(|a| (a.company_key.as_str(), a)).collect();

        let rows: Vec<FeatureRow> = companies
            .into_iter()
            .map(|resolved| {
                let key = resolved.record.company_key();
                let aggregate = key.as_deref().and_then(|k| by_key.get(k).copied());
                if aggregate.is_none() {
                    debug!(
                        id = %resolved.record.id,
                        company_key = ?key,
                        "No personnel data for company"
                    );
                }
                self.row(resolved, aggregate)
            })
            .collect();

        let table = FeatureTable { rows };
        let without = table.companies_without_personnel();
        PersonnelMetrics::record_companies_without_personnel(without);
        info!(
            companies = table.len(),
            with_personnel = table.len() - without,
            without_personnel = without,
            "Feature table assembled"
        );
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Investors;

    fn assembler() -> FeatureTableAssembler {
        let ages = AgeStatistics {
            reference_year: 2020,
            mean_age: Some(6.5),
        };
        FeatureTableAssembler::new(ages, &FeatureConfig::default())
    }

    fn resolved(
        record: CompanyRecord,
        employees: Option<f64>,
        stage: Option<GrowthStage>,
    ) -> ResolvedCompany {
        ResolvedCompany {
            record,
            employees: ResolvedCount {
                value: employees,
                tier: ImputationTier::Observed,
            },
            stage: ResolvedStage {
                stage,
                resolution: StageResolution::Observed,
            },
        }
    }

    fn company(id: &str, linkedin: Option<&str>) -> CompanyRecord {
        let mut record = CompanyRecord::new(id);
        record.linkedin_url = linkedin.map(|l| l.to_string());
        record
    }

    #[test]
    fn test_missing_personnel_is_not_conflated_with_zero() {
        let aggregates = vec![CompanyAggregate {
            company_key: "https://www.linkedin.com/company/beta".to_string(),
            personnel_count: 3,
            technical_ratio: 0.0,
            ..Default::default()
        }];
        let alpha = company("a", Some("https://www.linkedin.com/company/alpha"));
        let beta = company("b", Some("https://www.linkedin.com/company/Beta/"));
        let table = assembler().assemble(
            vec![
                resolved(alpha, Some(10.0), None),
                resolved(beta, Some(10.0), None),
                resolved(company("c", None), Some(10.0), None),
            ],
            &aggregates,
        );

        let (a, b, c) = (&table.rows[0], &table.rows[1], &table.rows[2]);
        for row in [a, b] {
            assert_eq!(row.technical_ratio, 0.0);
            assert_eq!(row.founder_from_institute, 0);
            assert_eq!(row.founder_has_degree, 0);
        }
        assert_eq!(a.no_personnel_data, 1);
        assert_eq!(b.no_personnel_data, 0);
        assert_eq!(b.personnel_count, 3);
        assert_eq!(c.no_personnel_data, 1);
        assert_eq!(table.companies_without_personnel(), 2);
    }

    #[test]
    fn test_founder_flags_from_aggregate() {
        let aggregates = vec![CompanyAggregate {
            company_key: "acme".to_string(),
            personnel_count: 2,
            technical_ratio: 0.5,
            founders_from_institute: 2,
            founders_with_patents: 1,
            ..Default::default()
        }];
        let companies = vec![resolved(company("a", Some("acme")), None, None)];
        let table = assembler().assemble(companies, &aggregates);
        let row = &table.rows[0];
        assert_eq!(row.founder_from_institute, 1);
        assert_eq!(row.founder_has_degree, 0);
        assert_eq!(row.founder_has_patents, 1);
        assert_eq!(row.technical_ratio, 0.5);
    }

    #[test]
    fn test_derived_numeric_features() {
        let mut record = company("a", None);
        record.launch_year = Some(2016);
        record.total_funding = Some(1_000_000.0);
        let companies = vec![resolved(record, Some(20.0), Some(GrowthStage::LateGrowth))];
        let table = assembler().assemble(companies, &[]);
        let row = &table.rows[0];
        assert_eq!(row.age, Some(4.0));
        assert_eq!(row.funding_employees_ratio, Some(50_000.0));
        assert_eq!(row.stage_age_ratio, Some(0.75));
        assert_eq!(row.company.nb_patents, Some(0.0));
    }

    #[test]
    fn test_age_falls_back_to_fitted_mean() {
        let companies = vec![resolved(company("a", None), Some(0.0), Some(GrowthStage::Seed))];
        let table = assembler().assemble(companies, &[]);
        let row = &table.rows[0];
        assert_eq!(row.age, Some(6.5));
        assert_eq!(row.funding_employees_ratio, None);
    }

    #[test]
    fn test_ratio_edge_cases() {
        assert_eq!(stage_age_ratio(Some(GrowthStage::Mature), Some(0.0)), Some(4.0));
        assert_eq!(stage_age_ratio(None, Some(3.0)), None);
        assert_eq!(funding_employees_ratio(Some(10.0), Some(0.0)), None);
        assert_eq!(funding_employees_ratio(None, Some(5.0)), None);
    }

    #[test]
    fn test_fit_mean_age() {
        let mut old = CompanyRecord::new("a");
        old.launch_year = Some(2010);
        let mut young = CompanyRecord::new("b");
        young.launch_year = Some(2018);
        let stats = AgeStatistics::fit(&[old, young, CompanyRecord::new("c")], 2020);
        assert_eq!(stats.mean_age, Some(6.0));
    }

    #[test]
    fn test_industry_and_investor_flags() {
        let a = assembler();
        let mut record = CompanyRecord::new("a");
        record.industries = vec!["Health".to_string(), "fintech".to_string()];
        record.investors = Some(Investors {
            total: 2,
            types: vec!["angel".to_string(), "fund".to_string()],
        });
        assert!(a.is_health(&record));
        assert!(a.has_fund_investor(&record));

        record.industries = vec!["biotech".to_string(), "health".to_string()];
        record.investors = Some(Investors {
            total: 0,
            types: vec!["fund".to_string()],
        });
        assert!(!a.is_health(&record));
        assert!(!a.has_fund_investor(&record));
    }
}
