use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::domain::{company_key, CompanyRecord, GrowthStage};
use crate::error::{FeatureError, Result};

/// Hand-verified fixes applied to company records before any statistic is
/// learned. Loaded from an external, versioned TOML document and injected
/// into the normalizer; an empty table changes nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionTable {
    pub version: String,
    /// Company name -> launch year
    pub launch_years: BTreeMap<String, i32>,
    /// Company LinkedIn URL -> verified employee count
    pub employee_counts: BTreeMap<String, f64>,
    /// Company id -> growth stage
    pub growth_stages: BTreeMap<String, GrowthStage>,
    /// Duplicate company ids dropped from the dataset
    pub excluded_ids: BTreeSet<String>,
    #[serde(skip)]
    fingerprint: String,
    #[serde(skip)]
    employee_counts_by_key: BTreeMap<String, f64>,
}

/// What applying the table did to one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppliedCorrections {
    pub launch_year: bool,
    pub employee_count: bool,
    pub growth_stage: bool,
}

impl CorrectionTable {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            FeatureError::Config(format!(
                "Failed to read correction table '{}': {}",
                path.display(),
                e
            ))
        })?;
        let table = Self::from_toml_str(&content)?;
        info!(
            "Loaded correction table version '{}' ({}) from {}",
            table.version,
            &table.fingerprint[..12],
            path.display()
        );
        Ok(table)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut table: CorrectionTable = toml::from_str(content)?;
        table.fingerprint = hex::encode(Sha256::digest(content.as_bytes()));
        table.employee_counts_by_key = table
            .employee_counts
            .iter()
            .filter_map(|(url, count)| company_key(url).map(|key| (key, *count)))
            .collect();

        let invalid = table
            .employee_counts
            .iter()
            .find(|(_, c)| !c.is_finite() || **c < 0.0);
        if let Some((url, count)) = invalid {
            return Err(FeatureError::Config(format!(
                "correction table: invalid employee count {} for '{}'",
                count, url
            )));
        }
        Ok(table)
    }

    /// SHA-256 of the source document; empty for a default table.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn is_excluded(&self, id: &str) -> bool {
        self.excluded_ids.contains(id)
    }

    /// Verified employee count for a company, matched on its normalised URL.
    pub fn employee_count_for(&self, record: &CompanyRecord) -> Option<f64> {
        record
            .company_key()
            .and_then(|key| self.employee_counts_by_key.get(&key).copied())
    }

    pub fn apply(&self, record: &mut CompanyRecord) -> AppliedCorrections {
        let mut applied = AppliedCorrections::default();

        if let Some(year) = record.name.as_ref().and_then(|name| self.launch_years.get(name)) {
            record.launch_year = Some(*year);
            applied.launch_year = true;
        }

        if let Some(count) = self.employee_count_for(record) {
            record.employees_latest = Some(count);
            applied.employee_count = true;
        }

        if let Some(stage) = self.growth_stages.get(&record.id) {
            record.growth_stage = Some(*stage);
            applied.growth_stage = true;
        }

        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"
version = "2020-12-03"
excluded_ids = ["1787891"]

[launch_years]
"Amypore" = 2018

[employee_counts]
"https://www.linkedin.com/company/acme/" = 42

[growth_stages]
"15789" = "mature"
"#;

    #[test]
    fn test_apply_corrections() {
        let table = CorrectionTable::from_toml_str(TABLE).unwrap();
        assert_eq!(table.version, "2020-12-03");
        assert_eq!(table.fingerprint().len(), 64);
        assert!(table.is_excluded("1787891"));

        let mut record = CompanyRecord::new("15789");
        record.name = Some("Amypore".to_string());
        record.linkedin_url = Some("https://www.linkedin.com/company/Acme".to_string());

        let applied = table.apply(&mut record);
        assert_eq!(record.launch_year, Some(2018));
        assert_eq!(record.employees_latest, Some(42.0));
        assert_eq!(record.growth_stage, Some(GrowthStage::Mature));
        assert!(applied.launch_year && applied.employee_count && applied.growth_stage);
    }

    #[test]
    fn test_default_table_is_noop() {
        let table = CorrectionTable::default();
        let mut record = CompanyRecord::new("1");
        record.name = Some("Amypore".to_string());
        let before = record.clone();
        assert_eq!(table.apply(&mut record), AppliedCorrections::default());
        assert_eq!(record, before);
    }

    #[test]
    fn test_unknown_stage_label_rejected() {
        let err = CorrectionTable::from_toml_str("[growth_stages]\n\"1\" = \"not meaningful\"\n");
        assert!(err.is_err());
    }
}
