use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{self, owned};
use crate::error::{FeatureError, Result};

/// All domain-tuning knobs of the feature pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub imputation: ImputationConfig,
    pub profiles: ProfileConfig,
    pub keywords: KeywordConfig,
    pub founder_signals: FounderSignalConfig,
    pub features: FeatureConfig,
    /// Optional external correction table, resolved relative to the config file
    pub corrections_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImputationConfig {
    /// Cohorts launched at or after this year get a cohort-median tier
    pub cohort_cutoff_year: i32,
    /// Range label meaning "no range known"
    pub range_sentinel: String,
    pub tier3_fallback: Tier3Fallback,
    /// Year against which company age is computed. Fixed, not the current year
    pub reference_year: i32,
}

/// Statistic used for employee counts still missing after the cohort tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier3Fallback {
    /// Median over every fit record with a known launch year
    DatasetMedian,
    /// Median of the last cohort visited by the cohort tier
    LastCohortMedian,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Slots kept per fragment category when flattening a profile
    pub slot_capacity: usize,
    pub scrape_batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    pub technical_include: Vec<String>,
    pub technical_exclude: Vec<String>,
    pub degree_markers: Vec<String>,
    pub founder_include: Vec<String>,
    pub founder_exclude: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FounderSignalConfig {
    /// Matched case-sensitively on word boundaries
    pub institute_acronyms: Vec<String>,
    /// Matched as lowercase substrings
    pub institute_phrases: Vec<String>,
    pub postdoc_markers: Vec<String>,
    pub degree_slot_markers: Vec<String>,
    pub title_degree_markers: Vec<String>,
    /// Exact labels of funding-event types counting as patent/publication history
    pub publication_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub health_industry_tag: String,
    pub fund_investor_types: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            imputation: ImputationConfig::default(),
            profiles: ProfileConfig::default(),
            keywords: KeywordConfig::default(),
            founder_signals: FounderSignalConfig::default(),
            features: FeatureConfig::default(),
            corrections_path: None,
        }
    }
}

impl Default for ImputationConfig {
    fn default() -> Self {
        Self {
            cohort_cutoff_year: constants::DEFAULT_COHORT_CUTOFF_YEAR,
            range_sentinel: constants::DEFAULT_RANGE_SENTINEL.to_string(),
            tier3_fallback: Tier3Fallback::DatasetMedian,
            reference_year: constants::DEFAULT_REFERENCE_YEAR,
        }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            slot_capacity: constants::DEFAULT_SLOT_CAPACITY,
            scrape_batch_size: constants::DEFAULT_SCRAPE_BATCH_SIZE,
        }
    }
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            technical_include: owned(constants::TECHNICAL_INCLUDE),
            technical_exclude: owned(constants::TECHNICAL_EXCLUDE),
            degree_markers: owned(constants::DEGREE_MARKERS),
            founder_include: owned(constants::FOUNDER_INCLUDE),
            founder_exclude: owned(constants::FOUNDER_EXCLUDE),
        }
    }
}

impl Default for FounderSignalConfig {
    fn default() -> Self {
        Self {
            institute_acronyms: owned(constants::INSTITUTE_ACRONYMS),
            institute_phrases: owned(constants::INSTITUTE_PHRASES),
            postdoc_markers: owned(constants::POSTDOC_MARKERS),
            degree_slot_markers: owned(constants::DEGREE_SLOT_MARKERS),
            title_degree_markers: owned(constants::TITLE_DEGREE_MARKERS),
            publication_types: owned(constants::PUBLICATION_TYPES),
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            health_industry_tag: constants::DEFAULT_HEALTH_INDUSTRY_TAG.to_string(),
            fund_investor_types: owned(constants::FUND_INVESTOR_TYPES),
        }
    }
}

impl PipelineConfig {
    /// Load and validate a TOML config. A relative `corrections_path` is
    /// resolved against the config file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            FeatureError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        let mut config = Self::from_toml_str(&content)?;
        if let Some(corrections) = config.corrections_path.as_mut() {
            if corrections.is_relative() {
                if let Some(dir) = path.parent() {
                    *corrections = dir.join(&*corrections);
                }
            }
        }
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.profiles.slot_capacity == 0 {
            return Err(FeatureError::Config("profiles.slot_capacity must be at least 1".into()));
        }
        if self.profiles.scrape_batch_size == 0 {
            return Err(FeatureError::Config(
                "profiles.scrape_batch_size must be at least 1".into(),
            ));
        }
        if self.keywords.technical_include.is_empty() {
            return Err(FeatureError::Config("keywords.technical_include must not be empty".into()));
        }
        if self.imputation.range_sentinel.trim().is_empty() {
            return Err(FeatureError::Config("imputation.range_sentinel must not be blank".into()));
        }
        Ok(())
    }

    /// Stable digest of the effective configuration, stored with fitted statistics.
    pub fn fingerprint(&self) -> String {
        // serde_json keeps field order, so the digest is stable for equal configs
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&canonical))
    }
}
