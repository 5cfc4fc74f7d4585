//! Founder background signals and company-level personnel aggregates.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::FounderSignalConfig;
use crate::domain::{FragmentCategory, PersonRecord};
use crate::error::{FeatureError, Result};
use crate::metrics::PersonnelMetrics;
use crate::pipeline::processing::profile_flattener::FlattenedProfile;

/// Background signals detected on one founder's flattened profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FounderSignals {
    pub profile_id: String,
    pub from_institute: bool,
    pub has_degree: bool,
    pub has_patent_or_publication: bool,
    /// Institute affiliation or degree
    pub technical_founder: bool,
}

pub struct FounderSignalDetector {
    /// Whole-word, case-sensitive acronym matcher. `None` with no acronyms.
    acronyms: Option<Regex>,
    phrases: Vec<String>,
    postdoc_markers: Vec<String>,
    degree_slot_markers: Vec<String>,
    title_degree_markers: Vec<String>,
    publication_types: Vec<String>,
}

fn lowered(list: &[String]) -> Vec<String> {
    list.iter().map(|s| s.to_lowercase()).collect()
}

fn contains_any(text: &str, markers: &[String]) -> bool {
    markers.iter().any(|m| text.contains(m.as_str()))
}

impl FounderSignalDetector {
    pub fn new(config: &FounderSignalConfig) -> Result<Self> {
        let acronyms = if config.institute_acronyms.is_empty() {
            None
        } else {
            let alternation = config
                .institute_acronyms
                .iter()
                .map(|a| regex::escape(a.trim()))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r"\b(?:{})\b", alternation);
            let regex = Regex::new(&pattern).map_err(|e| {
                FeatureError::Config(format!("invalid institute acronym list: {}", e))
            })?;
            Some(regex)
        };

        Ok(Self {
            acronyms,
            phrases: lowered(&config.institute_phrases),
            postdoc_markers: lowered(&config.postdoc_markers),
            degree_slot_markers: lowered(&config.degree_slot_markers),
            title_degree_markers: lowered(&config.title_degree_markers),
            publication_types: config
                .publication_types
                .iter()
                .map(|t| t.trim().to_string())
                .collect(),
        })
    }

    /// Acronym as a whole word (case kept) or institute phrase (case folded).
    pub fn mentions_institute(&self, text: &str) -> bool {
        if self.acronyms.as_ref().map_or(false, |re| re.is_match(text)) {
            return true;
        }
        contains_any(&text.to_lowercase(), &self.phrases)
    }

    pub fn from_institute(&self, profile: &FlattenedProfile) -> bool {
        let mut companies = profile.field_values(FragmentCategory::Experience, "company");
        let mut titles = profile.field_values(FragmentCategory::Experience, "title");

        companies.any(|c| self.mentions_institute(c))
            || titles.any(|t| {
                self.mentions_institute(t)
                    || contains_any(&t.to_lowercase(), &self.postdoc_markers)
            })
    }

    pub fn has_degree(&self, profile: &FlattenedProfile) -> bool {
        let mut degrees = profile.field_values(FragmentCategory::Education, "degree");
        let mut titles = profile.field_values(FragmentCategory::Experience, "title");

        degrees.any(|d| contains_any(&d.to_lowercase(), &self.degree_slot_markers))
            || titles.any(|t| contains_any(&t.to_lowercase(), &self.title_degree_markers))
    }

    /// Funding-event types must match a configured label exactly.
    pub fn has_patent_or_publication(&self, profile: &FlattenedProfile) -> bool {
        profile
            .field_values(FragmentCategory::FundingEvent, "type")
            .any(|t| self.publication_types.iter().any(|label| label == t.trim()))
    }

    pub fn detect(&self, profile: &FlattenedProfile) -> FounderSignals {
        let from_institute = self.from_institute(profile);
        let has_degree = self.has_degree(profile);
        FounderSignals {
            profile_id: profile.profile_id.clone(),
            from_institute,
            has_degree,
            has_patent_or_publication: self.has_patent_or_publication(profile),
            technical_founder: from_institute || has_degree,
        }
    }
}

/// Personnel statistics for one company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyAggregate {
    pub company_key: String,
    pub personnel_count: usize,
    /// Mean of the technical label over all personnel rows
    pub technical_ratio: f64,
    pub degree_count: usize,
    pub founder_count: usize,
    pub founders_from_institute: usize,
    pub founders_with_degree: usize,
    pub founders_with_patents: usize,
    pub technical_founders: usize,
}

/// Profile links and ids match after trimming whitespace and trailing slashes.
fn profile_key(url: &str) -> &str {
    url.trim().trim_end_matches('/')
}

type ProfileIndex<'a> = HashMap<&'a str, &'a FlattenedProfile>;

pub struct FounderFeatureAggregator {
    detector: FounderSignalDetector,
}

impl FounderFeatureAggregator {
    pub fn new(config: &FounderSignalConfig) -> Result<Self> {
        Ok(Self {
            detector: FounderSignalDetector::new(config)?,
        })
    }

    /// Signals for a founder whose profile link has a flattened profile.
    fn founder_signals(
        &self,
        person: &PersonRecord,
        profiles: &ProfileIndex<'_>,
    ) -> Option<FounderSignals> {
        if !person.is_founder {
            return None;
        }
        let url = person.profile_url.as_deref()?;
        profiles.get(profile_key(url)).map(|profile| self.detector.detect(profile))
    }

    /// Group personnel by company key, in first-seen order.
    pub fn aggregate(
        &self,
        persons: &[PersonRecord],
        profiles: &[FlattenedProfile],
    ) -> Vec<CompanyAggregate> {
        let by_id: ProfileIndex<'_> = profiles
            .iter()
            .map(|p| (profile_key(&p.profile_id), p))
            .collect();

        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut aggregates: Vec<CompanyAggregate> = Vec::new();
        let mut technical_counts: Vec<usize> = Vec::new();

        for person in persons {
            let slot = *index.entry(person.company_key.as_str()).or_insert_with(|| {
                aggregates.push(CompanyAggregate {
                    company_key: person.company_key.clone(),
                    ..Default::default()
                });
                technical_counts.push(0);
                aggregates.len() - 1
            });
            let aggregate = &mut aggregates[slot];

            aggregate.personnel_count += 1;
            if person.technical {
                technical_counts[slot] += 1;
            }
            if person.has_degree {
                aggregate.degree_count += 1;
            }
            if !person.is_founder {
                continue;
            }
            aggregate.founder_count += 1;

            let Some(signals) = self.founder_signals(person, &by_id) else {
                debug!(company = %person.company_key, "Founder without a scraped profile");
                continue;
            };
            aggregate.founders_from_institute += signals.from_institute as usize;
            aggregate.founders_with_degree += signals.has_degree as usize;
            aggregate.founders_with_patents += signals.has_patent_or_publication as usize;
            aggregate.technical_founders += signals.technical_founder as usize;
        }

        for (aggregate, technical) in aggregates.iter_mut().zip(technical_counts) {
            aggregate.technical_ratio = technical as f64 / aggregate.personnel_count as f64;
            PersonnelMetrics::record_technical_ratio(aggregate.technical_ratio);
        }

        info!(
            persons = persons.len(),
            companies = aggregates.len(),
            founders = aggregates.iter().map(|a| a.founder_count).sum::<usize>(),
            "Personnel aggregated per company"
        );
        aggregates
    }
}
