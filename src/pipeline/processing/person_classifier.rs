//! Keyword-rule classifiers deriving boolean labels from personnel free text.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::KeywordConfig;
use crate::domain::{company_key, PersonRecord, RawPerson};
use crate::error::{FeatureError, Result};
use crate::metrics::PersonnelMetrics;

/// Keyword rule: any inclusion keyword sets the label, then any exclusion
/// keyword clears it again. Exclusion always wins.
///
/// Keywords match as case-insensitive substrings. Keywords written in
/// capitals (e.g. "CEO") are acronyms and must stand as a whole word.
#[derive(Debug, Clone)]
pub struct KeywordRule {
    include: KeywordSet,
    exclude: KeywordSet,
}

#[derive(Debug, Clone, Default)]
struct KeywordSet {
    substrings: Vec<String>,
    acronyms: Option<Regex>,
}

fn is_acronym(keyword: &str) -> bool {
    keyword.chars().any(|c| c.is_ascii_uppercase())
        && keyword.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

impl KeywordSet {
    fn new(keywords: &[String]) -> Result<Self> {
        let mut substrings = Vec::new();
        let mut acronyms = Vec::new();
        for keyword in keywords.iter().filter(|k| !k.trim().is_empty()) {
            if is_acronym(keyword.trim()) {
                acronyms.push(regex::escape(&keyword.trim().to_lowercase()));
            } else {
                substrings.push(keyword.to_lowercase());
            }
        }

        let acronyms = if acronyms.is_empty() {
            None
        } else {
            let pattern = format!(r"\b(?:{})\b", acronyms.join("|"));
            let regex = Regex::new(&pattern)
                .map_err(|e| FeatureError::Config(format!("invalid keyword list: {}", e)))?;
            Some(regex)
        };
        Ok(Self {
            substrings,
            acronyms,
        })
    }

    fn matches(&self, lowered: &str) -> bool {
        self.substrings.iter().any(|k| lowered.contains(k.as_str()))
            || self.acronyms.as_ref().map_or(false, |re| re.is_match(lowered))
    }
}

impl KeywordRule {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            include: KeywordSet::new(include)?,
            exclude: KeywordSet::new(exclude)?,
        })
    }

    /// Evaluate against already-lowercased text.
    pub fn matches(&self, lowered: &str) -> bool {
        let mut label = false;
        if self.include.matches(lowered) {
            label = true;
        }
        if self.exclude.matches(lowered) {
            label = false;
        }
        label
    }
}

/// Lowercase a job title and drop the employer named after " at " / " chez ".
pub fn clean_title(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let stripped = lowered
        .split_once(" at ")
        .or_else(|| lowered.split_once(" chez "))
        .map(|(role, _)| role)
        .unwrap_or(&lowered);
    stripped.trim().to_string()
}

pub struct PersonClassifier {
    technical: KeywordRule,
    degree: KeywordRule,
    founder: KeywordRule,
}

impl PersonClassifier {
    pub fn new(keywords: &KeywordConfig) -> Result<Self> {
        Ok(Self {
            technical: KeywordRule::new(&keywords.technical_include, &keywords.technical_exclude)?,
            degree: KeywordRule::new(&keywords.degree_markers, &[])?,
            founder: KeywordRule::new(&keywords.founder_include, &keywords.founder_exclude)?,
        })
    }

    pub fn is_technical(&self, title: &str) -> bool {
        self.technical.matches(&clean_title(title))
    }

    /// Degree markers in the name or in the title.
    pub fn has_degree(&self, name: Option<&str>, title: &str) -> bool {
        let in_name = name.map_or(false, |n| self.degree.matches(&n.to_lowercase()));
        in_name || self.degree.matches(&clean_title(title))
    }

    pub fn is_founder(&self, title: &str) -> bool {
        self.founder.matches(&clean_title(title))
    }

    /// Classify one scraped person. `None` when the company link is unusable.
    pub fn classify(&self, person: &RawPerson) -> Option<PersonRecord> {
        let key = company_key(&person.company_url)?;
        let raw_title = person.title.as_deref().unwrap_or("");

        let record = PersonRecord {
            name: person.name.clone(),
            technical: self.is_technical(raw_title),
            has_degree: self.has_degree(person.name.as_deref(), raw_title),
            is_founder: self.is_founder(raw_title),
            title: clean_title(raw_title),
            profile_url: person.profile_url.clone(),
            company_key: key,
        };
        debug!(
            title = %record.title,
            technical = record.technical,
            has_degree = record.has_degree,
            founder = record.is_founder,
            "Person classified"
        );
        Some(record)
    }

    pub fn classify_all(&self, persons: &[RawPerson]) -> Vec<PersonRecord> {
        let records: Vec<PersonRecord> = persons.iter().filter_map(|p| self.classify(p)).collect();

        let technical = records.iter().filter(|r| r.technical).count();
        let founders = records.iter().filter(|r| r.is_founder).count();
        PersonnelMetrics::record_persons_classified(records.len(), technical, founders);
        info!(
            persons = persons.len(),
            classified = records.len(),
            technical,
            founders,
            "Personnel classified"
        );
        records
    }
}

/// A profile to hand to the external profile scraper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeTarget {
    pub profile_url: String,
    pub company_key: String,
}

/// Split technical persons with a profile link into scraper batches of
/// `batch_size`, keeping input order. The last batch holds the remainder.
pub fn technical_profile_batches(
    persons: &[PersonRecord],
    batch_size: usize,
) -> Vec<Vec<ScrapeTarget>> {
    let targets: Vec<ScrapeTarget> = persons
        .iter()
        .filter(|p| p.technical)
        .filter_map(|p| {
            let url = p.profile_url.as_deref()?.trim();
            (!url.is_empty()).then(|| ScrapeTarget {
                profile_url: url.to_string(),
                company_key: p.company_key.clone(),
            })
        })
        .collect();

    targets.chunks(batch_size.max(1)).map(|chunk| chunk.to_vec()).collect()
}
