//! Domain data shapes shared across pipeline stages

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered company lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GrowthStage {
    #[serde(rename = "seed")]
    Seed,
    #[serde(rename = "early growth")]
    EarlyGrowth,
    #[serde(rename = "late growth")]
    LateGrowth,
    #[serde(rename = "mature")]
    Mature,
}

impl GrowthStage {
    pub const ALL: [GrowthStage; 4] = [
        GrowthStage::Seed,
        GrowthStage::EarlyGrowth,
        GrowthStage::LateGrowth,
        GrowthStage::Mature,
    ];

    /// Parse a source label. Case and surrounding whitespace are ignored;
    /// `_`/`-` separators are accepted in place of the space.
    pub fn parse(label: &str) -> Option<Self> {
        let normalized = label.trim().to_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "seed" => Some(GrowthStage::Seed),
            "early growth" => Some(GrowthStage::EarlyGrowth),
            "late growth" => Some(GrowthStage::LateGrowth),
            "mature" => Some(GrowthStage::Mature),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GrowthStage::Seed => "seed",
            GrowthStage::EarlyGrowth => "early growth",
            GrowthStage::LateGrowth => "late growth",
            GrowthStage::Mature => "mature",
        }
    }

    /// 1 for seed through 4 for mature.
    pub fn ordinal(&self) -> u8 {
        match self {
            GrowthStage::Seed => 1,
            GrowthStage::EarlyGrowth => 2,
            GrowthStage::LateGrowth => 3,
            GrowthStage::Mature => 4,
        }
    }
}

impl fmt::Display for GrowthStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Investor summary extracted from the nested investors field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Investors {
    pub total: u64,
    pub types: Vec<String>,
}

/// One company as handed over by the ingest loader, after field parsing
/// and corrections. Absent values are `None`, never sentinels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub id: String,
    pub name: Option<String>,
    pub launch_year: Option<i32>,
    /// Raw employee range label, sentinel included
    pub employee_range: Option<String>,
    /// Observed employee count
    pub employees_latest: Option<f64>,
    pub growth_stage: Option<GrowthStage>,
    pub total_funding: Option<f64>,
    pub nb_patents: Option<f64>,
    /// Industry names in source order
    pub industries: Vec<String>,
    pub investors: Option<Investors>,
    pub linkedin_url: Option<String>,
}

impl CompanyRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            launch_year: None,
            employee_range: None,
            employees_latest: None,
            growth_stage: None,
            total_funding: None,
            nb_patents: None,
            industries: Vec::new(),
            investors: None,
            linkedin_url: None,
        }
    }

    /// Key used to join personnel aggregates onto this company.
    pub fn company_key(&self) -> Option<String> {
        self.linkedin_url.as_deref().and_then(company_key)
    }
}

/// Normalise a company LinkedIn URL (or a scraper start URL pointing at its
/// `/people` page) into a join key.
pub fn company_key(url: &str) -> Option<String> {
    let mut key = url.trim().trim_end_matches('/').to_lowercase();
    if let Some(stripped) = key.strip_suffix("/people") {
        key = stripped.trim_end_matches('/').to_string();
    }
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Scraped personnel row before classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPerson {
    pub name: Option<String>,
    pub title: Option<String>,
    pub profile_url: Option<String>,
    pub company_url: String,
}

/// A classified person attached to a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub name: Option<String>,
    /// Lowercased title with any "at <company>" suffix removed
    pub title: String,
    pub profile_url: Option<String>,
    pub company_key: String,
    pub technical: bool,
    pub has_degree: bool,
    pub is_founder: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentCategory {
    Experience,
    Education,
    FundingEvent,
}

impl FragmentCategory {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "experience" => Some(FragmentCategory::Experience),
            "education" => Some(FragmentCategory::Education),
            "funding_event" => Some(FragmentCategory::FundingEvent),
            _ => None,
        }
    }

    /// Column names of this category's fields, in slot order.
    pub fn field_names(&self) -> [&'static str; 3] {
        match self {
            FragmentCategory::Experience => ["title", "company", "description"],
            FragmentCategory::Education => ["institution", "degree", "field"],
            FragmentCategory::FundingEvent => ["type", "amount", "text"],
        }
    }
}

/// Category-specific payload of one scraped profile row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum FragmentFields {
    Experience {
        title: Option<String>,
        company: Option<String>,
        description: Option<String>,
    },
    Education {
        institution: Option<String>,
        degree: Option<String>,
        field: Option<String>,
    },
    FundingEvent {
        #[serde(rename = "type")]
        event_type: Option<String>,
        amount: Option<String>,
        text: Option<String>,
    },
}

impl FragmentFields {
    pub fn category(&self) -> FragmentCategory {
        match self {
            FragmentFields::Experience { .. } => FragmentCategory::Experience,
            FragmentFields::Education { .. } => FragmentCategory::Education,
            FragmentFields::FundingEvent { .. } => FragmentCategory::FundingEvent,
        }
    }

    /// Field values in the order given by `FragmentCategory::field_names`.
    pub fn values(&self) -> [Option<&str>; 3] {
        match self {
            FragmentFields::Experience { title, company, description } => {
                [title.as_deref(), company.as_deref(), description.as_deref()]
            }
            FragmentFields::Education { institution, degree, field } => {
                [institution.as_deref(), degree.as_deref(), field.as_deref()]
            }
            FragmentFields::FundingEvent { event_type, amount, text } => {
                [event_type.as_deref(), amount.as_deref(), text.as_deref()]
            }
        }
    }
}

/// One scraped row of a person's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProfileFragment {
    pub profile_id: String,
    #[serde(flatten)]
    pub fields: FragmentFields,
}

impl RawProfileFragment {
    pub fn category(&self) -> FragmentCategory {
        self.fields.category()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_stage_parse_and_order() {
        assert_eq!(GrowthStage::parse("Late Growth"), Some(GrowthStage::LateGrowth));
        assert_eq!(GrowthStage::parse("early_growth"), Some(GrowthStage::EarlyGrowth));
        assert_eq!(GrowthStage::parse("not meaningful"), None);
        assert!(GrowthStage::Seed < GrowthStage::Mature);
        assert_eq!(GrowthStage::Mature.ordinal(), 4);
    }

    #[test]
    fn test_company_key_strips_people_page() {
        assert_eq!(
            company_key("https://www.linkedin.com/company/acme/people/"),
            Some("https://www.linkedin.com/company/acme".to_string())
        );
        assert_eq!(
            company_key("https://www.LinkedIn.com/company/Acme"),
            Some("https://www.linkedin.com/company/acme".to_string())
        );
        assert_eq!(company_key("  "), None);
    }

    #[test]
    fn test_fragment_category_parse() {
        assert_eq!(FragmentCategory::parse("funding-event"), Some(FragmentCategory::FundingEvent));
        assert_eq!(FragmentCategory::parse("Education"), Some(FragmentCategory::Education));
        assert_eq!(FragmentCategory::parse("skills"), None);
    }
}
