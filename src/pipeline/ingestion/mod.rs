// Pipeline ingestion: schema checks and typed normalization of the raw input tables

pub mod corrections;
pub mod fields;
pub mod table;

pub use corrections::CorrectionTable;
pub use table::{RawRow, RawTable};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::constants::*;
use crate::domain::{
    CompanyRecord, FragmentCategory, FragmentFields, GrowthStage, RawPerson, RawProfileFragment,
};
use crate::error::{FeatureError, Result};
use crate::metrics::IngestMetrics;

/// A field that failed to parse and was treated as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub table: String,
    pub row: usize,
    pub field: String,
    pub reason: String,
}

/// Typed records from one raw table plus what went wrong along the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    pub issues: Vec<FieldIssue>,
    /// Rows dropped because an identifying field was unusable
    pub rejected_rows: usize,
    /// Rows dropped through the correction table
    pub excluded_rows: usize,
}

impl<T> Normalized<T> {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            issues: Vec::new(),
            rejected_rows: 0,
            excluded_rows: 0,
        }
    }
}

/// Converts heterogeneous raw rows into typed domain records.
///
/// Schema problems abort before any row is read. Per-field parse failures are
/// recorded as [`FieldIssue`]s and the field is treated as absent, so the
/// record falls through to the imputation tiers instead of failing the batch.
pub struct IngestNormalizer {
    corrections: CorrectionTable,
}

impl IngestNormalizer {
    pub fn new(corrections: CorrectionTable) -> Self {
        Self { corrections }
    }

    pub fn corrections(&self) -> &CorrectionTable {
        &self.corrections
    }

    pub fn normalize_companies(&self, table: &RawTable) -> Result<Normalized<CompanyRecord>> {
        check_schema(table, COMPANY_REQUIRED_COLUMNS)?;

        let mut out = Normalized::new();
        for (index, row) in table.rows.iter().enumerate() {
            let mut issues = IssueSink::new(&table.name, index);

            let id = match issues.take(fields::text(row, COL_ID)) {
                Some(id) => id,
                None => {
                    warn!(table = %table.name, row = index, "Company row without id rejected");
                    IngestMetrics::record_row_rejected();
                    out.rejected_rows += 1;
                    out.issues.extend(issues.finish());
                    continue;
                }
            };

            if self.corrections.is_excluded(&id) {
                debug!(id = %id, "Company excluded by correction table");
                out.excluded_rows += 1;
                continue;
            }

            let mut record = CompanyRecord::new(id);
            record.name = issues.take(fields::text(row, COL_NAME));
            record.launch_year = issues.take(fields::year(row, COL_LAUNCH_YEAR));
            record.employee_range = issues.take(fields::text(row, COL_EMPLOYEES_RANGE));
            record.employees_latest = issues.take(fields::number(row, COL_EMPLOYEES_LATEST));
            record.total_funding = issues.take(fields::number(row, COL_TOTAL_FUNDING));
            record.nb_patents = issues.take(fields::number(row, COL_PATENTS));
            record.linkedin_url = issues.take(fields::text(row, COL_LINKEDIN_URL));

            record.growth_stage = match issues.take(fields::text(row, COL_GROWTH_STAGE)) {
                Some(label) => {
                    let stage = GrowthStage::parse(&label);
                    if stage.is_none() {
                        issues.push(FeatureError::malformed(
                            COL_GROWTH_STAGE,
                            format!("unknown growth stage '{}'", label),
                        ));
                    }
                    stage
                }
                None => None,
            };

            if let Some(value) = issues.take(fields::nested(row, COL_INDUSTRIES)) {
                record.industries = issues
                    .take(fields::industries(&value, COL_INDUSTRIES).map(Some))
                    .unwrap_or_default();
            }
            if let Some(value) = issues.take(fields::nested(row, COL_INVESTORS)) {
                record.investors = issues.take(fields::investors(&value, COL_INVESTORS).map(Some));
            }

            let applied = self.corrections.apply(&mut record);
            if applied != Default::default() {
                debug!(id = %record.id, ?applied, "Corrections applied");
            }

            out.issues.extend(issues.finish());
            out.records.push(record);
        }

        finish_table(table, &out);
        if out.excluded_rows > 0 {
            IngestMetrics::record_rows_excluded(out.excluded_rows);
        }
        Ok(out)
    }

    pub fn normalize_personnel(&self, table: &RawTable) -> Result<Normalized<RawPerson>> {
        check_schema(table, PERSONNEL_REQUIRED_COLUMNS)?;

        let mut out = Normalized::new();
        for (index, row) in table.rows.iter().enumerate() {
            let mut issues = IssueSink::new(&table.name, index);

            let company_url = match issues.take(fields::text(row, COL_COMPANY_URL)) {
                Some(url) => url,
                None => {
                    IngestMetrics::record_row_rejected();
                    out.rejected_rows += 1;
                    out.issues.extend(issues.finish());
                    continue;
                }
            };

            out.records.push(RawPerson {
                name: issues.take(fields::text(row, COL_PERSON_NAME)),
                title: issues.take(fields::text(row, COL_PERSON_TITLE)),
                profile_url: issues.take(fields::text(row, COL_PROFILE_URL)),
                company_url,
            });
            out.issues.extend(issues.finish());
        }

        finish_table(table, &out);
        Ok(out)
    }

    pub fn normalize_fragments(&self, table: &RawTable) -> Result<Normalized<RawProfileFragment>> {
        check_schema(table, FRAGMENT_REQUIRED_COLUMNS)?;

        let mut out = Normalized::new();
        for (index, row) in table.rows.iter().enumerate() {
            let mut issues = IssueSink::new(&table.name, index);

            let profile_id = issues.take(fields::text(row, COL_PROFILE_ID));
            let category = issues.take(fields::text(row, COL_CATEGORY)).and_then(|tag| {
                let parsed = FragmentCategory::parse(&tag);
                if parsed.is_none() {
                    issues.push(FeatureError::UnknownCategory(tag));
                }
                parsed
            });

            let (profile_id, category) = match (profile_id, category) {
                (Some(profile_id), Some(category)) => (profile_id, category),
                _ => {
                    IngestMetrics::record_row_rejected();
                    out.rejected_rows += 1;
                    out.issues.extend(issues.finish());
                    continue;
                }
            };

            let [first, second, third] = category.field_names();
            let a = issues.take(fields::text(row, first));
            let b = issues.take(fields::text(row, second));
            let c = issues.take(fields::text(row, third));

            let fields = match category {
                FragmentCategory::Experience => FragmentFields::Experience {
                    title: a,
                    company: b,
                    description: c,
                },
                FragmentCategory::Education => FragmentFields::Education {
                    institution: a,
                    degree: b,
                    field: c,
                },
                FragmentCategory::FundingEvent => FragmentFields::FundingEvent {
                    event_type: a,
                    amount: b,
                    text: c,
                },
            };

            out.records.push(RawProfileFragment { profile_id, fields });
            out.issues.extend(issues.finish());
        }

        finish_table(table, &out);
        Ok(out)
    }
}

impl Default for IngestNormalizer {
    fn default() -> Self {
        Self::new(CorrectionTable::default())
    }
}

fn check_schema(table: &RawTable, required: &[&str]) -> Result<()> {
    table.require_columns(required).map_err(|e| {
        IngestMetrics::record_schema_mismatch();
        e
    })
}

fn finish_table<T>(table: &RawTable, out: &Normalized<T>) {
    IngestMetrics::record_rows_normalized(out.records.len());
    info!(
        table = %table.name,
        rows = table.len(),
        normalized = out.records.len(),
        rejected = out.rejected_rows,
        excluded = out.excluded_rows,
        malformed_fields = out.issues.len(),
        "Table normalized"
    );
}

/// Collects per-field failures of one row, turning them into absent values.
struct IssueSink<'a> {
    table: &'a str,
    row: usize,
    issues: Vec<FieldIssue>,
}

impl<'a> IssueSink<'a> {
    fn new(table: &'a str, row: usize) -> Self {
        Self {
            table,
            row,
            issues: Vec::new(),
        }
    }

    fn take<T>(&mut self, result: Result<Option<T>>) -> Option<T> {
        match result {
            Ok(value) => value,
            Err(e) => {
                self.push(e);
                None
            }
        }
    }

    fn push(&mut self, error: FeatureError) {
        let (field, reason) = match error {
            FeatureError::MalformedField { field, reason } => (field, reason),
            FeatureError::UnknownCategory(tag) => {
                (COL_CATEGORY.to_string(), format!("unknown category '{}'", tag))
            }
            other => (String::new(), other.to_string()),
        };
        warn!(
            table = self.table,
            row = self.row,
            field = %field,
            "Malformed field treated as absent: {}",
            reason
        );
        IngestMetrics::record_malformed_field();
        self.issues.push(FieldIssue {
            table: self.table.to_string(),
            row: self.row,
            field,
            reason,
        });
    }

    fn finish(self) -> Vec<FieldIssue> {
        self.issues
    }
}
