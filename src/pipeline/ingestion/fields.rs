//! Typed readers for the heterogeneous cells of raw input rows.
//!
//! Absent cells (missing key, `null`, blank string) read as `Ok(None)`;
//! cells that are present but unusable are `MalformedField` errors so the
//! caller can decide to recover locally.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::table::{json_kind, RawRow};
use crate::domain::Investors;
use crate::error::{FeatureError, Result};

static INTEGER_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid integer regex"));
static IN_WORD_APOSTROPHE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w)'(\w)").expect("valid apostrophe regex"));
static PY_NONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bNone\b").expect("valid None regex"));
static PY_TRUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bTrue\b").expect("valid True regex"));
static PY_FALSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bFalse\b").expect("valid False regex"));

fn cell<'a>(row: &'a RawRow, column: &str) -> Option<&'a Value> {
    match row.get(column) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(value) => Some(value),
    }
}

/// Text cell. Numbers are rendered, so numeric identifiers read as text.
pub fn text(row: &RawRow, column: &str) -> Result<Option<String>> {
    match cell(row, column) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(FeatureError::malformed(
            column,
            format!("expected text, found {}", json_kind(other)),
        )),
    }
}

/// Numeric cell; accepts JSON numbers and numeric strings.
pub fn number(row: &RawRow, column: &str) -> Result<Option<f64>> {
    let value = match cell(row, column) {
        None => return Ok(None),
        Some(value) => value,
    };

    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(Some(v)),
        // NaN spelled out by upstream exports means "absent"
        _ if matches!(value, Value::String(s) if s.trim().eq_ignore_ascii_case("nan")) => Ok(None),
        _ => Err(FeatureError::malformed(
            column,
            format!("expected a number, found {}", value),
        )),
    }
}

/// Year cell; accepts integral numbers such as `2015` or `"2015.0"`.
pub fn year(row: &RawRow, column: &str) -> Result<Option<i32>> {
    match number(row, column)? {
        None => Ok(None),
        Some(v) if v.fract() == 0.0 && (1000.0..=9999.0).contains(&v) => Ok(Some(v as i32)),
        Some(v) => Err(FeatureError::malformed(column, format!("{} is not a calendar year", v))),
    }
}

/// Every run of digits in an employee range label, e.g. `"11-50"` -> `[11, 50]`.
pub fn range_integers(label: &str) -> Vec<u64> {
    INTEGER_RUN
        .find_iter(label)
        .filter_map(|m| m.as_str().parse::<u64>().ok())
        .collect()
}

/// Arithmetic mean of the integers in a range label; `None` when it has none.
pub fn range_mean(label: &str) -> Option<f64> {
    let values = range_integers(label);
    if values.is_empty() {
        return None;
    }
    Some(values.iter().map(|v| *v as f64).sum::<f64>() / values.len() as f64)
}

/// Rewrite a Python-literal style blob (`{'total': 1, 'ok': True}`) as JSON.
pub fn repair_quasi_json(blob: &str) -> String {
    // In-word apostrophes ("d'Arrouzat", "O'Sol") would otherwise become quotes
    let without_apostrophes = IN_WORD_APOSTROPHE.replace_all(blob, "$1$2");
    let quoted = without_apostrophes.replace('\'', "\"");
    let nulls = PY_NONE.replace_all(&quoted, "null");
    let trues = PY_TRUE.replace_all(&nulls, "true");
    PY_FALSE.replace_all(&trues, "false").into_owned()
}

/// Read a nested cell either as already-structured JSON or as quasi-JSON text.
pub fn nested(row: &RawRow, column: &str) -> Result<Option<Value>> {
    match cell(row, column) {
        None => Ok(None),
        Some(Value::String(blob)) => serde_json::from_str(&repair_quasi_json(blob))
            .map(Some)
            .map_err(|e| {
                FeatureError::malformed(column, format!("unparseable nested text: {}", e))
            }),
        Some(value @ (Value::Array(_) | Value::Object(_))) => Ok(Some(value.clone())),
        Some(other) => Err(FeatureError::malformed(
            column,
            format!("expected nested structure, found {}", json_kind(other)),
        )),
    }
}

/// Industry names from a list of `{"name": ...}` entries, in source order.
pub fn industries(value: &Value, column: &str) -> Result<Vec<String>> {
    let entries = value.as_array().ok_or_else(|| {
        FeatureError::malformed(column, format!("expected a list, found {}", json_kind(value)))
    })?;

    entries
        .iter()
        .map(|entry| {
            entry
                .get("name")
                .and_then(Value::as_str)
                .map(|name| name.to_string())
                .ok_or_else(|| FeatureError::malformed(column, "industry entry without a name"))
        })
        .collect()
}

/// Investor summary from `{"total": n, "items": [{"type": ...}, ...]}`.
pub fn investors(value: &Value, column: &str) -> Result<Investors> {
    let total = value
        .get("total")
        .and_then(|t| {
            t.as_u64()
                .or_else(|| t.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
        })
        .ok_or_else(|| FeatureError::malformed(column, "investor record without a numeric total"))?;

    let mut types = Vec::new();
    if total > 0 {
        let items = value
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                FeatureError::malformed(column, "investor record without an item list")
            })?;
        types.extend(
            items
                .iter()
                .filter_map(|item| item.get("type").and_then(Value::as_str))
                .map(|t| t.to_string()),
        );
    }

    Ok(Investors { total, types })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> RawRow {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_range_mean() {
        assert_eq!(range_mean("10-20 employees"), Some(15.0));
        assert_eq!(range_mean("11-50"), Some(30.5));
        assert_eq!(range_mean("10001+"), Some(10001.0));
        assert_eq!(range_mean("n.a."), None);
        assert_eq!(range_mean(""), None);
    }

    #[test]
    fn test_number_and_year_cells() {
        let r = row(json!({
            "a": 12, "b": "3,500", "c": "", "d": "nan", "e": "lots", "y": "2015.0", "z": 15.5
        }));
        assert_eq!(number(&r, "a").unwrap(), Some(12.0));
        assert_eq!(number(&r, "b").unwrap(), Some(3500.0));
        assert_eq!(number(&r, "c").unwrap(), None);
        assert_eq!(number(&r, "d").unwrap(), None);
        assert_eq!(number(&r, "missing").unwrap(), None);
        assert!(number(&r, "e").is_err());
        assert_eq!(year(&r, "y").unwrap(), Some(2015));
        assert!(year(&r, "z").is_err());
    }

    #[test]
    fn test_text_reads_numeric_ids() {
        let r = row(json!({"id": 15789, "name": "  Acme "}));
        assert_eq!(text(&r, "id").unwrap(), Some("15789".to_string()));
        assert_eq!(text(&r, "name").unwrap(), Some("Acme".to_string()));
    }

    #[test]
    fn test_repair_quasi_json() {
        let blob = "{'total': 2, 'items': [{'type': 'fund', 'name': \"d'Arrouzat\"}, \
                    {'type': None, 'lead': True}]}";
        let value: Value = serde_json::from_str(&repair_quasi_json(blob)).unwrap();
        assert_eq!(value["total"], 2);
        assert_eq!(value["items"][0]["type"], "fund");
        assert_eq!(value["items"][0]["name"], "dArrouzat");
        assert!(value["items"][1]["type"].is_null());
        assert_eq!(value["items"][1]["lead"], true);
    }

    #[test]
    fn test_nested_industries_from_text_and_json() {
        let r = row(json!({
            "as_text": "[{'name': 'health', 'id': 7}, {'name': 'energy'}]",
            "as_json": [{"name": "fintech"}],
            "broken": "[{'name': 'health'"
        }));

        let from_text = nested(&r, "as_text").unwrap().unwrap();
        assert_eq!(industries(&from_text, "as_text").unwrap(), vec!["health", "energy"]);

        let from_json = nested(&r, "as_json").unwrap().unwrap();
        assert_eq!(industries(&from_json, "as_json").unwrap(), vec!["fintech"]);

        assert!(matches!(
            nested(&r, "broken"),
            Err(FeatureError::MalformedField { .. })
        ));
    }

    #[test]
    fn test_investors() {
        let funded = json!({"total": 2, "items": [{"type": "fund"}, {"type": "corporate"}]});
        assert_eq!(investors(&funded, "investors").unwrap().types, vec!["fund", "corporate"]);

        let none = json!({"total": 0, "items": []});
        assert!(investors(&none, "investors").unwrap().types.is_empty());

        assert!(investors(&json!({"items": []}), "investors").is_err());
    }
}
