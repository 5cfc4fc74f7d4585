use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FeatureError, Result};

pub type RawRow = Map<String, Value>;

/// An in-memory table as supplied by the ingest loader: named columns and
/// JSON-valued rows. Cells may be missing, `null`, strings or numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<RawRow>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// Build a table whose header is the union of row keys in first-seen order.
    pub fn from_rows(name: impl Into<String>, rows: Vec<RawRow>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        Self::new(name, columns, rows)
    }

    /// Build a table from a JSON array of objects. Non-object elements are rejected.
    pub fn from_json_array(name: impl Into<String>, value: Value) -> Result<Self> {
        let name = name.into();
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(FeatureError::malformed(
                    name,
                    format!("expected a JSON array of rows, found {}", json_kind(&other)),
                ))
            }
        };

        let mut rows = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match item {
                Value::Object(row) => rows.push(row),
                other => {
                    return Err(FeatureError::malformed(
                        format!("{}[{}]", name, index),
                        format!("expected an object, found {}", json_kind(&other)),
                    ))
                }
            }
        }
        Ok(Self::from_rows(name, rows))
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Fail with `SchemaMismatch` listing every required column the header lacks.
    pub fn require_columns(&self, required: &[&str]) -> Result<()> {
        let missing: Vec<String> = required
            .iter()
            .filter(|column| !self.has_column(column))
            .map(|column| column.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(FeatureError::SchemaMismatch {
                table: self.name.clone(),
                missing,
            })
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
