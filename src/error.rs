use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A nested or typed field could not be parsed into its expected shape.
    #[error("Malformed field '{field}': {reason}")]
    MalformedField { field: String, reason: String },

    /// Required columns are absent from an input table. Fatal for the run.
    #[error("Schema mismatch in table '{table}': missing columns {missing:?}")]
    SchemaMismatch { table: String, missing: Vec<String> },

    #[error("Unknown profile fragment category: {0}")]
    UnknownCategory(String),
}

impl FeatureError {
    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        FeatureError::MalformedField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FeatureError>;
