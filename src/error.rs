//! Error types for sample diversity validation.

use thiserror::Error;

/// Errors raised while loading inputs or computing statistics.
///
/// A validation run converts these into a `failed` result rather than
/// returning them to the caller.
#[derive(Error, Debug)]
pub enum DivError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Malformed catalog: {0}")]
    MalformedCatalog(String),

    #[error("Sample '{sample}' has non-numeric value '{value}' for metric '{metric}'")]
    InvalidMetric {
        sample: String,
        metric: String,
        value: String,
    },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("No data: {0}")]
    EmptyData(String),

    #[error("Table shape mismatch: expected {expected} columns, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, DivError>;
