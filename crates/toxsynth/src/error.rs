//! Error types for the toxsynth library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for toxsynth operations.
///
/// Insufficient input never surfaces here: too few dose groups or missing
/// p-values resolve to sentinel results. Errors are reserved for upstream
/// contract violations and I/O.
#[derive(Debug, Error)]
pub enum SynthError {
    /// Dose levels within one endpoint are not in ascending order.
    #[error("Dose levels for '{endpoint}' are not sorted ascending ({previous} then {next})")]
    UnsortedDoseLevels {
        endpoint: String,
        previous: u32,
        next: u32,
    },

    /// The same dose level appears twice within one endpoint.
    #[error("Duplicate dose level {level} for '{endpoint}'")]
    DuplicateDoseLevel { endpoint: String, level: u32 },

    /// The control group carries a p-value.
    #[error("Control group of '{endpoint}' carries a p-value")]
    ControlPValue { endpoint: String },

    /// A p-value is NaN or outside [0, 1].
    #[error("Invalid p-value {value} at dose level {level} of '{endpoint}'")]
    InvalidPValue {
        endpoint: String,
        level: u32,
        value: f64,
    },

    /// A scheduled-only row set does not describe the same endpoint.
    #[error("Scheduled-only statistics for '{expected}' belong to '{found}'")]
    CohortMismatch { expected: String, found: String },

    /// The same endpoint and sex appear twice in one study.
    #[error("Duplicate endpoint '{endpoint}'")]
    DuplicateEndpoint { endpoint: String },

    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing tabular dose rows.
    #[error("Parse error at row {row}, column '{column}': {message}")]
    Parse {
        row: usize,
        column: String,
        message: String,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// Result type alias for toxsynth operations.
pub type Result<T> = std::result::Result<T, SynthError>;
