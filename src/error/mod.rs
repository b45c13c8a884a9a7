//! Error handling for labsynth.
//!
//! Malformed rows are coerced rather than rejected (see
//! [`crate::models::RecordCleaner`]), so the variants here are reserved for
//! caller contract violations, unavailable scores and collaborator failures.

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

/// Specialized error type for labsynth operations
#[derive(Debug, Error)]
pub enum SynthError {
    /// Error opening, reading or writing a file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error processing Arrow data
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error processing Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error (de)serializing JSON payloads or configuration
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error converting between serde rows and Arrow batches
    #[error("Arrow conversion error: {0}")]
    ArrowConversion(#[from] serde_arrow::Error),

    /// The remote generation service failed or returned an unusable answer
    #[error("Remote backend error: {0}")]
    Remote(String),

    /// A row or payload is missing structure that cannot be defaulted
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Generation was requested with no source rows
    #[error("Cannot generate synthetic rows from an empty dataset")]
    EmptyDataset,

    /// The requested number of rows is not positive
    #[error("Invalid row count {0}: rows to generate must be positive")]
    InvalidCount(i64),

    /// A score cannot be derived from the supplied datasets
    #[error("Not computable: {0}")]
    NotComputable(String),

    /// A categorical distribution was built without any entries
    #[error("Categorical distribution for '{0}' has no entries")]
    EmptyDistribution(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SynthError {
    /// Whether this error marks a score that is unavailable rather than a failure
    #[must_use]
    pub const fn is_not_computable(&self) -> bool {
        matches!(self, Self::NotComputable(_))
    }
}

impl From<reqwest::Error> for SynthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Remote(error.to_string())
    }
}

/// Result type for labsynth operations
pub type Result<T> = std::result::Result<T, SynthError>;
