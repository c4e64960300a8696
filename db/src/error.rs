//! Error types for table and configuration loading.
//!
//! Line-level problems are diagnostics and never surface here; these errors
//! cover I/O, deserialization, schema construction and configuration.

use sbatch_lint_core::SchemaError;
use thiserror::Error;

/// Errors that can occur while loading tables or configuration.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The tables parsed but do not form a valid schema.
    #[error("invalid schema: {0}")]
    SchemaError(#[from] SchemaError),

    /// Configuration validation failure.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Every configured loader source was missing.
    #[error("no schema sources available (tried: {0})")]
    NoSourcesAvailable(String),
}

impl DatabaseError {
    /// Returns `true` when the error means a source does not exist, as
    /// opposed to existing but being unreadable or malformed.
    pub fn is_missing_source(&self) -> bool {
        matches!(self, Self::IoError(err) if err.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Convenience alias for results with [`DatabaseError`].
pub type Result<T> = std::result::Result<T, DatabaseError>;
