//! Error types for the scoring, forecasting, and scenario engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the engine and its artifact boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// One or more configuration invariants were violated.
    #[error("invalid configuration: {}", join_config_errors(.0))]
    InvalidConfig(Vec<ConfigError>),

    /// A cluster record could not be ingested.
    #[error("ingest error: {0}")]
    Ingest(String),

    /// Scored clusters and demand records do not describe the same cluster set.
    #[error("snapshot mismatch: {0}")]
    SnapshotMismatch(String),

    /// A recompute job is already running.
    #[error("recompute job already running since {0}")]
    JobInProgress(chrono::DateTime<chrono::Utc>),

    /// The running job was cancelled between stages.
    #[error("cancelled before stage `{0}`")]
    Cancelled(&'static str),

    /// Failed to publish output artifacts.
    #[error("failed to publish artifacts to {path}: {source}")]
    Publish {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::InvalidConfig(vec![e])
    }
}

fn join_config_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
