

use thiserror::Error;

use crate::oracles::base::LookupError;


#[derive(Error, Debug)]
pub enum SegError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Lookup failed: {0}")]
    Lookup(#[from] LookupError),

    #[error("Malformed row {index}: {reason}")]
    MalformedRow { index: usize, reason: String },

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Embedding model error: {0}")]
    Model(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Extraction failed for phrase #{index} ({phrase}): {error}")]
    Extraction {
        index: usize,
        phrase: String,
        error: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv_async::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SegError {
    pub fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRow {
            index,
            reason: reason.into(),
        }
    }
}

impl From<config::ConfigError> for SegError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<tempfile::PersistError> for SegError {
    fn from(e: tempfile::PersistError) -> Self {
        Self::Io(e.error)
    }
}


pub type Result<T> = std::result::Result<T, SegError>;
