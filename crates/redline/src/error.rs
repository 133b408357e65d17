//! Error types for the redline library.
//!
//! Only startup work (configuration, knowledge base loading, explicit cache
//! persistence) returns these errors. Producing a suggestion never does; every
//! failure inside the pipeline degrades to a fallback instead.

use std::path::PathBuf;
use thiserror::Error;

use crate::llm::GenerationError;

/// Main error type for redline operations.
#[derive(Debug, Error)]
pub enum RedlineError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration parse error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed knowledge base record.
    #[error("Knowledge base record {index}: {message}")]
    KnowledgeBase { index: usize, message: String },

    /// Cache file could not be written or read.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Generation service failure surfaced to a direct caller of the client.
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),
}

impl RedlineError {
    /// Wrap an IO error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RedlineError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for redline operations.
pub type Result<T> = std::result::Result<T, RedlineError>;
