//! Error types for ragctx-retrieval

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading or querying the retrieval core
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Malformed or missing caller input (empty question, k out of range)
    #[error("{0}")]
    Validation(String),

    /// Text could not be turned into an embedding
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Persisted index is missing, unreadable or inconsistent
    #[error("Failed to load index at {}: {reason}", path.display())]
    IndexLoad { path: PathBuf, reason: String },

    /// Stored vectors do not have the dimension the encoder produces
    #[error("Index dimension {index} does not match encoder dimension {encoder}")]
    DimensionMismatch { index: usize, encoder: usize },

    /// Unexpected failure while searching the index
    #[error("Search error: {0}")]
    Search(String),

    /// Embedding backend could not be initialized
    #[error("Model error: {0}")]
    Model(String),

    /// Serialization error (bincode)
    #[error("Serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// How a failure is reported to whoever called `retrieve`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The caller sent bad input
    Validation,
    /// Something failed inside the core
    Retrieval,
}

impl RetrievalError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an encoding error
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Create an index load error for the given location
    pub fn index_load(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::IndexLoad {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Create a search error
    pub fn search(msg: impl Into<String>) -> Self {
        Self::Search(msg.into())
    }

    /// Create a model error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Classify for the external contract
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Validation(_) => ErrorClass::Validation,
            _ => ErrorClass::Retrieval,
        }
    }

    /// True for failures that must stop the service from starting
    pub fn is_index_load(&self) -> bool {
        matches!(self, Self::IndexLoad { .. } | Self::DimensionMismatch { .. })
    }

    /// HTTP-style status for the error class (400 or 500)
    pub fn status_code(&self) -> u16 {
        match self.class() {
            ErrorClass::Validation => 400,
            ErrorClass::Retrieval => 500,
        }
    }
}

/// Result type for retrieval operations
pub type Result<T> = std::result::Result<T, RetrievalError>;
