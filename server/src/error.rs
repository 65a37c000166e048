//! Error types for the ragctx front end.

use ragctx_retrieval::{ErrorClass, RetrievalError};
use thiserror::Error;

/// Errors that can occur outside a single request.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ServerError {
    /// Process exit code: 2 for bad input, 1 for everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Retrieval(err) if err.class() == ErrorClass::Validation => 2,
            _ => 1,
        }
    }
}

/// Result type alias for front-end operations.
pub type ServerResult<T> = Result<T, ServerError>;
