//! Request/response contract for front ends
//!
//! Mirrors the `/ask` JSON shape: `{"question": ..., "k": ...}` in,
//! `{"question": ..., "context": [...]}` or `{"error": ...}` out.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorClass, RetrievalError, Result};
use crate::retriever::{Retriever, MISSING_QUESTION};

/// Incoming question
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrieveRequest {
    #[serde(default)]
    pub question: Option<String>,
    /// Passage count; signed so negative values can be reported as bad input
    #[serde(default)]
    pub k: Option<i64>,
}

impl RetrieveRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: Some(question.into()),
            k: None,
        }
    }

    pub fn with_k(mut self, k: i64) -> Self {
        self.k = Some(k);
        self
    }
}

/// Response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RetrieveResponse {
    Success {
        question: String,
        context: Vec<String>,
    },
    Failure {
        error: String,
    },
}

/// Response body plus its status class
#[derive(Debug, Clone, PartialEq)]
pub struct RetrieveOutcome {
    /// 200, 400 or 500
    pub status: u16,
    pub body: RetrieveResponse,
}

impl RetrieveOutcome {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    fn from_error(err: &RetrievalError) -> Self {
        match err.class() {
            ErrorClass::Validation => log::debug!("Rejected request: {}", err),
            ErrorClass::Retrieval => log::error!("Retrieval failed: {}", err),
        }
        Self {
            status: err.status_code(),
            body: RetrieveResponse::Failure {
                error: err.to_string(),
            },
        }
    }
}

/// Validate a caller-supplied `k`, falling back to `default`
pub fn resolve_top_k(k: Option<i64>, default: usize) -> Result<usize> {
    match k {
        None => Ok(default),
        Some(k) if k <= 0 => Err(RetrievalError::validation(format!(
            "k must be a positive integer, got {}",
            k
        ))),
        Some(k) => usize::try_from(k)
            .map_err(|_| RetrievalError::validation(format!("k is too large: {}", k))),
    }
}

impl Retriever {
    /// Answer one request; never fails, errors become the failure body
    pub fn handle(&self, request: &RetrieveRequest) -> RetrieveOutcome {
        match self.answer(request) {
            Ok(body) => RetrieveOutcome { status: 200, body },
            Err(err) => RetrieveOutcome::from_error(&err),
        }
    }

    fn answer(&self, request: &RetrieveRequest) -> Result<RetrieveResponse> {
        let question = request
            .question
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| RetrievalError::validation(MISSING_QUESTION))?;
        let k = resolve_top_k(request.k, self.context().default_top_k())?;

        let context = self.retrieve(question, Some(k))?;
        Ok(RetrieveResponse::Success {
            question: question.to_string(),
            context,
        })
    }
}
