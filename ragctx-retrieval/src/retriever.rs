//! Retriever and service context
//!
//! [`ServiceContext`] owns the encoder and index, built once at startup.
//! [`Retriever`] is the cheap, cloneable handle request handlers call.

use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::embedding::TextEncoder;
use crate::error::{RetrievalError, Result};
use crate::index::{IndexExpectation, IndexSnapshot, PassageIndex, ScoredPassage};

/// Message returned for an empty or missing question
pub const MISSING_QUESTION: &str = "missing question field";

/// Everything a retrieval call reads, loaded once
pub struct ServiceContext {
    encoder: TextEncoder,
    index: PassageIndex,
    default_top_k: usize,
}

impl ServiceContext {
    /// Load the encoder, then the index, refusing to start on any mismatch
    pub fn load(config: &RetrievalConfig) -> Result<Self> {
        // A missing or unreadable index fails before any model is fetched
        IndexSnapshot::read_manifest(&config.index_dir)?;

        let encoder = TextEncoder::from_config(&config.encoder)?;
        let expect = IndexExpectation::from_encoder(&encoder);
        let index = PassageIndex::load(&config.index_dir, &expect, &config.search)?;
        Self::new(encoder, index, config.default_top_k)
    }

    /// Assemble from parts already loaded
    pub fn new(encoder: TextEncoder, index: PassageIndex, default_top_k: usize) -> Result<Self> {
        if encoder.dimension() != index.dimension() {
            return Err(RetrievalError::DimensionMismatch {
                index: index.dimension(),
                encoder: encoder.dimension(),
            });
        }
        if default_top_k == 0 {
            return Err(RetrievalError::validation(
                "default k must be a positive integer",
            ));
        }
        Ok(Self {
            encoder,
            index,
            default_top_k,
        })
    }

    pub fn encoder(&self) -> &TextEncoder {
        &self.encoder
    }

    pub fn index(&self) -> &PassageIndex {
        &self.index
    }

    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }
}

/// Stateless retrieval entry point
#[derive(Clone)]
pub struct Retriever {
    context: Arc<ServiceContext>,
}

impl Retriever {
    pub fn new(context: Arc<ServiceContext>) -> Self {
        Self { context }
    }

    /// Passage texts most similar to `query`, best first
    pub fn retrieve(&self, query: &str, k: Option<usize>) -> Result<Vec<String>> {
        Ok(self
            .retrieve_scored(query, k)?
            .into_iter()
            .map(|hit| hit.passage.text)
            .collect())
    }

    /// Like [`Retriever::retrieve`] but keeps scores and metadata
    pub fn retrieve_scored(&self, query: &str, k: Option<usize>) -> Result<Vec<ScoredPassage>> {
        if query.trim().is_empty() {
            return Err(RetrievalError::validation(MISSING_QUESTION));
        }
        let k = k.unwrap_or(self.context.default_top_k);
        if k == 0 {
            return Err(RetrievalError::validation("k must be a positive integer"));
        }

        let vector = self.context.encoder.embed_query(query)?;
        let hits = self.context.index.search(&vector, k)?;

        log::debug!("Retrieved {} passages (k={})", hits.len(), k);
        Ok(hits)
    }

    pub fn context(&self) -> &Arc<ServiceContext> {
        &self.context
    }
}
