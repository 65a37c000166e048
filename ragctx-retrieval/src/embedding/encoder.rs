//! Asymmetric text encoder
//!
//! E5-family models are trained with `passage: ` in front of documents and
//! `query: ` in front of questions. The index was built with the passage
//! prefix, so queries must be encoded with the query prefix or ranking quality
//! silently degrades.

use std::sync::Arc;

use super::backend::EmbeddingBackend;
use super::discovery::resolve_cache_dir;
use super::hashing::HashingBackend;
use super::onnx::{FastEmbedBackend, FastEmbedConfig};
use crate::config::{BackendKind, EncoderConfig};
use crate::error::{RetrievalError, Result};

/// Marker prepended to every document before encoding
pub const PASSAGE_PREFIX: &str = "passage: ";

/// Marker prepended to every query before encoding
pub const QUERY_PREFIX: &str = "query: ";

/// Text encoder applying the passage/query convention over a backend
///
/// Cheap to clone; the backend is shared.
#[derive(Clone)]
pub struct TextEncoder {
    backend: Arc<dyn EmbeddingBackend>,
}

impl TextEncoder {
    /// Wrap an already-loaded backend
    pub fn new(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self { backend }
    }

    /// Load the backend described by `config`
    pub fn from_config(config: &EncoderConfig) -> Result<Self> {
        let backend: Arc<dyn EmbeddingBackend> = match config.backend {
            BackendKind::FastEmbed => {
                let cache_dir = resolve_cache_dir(config.cache_dir.as_deref());
                let mut fe_config = FastEmbedConfig::new(&config.model, cache_dir);
                fe_config.max_length = config.max_length;
                if let Some(batch_size) = config.batch_size {
                    fe_config.batch_size = batch_size;
                }
                Arc::new(FastEmbedBackend::load(fe_config)?)
            }
            BackendKind::Hashing => Arc::new(HashingBackend::new(
                config.hashing_dimension,
                config.max_length,
            )?),
        };

        log::info!(
            "TextEncoder ready ({}, {}d)",
            backend.model_id(),
            backend.dimension()
        );

        Ok(Self::new(backend))
    }

    /// Embed documents with the passage prefix
    pub fn embed_documents<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Vec<f32>>> {
        self.encode_prefixed(PASSAGE_PREFIX, texts)
    }

    /// Embed a query with the query prefix
    pub fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.encode_prefixed(QUERY_PREFIX, &[text])?;
        vectors
            .pop()
            .ok_or_else(|| RetrievalError::encoding("backend returned no vector for query"))
    }

    fn encode_prefixed<S: AsRef<str>>(&self, prefix: &str, texts: &[S]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut prepared = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            let text = text.as_ref();
            if text.trim().is_empty() {
                return Err(RetrievalError::encoding(format!(
                    "input {} is empty",
                    i
                )));
            }
            prepared.push(format!("{}{}", prefix, text));
        }

        let vectors = self.backend.encode(&prepared)?;
        if vectors.len() != prepared.len() {
            return Err(RetrievalError::encoding(format!(
                "backend returned {} vectors for {} inputs",
                vectors.len(),
                prepared.len()
            )));
        }

        let dimension = self.dimension();
        for vector in &vectors {
            if vector.len() != dimension {
                return Err(RetrievalError::encoding(format!(
                    "backend returned a {}d vector, expected {}d",
                    vector.len(),
                    dimension
                )));
            }
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(RetrievalError::encoding(
                    "backend returned non-finite values",
                ));
            }
        }

        Ok(vectors)
    }

    /// Get embedding dimension
    pub fn dimension(&self) -> usize {
        self.backend.dimension()
    }

    /// Identifier of the underlying model
    pub fn model_id(&self) -> &str {
        self.backend.model_id()
    }

    /// Prefix documents must have been embedded with
    pub fn document_prefix(&self) -> &'static str {
        PASSAGE_PREFIX
    }
}

impl std::fmt::Debug for TextEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextEncoder")
            .field("model_id", &self.model_id())
            .field("dimension", &self.dimension())
            .finish()
    }
}
