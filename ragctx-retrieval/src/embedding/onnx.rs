//! fastembed (ONNX Runtime) embedding backend
//!
//! Runs multilingual E5 models locally. Model files are fetched into the
//! cache directory on first load; after that no network access happens.

use ::fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;
use std::path::PathBuf;

use super::backend::EmbeddingBackend;
use super::discovery::has_cached_model;
use crate::error::{RetrievalError, Result};

/// Models this backend can load, by HuggingFace identifier
const SUPPORTED_MODELS: &[(&str, EmbeddingModel)] = &[
    ("intfloat/multilingual-e5-small", EmbeddingModel::MultilingualE5Small),
    ("intfloat/multilingual-e5-base", EmbeddingModel::MultilingualE5Base),
    ("intfloat/multilingual-e5-large", EmbeddingModel::MultilingualE5Large),
];

/// fastembed backend configuration
#[derive(Debug, Clone)]
pub struct FastEmbedConfig {
    /// HuggingFace model identifier
    pub model_id: String,
    /// Directory model files are cached in
    pub cache_dir: PathBuf,
    /// Maximum sequence length (default: 512)
    pub max_length: usize,
    /// Batch size for encoding (default: 256)
    pub batch_size: usize,
}

impl FastEmbedConfig {
    pub fn new(model_id: impl Into<String>, cache_dir: PathBuf) -> Self {
        Self {
            model_id: model_id.into(),
            cache_dir,
            max_length: crate::config::DEFAULT_MAX_LENGTH,
            batch_size: 256,
        }
    }
}

/// Resolve a model identifier, accepting the bare name without the `intfloat/` org
pub fn resolve_model(model_id: &str) -> Result<(&'static str, EmbeddingModel)> {
    SUPPORTED_MODELS
        .iter()
        .find(|(id, _)| {
            *id == model_id || id.rsplit('/').next() == Some(model_id)
        })
        .map(|(id, model)| (*id, model.clone()))
        .ok_or_else(|| {
            let known: Vec<&str> = SUPPORTED_MODELS.iter().map(|(id, _)| *id).collect();
            RetrievalError::model(format!(
                "Unsupported embedding model '{}'. Supported: {}",
                model_id,
                known.join(", ")
            ))
        })
}

/// fastembed text embedding wrapper
pub struct FastEmbedBackend {
    model: Mutex<TextEmbedding>,
    model_id: String,
    config: FastEmbedConfig,
    dimension: usize,
}

impl FastEmbedBackend {
    /// Load the configured model, downloading it into the cache if needed
    pub fn load(config: FastEmbedConfig) -> Result<Self> {
        let (model_id, model) = resolve_model(&config.model_id)?;

        std::fs::create_dir_all(&config.cache_dir).map_err(|e| {
            RetrievalError::model(format!(
                "Failed to create model cache {}: {}",
                config.cache_dir.display(),
                e
            ))
        })?;

        if has_cached_model(&config.cache_dir, model_id) {
            log::info!("Loading {} from {}", model_id, config.cache_dir.display());
        } else {
            log::warn!(
                "{} not cached in {}, downloading before serving",
                model_id,
                config.cache_dir.display()
            );
        }

        let options = InitOptions::new(model)
            .with_cache_dir(config.cache_dir.clone())
            .with_max_length(config.max_length)
            .with_show_download_progress(false);

        #[allow(unused_mut)]
        let mut embedding = TextEmbedding::try_new(options)
            .map_err(|e: anyhow::Error| {
                RetrievalError::model(format!("Failed to load {}: {:#}", model_id, e))
            })?;

        // Get dimension by encoding a probe string
        let probe = embedding
            .embed(vec!["query: dimension probe"], None)
            .map_err(|e: anyhow::Error| {
                RetrievalError::model(format!("Failed to encode probe: {:#}", e))
            })?;
        let dimension = probe.first().map(Vec::len).unwrap_or(0);
        if dimension == 0 {
            return Err(RetrievalError::model(format!(
                "{} produced an empty probe embedding",
                model_id
            )));
        }

        log::info!(
            "Loaded {} ({}d, max {} tokens)",
            model_id,
            dimension,
            config.max_length
        );

        Ok(Self {
            model: Mutex::new(embedding),
            model_id: model_id.to_string(),
            config,
            dimension,
        })
    }

    /// Get configuration
    pub fn config(&self) -> &FastEmbedConfig {
        &self.config
    }
}

impl EmbeddingBackend for FastEmbedBackend {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn max_length(&self) -> usize {
        self.config.max_length
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        #[allow(unused_mut)]
        let mut model = self.model.lock();
        model
            .embed(texts.to_vec(), Some(self.config.batch_size))
            .map_err(|e: anyhow::Error| {
                RetrievalError::encoding(format!("Failed to encode texts: {:#}", e))
            })
    }
}
