//! Configuration for the retrieval core
//!
//! Plain structs with sensible defaults; the binary fills them from the
//! command line.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Embedding model used when none is configured
pub const DEFAULT_MODEL: &str = "intfloat/multilingual-e5-small";

/// Number of passages returned when the caller does not ask for a count
pub const DEFAULT_TOP_K: usize = 4;

/// Default token limit before input is truncated
pub const DEFAULT_MAX_LENGTH: usize = 512;

/// Which embedding backend the encoder wraps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// ONNX transformer model through fastembed
    #[default]
    FastEmbed,
    /// Deterministic feature hashing, no model files needed
    Hashing,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fastembed" => Ok(Self::FastEmbed),
            "hashing" | "hash" => Ok(Self::Hashing),
            other => Err(format!(
                "unknown backend '{}' (expected fastembed or hashing)",
                other
            )),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FastEmbed => write!(f, "fastembed"),
            Self::Hashing => write!(f, "hashing"),
        }
    }
}

/// Encoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Backend implementation
    pub backend: BackendKind,
    /// Model identifier (HuggingFace style, e.g. `intfloat/multilingual-e5-small`)
    pub model: String,
    /// Maximum tokens per input; longer inputs are truncated
    pub max_length: usize,
    /// Where model files live (discovered when unset)
    pub cache_dir: Option<PathBuf>,
    /// Output dimension of the hashing backend
    pub hashing_dimension: usize,
    /// Batch size handed to the backend for document encoding
    pub batch_size: Option<usize>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            model: DEFAULT_MODEL.to_string(),
            max_length: DEFAULT_MAX_LENGTH,
            cache_dir: None,
            hashing_dimension: 384,
            batch_size: None,
        }
    }
}

/// How nearest neighbors are found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    /// Score every stored vector
    Exact,
    /// Walk an HNSW graph, then re-score candidates exactly
    Hnsw,
    /// HNSW for large snapshots, exact otherwise
    #[default]
    Auto,
}

impl FromStr for SearchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exact" | "flat" => Ok(Self::Exact),
            "hnsw" => Ok(Self::Hnsw),
            "auto" => Ok(Self::Auto),
            other => Err(format!(
                "unknown search strategy '{}' (expected exact, hnsw or auto)",
                other
            )),
        }
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Hnsw => write!(f, "hnsw"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Strategy selection
    pub strategy: SearchStrategy,
    /// Passage count at which `Auto` switches to HNSW (default: 20000)
    pub hnsw_min_passages: usize,
    /// HNSW construction breadth (default: 100)
    pub ef_construction: usize,
    /// HNSW search breadth, also the candidate pool size (default: 100)
    pub ef_search: usize,
    /// Seed for graph construction so rebuilds are reproducible
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy: SearchStrategy::default(),
            hnsw_min_passages: 20_000,
            ef_construction: 100,
            ef_search: 100,
            seed: 0x5eed_cafe,
        }
    }
}

impl SearchConfig {
    /// Whether an index of `passages` entries should get an HNSW graph
    pub fn wants_hnsw(&self, passages: usize) -> bool {
        match self.strategy {
            SearchStrategy::Exact => false,
            SearchStrategy::Hnsw => passages > 0,
            SearchStrategy::Auto => passages >= self.hnsw_min_passages.max(1),
        }
    }
}

/// Top-level configuration for a retrieval service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Directory holding the persisted index
    pub index_dir: PathBuf,
    /// Passages returned when the caller gives no `k`
    pub default_top_k: usize,
    /// Encoder settings
    pub encoder: EncoderConfig,
    /// Search settings
    pub search: SearchConfig,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("vector_db"),
            default_top_k: DEFAULT_TOP_K,
            encoder: EncoderConfig::default(),
            search: SearchConfig::default(),
        }
    }
}
