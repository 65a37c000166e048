//! ragctx retrieval core
//!
//! Embedding and similarity search for the retrieval stage of a RAG pipeline:
//! a question goes in, the most relevant stored passages come out.
//!
//! ## Features
//!
//! - **Asymmetric encoding** - E5 `query: ` / `passage: ` prefixes applied over a pluggable backend
//! - **Local models** - fastembed (ONNX Runtime) multilingual E5, no network while serving
//! - **Immutable index** - snapshot loaded once, validated against the encoder before serving
//! - **Deterministic ranking** - cosine, L2 or dot scoring, ties broken by insertion order
//! - **HNSW** - optional instant-distance graph for large snapshots
//!
//! ## Example
//!
//! ```ignore
//! use ragctx_retrieval::{RetrievalConfig, Retriever, ServiceContext};
//! use std::sync::Arc;
//!
//! let config = RetrievalConfig {
//!     index_dir: "vector_db".into(),
//!     ..Default::default()
//! };
//! let context = Arc::new(ServiceContext::load(&config)?);
//! let retriever = Retriever::new(context);
//!
//! let passages = retriever.retrieve("請問ETF是什麼？", Some(4))?;
//! ```

pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod request;
pub mod retriever;

// Re-exports for convenience
pub use config::{
    BackendKind, EncoderConfig, RetrievalConfig, SearchConfig, SearchStrategy, DEFAULT_MODEL,
    DEFAULT_TOP_K,
};
pub use embedding::{EmbeddingBackend, HashingBackend, TextEncoder};
pub use error::{ErrorClass, Result, RetrievalError};
pub use index::{IndexSnapshot, Metric, Passage, PassageIndex, ScoredPassage};
pub use request::{RetrieveOutcome, RetrieveRequest, RetrieveResponse};
pub use retriever::{Retriever, ServiceContext};
