//! Embedding module
//!
//! Backends produce raw vectors; [`TextEncoder`] layers the E5
//! passage/query convention on top.

mod backend;
mod discovery;
mod encoder;
mod hashing;
mod onnx;

pub use backend::EmbeddingBackend;
pub use discovery::{has_cached_model, resolve_cache_dir};
pub use encoder::{TextEncoder, PASSAGE_PREFIX, QUERY_PREFIX};
pub use hashing::HashingBackend;
pub use onnx::{resolve_model, FastEmbedBackend, FastEmbedConfig};
