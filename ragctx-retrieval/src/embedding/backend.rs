//! Embedding backend abstraction
//!
//! A backend turns already-prepared strings into vectors. It knows nothing
//! about the query/passage convention; [`super::TextEncoder`] owns that.

use crate::error::Result;

/// A loaded embedding model, shared read-only across threads
pub trait EmbeddingBackend: Send + Sync {
    /// Identifier recorded in index manifests
    fn model_id(&self) -> &str;

    /// Length of every vector this backend returns
    fn dimension(&self) -> usize;

    /// Token limit; longer inputs are truncated to this many tokens
    fn max_length(&self) -> usize;

    /// Encode a batch of texts, one vector per input, in input order
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Scale `vector` to unit length in place. Zero vectors are left untouched.
pub(crate) fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 1e-12 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}
