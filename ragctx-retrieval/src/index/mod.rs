//! Vector index
//!
//! Persisted snapshot format, similarity metrics and the read-only
//! [`PassageIndex`] searched at query time.

mod metric;
mod passage;
mod snapshot;
mod store;

pub use metric::{cosine_similarity, Metric};
pub use passage::{Passage, ScoredPassage};
pub use snapshot::{
    IndexManifest, IndexSnapshot, StoredPassage, FORMAT_VERSION, MANIFEST_FILE, PASSAGES_FILE,
};
pub use store::{IndexExpectation, PassageIndex};
