//! Passage types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A stored chunk of source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Raw text returned to callers
    pub text: String,
    /// Source metadata (file, page, ...), carried through but never ranked on
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Passage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Search hit with its similarity score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPassage {
    pub passage: Passage,
    /// Higher is more similar, under the index metric
    pub score: f32,
    /// Zero-based position in the result list
    pub rank: usize,
}
