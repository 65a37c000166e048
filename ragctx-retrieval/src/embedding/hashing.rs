//! Feature-hashing embedding backend
//!
//! Deterministic FNV-1a signed hashing of word and CJK-character tokens into a
//! fixed number of buckets. Needs no model files, so it backs offline smoke
//! runs and tests. Similarity is lexical, not semantic.

use super::backend::{normalize, EmbeddingBackend};
use crate::error::{RetrievalError, Result};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Feature-hashing backend
#[derive(Debug, Clone)]
pub struct HashingBackend {
    model_id: String,
    dimension: usize,
    max_length: usize,
}

impl HashingBackend {
    pub fn new(dimension: usize, max_length: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(RetrievalError::model("hashing dimension must be positive"));
        }
        if max_length == 0 {
            return Err(RetrievalError::model("max_length must be positive"));
        }
        Ok(Self {
            model_id: format!("hashing-fnv1a-{}", dimension),
            dimension,
            max_length,
        })
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimension];
        for token in tokenize(text).iter().take(self.max_length) {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        normalize(&mut vector);
        vector
    }
}

impl EmbeddingBackend for HashingBackend {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn max_length(&self) -> usize {
        self.max_length
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

/// Lowercased ASCII alphanumeric runs; every other alphabetic char is its own token
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            current.push(c.to_ascii_lowercase());
            continue;
        }
        if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        if c.is_alphanumeric() {
            tokens.extend(c.to_lowercase().map(String::from));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}
