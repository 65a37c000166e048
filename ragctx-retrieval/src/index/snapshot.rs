//! Persisted index layout
//!
//! An index directory holds two files:
//! - `manifest.json`: format version, model, dimension, metric, document prefix
//!   and passage count
//! - `passages.bin`: bincode `Vec<StoredPassage>` in insertion order

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::metric::Metric;
use super::passage::Passage;
use crate::embedding::TextEncoder;
use crate::error::{RetrievalError, Result};

/// Current on-disk format
pub const FORMAT_VERSION: u32 = 1;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const PASSAGES_FILE: &str = "passages.bin";

/// Index header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    /// Embedding model the vectors were produced with
    pub model: String,
    pub dimension: usize,
    pub metric: Metric,
    /// Prefix documents were embedded with
    pub document_prefix: String,
    pub passage_count: usize,
}

/// One passage with its vector, as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPassage {
    pub passage: Passage,
    pub vector: Vec<f32>,
}

/// In-memory form of a persisted index
#[derive(Debug, Clone)]
pub struct IndexSnapshot {
    pub manifest: IndexManifest,
    pub passages: Vec<StoredPassage>,
}

impl IndexSnapshot {
    /// Empty snapshot for vectors of `dimension` produced by `model`
    pub fn new(
        model: impl Into<String>,
        dimension: usize,
        metric: Metric,
        document_prefix: impl Into<String>,
    ) -> Self {
        Self {
            manifest: IndexManifest {
                format_version: FORMAT_VERSION,
                model: model.into(),
                dimension,
                metric,
                document_prefix: document_prefix.into(),
                passage_count: 0,
            },
            passages: Vec::new(),
        }
    }

    /// Embed `passages` with the encoder's document convention
    pub fn embed(encoder: &TextEncoder, metric: Metric, passages: Vec<Passage>) -> Result<Self> {
        let mut snapshot = Self::new(
            encoder.model_id(),
            encoder.dimension(),
            metric,
            encoder.document_prefix(),
        );
        let texts: Vec<&str> = passages.iter().map(|p| p.text.as_str()).collect();
        let vectors = encoder.embed_documents(&texts)?;
        for (passage, vector) in passages.into_iter().zip(vectors) {
            snapshot.push(passage, vector)?;
        }
        Ok(snapshot)
    }

    /// Append a passage; insertion order is the tie-break order at search time
    pub fn push(&mut self, passage: Passage, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.manifest.dimension {
            return Err(RetrievalError::validation(format!(
                "vector has {} dimensions, index expects {}",
                vector.len(),
                self.manifest.dimension
            )));
        }
        self.passages.push(StoredPassage { passage, vector });
        self.manifest.passage_count = self.passages.len();
        Ok(())
    }

    /// Write `manifest.json` and `passages.bin` into `dir`
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        self.check().map_err(RetrievalError::validation)?;

        std::fs::create_dir_all(dir)?;
        std::fs::write(
            dir.join(PASSAGES_FILE),
            bincode::serialize(&self.passages)?,
        )?;
        // Manifest last: a directory with a manifest is a complete index
        std::fs::write(
            dir.join(MANIFEST_FILE),
            serde_json::to_vec_pretty(&self.manifest)?,
        )?;

        log::info!(
            "Wrote index with {} passages to {}",
            self.passages.len(),
            dir.display()
        );
        Ok(())
    }

    /// Read just the manifest
    pub fn read_manifest(dir: impl AsRef<Path>) -> Result<IndexManifest> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(RetrievalError::index_load(dir, "index directory not found"));
        }

        let manifest_path = dir.join(MANIFEST_FILE);
        let bytes = std::fs::read(&manifest_path).map_err(|e| {
            RetrievalError::index_load(dir, format!("cannot read {}: {}", MANIFEST_FILE, e))
        })?;
        let manifest: IndexManifest = serde_json::from_slice(&bytes).map_err(|e| {
            RetrievalError::index_load(dir, format!("corrupted {}: {}", MANIFEST_FILE, e))
        })?;

        if manifest.format_version != FORMAT_VERSION {
            return Err(RetrievalError::index_load(
                dir,
                format!(
                    "unsupported format version {} (supported: {})",
                    manifest.format_version, FORMAT_VERSION
                ),
            ));
        }

        Ok(manifest)
    }

    /// Read and verify a full snapshot
    pub fn read_from(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let manifest = Self::read_manifest(dir)?;

        let bytes = std::fs::read(dir.join(PASSAGES_FILE)).map_err(|e| {
            RetrievalError::index_load(dir, format!("cannot read {}: {}", PASSAGES_FILE, e))
        })?;
        let passages: Vec<StoredPassage> = bincode::deserialize(&bytes).map_err(|e| {
            RetrievalError::index_load(dir, format!("corrupted {}: {}", PASSAGES_FILE, e))
        })?;

        let snapshot = Self { manifest, passages };
        snapshot
            .check()
            .map_err(|reason| RetrievalError::index_load(dir, reason))?;
        Ok(snapshot)
    }

    /// Internal consistency between header and payload
    pub(crate) fn check(&self) -> std::result::Result<(), String> {
        let manifest = &self.manifest;
        if manifest.dimension == 0 {
            return Err("manifest dimension is zero".to_string());
        }
        if manifest.passage_count != self.passages.len() {
            return Err(format!(
                "manifest lists {} passages but {} are stored",
                manifest.passage_count,
                self.passages.len()
            ));
        }
        for (i, stored) in self.passages.iter().enumerate() {
            if stored.vector.len() != manifest.dimension {
                return Err(format!(
                    "passage {} has a {}d vector, manifest says {}d",
                    i,
                    stored.vector.len(),
                    manifest.dimension
                ));
            }
            if stored.vector.iter().any(|v| !v.is_finite()) {
                return Err(format!("passage {} has non-finite vector values", i));
            }
            let norm_sq: f32 = stored.vector.iter().map(|v| v * v).sum();
            if !norm_sq.is_finite() {
                return Err(format!("passage {} has a vector norm that overflows f32", i));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> IndexSnapshot {
        let mut snapshot = IndexSnapshot::new("test-model", 3, Metric::Cosine, "passage: ");
        snapshot
            .push(
                Passage::new("ETF 是交易所交易基金").with_metadata("source", "faq.pdf"),
                vec![1.0, 0.0, 0.0],
            )
            .unwrap();
        snapshot
            .push(Passage::new("債券基金"), vec![0.0, 1.0, 0.0])
            .unwrap();
        snapshot
    }

    #[test]
    fn test_write_then_read() {
        let tmp = TempDir::new().unwrap();
        let snapshot = sample();
        snapshot.write_to(tmp.path()).unwrap();

        let loaded = IndexSnapshot::read_from(tmp.path()).unwrap();
        assert_eq!(loaded.manifest, snapshot.manifest);
        assert_eq!(loaded.passages, snapshot.passages);
        assert_eq!(
            loaded.passages[0].passage.metadata.get("source").map(String::as_str),
            Some("faq.pdf")
        );
    }

    #[test]
    fn test_push_rejects_wrong_dimension() {
        let mut snapshot = sample();
        assert!(snapshot.push(Passage::new("x"), vec![1.0, 2.0]).is_err());
        assert_eq!(snapshot.manifest.passage_count, 2);
    }

    #[test]
    fn test_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let err = IndexSnapshot::read_from(tmp.path().join("faiss_db")).unwrap_err();
        assert!(err.is_index_load());
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_missing_passages_file() {
        let tmp = TempDir::new().unwrap();
        sample().write_to(tmp.path()).unwrap();
        std::fs::remove_file(tmp.path().join(PASSAGES_FILE)).unwrap();

        let err = IndexSnapshot::read_from(tmp.path()).unwrap_err();
        assert!(err.is_index_load());
        assert!(err.to_string().contains(PASSAGES_FILE));
    }

    #[test]
    fn test_corrupted_payload() {
        let tmp = TempDir::new().unwrap();
        sample().write_to(tmp.path()).unwrap();
        std::fs::write(tmp.path().join(PASSAGES_FILE), b"\x01\x02garbage").unwrap();

        let err = IndexSnapshot::read_from(tmp.path()).unwrap_err();
        assert!(err.is_index_load());
        assert!(err.to_string().contains("corrupted"));
    }

    #[test]
    fn test_corrupted_manifest() {
        let tmp = TempDir::new().unwrap();
        sample().write_to(tmp.path()).unwrap();
        std::fs::write(tmp.path().join(MANIFEST_FILE), b"{ not json").unwrap();

        let err = IndexSnapshot::read_manifest(tmp.path()).unwrap_err();
        assert!(err.is_index_load());
    }

    #[test]
    fn test_count_mismatch_is_detected() {
        let tmp = TempDir::new().unwrap();
        let mut snapshot = sample();
        snapshot.write_to(tmp.path()).unwrap();

        snapshot.manifest.passage_count = 5;
        std::fs::write(
            tmp.path().join(MANIFEST_FILE),
            serde_json::to_vec(&snapshot.manifest).unwrap(),
        )
        .unwrap();

        let err = IndexSnapshot::read_from(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("lists 5 passages"));
    }

    #[test]
    fn test_unsupported_version() {
        let tmp = TempDir::new().unwrap();
        let mut snapshot = sample();
        snapshot.write_to(tmp.path()).unwrap();

        snapshot.manifest.format_version = 9;
        std::fs::write(
            tmp.path().join(MANIFEST_FILE),
            serde_json::to_vec(&snapshot.manifest).unwrap(),
        )
        .unwrap();

        let err = IndexSnapshot::read_manifest(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported format version 9"));
    }

    #[test]
    fn test_non_finite_vectors_are_rejected() {
        let mut snapshot = sample();
        snapshot.passages[1].vector[2] = f32::NAN;
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            snapshot.write_to(tmp.path()),
            Err(RetrievalError::Validation(_))
        ));
    }

    #[test]
    fn test_overflowing_norm_is_rejected_on_read() {
        let tmp = TempDir::new().unwrap();
        sample().write_to(tmp.path()).unwrap();

        // Rewrite the payload with a vector whose components are finite but whose norm is not
        let mut passages = sample().passages;
        passages[0].vector = vec![3e38, 3e38, 0.0];
        std::fs::write(
            tmp.path().join(PASSAGES_FILE),
            bincode::serialize(&passages).unwrap(),
        )
        .unwrap();

        let err = IndexSnapshot::read_from(tmp.path()).unwrap_err();
        assert!(err.is_index_load());
        assert!(err.to_string().contains("overflows"));
    }
}
