//! Read-only passage index
//!
//! Loaded once from a snapshot directory and never mutated, so any number of
//! threads can search it without locking. Exact search scores every vector;
//! large snapshots can additionally carry an instant-distance HNSW graph whose
//! candidates are re-scored exactly before ranking.

use instant_distance::{Builder, HnswMap, Point, Search};
use std::cmp::Ordering;
use std::path::Path;

use super::metric::Metric;
use super::passage::{Passage, ScoredPassage};
use super::snapshot::{IndexManifest, IndexSnapshot};
use crate::config::{SearchConfig, SearchStrategy};
use crate::embedding::TextEncoder;
use crate::error::{RetrievalError, Result};

/// Location reported for snapshots that never touched disk
const IN_MEMORY: &str = "<in-memory snapshot>";

/// What the loaded index must agree with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexExpectation {
    pub dimension: usize,
    pub model_id: String,
    pub document_prefix: String,
}

impl IndexExpectation {
    /// Expectation matching everything `encoder` produces
    pub fn from_encoder(encoder: &TextEncoder) -> Self {
        Self {
            dimension: encoder.dimension(),
            model_id: encoder.model_id().to_string(),
            document_prefix: encoder.document_prefix().to_string(),
        }
    }
}

/// HNSW point wrapper
#[derive(Clone)]
struct IndexPoint {
    vector: Vec<f32>,
    metric: Metric,
}

impl Point for IndexPoint {
    fn distance(&self, other: &Self) -> f32 {
        self.metric.distance(&self.vector, &other.vector)
    }
}

/// HNSW graph; values are passage ordinals
struct HnswIndex {
    hnsw: HnswMap<IndexPoint, usize>,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    ordinal: usize,
    score: f32,
}

impl Candidate {
    /// NaN scores (e.g. from overflowing products) rank below every real score
    fn new(ordinal: usize, score: f32) -> Self {
        let score = if score.is_nan() { f32::NEG_INFINITY } else { score };
        Self { ordinal, score }
    }
}

/// Descending score, then ascending insertion order
fn rank_order(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.ordinal.cmp(&b.ordinal))
}

/// Keep the best `k` candidates, ranked
fn top_k(mut candidates: Vec<Candidate>, k: usize) -> Vec<Candidate> {
    if candidates.len() > k {
        candidates.select_nth_unstable_by(k - 1, rank_order);
        candidates.truncate(k);
    }
    candidates.sort_by(rank_order);
    candidates
}

/// Immutable passage index
pub struct PassageIndex {
    manifest: IndexManifest,
    passages: Vec<Passage>,
    /// Row-major, `dimension` floats per passage
    vectors: Vec<f32>,
    hnsw: Option<HnswIndex>,
}

impl PassageIndex {
    /// Load the index at `path`, checking it against the encoder before serving
    pub fn load(
        path: impl AsRef<Path>,
        expect: &IndexExpectation,
        search: &SearchConfig,
    ) -> Result<Self> {
        let path = path.as_ref();

        // Cheap header checks first so a mismatched index fails before the payload is read
        let manifest = IndexSnapshot::read_manifest(path)?;
        check_expectation(path, &manifest, expect)?;

        let snapshot = IndexSnapshot::read_from(path)?;
        let index = Self::from_snapshot(snapshot, search)?;

        log::info!(
            "Loaded index from {} ({} passages, {}d, {}, {})",
            path.display(),
            index.len(),
            index.dimension(),
            index.metric(),
            index.strategy()
        );
        if index.is_empty() {
            log::warn!("Index at {} holds no passages", path.display());
        }

        Ok(index)
    }

    /// Build from an in-memory snapshot
    ///
    /// Applies the same consistency checks as reading from disk.
    pub fn from_snapshot(snapshot: IndexSnapshot, search: &SearchConfig) -> Result<Self> {
        snapshot
            .check()
            .map_err(|reason| RetrievalError::index_load(IN_MEMORY, reason))?;

        let IndexSnapshot { manifest, passages } = snapshot;
        let mut texts = Vec::with_capacity(passages.len());
        let mut vectors = Vec::with_capacity(passages.len() * manifest.dimension);
        for stored in passages {
            vectors.extend_from_slice(&stored.vector);
            texts.push(stored.passage);
        }

        let mut index = Self {
            manifest,
            passages: texts,
            vectors,
            hnsw: None,
        };

        if search.wants_hnsw(index.len()) {
            index.hnsw = Some(index.build_hnsw(search));
        }

        Ok(index)
    }

    fn build_hnsw(&self, search: &SearchConfig) -> HnswIndex {
        let metric = self.manifest.metric;
        let points: Vec<IndexPoint> = (0..self.len())
            .map(|i| IndexPoint {
                vector: self.vector(i).to_vec(),
                metric,
            })
            .collect();
        let ordinals: Vec<usize> = (0..self.len()).collect();

        log::info!("Building HNSW graph over {} passages", points.len());
        let hnsw = Builder::default()
            .ef_construction(search.ef_construction)
            .ef_search(search.ef_search)
            .seed(search.seed)
            .build(points, ordinals);

        HnswIndex { hnsw }
    }

    fn vector(&self, ordinal: usize) -> &[f32] {
        let dimension = self.manifest.dimension;
        &self.vectors[ordinal * dimension..(ordinal + 1) * dimension]
    }

    /// Up to `k` passages ordered by descending similarity
    ///
    /// Equal scores keep insertion order.
    pub fn search(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredPassage>> {
        if k == 0 {
            return Err(RetrievalError::validation("k must be a positive integer"));
        }
        if vector.len() != self.dimension() {
            return Err(RetrievalError::search(format!(
                "query vector has {} dimensions, index has {}",
                vector.len(),
                self.dimension()
            )));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(RetrievalError::search("query vector has non-finite values"));
        }

        let candidates = match &self.hnsw {
            Some(hnsw) if k < self.len() => self
                .hnsw_candidates(hnsw, vector, k)
                .unwrap_or_else(|| self.exact_candidates(vector)),
            _ => self.exact_candidates(vector),
        };

        Ok(top_k(candidates, k)
            .into_iter()
            .enumerate()
            .map(|(rank, c)| ScoredPassage {
                passage: self.passages[c.ordinal].clone(),
                score: c.score,
                rank,
            })
            .collect())
    }

    fn exact_candidates(&self, vector: &[f32]) -> Vec<Candidate> {
        let metric = self.manifest.metric;
        (0..self.len())
            .map(|ordinal| Candidate::new(ordinal, metric.score(vector, self.vector(ordinal))))
            .collect()
    }

    /// `None` when the graph cannot supply `k` candidates
    fn hnsw_candidates(&self, hnsw: &HnswIndex, vector: &[f32], k: usize) -> Option<Vec<Candidate>> {
        let metric = self.manifest.metric;
        let query = IndexPoint {
            vector: vector.to_vec(),
            metric,
        };

        let mut search = Search::default();
        let candidates: Vec<Candidate> = hnsw
            .hnsw
            .search(&query, &mut search)
            .map(|item| {
                let ordinal = *item.value;
                Candidate::new(ordinal, metric.score(vector, self.vector(ordinal)))
            })
            .collect();

        if candidates.len() < k {
            log::debug!(
                "HNSW returned {} candidates for k={}, using exact search",
                candidates.len(),
                k
            );
            return None;
        }
        Some(candidates)
    }

    /// Number of passages
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.manifest.dimension
    }

    pub fn metric(&self) -> Metric {
        self.manifest.metric
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    /// Strategy actually in use
    pub fn strategy(&self) -> SearchStrategy {
        if self.hnsw.is_some() {
            SearchStrategy::Hnsw
        } else {
            SearchStrategy::Exact
        }
    }

    /// Get index statistics
    pub fn stats(&self) -> serde_json::Value {
        serde_json::json!({
            "passages": self.len(),
            "dimension": self.dimension(),
            "metric": self.metric(),
            "model": self.manifest.model,
            "documentPrefix": self.manifest.document_prefix,
            "strategy": self.strategy(),
            "formatVersion": self.manifest.format_version,
        })
    }
}

fn check_expectation(path: &Path, manifest: &IndexManifest, expect: &IndexExpectation) -> Result<()> {
    if manifest.dimension != expect.dimension {
        return Err(RetrievalError::DimensionMismatch {
            index: manifest.dimension,
            encoder: expect.dimension,
        });
    }
    if manifest.model != expect.model_id {
        return Err(RetrievalError::index_load(
            path,
            format!(
                "index was built with model '{}' but the encoder uses '{}'",
                manifest.model, expect.model_id
            ),
        ));
    }
    if manifest.document_prefix != expect.document_prefix {
        return Err(RetrievalError::index_load(
            path,
            format!(
                "index documents were embedded with prefix {:?}, encoder uses {:?}",
                manifest.document_prefix, expect.document_prefix
            ),
        ));
    }
    Ok(())
}
