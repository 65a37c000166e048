//! Similarity metrics
//!
//! Scores are always "higher is more similar" so ranking code never needs to
//! know which metric an index was built with.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Similarity metric declared in the index manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Cosine similarity; zero-norm vectors score 0.0
    Cosine,
    /// Negative Euclidean distance
    L2,
    /// Inner product
    Dot,
}

impl Metric {
    /// Similarity score between two equal-length vectors
    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Cosine => cosine_similarity(a, b),
            Self::L2 => -euclidean_distance(a, b),
            Self::Dot => dot(a, b),
        }
    }

    /// Distance used to build the HNSW graph (lower is closer)
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            // Cosine distance = 1 - similarity (HNSW finds minimum)
            Self::Cosine => 1.0 - cosine_similarity(a, b),
            Self::L2 => euclidean_distance(a, b),
            Self::Dot => -dot(a, b),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cosine => write!(f, "cosine"),
            Self::L2 => write!(f, "l2"),
            Self::Dot => write!(f, "dot"),
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Calculate cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot = dot(a, b);
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_zero_norm() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_l2_score_is_negative_distance() {
        let score = Metric::L2.score(&[0.0, 0.0], &[3.0, 4.0]);
        assert!((score + 5.0).abs() < 1e-6);
        assert!((Metric::L2.distance(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_ignores_magnitude_but_dot_does_not() {
        let q = [1.0, 0.0];
        let small = [1.0, 0.0];
        let large = [10.0, 0.0];
        assert_eq!(Metric::Cosine.score(&q, &small), Metric::Cosine.score(&q, &large));
        assert!(Metric::Dot.score(&q, &large) > Metric::Dot.score(&q, &small));
    }

    #[test]
    fn test_metric_serde_names() {
        assert_eq!(serde_json::to_string(&Metric::Cosine).unwrap(), "\"cosine\"");
        assert_eq!(serde_json::to_string(&Metric::L2).unwrap(), "\"l2\"");
        let parsed: Metric = serde_json::from_str("\"dot\"").unwrap();
        assert_eq!(parsed, Metric::Dot);
        assert!(serde_json::from_str::<Metric>("\"manhattan\"").is_err());
    }
}
