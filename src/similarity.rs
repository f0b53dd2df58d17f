//! Cosine nearest-neighbour lookup over embedding snapshots.

use std::cmp::Ordering;
use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::catalog::ProductId;
use crate::config::EmbeddingConfig;
use crate::embedding::snapshot::EmbeddingSnapshot;

/// Default minimum similarity a neighbour must exceed.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.1;

/// Cosine similarity of two vectors.
///
/// Returns 0.0 for vectors of different lengths, empty vectors and
/// vectors with zero norm.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// A product with its similarity to the subject of a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredProduct {
    pub product_id: ProductId,
    pub score: f64,
}

impl ScoredProduct {
    pub fn new(product_id: ProductId, score: f64) -> Self {
        ScoredProduct { product_id, score }
    }

    /// Score descending, then product ID ascending.
    pub fn ranking(a: &ScoredProduct, b: &ScoredProduct) -> Ordering {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.product_id.cmp(&b.product_id))
    }
}

/// Finds the nearest neighbours of a product within a snapshot.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityEngine {
    threshold: f64,
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        SimilarityEngine::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl SimilarityEngine {
    pub fn new(threshold: f64) -> Self {
        SimilarityEngine { threshold }
    }

    pub fn from_config(config: &EmbeddingConfig) -> Self {
        SimilarityEngine::new(config.similarity_threshold)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Up to `limit` products most similar to `product_id`.
    ///
    /// Products scoring at or below the threshold are dropped. The result
    /// is empty when the product has no vector in the snapshot or when
    /// `limit` is zero.
    pub fn find_similar(
        &self,
        product_id: ProductId,
        snapshot: &EmbeddingSnapshot,
        limit: usize,
    ) -> Vec<ScoredProduct> {
        self.find_similar_excluding(product_id, snapshot, limit, &HashSet::new())
    }

    /// Like [`find_similar`](Self::find_similar), but never returns an ID
    /// in `exclude`. Exclusion happens before truncation, so excluded
    /// products do not use up the limit.
    pub fn find_similar_excluding(
        &self,
        product_id: ProductId,
        snapshot: &EmbeddingSnapshot,
        limit: usize,
        exclude: &HashSet<ProductId>,
    ) -> Vec<ScoredProduct> {
        if limit == 0 {
            return Vec::new();
        }
        let Some(subject) = snapshot.vector(product_id) else {
            return Vec::new();
        };

        let mut scored: Vec<ScoredProduct> = snapshot
            .vectors()
            .par_iter()
            .filter(|(id, _)| **id != product_id && !exclude.contains(*id))
            .filter_map(|(id, vector)| {
                let score = cosine_similarity(subject.as_slice(), vector.as_slice());
                (score > self.threshold).then(|| ScoredProduct::new(*id, score))
            })
            .collect();

        scored.sort_by(ScoredProduct::ranking);
        scored.truncate(limit);
        scored
    }
}
