//! Dense embedding vectors.

use serde::{Deserialize, Serialize};

/// A dense weight vector over one vocabulary.
///
/// Vectors produced by the vectorizer are either L2-normalized or all
/// zero. Two vectors are only comparable when they come from the same
/// vocabulary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingVector(Vec<f64>);

impl EmbeddingVector {
    pub fn new(data: Vec<f64>) -> Self {
        EmbeddingVector(data)
    }

    /// An all-zero vector of the given dimension.
    pub fn zeros(dimension: usize) -> Self {
        EmbeddingVector(vec![0.0; dimension])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.0.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|x| *x == 0.0)
    }

    /// Number of non-zero components.
    pub fn nnz(&self) -> usize {
        self.0.iter().filter(|x| **x != 0.0).count()
    }

    /// Scale to unit length. A zero vector is left unchanged.
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for value in &mut self.0 {
                *value /= norm;
            }
        }
    }
}

impl From<Vec<f64>> for EmbeddingVector {
    fn from(data: Vec<f64>) -> Self {
        EmbeddingVector(data)
    }
}
