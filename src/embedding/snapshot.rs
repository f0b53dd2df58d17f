//! Immutable embedding snapshots.
//!
//! A snapshot bundles the vocabulary, the IDF table and one vector per
//! product for a single corpus version. Once built it is never mutated,
//! so it is shared between concurrent readers behind an `Arc`.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rayon::prelude::*;

use crate::analysis::feature::FeatureExtractor;
use crate::analysis::tokenizer::{StandardTokenizer, Tokenizer};
use crate::catalog::{Product, ProductId};
use crate::config::EmbeddingConfig;
use crate::embedding::idf::IdfTable;
use crate::embedding::tfidf::TfIdfVectorizer;
use crate::embedding::vector::EmbeddingVector;
use crate::embedding::vocabulary::{Vocabulary, VocabularyBuilder};
use crate::error::Result;

/// Vocabulary, IDF weights and product vectors of one corpus version.
#[derive(Debug, Clone)]
pub struct EmbeddingSnapshot {
    vocabulary: Arc<Vocabulary>,
    idf: Arc<IdfTable>,
    vectors: BTreeMap<ProductId, EmbeddingVector>,
    corpus_version: u64,
    built_at: DateTime<Utc>,
}

impl EmbeddingSnapshot {
    /// A snapshot of an empty corpus.
    pub fn empty(corpus_version: u64, built_at: DateTime<Utc>) -> Self {
        EmbeddingSnapshot {
            vocabulary: Arc::new(Vocabulary::empty()),
            idf: Arc::new(IdfTable::default()),
            vectors: BTreeMap::new(),
            corpus_version,
            built_at,
        }
    }

    pub fn vector(&self, id: ProductId) -> Option<&EmbeddingVector> {
        self.vectors.get(&id)
    }

    pub fn contains(&self, id: ProductId) -> bool {
        self.vectors.contains_key(&id)
    }

    /// All vectors in product ID order.
    pub fn vectors(&self) -> &BTreeMap<ProductId, EmbeddingVector> {
        &self.vectors
    }

    pub fn product_ids(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.vectors.keys().copied()
    }

    /// Number of products in the corpus.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    pub fn idf(&self) -> &Arc<IdfTable> {
        &self.idf
    }

    /// Length of every vector in the snapshot.
    pub fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn corpus_version(&self) -> u64 {
        self.corpus_version
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}

/// Builds snapshots from product lists.
#[derive(Clone)]
pub struct SnapshotBuilder {
    extractor: FeatureExtractor,
    vocabulary_builder: VocabularyBuilder,
}

impl std::fmt::Debug for SnapshotBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotBuilder")
            .field("vocabulary_builder", &self.vocabulary_builder)
            .finish()
    }
}

impl SnapshotBuilder {
    /// Create a builder with the standard tokenizer.
    pub fn new(config: &EmbeddingConfig) -> Self {
        Self::with_tokenizer(Arc::new(StandardTokenizer::new()), config)
    }

    pub fn with_tokenizer(tokenizer: Arc<dyn Tokenizer>, config: &EmbeddingConfig) -> Self {
        SnapshotBuilder {
            extractor: FeatureExtractor::new(),
            vocabulary_builder: VocabularyBuilder::from_config(tokenizer, config),
        }
    }

    /// Build a snapshot from the eligible subset of `products`.
    ///
    /// Products that are not available are skipped; duplicate IDs keep
    /// their last occurrence. Document extraction, tokenization and
    /// vectorization run in parallel.
    pub fn build(
        &self,
        products: &[Product],
        corpus_version: u64,
        built_at: DateTime<Utc>,
    ) -> Result<EmbeddingSnapshot> {
        let mut eligible: BTreeMap<ProductId, &Product> = BTreeMap::new();
        for product in products.iter().filter(|product| product.is_available()) {
            eligible.insert(product.id, product);
        }

        if eligible.is_empty() {
            return Ok(EmbeddingSnapshot::empty(corpus_version, built_at));
        }

        let tokenizer = self.vocabulary_builder.tokenizer();
        let tokenized: Vec<(ProductId, Vec<String>)> = eligible
            .into_par_iter()
            .map(|(id, product)| {
                let document = self.extractor.extract(product);
                (id, tokenizer.tokenize(&document))
            })
            .collect();

        let token_lists: Vec<&[String]> = tokenized
            .iter()
            .map(|(_, tokens)| tokens.as_slice())
            .collect();
        let (vocabulary, frequencies) = self.vocabulary_builder.build_from_tokens(&token_lists);
        let idf = IdfTable::compute(&vocabulary, &frequencies);

        let vectorizer =
            TfIdfVectorizer::new(Arc::new(vocabulary), Arc::new(idf), Arc::clone(tokenizer))?;

        let vectors: BTreeMap<ProductId, EmbeddingVector> = tokenized
            .par_iter()
            .map(|(id, tokens)| (*id, vectorizer.transform_tokens(tokens)))
            .collect();

        Ok(EmbeddingSnapshot {
            vocabulary: Arc::clone(vectorizer.vocabulary()),
            idf: Arc::clone(vectorizer.idf()),
            vectors,
            corpus_version,
            built_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProductStatus;

    fn products() -> Vec<Product> {
        vec![
            Product::new(1, "Red Shoes", 2000.0).with_category(1, "Footwear"),
            Product::new(2, "Blue Shoes", 2200.0).with_category(1, "Footwear"),
            Product::new(3, "Laptop", 150000.0).with_category(2, "Electronics"),
            Product::new(4, "Retired Shoes", 2100.0)
                .with_category(1, "Footwear")
                .with_status(ProductStatus::Inactive),
        ]
    }

    #[test]
    fn test_build_skips_unavailable_products() {
        let builder = SnapshotBuilder::new(&EmbeddingConfig::default());
        let snapshot = builder.build(&products(), 3, Utc::now()).unwrap();

        assert_eq!(snapshot.len(), 3);
        assert!(!snapshot.contains(ProductId(4)));
        assert_eq!(snapshot.corpus_version(), 3);
        assert_eq!(
            snapshot.product_ids().collect::<Vec<_>>(),
            vec![ProductId(1), ProductId(2), ProductId(3)]
        );
    }

    #[test]
    fn test_vectors_are_unit_or_zero() {
        let builder = SnapshotBuilder::new(&EmbeddingConfig::default());
        let snapshot = builder.build(&products(), 0, Utc::now()).unwrap();

        // Shared terms across the two shoes: shoes, footwear, affordable.
        assert_eq!(
            snapshot.vocabulary().terms().collect::<Vec<_>>(),
            vec!["affordable", "footwear", "shoes"]
        );
        for vector in snapshot.vectors().values() {
            assert_eq!(vector.len(), snapshot.dimension());
            let norm = vector.norm();
            assert!(norm == 0.0 || (norm - 1.0).abs() < 1e-9);
        }
        assert!(snapshot.vector(ProductId(3)).unwrap().is_zero());
    }

    #[test]
    fn test_empty_corpus_yields_empty_snapshot() {
        let builder = SnapshotBuilder::new(&EmbeddingConfig::default());
        let snapshot = builder.build(&[], 0, Utc::now()).unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.dimension(), 0);
    }
}
