//! TF-IDF embeddings of catalog products.
//!
//! The pipeline runs leaf-first:
//!
//! 1. [`FeatureExtractor`](crate::analysis::FeatureExtractor) turns each
//!    product into a weighted document
//! 2. [`VocabularyBuilder`] keeps terms within the document-frequency bounds
//! 3. [`IdfTable`] weights each retained term by `ln(N / df)`
//! 4. [`TfIdfVectorizer`] produces one unit-length vector per document
//! 5. [`SnapshotBuilder`] bundles the result into an immutable
//!    [`EmbeddingSnapshot`], which [`EmbeddingCache`] memoizes

pub mod cache;
pub mod idf;
pub mod snapshot;
pub mod tfidf;
pub mod vector;
pub mod vocabulary;

pub use cache::{EmbeddingCache, SnapshotFreshness};
pub use idf::IdfTable;
pub use snapshot::{EmbeddingSnapshot, SnapshotBuilder};
pub use tfidf::TfIdfVectorizer;
pub use vector::EmbeddingVector;
pub use vocabulary::{DocumentFrequencies, Vocabulary, VocabularyBuilder};
