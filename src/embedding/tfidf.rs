//! TF-IDF vectorizer for product documents.

use std::sync::Arc;

use crate::analysis::tokenizer::Tokenizer;
use crate::embedding::idf::IdfTable;
use crate::embedding::vector::EmbeddingVector;
use crate::embedding::vocabulary::{Vocabulary, VocabularyBuilder};
use crate::error::{RecommendError, Result};

/// Converts documents into L2-normalized TF-IDF vectors over a fixed vocabulary.
pub struct TfIdfVectorizer {
    /// Vocabulary: term -> index mapping.
    vocabulary: Arc<Vocabulary>,
    /// Inverse document frequency for each vocabulary index.
    idf: Arc<IdfTable>,
    /// Tokenizer shared with the vocabulary builder.
    tokenizer: Arc<dyn Tokenizer>,
}

impl std::fmt::Debug for TfIdfVectorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TfIdfVectorizer")
            .field("vocabulary_size", &self.vocabulary.len())
            .field("n_documents", &self.vocabulary.total_documents())
            .field("tokenizer", &self.tokenizer.name())
            .finish()
    }
}

impl TfIdfVectorizer {
    /// Create a vectorizer from a vocabulary and its IDF table.
    pub fn new(
        vocabulary: Arc<Vocabulary>,
        idf: Arc<IdfTable>,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Result<Self> {
        if vocabulary.len() != idf.len() {
            return Err(RecommendError::embedding(format!(
                "IDF table has {} weights for a vocabulary of {} terms",
                idf.len(),
                vocabulary.len()
            )));
        }

        Ok(TfIdfVectorizer {
            vocabulary,
            idf,
            tokenizer,
        })
    }

    /// Fit a vectorizer on a corpus of documents.
    pub fn fit(documents: &[String], builder: &VocabularyBuilder) -> Result<Self> {
        let (vocabulary, frequencies) = builder.build(documents);
        let idf = IdfTable::compute(&vocabulary, &frequencies);
        Self::new(
            Arc::new(vocabulary),
            Arc::new(idf),
            Arc::clone(builder.tokenizer()),
        )
    }

    /// Transform a document into a TF-IDF vector.
    pub fn transform(&self, document: &str) -> EmbeddingVector {
        let tokens = self.tokenizer.tokenize(document);
        self.transform_tokens(&tokens)
    }

    /// Transform an already tokenized document.
    ///
    /// Weight = raw count within the document × idf; the result is scaled
    /// to unit length unless no vocabulary term occurs.
    pub fn transform_tokens(&self, tokens: &[String]) -> EmbeddingVector {
        let mut weights = vec![0.0; self.vocabulary.len()];

        // Count term frequencies
        for token in tokens {
            if let Some(index) = self.vocabulary.index_of(token) {
                weights[index] += 1.0;
            }
        }

        // Apply IDF
        for (index, weight) in weights.iter_mut().enumerate() {
            if *weight > 0.0 {
                *weight *= self.idf.weight(index).unwrap_or(0.0);
            }
        }

        let mut vector = EmbeddingVector::new(weights);
        vector.normalize();
        vector
    }

    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    pub fn idf(&self) -> &Arc<IdfTable> {
        &self.idf
    }

    /// Length of every vector this vectorizer produces.
    pub fn dimension(&self) -> usize {
        self.vocabulary.len()
    }
}
