//! Vocabulary building with document-frequency filtering.
//!
//! A term is retained when it appears in at least `min_document_frequency`
//! documents and in at most `max_document_ratio` of all documents. The
//! lower bound removes one-off noise, the upper bound removes terms too
//! common to discriminate between products.

use std::collections::HashSet;
use std::sync::Arc;

use ahash::AHashMap;

use crate::analysis::tokenizer::Tokenizer;
use crate::config::EmbeddingConfig;

/// Number of documents containing each term at least once.
#[derive(Debug, Clone, Default)]
pub struct DocumentFrequencies {
    counts: AHashMap<String, usize>,
    total_documents: usize,
}

impl DocumentFrequencies {
    /// Count document frequencies over tokenized documents.
    pub fn from_tokenized<D: AsRef<[String]>>(documents: &[D]) -> Self {
        let mut counts: AHashMap<String, usize> = AHashMap::new();

        for tokens in documents {
            let unique: HashSet<&String> = tokens.as_ref().iter().collect();
            for term in unique {
                *counts.entry(term.clone()).or_insert(0) += 1;
            }
        }

        DocumentFrequencies {
            counts,
            total_documents: documents.len(),
        }
    }

    pub fn get(&self, term: &str) -> Option<usize> {
        self.counts.get(term).copied()
    }

    pub fn total_documents(&self) -> usize {
        self.total_documents
    }

    /// Number of distinct terms seen.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Term to index mapping for one corpus snapshot.
///
/// Indices are `0..len()` in lexicographic term order. An index is only
/// meaningful for the vocabulary that produced it.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    term_to_index: AHashMap<String, usize>,
    index_to_term: Vec<String>,
    total_documents: usize,
}

impl Vocabulary {
    /// An empty vocabulary.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a vocabulary from a set of terms.
    pub fn from_terms<I>(terms: I, total_documents: usize) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut index_to_term: Vec<String> = terms.into_iter().collect();
        index_to_term.sort();
        index_to_term.dedup();

        let term_to_index = index_to_term
            .iter()
            .enumerate()
            .map(|(index, term)| (term.clone(), index))
            .collect();

        Vocabulary {
            term_to_index,
            index_to_term,
            total_documents,
        }
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.term_to_index.get(term).copied()
    }

    pub fn term(&self, index: usize) -> Option<&str> {
        self.index_to_term.get(index).map(String::as_str)
    }

    pub fn contains(&self, term: &str) -> bool {
        self.term_to_index.contains_key(term)
    }

    /// Terms in index order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.index_to_term.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.index_to_term.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_to_term.is_empty()
    }

    /// Size of the corpus this vocabulary was built from.
    pub fn total_documents(&self) -> usize {
        self.total_documents
    }
}

/// Scans a corpus and yields the retained vocabulary.
#[derive(Clone)]
pub struct VocabularyBuilder {
    tokenizer: Arc<dyn Tokenizer>,
    min_document_frequency: usize,
    max_document_ratio: f64,
}

impl std::fmt::Debug for VocabularyBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VocabularyBuilder")
            .field("tokenizer", &self.tokenizer.name())
            .field("min_document_frequency", &self.min_document_frequency)
            .field("max_document_ratio", &self.max_document_ratio)
            .finish()
    }
}

impl VocabularyBuilder {
    /// Create a builder with the default bounds (2 documents, 80% of the corpus).
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self::from_config(tokenizer, &EmbeddingConfig::default())
    }

    pub fn from_config(tokenizer: Arc<dyn Tokenizer>, config: &EmbeddingConfig) -> Self {
        VocabularyBuilder {
            tokenizer,
            min_document_frequency: config.min_document_frequency,
            max_document_ratio: config.max_document_ratio,
        }
    }

    pub fn with_min_document_frequency(mut self, min: usize) -> Self {
        self.min_document_frequency = min;
        self
    }

    pub fn with_max_document_ratio(mut self, ratio: f64) -> Self {
        self.max_document_ratio = ratio;
        self
    }

    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        &self.tokenizer
    }

    /// Tokenize raw documents and build the vocabulary.
    pub fn build(&self, documents: &[String]) -> (Vocabulary, DocumentFrequencies) {
        let tokenized: Vec<Vec<String>> = documents
            .iter()
            .map(|document| self.tokenizer.tokenize(document))
            .collect();
        self.build_from_tokens(&tokenized)
    }

    /// Build the vocabulary from already tokenized documents.
    pub fn build_from_tokens<D: AsRef<[String]>>(
        &self,
        documents: &[D],
    ) -> (Vocabulary, DocumentFrequencies) {
        let frequencies = DocumentFrequencies::from_tokenized(documents);
        let total = frequencies.total_documents();

        let retained = frequencies
            .counts
            .iter()
            .filter(|(_, df)| self.retains(**df, total))
            .map(|(term, _)| term.clone());

        let vocabulary = Vocabulary::from_terms(retained, total);
        (vocabulary, frequencies)
    }

    /// Whether a term with document frequency `df` survives in a corpus of `total`.
    pub fn retains(&self, df: usize, total: usize) -> bool {
        df >= self.min_document_frequency && df as f64 <= self.max_document_ratio * total as f64
    }
}
