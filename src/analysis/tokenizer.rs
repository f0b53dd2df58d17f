//! Tokenizers used by the vocabulary builder and the vectorizer.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::analysis::stop::StopWords;

/// Every character that is neither ASCII alphanumeric nor whitespace.
static NON_WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9\s]").expect("Non-word pattern should be valid")
});

/// Trait for tokenizers that convert document text into terms.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text. Must be deterministic.
    fn tokenize(&self, text: &str) -> Vec<String>;

    /// Get the name of this tokenizer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

/// The default product-text tokenizer.
///
/// Replaces every character outside `[A-Za-z0-9]` and whitespace with a
/// space, splits on whitespace runs, then drops terms of two characters or
/// fewer and stop words. No case folding or stemming is applied; documents
/// are lowercased by the feature extractor before they get here.
///
/// # Examples
///
/// ```
/// use curio::analysis::tokenizer::{StandardTokenizer, Tokenizer};
///
/// let tokenizer = StandardTokenizer::new();
/// let terms = tokenizer.tokenize("the red-shoes are on sale");
/// assert_eq!(terms, vec!["red", "shoes", "sale"]);
/// ```
#[derive(Clone, Debug)]
pub struct StandardTokenizer {
    stop_words: Arc<StopWords>,
    min_length: usize,
}

impl StandardTokenizer {
    /// Create a tokenizer with the default English stop words.
    pub fn new() -> Self {
        Self::with_stop_words(StopWords::english())
    }

    /// Create a tokenizer with a custom stop word list.
    pub fn with_stop_words(stop_words: StopWords) -> Self {
        StandardTokenizer {
            stop_words: Arc::new(stop_words),
            min_length: 3,
        }
    }

    /// Minimum number of characters a term needs to be kept.
    pub fn min_length(&self) -> usize {
        self.min_length
    }
}

impl Default for StandardTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for StandardTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let cleaned = NON_WORD_PATTERN.replace_all(text, " ");

        cleaned
            .split_whitespace()
            .filter(|term| term.chars().count() >= self.min_length)
            .filter(|term| !self.stop_words.contains(term))
            .map(str::to_owned)
            .collect()
    }

    fn name(&self) -> &'static str {
        "standard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_punctuation_becomes_separator() {
        let tokenizer = StandardTokenizer::new();
        let terms = tokenizer.tokenize("wireless,bluetooth/headphones (v2.0) budget_friendly");
        assert_eq!(
            terms,
            vec!["wireless", "bluetooth", "headphones", "budget", "friendly"]
        );
    }

    #[test]
    fn test_short_terms_and_stop_words_dropped() {
        let tokenizer = StandardTokenizer::new();
        let terms = tokenizer.tokenize("a tv for the kitchen with an oven");
        assert_eq!(terms, vec!["kitchen", "oven"]);
    }

    #[test]
    fn test_repetition_is_preserved() {
        let tokenizer = StandardTokenizer::new();
        let terms = tokenizer.tokenize("laptop laptop  laptop\tbag");
        assert_eq!(terms, vec!["laptop", "laptop", "laptop", "bag"]);
    }

    #[test]
    fn test_custom_stop_words() {
        let tokenizer = StandardTokenizer::with_stop_words(StopWords::none());
        assert_eq!(tokenizer.tokenize("the kitchen"), vec!["the", "kitchen"]);
        assert_eq!(tokenizer.name(), "standard");
    }

    #[test]
    fn test_empty_input() {
        let tokenizer = StandardTokenizer::new();
        assert!(tokenizer.tokenize("").is_empty());
        assert!(tokenizer.tokenize("!!! -- ??").is_empty());
    }
}
