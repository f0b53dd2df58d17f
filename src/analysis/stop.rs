//! English stop words.
//!
//! A fixed, enumerated list of articles, conjunctions, pronouns and common
//! prepositions. Matching is exact and not locale-sensitive. Words of two
//! characters or fewer are listed for completeness even though the
//! tokenizer already drops them by length.
//!
//! # Examples
//!
//! ```
//! use curio::analysis::stop::StopWords;
//!
//! let stop_words = StopWords::english();
//! assert!(stop_words.contains("the"));
//! assert!(!stop_words.contains("shoes"));
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

/// Default English stop words list.
const DEFAULT_ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "against", "all", "also", "an", "and", "any", "are", "as",
    "at", "be", "because", "been", "before", "being", "below", "between", "both", "but", "by",
    "can", "could", "did", "does", "down", "during", "each", "for", "from", "further", "had",
    "has", "have", "her", "here", "his", "how", "if", "in", "into", "is", "it", "its", "just",
    "more", "most", "no", "nor", "not", "of", "off", "on", "once", "only", "onto", "or", "other",
    "our", "out", "over", "own", "per", "same", "she", "should", "so", "some", "such", "than",
    "that", "the", "their", "them", "then", "there", "these", "they", "this", "those", "through",
    "to", "too", "under", "until", "up", "upon", "very", "via", "was", "we", "were", "what",
    "when", "where", "which", "while", "who", "whom", "why", "will", "with", "within", "without",
    "would", "you", "your",
];

/// Default English stop words as a HashSet.
pub static DEFAULT_ENGLISH_STOP_WORDS_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| DEFAULT_ENGLISH_STOP_WORDS.iter().copied().collect());

/// A set of words removed during tokenization.
#[derive(Debug, Clone)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// The default English list.
    pub fn english() -> Self {
        Self::from_words(DEFAULT_ENGLISH_STOP_WORDS.iter().copied())
    }

    /// Build a custom list.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StopWords {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// An empty list that removes nothing.
    pub fn none() -> Self {
        StopWords {
            words: HashSet::new(),
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for StopWords {
    fn default() -> Self {
        Self::english()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_list_matches_static_set() {
        let stop_words = StopWords::default();
        assert_eq!(stop_words.len(), DEFAULT_ENGLISH_STOP_WORDS_SET.len());
        for word in DEFAULT_ENGLISH_STOP_WORDS_SET.iter() {
            assert!(stop_words.contains(word));
        }
    }

    #[test]
    fn test_custom_and_empty_lists() {
        let custom = StopWords::from_words(["sale", "new"]);
        assert!(custom.contains("sale"));
        assert!(!custom.contains("the"));

        let none = StopWords::none();
        assert!(none.is_empty());
        assert!(!none.contains("the"));
    }
}
