//! Configuration for the recommendation engine.
//!
//! Every tunable constant of the engine lives here: vocabulary filters,
//! similarity threshold, quota ratios, price windows, recency weighting
//! and cache lifetimes. All sections implement `Default` with the
//! production values, and missing fields in a JSON file fall back to them.
//!
//! # Examples
//!
//! ```
//! use curio::config::RecommenderConfig;
//!
//! let mut config = RecommenderConfig::default();
//! assert_eq!(config.related.rule_based_ratio, 0.7);
//!
//! // Widen the price window for a vertical with sparse categories
//! config.related.price_tolerance = 0.5;
//! assert!(config.validate().is_ok());
//! ```

use std::fs;
use std::path::Path;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::{RecommendError, Result};

/// Convert a number of seconds into a chrono duration, saturating.
pub(crate) fn seconds(secs: u64) -> TimeDelta {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// Vocabulary, similarity and snapshot settings.
    pub embedding: EmbeddingConfig,
    /// Product-to-product recommendation settings.
    pub related: RelatedConfig,
    /// Per-user recommendation settings.
    pub personalized: PersonalizedConfig,
    /// View history settings.
    pub history: HistoryConfig,
    /// Lifetime of cached trending results, in seconds.
    pub trending_cache_ttl_secs: u64,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            embedding: EmbeddingConfig::default(),
            related: RelatedConfig::default(),
            personalized: PersonalizedConfig::default(),
            history: HistoryConfig::default(),
            trending_cache_ttl_secs: 60 * 60,
        }
    }
}

impl RecommenderConfig {
    /// Parse and validate a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: RecommenderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn trending_cache_ttl(&self) -> TimeDelta {
        seconds(self.trending_cache_ttl_secs)
    }

    /// Check that every ratio and count is within its meaningful range.
    pub fn validate(&self) -> Result<()> {
        let embedding = &self.embedding;
        if embedding.min_document_frequency == 0 {
            return Err(RecommendError::config(
                "embedding.min_document_frequency must be at least 1",
            ));
        }
        check_unit_ratio("embedding.max_document_ratio", embedding.max_document_ratio)?;
        if !(-1.0..1.0).contains(&embedding.similarity_threshold) {
            return Err(RecommendError::config(
                "embedding.similarity_threshold must be in [-1, 1)",
            ));
        }

        check_unit_ratio("related.rule_based_ratio", self.related.rule_based_ratio)?;
        check_tolerance("related.price_tolerance", self.related.price_tolerance)?;
        check_multiplier(
            "related.candidate_multiplier",
            self.related.candidate_multiplier,
        )?;

        let personalized = &self.personalized;
        check_unit_ratio(
            "personalized.rule_based_ratio",
            personalized.rule_based_ratio,
        )?;
        check_tolerance(
            "personalized.price_tolerance",
            personalized.price_tolerance,
        )?;
        check_unit_ratio("personalized.category_share", personalized.category_share)?;
        check_unit_ratio("personalized.price_share", personalized.price_share)?;
        check_unit_ratio("personalized.recency_decay", personalized.recency_decay)?;
        check_multiplier(
            "personalized.candidate_multiplier",
            personalized.candidate_multiplier,
        )?;
        if personalized.recent_views == 0 {
            return Err(RecommendError::config(
                "personalized.recent_views must be at least 1",
            ));
        }

        if self.history.max_entries == 0 {
            return Err(RecommendError::config(
                "history.max_entries must be at least 1",
            ));
        }

        Ok(())
    }
}

fn check_unit_ratio(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(RecommendError::config(format!(
            "{name} must be in [0, 1], got {value}"
        )))
    }
}

fn check_tolerance(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(RecommendError::config(format!(
            "{name} must be a non-negative number, got {value}"
        )))
    }
}

fn check_multiplier(name: &str, value: usize) -> Result<()> {
    if value == 0 {
        Err(RecommendError::config(format!("{name} must be at least 1")))
    } else {
        Ok(())
    }
}

/// Settings for the TF-IDF model and similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Terms found in fewer documents are dropped from the vocabulary.
    pub min_document_frequency: usize,
    /// Terms found in more than this share of documents are dropped.
    pub max_document_ratio: f64,
    /// Candidates scoring at or below this similarity are discarded.
    pub similarity_threshold: f64,
    /// Lifetime of a published snapshot, in seconds.
    pub snapshot_ttl_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            min_document_frequency: 2,
            max_document_ratio: 0.8,
            similarity_threshold: 0.1,
            snapshot_ttl_secs: 24 * 60 * 60,
        }
    }
}

impl EmbeddingConfig {
    pub fn snapshot_ttl(&self) -> TimeDelta {
        seconds(self.snapshot_ttl_secs)
    }
}

/// Settings for product-to-product recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelatedConfig {
    /// Share of the limit reserved for rule-based candidates (rounded up).
    pub rule_based_ratio: f64,
    /// Relative price window around the subject's price.
    pub price_tolerance: f64,
    /// How many similarity candidates to fetch per slot to fill.
    pub candidate_multiplier: usize,
    /// Lifetime of cached results, in seconds.
    pub cache_ttl_secs: u64,
}

impl Default for RelatedConfig {
    fn default() -> Self {
        Self {
            rule_based_ratio: 0.7,
            price_tolerance: 0.3,
            candidate_multiplier: 2,
            cache_ttl_secs: 60 * 60,
        }
    }
}

impl RelatedConfig {
    pub fn cache_ttl(&self) -> TimeDelta {
        seconds(self.cache_ttl_secs)
    }
}

/// Settings for per-user recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalizedConfig {
    /// Share of the limit reserved for rule-based candidates (rounded up).
    pub rule_based_ratio: f64,
    /// Relative price window around the user's average viewed price.
    pub price_tolerance: f64,
    /// Share of the rule-based target given to preferred categories.
    pub category_share: f64,
    /// Share of the rule-based target given to the price window.
    pub price_share: f64,
    /// Number of most recent views used as similarity seeds.
    pub recent_views: usize,
    /// Weight lost per step back in view recency.
    pub recency_decay: f64,
    /// How many similarity candidates to fetch per slot to fill.
    pub candidate_multiplier: usize,
    /// Lifetime of cached results, in seconds.
    pub cache_ttl_secs: u64,
}

impl Default for PersonalizedConfig {
    fn default() -> Self {
        Self {
            rule_based_ratio: 0.6,
            price_tolerance: 0.4,
            category_share: 0.5,
            price_share: 0.3,
            recent_views: 5,
            recency_decay: 0.1,
            candidate_multiplier: 2,
            cache_ttl_secs: 30 * 60,
        }
    }
}

impl PersonalizedConfig {
    pub fn cache_ttl(&self) -> TimeDelta {
        seconds(self.cache_ttl_secs)
    }
}

/// Settings for the view history store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of products remembered per user.
    pub max_entries: usize,
    /// Lifetime of a history after its last write, in seconds.
    pub ttl_secs: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: 50,
            ttl_secs: 30 * 24 * 60 * 60,
        }
    }
}

impl HistoryConfig {
    pub fn ttl(&self) -> TimeDelta {
        seconds(self.ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = RecommenderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.embedding.min_document_frequency, 2);
        assert_eq!(config.embedding.similarity_threshold, 0.1);
        assert_eq!(config.embedding.snapshot_ttl(), TimeDelta::hours(24));
        assert_eq!(config.related.cache_ttl(), TimeDelta::hours(1));
        assert_eq!(config.personalized.cache_ttl(), TimeDelta::minutes(30));
        assert_eq!(config.history.max_entries, 50);
        assert_eq!(config.history.ttl(), TimeDelta::days(30));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = RecommenderConfig::from_json_str(
            r#"{"related": {"price_tolerance": 0.5}, "trending_cache_ttl_secs": 60}"#,
        )
        .unwrap();
        assert_eq!(config.related.price_tolerance, 0.5);
        assert_eq!(config.related.rule_based_ratio, 0.7);
        assert_eq!(config.trending_cache_ttl_secs, 60);
        assert_eq!(config.personalized, PersonalizedConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = RecommenderConfig::default();
        config.related.rule_based_ratio = 1.5;
        assert!(config.validate().is_err());

        let mut config = RecommenderConfig::default();
        config.personalized.recent_views = 0;
        assert!(config.validate().is_err());

        let mut config = RecommenderConfig::default();
        config.embedding.min_document_frequency = 0;
        assert!(config.validate().is_err());

        assert!(RecommenderConfig::from_json_str(r#"{"history": {"max_entries": 0}}"#).is_err());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"embedding": {{"similarity_threshold": 0.2}}}}"#).unwrap();

        let config = RecommenderConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.embedding.similarity_threshold, 0.2);
    }

    #[test]
    fn test_huge_ttl_saturates() {
        assert_eq!(seconds(u64::MAX), TimeDelta::MAX);
    }
}
