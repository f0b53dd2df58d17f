//! Recommender statistics.

use serde::{Deserialize, Serialize};

use crate::embedding::cache::SnapshotFreshness;

/// Point-in-time view of the recommender's caches and embedding corpus.
///
/// Collecting statistics never builds a snapshot: when none is published
/// the corpus figures are zero and `snapshot` is `None`.
///
/// # Examples
///
/// ```
/// use curio::recommend::RecommenderStats;
///
/// let stats = RecommenderStats::default();
/// assert_eq!(stats.corpus_size, 0);
/// assert!(stats.snapshot.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommenderStats {
    /// Number of products in the published snapshot.
    pub corpus_size: usize,
    /// Number of retained vocabulary terms.
    pub vocabulary_size: usize,
    /// Length of every product vector.
    pub vector_dimensions: usize,
    /// Timing of the published snapshot.
    pub snapshot: Option<SnapshotFreshness>,
    /// Fresh cached related-product results.
    pub related_entries: usize,
    /// Fresh cached personalized results.
    pub personalized_entries: usize,
    /// Fresh cached trending results.
    pub trending_entries: usize,
    /// Users with an unexpired view history.
    pub tracked_users: usize,
}
