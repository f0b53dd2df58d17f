//! Hybrid product recommendations.
//!
//! A request is served in two tiers. The rule-based tier fills a share of
//! the limit from catalog queries ([`RuleStrategy`]), sampling randomly
//! among the matches. The similarity tier fills the rest from the
//! embedding snapshot. The tiers are concatenated, never interleaved,
//! through a [`CandidateList`] that keeps the selection duplicate-free.

pub mod candidates;
pub mod recommender;
pub mod stats;
pub mod strategy;

pub use candidates::CandidateList;
pub use recommender::HybridRecommender;
pub use stats::RecommenderStats;
pub use strategy::{Phase, RuleStrategy, Signals};
