//! The hybrid recommender.

use std::collections::HashSet;
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::cache::TtlCache;
use crate::cache::clock::{Clock, SystemClock};
use crate::catalog::{Catalog, Product, ProductId, UserId};
use crate::config::RecommenderConfig;
use crate::embedding::cache::EmbeddingCache;
use crate::embedding::snapshot::SnapshotBuilder;
use crate::error::Result;
use crate::history::ViewHistoryStore;
use crate::recommend::candidates::CandidateList;
use crate::recommend::stats::RecommenderStats;
use crate::recommend::strategy::{Phase, RuleStrategy, Signals};
use crate::similarity::{ScoredProduct, SimilarityEngine};

/// `ceil(total × share)`, bounded by `total`.
fn share_of(total: usize, share: f64) -> usize {
    // 10 × 0.3 evaluates to 3.0000000000000004
    let exact = total as f64 * share;
    ((exact - 1e-9).ceil().max(0.0) as usize).min(total)
}

/// Blends rule-based catalog heuristics with TF-IDF similarity.
///
/// Each request first fills a rule-based quota from the catalog, then
/// fills the rest with products similar to the subject. If the similarity
/// phase fails, the rest is filled with popular products instead.
/// Results are cached per subject and limit.
pub struct HybridRecommender {
    catalog: Arc<dyn Catalog>,
    config: RecommenderConfig,
    embeddings: EmbeddingCache,
    similarity: SimilarityEngine,
    history: ViewHistoryStore,
    related: TtlCache<(ProductId, usize), Vec<ProductId>>,
    personalized: TtlCache<(UserId, usize), Vec<ProductId>>,
    trending: TtlCache<usize, Vec<ProductId>>,
    rng: Mutex<StdRng>,
}

impl std::fmt::Debug for HybridRecommender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridRecommender")
            .field("config", &self.config)
            .field("embeddings", &self.embeddings)
            .field("history", &self.history)
            .field("related", &self.related)
            .field("personalized", &self.personalized)
            .field("trending", &self.trending)
            .finish()
    }
}

impl HybridRecommender {
    /// Create a recommender using the system clock and OS-seeded sampling.
    pub fn new(catalog: Arc<dyn Catalog>, config: RecommenderConfig) -> Result<Self> {
        Self::with_clock(catalog, config, Arc::new(SystemClock))
    }

    /// Create a recommender reading time from `clock`.
    pub fn with_clock(
        catalog: Arc<dyn Catalog>,
        config: RecommenderConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let embeddings = EmbeddingCache::new(
            Arc::clone(&catalog),
            SnapshotBuilder::new(&config.embedding),
            config.embedding.snapshot_ttl(),
            Arc::clone(&clock),
        );

        Ok(HybridRecommender {
            similarity: SimilarityEngine::from_config(&config.embedding),
            history: ViewHistoryStore::new(&config.history, Arc::clone(&clock)),
            related: TtlCache::new("related", config.related.cache_ttl(), Arc::clone(&clock)),
            personalized: TtlCache::new(
                "personalized",
                config.personalized.cache_ttl(),
                Arc::clone(&clock),
            ),
            trending: TtlCache::new("trending", config.trending_cache_ttl(), clock),
            rng: Mutex::new(StdRng::from_os_rng()),
            catalog,
            config,
            embeddings,
        })
    }

    /// Make rule-based sampling reproducible.
    pub fn with_seed(self, seed: u64) -> Self {
        *self.rng.lock() = StdRng::seed_from_u64(seed);
        self
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    pub fn embeddings(&self) -> &EmbeddingCache {
        &self.embeddings
    }

    pub fn history(&self) -> &ViewHistoryStore {
        &self.history
    }

    /// Products to show alongside `product_id`.
    ///
    /// Returns an empty list for an unknown product or a zero limit.
    /// Catalog failures while collecting rule-based candidates are returned
    /// as errors; failures of the similarity phase are not.
    pub fn related_products(&self, product_id: ProductId, limit: usize) -> Result<Vec<ProductId>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let key = (product_id, limit);
        if let Some(cached) = self.related.get(&key) {
            return Ok(cached);
        }

        let Some(subject) = self
            .catalog
            .find_products_by_ids(&[product_id])?
            .into_iter()
            .next()
        else {
            debug!(product = %product_id, "unknown product, no related products");
            return Ok(Vec::new());
        };

        self.related
            .get_or_try_insert_with(key, || self.compute_related(&subject, limit))
    }

    fn compute_related(&self, subject: &Product, limit: usize) -> Result<Vec<ProductId>> {
        let config = &self.config.related;
        let signals = Signals::from_product(subject);
        let phases = [
            Phase::uncapped(RuleStrategy::SameCategory),
            Phase::uncapped(RuleStrategy::PriceWindow {
                tolerance: config.price_tolerance,
            }),
            Phase::uncapped(RuleStrategy::SharedTags),
        ];

        let mut list = CandidateList::new(share_of(limit, config.rule_based_ratio))
            .excluding([subject.id]);
        self.run_phases(&signals, &phases, &mut list)?;
        let rule_count = list.len();

        list.set_quota(limit);
        let target = list.remaining();
        let similar = self.related_similar(subject.id, target, list.excluded());
        self.fill_from_similarity(&mut list, similar, "related")?;

        debug!(
            product = %subject.id,
            rule_based = rule_count,
            similarity = list.len() - rule_count,
            "related products computed"
        );
        Ok(list.into_vec())
    }

    fn related_similar(
        &self,
        subject: ProductId,
        target: usize,
        exclude: &HashSet<ProductId>,
    ) -> Result<Vec<ProductId>> {
        if target == 0 {
            return Ok(Vec::new());
        }

        let snapshot = self.embeddings.get_or_build()?;
        let fetch = target.saturating_mul(self.config.related.candidate_multiplier);
        let candidates = self
            .similarity
            .find_similar_excluding(subject, &snapshot, fetch, exclude);

        Ok(self
            .keep_available(candidates, target)?
            .into_iter()
            .map(|candidate| candidate.product_id)
            .collect())
    }

    /// Recommendations for a user from their view history.
    ///
    /// A user without history gets the popular products.
    pub fn personalized_recommendations(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<ProductId>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        self.personalized
            .get_or_try_insert_with((user_id, limit), || {
                self.compute_personalized(user_id, limit)
            })
    }

    fn compute_personalized(&self, user_id: UserId, limit: usize) -> Result<Vec<ProductId>> {
        let viewed = self.history.history(user_id);
        if viewed.is_empty() {
            debug!(user = %user_id, "no view history, using popular products");
            return self.popular_products(limit, &HashSet::new());
        }

        let config = &self.config.personalized;
        let viewed_products = self.catalog.find_products_by_ids(&viewed)?;
        let signals = Signals::from_products(&viewed_products);

        let rule_target = share_of(limit, config.rule_based_ratio);
        let phases = [
            Phase::capped(
                RuleStrategy::SameCategory,
                share_of(rule_target, config.category_share),
            ),
            Phase::capped(
                RuleStrategy::PriceWindow {
                    tolerance: config.price_tolerance,
                },
                share_of(rule_target, config.price_share),
            ),
            Phase::uncapped(RuleStrategy::SharedTags),
        ];

        let mut list = CandidateList::new(rule_target).excluding(viewed.iter().copied());
        self.run_phases(&signals, &phases, &mut list)?;
        let rule_count = list.len();

        list.set_quota(limit);
        let target = list.remaining();
        let similar = self.personalized_similar(&viewed, target, list.excluded());
        self.fill_from_similarity(&mut list, similar, "personalized")?;

        debug!(
            user = %user_id,
            views = viewed.len(),
            rule_based = rule_count,
            similarity = list.len() - rule_count,
            "personalized recommendations computed"
        );
        Ok(list.into_vec())
    }

    /// Similar products of the most recent views, weighted by recency.
    ///
    /// The view at position `i` contributes `similarity × (1 − decay × i)`;
    /// a candidate reached from several views keeps its best weight.
    fn personalized_similar(
        &self,
        viewed: &[ProductId],
        target: usize,
        exclude: &HashSet<ProductId>,
    ) -> Result<Vec<ProductId>> {
        if target == 0 {
            return Ok(Vec::new());
        }

        let config = &self.config.personalized;
        let snapshot = self.embeddings.get_or_build()?;
        let fetch = target.saturating_mul(config.candidate_multiplier);

        let mut best: AHashMap<ProductId, f64> = AHashMap::new();
        for (position, view) in viewed.iter().take(config.recent_views).enumerate() {
            let weight = (1.0 - config.recency_decay * position as f64).max(0.0);
            for candidate in self
                .similarity
                .find_similar_excluding(*view, &snapshot, fetch, exclude)
            {
                let score = candidate.score * weight;
                best.entry(candidate.product_id)
                    .and_modify(|current| *current = current.max(score))
                    .or_insert(score);
            }
        }

        let candidates: Vec<ScoredProduct> = best
            .into_iter()
            .map(|(product_id, score)| ScoredProduct::new(product_id, score))
            .collect();

        Ok(self
            .keep_available(candidates, target)?
            .into_iter()
            .map(|candidate| candidate.product_id)
            .collect())
    }

    /// Newest available products, skipping `exclude`. Not cached.
    pub fn popular_products(
        &self,
        limit: usize,
        exclude: &HashSet<ProductId>,
    ) -> Result<Vec<ProductId>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        Ok(self
            .catalog
            .most_recently_created(exclude, limit)?
            .into_iter()
            .map(|product| product.id)
            .collect())
    }

    /// Trending products. Currently the popular products, cached separately.
    pub fn trending_products(&self, limit: usize) -> Result<Vec<ProductId>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        self.trending
            .get_or_try_insert_with(limit, || self.popular_products(limit, &HashSet::new()))
    }

    /// Pure similarity lookup, restricted to available products.
    pub fn similar_products(
        &self,
        product_id: ProductId,
        limit: usize,
    ) -> Result<Vec<ScoredProduct>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let snapshot = self.embeddings.get_or_build()?;
        let fetch = limit.saturating_mul(self.config.related.candidate_multiplier);
        let candidates = self.similarity.find_similar(product_id, &snapshot, fetch);
        self.keep_available(candidates, limit)
    }

    /// Record a product view and drop the user's cached recommendations.
    pub fn track_view(&self, user_id: UserId, product_id: ProductId) {
        self.history.record_view(user_id, product_id);
        self.personalized.retain(|(user, _)| *user != user_id);
    }

    /// Drop the embedding snapshot and every cached result.
    ///
    /// Live view histories are kept; expired ones are purged.
    pub fn clear_caches(&self) {
        self.embeddings.invalidate();
        self.related.invalidate_all();
        self.personalized.invalidate_all();
        self.trending.invalidate_all();
        let purged_histories = self.history.purge_expired();
        info!(purged_histories, "recommendation caches cleared");
    }

    /// Rebuild the embedding snapshot now and report the result.
    pub fn rebuild_embeddings(&self) -> Result<RecommenderStats> {
        self.embeddings.rebuild()?;
        Ok(self.stats())
    }

    /// Current statistics. Never builds a snapshot.
    pub fn stats(&self) -> RecommenderStats {
        let snapshot = self.embeddings.peek();

        RecommenderStats {
            corpus_size: snapshot.as_ref().map_or(0, |s| s.len()),
            vocabulary_size: snapshot.as_ref().map_or(0, |s| s.vocabulary().len()),
            vector_dimensions: snapshot.as_ref().map_or(0, |s| s.dimension()),
            snapshot: self.embeddings.freshness(),
            related_entries: self.related.len(),
            personalized_entries: self.personalized.len(),
            trending_entries: self.trending.len(),
            tracked_users: self.history.tracked_users(),
        }
    }

    /// Run rule-based phases in order until the list is full.
    ///
    /// Each phase samples uniformly from every product its strategy matches.
    fn run_phases(
        &self,
        signals: &Signals,
        phases: &[Phase],
        list: &mut CandidateList,
    ) -> Result<()> {
        for phase in phases {
            if list.is_full() {
                break;
            }

            let mut candidates =
                phase
                    .strategy
                    .candidates(self.catalog.as_ref(), signals, list.excluded())?;
            candidates.shuffle(&mut *self.rng.lock());

            let added = list.extend(
                candidates.into_iter().map(|product| product.id),
                phase.cap.unwrap_or(usize::MAX),
            );
            debug!(strategy = phase.strategy.name(), added, "rule-based phase");
        }
        Ok(())
    }

    /// Fill the rest of `list` from the similarity phase, or from popular
    /// products if that phase failed.
    fn fill_from_similarity(
        &self,
        list: &mut CandidateList,
        similar: Result<Vec<ProductId>>,
        operation: &'static str,
    ) -> Result<()> {
        match similar {
            Ok(ids) => {
                list.extend(ids, usize::MAX);
            }
            Err(err) => {
                warn!(
                    operation,
                    error = %err,
                    "similarity phase failed, falling back to popular products"
                );
                let popular = self.popular_products(list.remaining(), list.excluded())?;
                list.extend(popular, usize::MAX);
            }
        }
        Ok(())
    }

    /// Keep candidates the catalog reports as available, best first.
    fn keep_available(
        &self,
        mut candidates: Vec<ScoredProduct>,
        limit: usize,
    ) -> Result<Vec<ScoredProduct>> {
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let ids: Vec<ProductId> = candidates.iter().map(|c| c.product_id).collect();
        let available: HashSet<ProductId> = self
            .catalog
            .find_products_by_ids(&ids)?
            .into_iter()
            .filter(Product::is_available)
            .map(|product| product.id)
            .collect();

        candidates.retain(|candidate| available.contains(&candidate.product_id));
        candidates.sort_by(ScoredProduct::ranking);
        candidates.truncate(limit);
        Ok(candidates)
    }
}
