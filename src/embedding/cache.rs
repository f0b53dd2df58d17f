//! Snapshot memoization keyed by corpus version.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::TtlCache;
use crate::cache::clock::Clock;
use crate::catalog::Catalog;
use crate::embedding::snapshot::{EmbeddingSnapshot, SnapshotBuilder};
use crate::error::Result;

/// Publication time and remaining lifetime of the current snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFreshness {
    pub corpus_version: u64,
    pub built_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub age_seconds: i64,
}

/// Produces and retains the current [`EmbeddingSnapshot`].
///
/// Snapshots are keyed by [`Catalog::corpus_version`], so a catalog change
/// makes the next request build a new one. Concurrent requests that miss
/// share a single build.
pub struct EmbeddingCache {
    catalog: Arc<dyn Catalog>,
    builder: SnapshotBuilder,
    snapshots: TtlCache<u64, Arc<EmbeddingSnapshot>>,
}

impl std::fmt::Debug for EmbeddingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingCache")
            .field("builder", &self.builder)
            .field("snapshots", &self.snapshots)
            .finish()
    }
}

impl EmbeddingCache {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        builder: SnapshotBuilder,
        ttl: TimeDelta,
        clock: Arc<dyn Clock>,
    ) -> Self {
        EmbeddingCache {
            catalog,
            builder,
            snapshots: TtlCache::new("embedding_snapshot", ttl, clock),
        }
    }

    /// Return the snapshot of the current corpus, building it if needed.
    pub fn get_or_build(&self) -> Result<Arc<EmbeddingSnapshot>> {
        let version = self.catalog.corpus_version();

        let snapshot = self
            .snapshots
            .get_or_try_insert_with(version, || self.build(version))?;

        // Older corpus versions can never be requested again.
        self.snapshots.retain(|key| *key >= version);

        Ok(snapshot)
    }

    /// The published snapshot of the current corpus, without building.
    pub fn peek(&self) -> Option<Arc<EmbeddingSnapshot>> {
        self.snapshots.get(&self.catalog.corpus_version())
    }

    /// Freshness of the published snapshot of the current corpus.
    pub fn freshness(&self) -> Option<SnapshotFreshness> {
        let version = self.catalog.corpus_version();
        let entry = self.snapshots.get_entry(&version)?;
        let now = self.snapshots.clock().now();

        Some(SnapshotFreshness {
            corpus_version: version,
            built_at: entry.inserted_at,
            expires_at: entry.expires_at,
            age_seconds: (now - entry.inserted_at).num_seconds(),
        })
    }

    /// Drop the published snapshot; the next request rebuilds.
    pub fn invalidate(&self) {
        info!("embedding snapshot invalidated");
        self.snapshots.invalidate_all();
    }

    /// Drop the published snapshot and build a new one immediately.
    pub fn rebuild(&self) -> Result<Arc<EmbeddingSnapshot>> {
        self.invalidate();
        self.get_or_build()
    }

    fn build(&self, version: u64) -> Result<Arc<EmbeddingSnapshot>> {
        let start = Instant::now();
        debug!(corpus_version = version, "building embedding snapshot");

        let products = self.catalog.list_active_in_stock_products()?;
        let built_at = self.snapshots.clock().now();
        let snapshot = self.builder.build(&products, version, built_at)?;

        info!(
            corpus_version = version,
            corpus_size = snapshot.len(),
            vocabulary_size = snapshot.dimension(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "embedding snapshot built"
        );

        Ok(Arc::new(snapshot))
    }
}
