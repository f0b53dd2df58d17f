//! Per-user product view history.
//!
//! Each user's history is an ordered list of product IDs, most recent
//! first, without duplicates and bounded in length. A history expires a
//! fixed time after its last write; an expired history reads as empty.
//!
//! Writes to the same user are serialized through that user's own lock,
//! so concurrent views of different users never contend beyond the
//! brief map lookup. Every [`PURGE_INTERVAL`] recorded views the store
//! drops the histories that have expired.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ahash::AHashMap;
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::cache::clock::Clock;
use crate::cache::{PURGE_INTERVAL, expiry};
use crate::catalog::{ProductId, UserId};
use crate::config::HistoryConfig;

#[derive(Debug)]
struct UserHistory {
    views: VecDeque<ProductId>,
    expires_at: DateTime<Utc>,
    /// Set once the slot has been removed from the map; writers retry.
    detached: bool,
}

impl UserHistory {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Stores recent product views per user.
pub struct ViewHistoryStore {
    users: RwLock<AHashMap<UserId, Arc<Mutex<UserHistory>>>>,
    max_entries: usize,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
    writes: AtomicUsize,
}

impl std::fmt::Debug for ViewHistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewHistoryStore")
            .field("users", &self.users.read().len())
            .field("max_entries", &self.max_entries)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl ViewHistoryStore {
    pub fn new(config: &HistoryConfig, clock: Arc<dyn Clock>) -> Self {
        ViewHistoryStore {
            users: RwLock::new(AHashMap::new()),
            max_entries: config.max_entries.max(1),
            ttl: config.ttl(),
            clock,
            writes: AtomicUsize::new(0),
        }
    }

    /// Record that `user` viewed `product`.
    ///
    /// The product moves to the front of the history, older entries beyond
    /// the size bound are dropped and the expiry is reset.
    pub fn record_view(&self, user: UserId, product: ProductId) {
        loop {
            let slot = self.slot(user);
            let now = self.clock.now();
            let mut history = slot.lock();

            // Purged or forgotten between the lookup and the lock.
            if history.detached {
                continue;
            }

            if !history.is_live(now) {
                history.views.clear();
            }

            history.views.retain(|id| *id != product);
            history.views.push_front(product);
            history.views.truncate(self.max_entries);
            history.expires_at = expiry(now, self.ttl);

            debug!(user = %user, product = %product, entries = history.views.len(), "view recorded");
            break;
        }

        if self.writes.fetch_add(1, Ordering::Relaxed) % PURGE_INTERVAL == PURGE_INTERVAL - 1 {
            let purged = self.purge_expired();
            if purged > 0 {
                debug!(purged, "expired view histories purged");
            }
        }
    }

    /// Viewed products, most recent first. Empty if none or expired.
    pub fn history(&self, user: UserId) -> Vec<ProductId> {
        let Some(slot) = self.users.read().get(&user).cloned() else {
            return Vec::new();
        };

        let now = self.clock.now();
        let history = slot.lock();
        if history.is_live(now) {
            history.views.iter().copied().collect()
        } else {
            Vec::new()
        }
    }

    /// Drop a user's history, returning whether one was stored.
    pub fn forget(&self, user: UserId) -> bool {
        match self.users.write().remove(&user) {
            Some(slot) => {
                slot.lock().detached = true;
                true
            }
            None => false,
        }
    }

    /// Number of users with an unexpired history.
    pub fn tracked_users(&self) -> usize {
        let now = self.clock.now();
        self.users
            .read()
            .values()
            .filter(|slot| slot.lock().is_live(now))
            .count()
    }

    /// Remove expired histories, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut users = self.users.write();
        let before = users.len();
        users.retain(|_, slot| {
            let mut history = slot.lock();
            if history.is_live(now) {
                return true;
            }
            history.detached = true;
            false
        });
        before - users.len()
    }

    /// Number of stored histories, expired ones included.
    pub fn stored_users(&self) -> usize {
        self.users.read().len()
    }

    fn slot(&self, user: UserId) -> Arc<Mutex<UserHistory>> {
        if let Some(slot) = self.users.read().get(&user) {
            return Arc::clone(slot);
        }

        let mut users = self.users.write();
        Arc::clone(users.entry(user).or_insert_with(|| {
            Arc::new(Mutex::new(UserHistory {
                views: VecDeque::new(),
                expires_at: DateTime::<Utc>::MIN_UTC,
                detached: false,
            }))
        }))
    }
}
