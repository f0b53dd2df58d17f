//! Key-value caching with lazy expiry and single-flight computation.
//!
//! [`TtlCache`] is the one memoization facility of the crate. Embedding
//! snapshots, recommendation results and trending lists all live in
//! instances of it, injected into the components that use them.
//!
//! Expiry is checked when an entry is read; there is no background
//! eviction. Every [`PURGE_INTERVAL`] writes the cache also sweeps out
//! every expired entry, so keys that are never read again do not pile up.
//! [`TtlCache::get_or_try_insert_with`] guarantees that at most
//! one computation per key runs at a time: concurrent callers that miss
//! the same key block until the running computation finishes and then
//! observe its result.

pub mod clock;

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use ahash::AHashMap;
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::{Condvar, Mutex};
use tracing::debug;

use crate::error::Result;

pub use clock::{Clock, ManualClock, SystemClock};

/// Writes between two sweeps of expired entries.
pub const PURGE_INTERVAL: usize = 256;

/// A cached value with its timestamps.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub inserted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// `now + ttl`, saturating at the latest representable instant.
pub(crate) fn expiry(now: DateTime<Utc>, ttl: TimeDelta) -> DateTime<Utc> {
    now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

struct CacheState<K, V> {
    entries: AHashMap<K, CacheEntry<V>>,
    /// Keys being computed. `true` once the running computation has been
    /// invalidated and must not publish its result.
    in_flight: AHashMap<K, bool>,
    /// Writes since the last sweep.
    writes: usize,
}

impl<K, V> CacheState<K, V>
where
    K: Eq + Hash,
{
    /// Store an entry, sweeping expired ones every [`PURGE_INTERVAL`] writes.
    fn store(&mut self, key: K, entry: CacheEntry<V>, now: DateTime<Utc>) -> usize {
        self.entries.insert(key, entry);
        self.writes += 1;
        if self.writes < PURGE_INTERVAL {
            return 0;
        }

        self.writes = 0;
        self.sweep(now)
    }

    fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(now));
        before - self.entries.len()
    }
}

/// A TTL cache with per-key single-flight computation.
///
/// Computations run without holding the cache lock, so a computation must
/// not request the same key from the same cache (it would wait on itself).
pub struct TtlCache<K, V> {
    name: &'static str,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
    state: Mutex<CacheState<K, V>>,
    ready: Condvar,
}

impl<K, V> fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TtlCache")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .field("entries", &state.entries.len())
            .field("in_flight", &state.in_flight.len())
            .finish()
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache whose entries live for `ttl`.
    pub fn new(name: &'static str, ttl: TimeDelta, clock: Arc<dyn Clock>) -> Self {
        TtlCache {
            name,
            ttl,
            clock,
            state: Mutex::new(CacheState {
                entries: AHashMap::new(),
                in_flight: AHashMap::new(),
                writes: 0,
            }),
            ready: Condvar::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Get a fresh value. Expired entries are dropped on the way.
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_entry(key).map(|entry| entry.value)
    }

    /// Get a fresh entry with its timestamps.
    pub fn get_entry(&self, key: &K) -> Option<CacheEntry<V>> {
        let now = self.clock.now();
        let mut state = self.state.lock();
        match state.entries.get(key).map(|entry| entry.is_fresh(now)) {
            Some(true) => state.entries.get(key).cloned(),
            Some(false) => {
                state.entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a value, replacing any previous entry.
    pub fn insert(&self, key: K, value: V) {
        let now = self.clock.now();
        let entry = CacheEntry {
            value,
            inserted_at: now,
            expires_at: expiry(now, self.ttl),
        };
        let purged = self.state.lock().store(key, entry, now);
        if purged > 0 {
            debug!(cache = self.name, purged, "expired entries purged");
        }
    }

    /// Get a fresh value, or compute and store it.
    ///
    /// Only one caller computes a given key at a time; the others wait for
    /// it. If the computation fails or unwinds, nothing is stored and one
    /// of the waiting callers takes over. A computation whose key is
    /// invalidated while it runs returns its value to its own caller but
    /// does not store it.
    pub fn get_or_try_insert_with<F>(&self, key: K, compute: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        {
            let mut state = self.state.lock();
            loop {
                let now = self.clock.now();
                if let Some(entry) = state.entries.get(&key) {
                    if entry.is_fresh(now) {
                        debug!(cache = self.name, "cache hit");
                        return Ok(entry.value.clone());
                    }
                    state.entries.remove(&key);
                }

                if state.in_flight.contains_key(&key) {
                    debug!(cache = self.name, "waiting for in-flight computation");
                    self.ready.wait(&mut state);
                    continue;
                }

                state.in_flight.insert(key.clone(), false);
                break;
            }
        }

        debug!(cache = self.name, "cache miss");
        let guard = InFlightGuard {
            cache: self,
            key: &key,
        };

        let value = compute()?;

        {
            let now = self.clock.now();
            let mut state = self.state.lock();
            let stale = state.in_flight.get(&key).copied().unwrap_or(true);
            if stale {
                debug!(cache = self.name, "discarding result invalidated during computation");
            } else {
                let entry = CacheEntry {
                    value: value.clone(),
                    inserted_at: now,
                    expires_at: expiry(now, self.ttl),
                };
                let purged = state.store(key.clone(), entry, now);
                if purged > 0 {
                    debug!(cache = self.name, purged, "expired entries purged");
                }
            }
        }
        drop(guard);

        Ok(value)
    }

    /// Drop one entry and stop any running computation of it from publishing.
    pub fn invalidate(&self, key: &K) {
        let mut state = self.state.lock();
        state.entries.remove(key);
        if let Some(stale) = state.in_flight.get_mut(key) {
            *stale = true;
        }
    }

    /// Drop every entry and stop all running computations from publishing.
    pub fn invalidate_all(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        for stale in state.in_flight.values_mut() {
            *stale = true;
        }
    }

    /// Keep only the keys matching `keep`; the others are invalidated.
    pub fn retain<F>(&self, mut keep: F)
    where
        F: FnMut(&K) -> bool,
    {
        let mut state = self.state.lock();
        state.entries.retain(|key, _| keep(key));
        for (key, stale) in state.in_flight.iter_mut() {
            if !keep(key) {
                *stale = true;
            }
        }
    }

    /// Remove expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.writes = 0;
        state.sweep(now)
    }

    /// Number of fresh entries.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.state
            .lock()
            .entries
            .values()
            .filter(|entry| entry.is_fresh(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stored entries, expired ones included.
    pub fn stored_len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Age of a fresh entry.
    pub fn entry_age(&self, key: &K) -> Option<TimeDelta> {
        let now = self.clock.now();
        self.get_entry(key).map(|entry| now - entry.inserted_at)
    }

    pub(crate) fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

/// Clears the in-flight marker and wakes waiters, on success, error or unwind.
struct InFlightGuard<'a, K, V>
where
    K: Eq + Hash,
{
    cache: &'a TtlCache<K, V>,
    key: &'a K,
}

impl<K, V> Drop for InFlightGuard<'_, K, V>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        self.cache.state.lock().in_flight.remove(self.key);
        self.cache.ready.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::error::RecommendError;

    fn manual_cache(ttl: TimeDelta) -> (Arc<ManualClock>, TtlCache<u64, String>) {
        let clock = Arc::new(ManualClock::default());
        let cache = TtlCache::new("test", ttl, clock.clone());
        (clock, cache)
    }

    #[test]
    fn test_entries_expire_lazily() {
        let (clock, cache) = manual_cache(TimeDelta::minutes(30));
        cache.insert(1, "one".to_string());
        assert_eq!(cache.get(&1).as_deref(), Some("one"));

        clock.advance(TimeDelta::minutes(29));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.entry_age(&1), Some(TimeDelta::minutes(29)));

        clock.advance(TimeDelta::minutes(1));
        assert!(cache.get(&1).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_get_or_try_insert_with_memoizes() {
        let (_clock, cache) = manual_cache(TimeDelta::hours(1));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_try_insert_with(7, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("seven".to_string())
                })
                .unwrap();
            assert_eq!(value, "seven");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_computation_is_not_stored() {
        let (_clock, cache) = manual_cache(TimeDelta::hours(1));

        let result = cache.get_or_try_insert_with(1, || Err(RecommendError::other("boom")));
        assert!(result.is_err());
        assert!(cache.get(&1).is_none());

        let value = cache
            .get_or_try_insert_with(1, || Ok("recovered".to_string()))
            .unwrap();
        assert_eq!(value, "recovered");
    }

    #[test]
    fn test_panicking_computation_releases_key() {
        let (_clock, cache) = manual_cache(TimeDelta::hours(1));

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = cache.get_or_try_insert_with(1, || -> Result<String> { panic!("abandoned") });
        }));
        assert!(outcome.is_err());

        let value = cache
            .get_or_try_insert_with(1, || Ok("rebuilt".to_string()))
            .unwrap();
        assert_eq!(value, "rebuilt");
    }

    #[test]
    fn test_single_flight_under_contention() {
        let cache = Arc::new(TtlCache::<u64, u64>::new(
            "contended",
            TimeDelta::hours(1),
            Arc::new(SystemClock),
        ));
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache
                        .get_or_try_insert_with(42, || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(50));
                            Ok(4242)
                        })
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 4242);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalidation_during_computation_prevents_publish() {
        let (_clock, cache) = manual_cache(TimeDelta::hours(1));

        let value = cache
            .get_or_try_insert_with(1, || {
                cache.invalidate_all();
                Ok("stale".to_string())
            })
            .unwrap();
        assert_eq!(value, "stale");
        assert!(cache.get(&1).is_none());
    }

    #[test]
    fn test_retain_and_invalidate() {
        let (_clock, cache) = manual_cache(TimeDelta::hours(1));
        for key in 0..6 {
            cache.insert(key, key.to_string());
        }

        cache.retain(|key| key % 2 == 0);
        assert_eq!(cache.len(), 3);

        cache.invalidate(&0);
        assert!(cache.get(&0).is_none());
        assert_eq!(cache.len(), 2);

        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let (clock, cache) = manual_cache(TimeDelta::minutes(10));
        cache.insert(1, "old".to_string());
        clock.advance(TimeDelta::minutes(5));
        cache.insert(2, "new".to_string());
        clock.advance(TimeDelta::minutes(6));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.get(&2).as_deref(), Some("new"));
    }

    #[test]
    fn test_writes_sweep_keys_that_are_never_read_again() {
        let (clock, cache) = manual_cache(TimeDelta::minutes(30));
        for key in 0..PURGE_INTERVAL as u64 {
            cache.insert(key, "first wave".to_string());
        }
        assert_eq!(cache.stored_len(), PURGE_INTERVAL);

        clock.advance(TimeDelta::days(31));
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stored_len(), PURGE_INTERVAL);

        // None of the first wave is read again; new keys alone drive the sweep.
        for key in 0..PURGE_INTERVAL as u64 {
            let value = cache
                .get_or_try_insert_with(10_000 + key, || Ok("second wave".to_string()))
                .unwrap();
            assert_eq!(value, "second wave");
        }
        assert_eq!(cache.stored_len(), PURGE_INTERVAL);
        assert_eq!(cache.len(), PURGE_INTERVAL);
        assert!(cache.get(&0).is_none());
    }
}
