//! TTL cache storage.
//!
//! A process-wide map from [`CacheKey`] to `(value, expires_at)`. Entries are
//! served only while `now < expires_at`; an expired entry is removed the next
//! time it is read, or by [`CacheStore::purge_expired`]. There is no capacity
//! bound. Writes are last-writer-wins.
//!
//! Every invalidation advances a store-wide [`Generation`]. A reader that
//! captured the generation before fetching from the source can write back
//! with [`CacheStore::set_if_unchanged`], which refuses the write if any
//! invalidation happened in between, so a listing fetched before a write
//! committed is never put back after that write invalidated it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use metrics::{counter, gauge};
use serde::Serialize;
use tracing::debug;

use super::clock::{Clock, SystemClock};
use super::keys::{CacheKey, Namespace};

/// Longest TTL honoured by [`CacheStore::set`]; keeps `Instant` arithmetic in range.
const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
    invalidated: AtomicU64,
}

/// Invalidation epoch observed by a reader before it fetched from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// Point-in-time view of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub invalidated: u64,
}

pub struct CacheStore<V> {
    entries: DashMap<CacheKey, CacheEntry<V>>,
    clock: Arc<dyn Clock>,
    counters: Counters,
    generation: AtomicU64,
}

impl<V: Clone> CacheStore<V> {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            counters: Counters::default(),
            generation: AtomicU64::new(0),
        }
    }

    /// Return the value for `key` if it is present and unexpired.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let now = self.clock.now();
        let namespace = key.namespace().as_str();

        let expired = match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                counter!("roombook_cache_hit_total", "namespace" => namespace).increment(1);
                debug!(cache = "listing", %key, outcome = "hit", "cache lookup");
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            // A concurrent `set` may have refreshed the entry since we looked.
            if self
                .entries
                .remove_if(key, |_, entry| !entry.is_live(now))
                .is_some()
            {
                self.counters.expired.fetch_add(1, Ordering::Relaxed);
                counter!("roombook_cache_expired_total", "namespace" => namespace).increment(1);
                self.record_len();
            }
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        counter!("roombook_cache_miss_total", "namespace" => namespace).increment(1);
        debug!(
            cache = "listing",
            %key,
            outcome = if expired { "expired" } else { "miss" },
            "cache lookup"
        );
        None
    }

    /// Current invalidation epoch. Capture it before fetching a value that
    /// will be written back with [`CacheStore::set_if_unchanged`].
    pub fn generation(&self) -> Generation {
        Generation(self.generation.load(Ordering::SeqCst))
    }

    /// Store `value` under `key` for `ttl`, replacing any existing entry.
    ///
    /// A zero `ttl` stores nothing and drops whatever was cached under `key`.
    pub fn set(&self, key: CacheKey, value: V, ttl: Duration) {
        self.write(key, value, ttl, None);
    }

    /// Like [`CacheStore::set`], but only if nothing was invalidated since
    /// `observed` was captured. Returns whether the value was stored.
    pub fn set_if_unchanged(
        &self,
        key: CacheKey,
        value: V,
        ttl: Duration,
        observed: Generation,
    ) -> bool {
        self.write(key, value, ttl, Some(observed))
    }

    fn write(&self, key: CacheKey, value: V, ttl: Duration, observed: Option<Generation>) -> bool {
        let stored = {
            // The shard lock is held from here until the entry is written, and
            // invalidation bumps the generation before taking that lock.
            let entry = self.entries.entry(key);
            if observed.is_some_and(|seen| seen != self.generation()) {
                debug!(
                    cache = "listing",
                    key = %entry.key(),
                    "invalidated during fetch, not storing"
                );
                return false;
            }
            match entry {
                Entry::Occupied(slot) if ttl.is_zero() => {
                    debug!(cache = "listing", key = %slot.key(), "zero ttl, dropping entry");
                    slot.remove();
                    false
                }
                Entry::Vacant(_) if ttl.is_zero() => false,
                Entry::Occupied(mut slot) => {
                    let expires_at = self.clock.now() + ttl.min(MAX_TTL);
                    slot.insert(CacheEntry { value, expires_at });
                    true
                }
                Entry::Vacant(slot) => {
                    let expires_at = self.clock.now() + ttl.min(MAX_TTL);
                    slot.insert(CacheEntry { value, expires_at });
                    true
                }
            }
        };
        self.record_len();
        stored
    }

    /// Remove `key` ahead of its expiry. Returns whether an entry was removed.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.advance_generation();
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.note_invalidated(key.namespace(), 1);
            self.record_len();
        }
        debug!(cache = "listing", %key, removed, "cache invalidate");
        removed
    }

    /// Remove every entry in `namespace`. Returns the number removed.
    pub fn invalidate_namespace(&self, namespace: Namespace) -> usize {
        self.advance_generation();
        let before = self.entries.len();
        self.entries.retain(|key, _| key.namespace() != namespace);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            self.note_invalidated(namespace, removed as u64);
            self.record_len();
        }
        removed
    }

    /// Drop every entry. Returns the number removed.
    pub fn clear(&self) -> usize {
        let mut removed = 0;
        for namespace in Namespace::ALL {
            removed += self.invalidate_namespace(namespace);
        }
        removed
    }

    /// Physically remove all expired entries. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            self.counters
                .expired
                .fetch_add(removed as u64, Ordering::Relaxed);
            self.record_len();
        }
        removed
    }

    /// Number of physically present entries, including expired ones not yet removed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            expired: self.counters.expired.load(Ordering::Relaxed),
            invalidated: self.counters.invalidated.load(Ordering::Relaxed),
        }
    }

    fn advance_generation(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn note_invalidated(&self, namespace: Namespace, count: u64) {
        self.counters
            .invalidated
            .fetch_add(count, Ordering::Relaxed);
        counter!("roombook_cache_invalidate_total", "namespace" => namespace.as_str())
            .increment(count);
    }

    fn record_len(&self) {
        gauge!("roombook_cache_entries").set(self.entries.len() as f64);
    }
}

impl<V: Clone> Default for CacheStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::cache::clock::ManualClock;

    const ONE_MINUTE: Duration = Duration::from_secs(60);

    fn key(raw: &str) -> CacheKey {
        raw.parse().expect("valid cache key")
    }

    fn store_with_clock() -> (CacheStore<Vec<&'static str>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (CacheStore::with_clock(clock.clone()), clock)
    }

    #[test]
    fn unset_key_is_absent() {
        let (store, _) = store_with_clock();
        assert!(store.get(&key("company-reservations:acme-corp")).is_none());
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn set_then_get_returns_value() {
        let (store, _) = store_with_clock();
        let k = key("company-reservations:acme-corp");
        store.set(k.clone(), vec!["r1"], ONE_MINUTE);
        assert_eq!(store.get(&k), Some(vec!["r1"]));
    }

    #[test]
    fn entry_expires_after_ttl_and_is_removed() {
        let (store, clock) = store_with_clock();
        let k = key("company-reservations:acme-corp");
        store.set(k.clone(), vec!["r1"], ONE_MINUTE);
        assert_eq!(store.get(&k), Some(vec!["r1"]));

        clock.advance(Duration::from_secs(61));
        assert!(store.get(&k).is_none());
        assert!(store.is_empty(), "expired entry should be removed on access");
        assert_eq!(store.stats().expired, 1);
    }

    #[test]
    fn entry_is_absent_exactly_at_expiry() {
        let (store, clock) = store_with_clock();
        let k = key("user-reservations:ola");
        store.set(k.clone(), vec!["r1"], ONE_MINUTE);

        clock.advance(ONE_MINUTE - Duration::from_millis(1));
        assert!(store.get(&k).is_some());

        clock.advance(Duration::from_millis(1));
        assert!(store.get(&k).is_none());
    }

    #[test]
    fn repeated_get_is_idempotent() {
        let (store, _) = store_with_clock();
        let k = key("company-rooms:acme-corp");
        store.set(k.clone(), vec!["fjord", "glacier"], ONE_MINUTE);
        assert_eq!(store.get(&k), store.get(&k));

        let missing = key("company-rooms:other");
        assert_eq!(store.get(&missing), store.get(&missing));
    }

    #[test]
    fn set_overwrites_and_restarts_ttl() {
        let (store, clock) = store_with_clock();
        let k = key("company-reservations:acme-corp");
        store.set(k.clone(), vec!["old"], ONE_MINUTE);

        clock.advance(Duration::from_secs(45));
        store.set(k.clone(), vec!["new"], ONE_MINUTE);

        clock.advance(Duration::from_secs(45));
        assert_eq!(store.get(&k), Some(vec!["new"]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn zero_ttl_drops_existing_entry() {
        let (store, _) = store_with_clock();
        let k = key("company-reservations:acme-corp");
        store.set(k.clone(), vec!["r1"], ONE_MINUTE);
        store.set(k.clone(), vec!["r2"], Duration::ZERO);

        assert!(store.get(&k).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn invalidate_removes_before_expiry() {
        let (store, _) = store_with_clock();
        let k = key("company-rooms:acme-corp");
        store.set(k.clone(), vec!["fjord"], ONE_MINUTE);

        assert!(store.invalidate(&k));
        assert!(store.get(&k).is_none());
        assert!(!store.invalidate(&k));
        assert_eq!(store.stats().invalidated, 1);
    }

    #[test]
    fn invalidate_namespace_leaves_other_namespaces() {
        let (store, _) = store_with_clock();
        store.set(key("company-rooms:acme-corp"), vec!["a"], ONE_MINUTE);
        store.set(key("company-rooms:globex"), vec!["b"], ONE_MINUTE);
        store.set(key("company-reservations:acme-corp"), vec!["c"], ONE_MINUTE);

        assert_eq!(store.invalidate_namespace(Namespace::CompanyRooms), 2);
        assert_eq!(store.len(), 1);
        assert!(store.get(&key("company-reservations:acme-corp")).is_some());
    }

    #[test]
    fn purge_expired_only_removes_stale_entries() {
        let (store, clock) = store_with_clock();
        store.set(key("company-reservations:acme-corp"), vec!["a"], ONE_MINUTE);
        store.set(key("user-reservations:ola"), vec!["b"], 2 * ONE_MINUTE);

        clock.advance(Duration::from_secs(90));
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get(&key("user-reservations:ola")).is_some());
    }

    #[test]
    fn clear_empties_store() {
        let (store, _) = store_with_clock();
        store.set(key("company-reservations:acme-corp"), vec!["a"], ONE_MINUTE);
        store.set(key("user-reservations:ola"), vec!["b"], ONE_MINUTE);

        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn fill_after_invalidation_is_refused() {
        let (store, _) = store_with_clock();
        let k = key("company-rooms:acme-corp");
        let before_fetch = store.generation();

        store.invalidate(&k);
        assert!(!store.set_if_unchanged(k.clone(), vec!["deleted"], ONE_MINUTE, before_fetch));
        assert!(store.get(&k).is_none());

        let after = store.generation();
        assert!(store.set_if_unchanged(k.clone(), vec!["fresh"], ONE_MINUTE, after));
        assert_eq!(store.get(&k), Some(vec!["fresh"]));
    }

    #[test]
    fn namespace_invalidation_also_refuses_stale_fill() {
        let (store, _) = store_with_clock();
        let k = key("user-reservations:ola");
        let before_fetch = store.generation();

        store.invalidate_namespace(Namespace::CompanyRooms);
        assert!(!store.set_if_unchanged(k.clone(), vec!["r1"], ONE_MINUTE, before_fetch));
        assert!(store.is_empty());
    }

    #[test]
    fn concurrent_miss_then_set_converges_to_one_entry() {
        let (store, _) = store_with_clock();
        let store = Arc::new(store);
        let k = key("company-reservations:acme-corp");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let k = k.clone();
                thread::spawn(move || {
                    if store.get(&k).is_none() {
                        store.set(k.clone(), vec!["r1", "r2"], ONE_MINUTE);
                    }
                    store.get(&k)
                })
            })
            .collect();

        for handle in handles {
            let seen = handle.join().expect("worker thread");
            assert_eq!(seen, Some(vec!["r1", "r2"]));
        }
        assert_eq!(store.len(), 1);
    }
}
