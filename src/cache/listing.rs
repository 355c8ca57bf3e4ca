//! Typed access to cached reservation and room listings.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::domain::entities::{ReservationRecord, RoomRecord};

use super::clock::Clock;
use super::config::CacheConfig;
use super::keys::{CacheKey, Namespace};
use super::store::{CacheStats, CacheStore, Generation};

/// Values kept in the listing cache.
#[derive(Debug, Clone)]
pub enum CachedListing {
    Reservations(Arc<[ReservationRecord]>),
    Rooms(Arc<[RoomRecord]>),
}

/// The shared listing cache handed to application services.
///
/// Wraps a single [`CacheStore`] and applies the configured TTL for each
/// namespace. When the cache is disabled reads always miss and writes are
/// dropped.
pub struct ListingCache {
    config: CacheConfig,
    store: CacheStore<CachedListing>,
}

impl ListingCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            store: CacheStore::new(),
        }
    }

    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            store: CacheStore::with_clock(clock),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn ttl_for(&self, namespace: Namespace) -> Duration {
        self.config.ttl_for(namespace)
    }

    /// Capture before a miss falls through to the repository; pass to the
    /// matching `fill_*` call.
    pub fn generation(&self) -> Generation {
        self.store.generation()
    }

    pub fn reservations(&self, key: &CacheKey) -> Option<Arc<[ReservationRecord]>> {
        match self.lookup(key)? {
            CachedListing::Reservations(items) => Some(items),
            CachedListing::Rooms(_) => self.mismatched(key, "reservations"),
        }
    }

    /// Write back a fetched reservation listing unless an invalidation ran
    /// since `observed`.
    pub fn fill_reservations(
        &self,
        key: CacheKey,
        items: Arc<[ReservationRecord]>,
        observed: Generation,
    ) -> bool {
        self.fill_listing(key, CachedListing::Reservations(items), observed)
    }

    pub fn rooms(&self, key: &CacheKey) -> Option<Arc<[RoomRecord]>> {
        match self.lookup(key)? {
            CachedListing::Rooms(items) => Some(items),
            CachedListing::Reservations(_) => self.mismatched(key, "rooms"),
        }
    }

    pub fn set_rooms(&self, key: CacheKey, items: Arc<[RoomRecord]>) {
        self.store_listing(key, CachedListing::Rooms(items));
    }

    pub fn fill_rooms(&self, key: CacheKey, items: Arc<[RoomRecord]>, observed: Generation) -> bool {
        self.fill_listing(key, CachedListing::Rooms(items), observed)
    }

    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.store.invalidate(key)
    }

    pub fn invalidate_namespace(&self, namespace: Namespace) -> usize {
        self.store.invalidate_namespace(namespace)
    }

    pub fn clear(&self) -> usize {
        self.store.clear()
    }

    pub fn purge_expired(&self) -> usize {
        self.store.purge_expired()
    }

    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }

    fn lookup(&self, key: &CacheKey) -> Option<CachedListing> {
        if !self.config.enabled {
            return None;
        }
        self.store.get(key)
    }

    fn store_listing(&self, key: CacheKey, listing: CachedListing) {
        if !self.config.enabled {
            return;
        }
        let ttl = self.config.ttl_for(key.namespace());
        self.store.set(key, listing, ttl);
    }

    fn fill_listing(&self, key: CacheKey, listing: CachedListing, observed: Generation) -> bool {
        if !self.config.enabled {
            return false;
        }
        let ttl = self.config.ttl_for(key.namespace());
        self.store.set_if_unchanged(key, listing, ttl, observed)
    }

    // Only reachable if a namespace is wired to the wrong listing type.
    fn mismatched<T>(&self, key: &CacheKey, expected: &'static str) -> Option<T> {
        warn!(%key, expected, "cached listing has unexpected type, dropping entry");
        self.store.invalidate(key);
        None
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;
    use crate::cache::clock::ManualClock;
    use crate::domain::identifier::NormalizedId;

    fn company() -> NormalizedId {
        NormalizedId::parse("Acme Corp").expect("identifier")
    }

    fn room(name: &str) -> RoomRecord {
        RoomRecord {
            id: Uuid::new_v4(),
            company_slug: "acme-corp".to_string(),
            name: name.to_string(),
            capacity: 4,
            restricted_to: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn rooms_use_configured_ttl() {
        let clock = Arc::new(ManualClock::new());
        let cache = ListingCache::with_clock(
            CacheConfig {
                company_rooms_ttl: Duration::from_secs(10),
                ..Default::default()
            },
            clock.clone(),
        );
        let key = CacheKey::company_rooms(&company());
        cache.set_rooms(key.clone(), vec![room("Fjord")].into());

        assert_eq!(cache.rooms(&key).map(|r| r.len()), Some(1));
        clock.advance(Duration::from_secs(10));
        assert!(cache.rooms(&key).is_none());
    }

    #[test]
    fn disabled_cache_never_stores() {
        let cache = ListingCache::new(CacheConfig {
            enabled: false,
            ..Default::default()
        });
        let key = CacheKey::company_rooms(&company());
        cache.set_rooms(key.clone(), vec![room("Fjord")].into());

        assert!(cache.rooms(&key).is_none());
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn fill_is_dropped_when_key_was_invalidated_meanwhile() {
        let cache = ListingCache::new(CacheConfig::default());
        let key = CacheKey::company_rooms(&company());
        let observed = cache.generation();

        cache.invalidate(&key);
        assert!(!cache.fill_rooms(key.clone(), vec![room("Fjord")].into(), observed));
        assert!(cache.rooms(&key).is_none());

        let observed = cache.generation();
        assert!(cache.fill_rooms(key.clone(), vec![room("Glacier")].into(), observed));
        assert_eq!(cache.rooms(&key).map(|r| r[0].name.clone()), Some("Glacier".to_string()));
    }

    #[test]
    fn mismatched_listing_reads_as_miss() {
        let cache = ListingCache::new(CacheConfig::default());
        let key = CacheKey::company_rooms(&company());
        cache.set_rooms(key.clone(), vec![room("Fjord")].into());

        assert!(cache.reservations(&key).is_none());
        assert!(cache.rooms(&key).is_none(), "entry should have been dropped");
    }
}
