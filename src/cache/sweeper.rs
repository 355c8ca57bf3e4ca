//! Background removal of expired cache entries.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use super::listing::ListingCache;

/// Periodically purge expired entries so keys that are never read again do
/// not accumulate. The first tick is skipped.
pub fn spawn_sweeper(cache: Arc<ListingCache>) -> JoinHandle<()> {
    let period = cache.config().sweep_interval;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = cache.purge_expired();
            debug!(cache = "listing", removed, "swept expired entries");
        }
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::cache::clock::ManualClock;
    use crate::cache::config::CacheConfig;
    use crate::cache::keys::CacheKey;
    use crate::domain::identifier::NormalizedId;

    #[tokio::test(start_paused = true)]
    async fn sweeper_purges_expired_entries() {
        let clock = Arc::new(ManualClock::new());
        let config = CacheConfig {
            sweep_interval: Duration::from_secs(30),
            ..Default::default()
        };
        let cache = Arc::new(ListingCache::with_clock(config, clock.clone()));
        let company = NormalizedId::parse("acme-corp").expect("identifier");
        cache.set_rooms(CacheKey::company_rooms(&company), Vec::new().into());
        assert_eq!(cache.stats().entries, 1);

        let handle = spawn_sweeper(cache.clone());
        clock.advance(Duration::from_secs(61));
        tokio::time::sleep(Duration::from_secs(31)).await;
        tokio::task::yield_now().await;

        assert_eq!(cache.stats().entries, 0);
        handle.abort();
    }
}
