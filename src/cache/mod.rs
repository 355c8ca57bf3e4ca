//! Roombook listing cache.
//!
//! A short-lived, in-process, read-through cache in front of the reservation
//! and room listings:
//!
//! - [`CacheStore`]: generic key → (value, expiry) map with TTL semantics
//! - [`CacheKey`]: typed `{namespace}:{identifier}` keys
//! - [`ListingCache`]: typed facade used by application services
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! company_reservations_ttl_seconds = 60
//! user_reservations_ttl_seconds = 120
//! company_rooms_ttl_seconds = 60
//! sweep_interval_seconds = 300
//! ```

mod clock;
mod config;
mod keys;
mod listing;
mod store;
mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use keys::{CacheKey, KeyError, Namespace};
pub use listing::{CachedListing, ListingCache};
pub use store::{CacheStats, CacheStore, Generation};
pub use sweeper::spawn_sweeper;
