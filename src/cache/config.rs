//! Cache configuration.
//!
//! Controls the listing cache TTLs and the expiry sweeper via `roombook.toml`.

use std::time::Duration;

use super::keys::Namespace;

const DEFAULT_COMPANY_RESERVATIONS_TTL: Duration = Duration::from_secs(60);
const DEFAULT_USER_RESERVATIONS_TTL: Duration = Duration::from_secs(2 * 60);
const DEFAULT_COMPANY_ROOMS_TTL: Duration = Duration::from_secs(60);
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Listing cache configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// When false every read goes to the repository and nothing is stored.
    pub enabled: bool,
    pub company_reservations_ttl: Duration,
    pub user_reservations_ttl: Duration,
    pub company_rooms_ttl: Duration,
    /// How often expired entries are physically removed.
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            company_reservations_ttl: DEFAULT_COMPANY_RESERVATIONS_TTL,
            user_reservations_ttl: DEFAULT_USER_RESERVATIONS_TTL,
            company_rooms_ttl: DEFAULT_COMPANY_ROOMS_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            company_reservations_ttl: settings.company_reservations_ttl,
            user_reservations_ttl: settings.user_reservations_ttl,
            company_rooms_ttl: settings.company_rooms_ttl,
            sweep_interval: settings.sweep_interval,
        }
    }
}

impl CacheConfig {
    pub fn ttl_for(&self, namespace: Namespace) -> Duration {
        match namespace {
            Namespace::CompanyReservations => self.company_reservations_ttl,
            Namespace::UserReservations => self.user_reservations_ttl,
            Namespace::CompanyRooms => self.company_rooms_ttl,
        }
    }
}
