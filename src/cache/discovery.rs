//! Per-user discovery cache.
//!
//! Holds one [`CacheState<MediaItem>`] per user id. The state itself is an
//! immutable value: readers clone it out, run the pure rotation functions
//! and put the result back. Two concurrent refills for the same user may
//! race; the later write wins, which at worst drops one batch of
//! recommendations that the next request fetches again.

use std::time::Duration;

use moka::sync::Cache;

use crate::cache::CacheState;
use crate::telemetry;
use crate::types::MediaItem;

/// Configuration for the "For You" rotation cache.
///
/// ```rust
/// # use assistarr::DiscoveryConfig;
/// # use std::time::Duration;
/// let config = DiscoveryConfig::new()
///     .capacity(12)
///     .target(4)
///     .fresh_max_age(Duration::from_secs(300));
/// ```
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Items held per user. Default: 6.
    pub capacity: usize,
    /// Fresh items to collect before a refill cycle stops fetching. Default: 3.
    pub target: usize,
    /// How long a refill cycle lasts before held items count as stale.
    /// Default: 2 minutes.
    pub fresh_max_age: Duration,
    /// Maximum number of users with cached state. Default: 10,000.
    pub max_users: u64,
    /// Drop a user's state after this long without access. Default: 1 hour.
    pub idle: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            capacity: 6,
            target: 3,
            fresh_max_age: Duration::from_secs(120),
            max_users: 10_000,
            idle: Duration::from_secs(3600),
        }
    }
}

impl DiscoveryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capacity(mut self, n: usize) -> Self {
        self.capacity = n;
        self
    }

    /// Clamped to `capacity` when used.
    pub fn target(mut self, n: usize) -> Self {
        self.target = n;
        self
    }

    pub fn fresh_max_age(mut self, age: Duration) -> Self {
        self.fresh_max_age = age;
        self
    }

    pub fn max_users(mut self, n: u64) -> Self {
        self.max_users = n;
        self
    }

    pub fn idle(mut self, idle: Duration) -> Self {
        self.idle = idle;
        self
    }

    /// Target never exceeds capacity, otherwise a cycle could never finish.
    pub fn effective_target(&self) -> usize {
        self.target.min(self.capacity)
    }
}

/// Thread-safe per-user store of rotation cache state.
pub struct DiscoveryCacheStore {
    cache: Cache<String, CacheState<MediaItem>>,
    capacity: usize,
}

impl DiscoveryCacheStore {
    pub fn new(config: &DiscoveryConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_users)
            .time_to_idle(config.idle)
            .build();
        Self {
            cache,
            capacity: config.capacity,
        }
    }

    /// Current state for `user_id`, or an empty one.
    pub fn get(&self, user_id: &str) -> CacheState<MediaItem> {
        match self.cache.get(user_id) {
            Some(state) => {
                metrics::counter!(telemetry::DISCOVERY_CACHE_HITS_TOTAL).increment(1);
                state
            }
            None => {
                metrics::counter!(telemetry::DISCOVERY_CACHE_MISSES_TOTAL).increment(1);
                CacheState::new(self.capacity)
            }
        }
    }

    /// Replace the state for `user_id`.
    pub fn put(&self, user_id: &str, state: CacheState<MediaItem>) {
        self.cache.insert(user_id.to_string(), state);
    }

    /// Forget the state for `user_id`, e.g. after its settings changed.
    pub fn invalidate(&self, user_id: &str) {
        self.cache.invalidate(user_id);
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.cache.contains_key(user_id)
    }
}
