//! Builder for configuring [`Assistarr`] instances.

use std::sync::Arc;

use reqwest::Client;

use super::Assistarr;
use crate::cache::{DiscoveryCacheStore, DiscoveryConfig};
use crate::clients::UpstreamTimeouts;
use crate::retry::RetryConfig;
use crate::store::{MemoryConfigStore, ServiceConfigStore};
use crate::{AssistarrError, Result};

/// Builder for configuring [`Assistarr`] instances.
///
/// ```rust
/// # use assistarr::{Assistarr, DiscoveryConfig, MemoryConfigStore};
/// # use std::sync::Arc;
/// let assistarr = Assistarr::builder()
///     .store(Arc::new(MemoryConfigStore::new()))
///     .discovery(DiscoveryConfig::new().capacity(8))
///     .build()
///     .unwrap();
/// ```
pub struct AssistarrBuilder {
    store: Option<Arc<dyn ServiceConfigStore>>,
    http: Option<Client>,
    timeouts: UpstreamTimeouts,
    discovery: DiscoveryConfig,
    retry: RetryConfig,
}

impl AssistarrBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            http: None,
            timeouts: UpstreamTimeouts::default(),
            discovery: DiscoveryConfig::default(),
            retry: RetryConfig::default(),
        }
    }

    /// Where service configs are read from. Default: an empty in-memory store.
    pub fn store(mut self, store: Arc<dyn ServiceConfigStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Reuse an existing HTTP client (connection pool).
    pub fn http_client(mut self, http: Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Per-call timeouts for upstream data calls and health probes.
    pub fn timeouts(mut self, timeouts: UpstreamTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Rotation cache settings for the "For You" section.
    pub fn discovery(mut self, config: DiscoveryConfig) -> Self {
        self.discovery = config;
        self
    }

    /// Retry policy for discovery fetches.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    pub fn build(self) -> Result<Assistarr> {
        if self.discovery.capacity == 0 {
            return Err(AssistarrError::Configuration(
                "discovery capacity must be at least 1".to_string(),
            ));
        }
        let http = match self.http {
            Some(http) => http,
            None => Client::builder()
                .user_agent(concat!("assistarr/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| {
                    AssistarrError::Configuration(format!("failed to build HTTP client: {e}"))
                })?,
        };
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryConfigStore::new()));

        Ok(Assistarr {
            store,
            http,
            timeouts: self.timeouts,
            discovery_cache: DiscoveryCacheStore::new(&self.discovery),
            discovery: self.discovery,
            retry: self.retry,
        })
    }
}

impl Default for AssistarrBuilder {
    fn default() -> Self {
        Self::new()
    }
}
