//! The [`Assistarr`] service: config resolution plus the aggregators.
//!
//! Each aggregator lives in its own module as an `impl Assistarr` block:
//!
//! - [`monitor`]: concurrent, fault-isolated status snapshot
//! - [`discovery`]: discovery sections and the staged "For You" feed
//! - [`lookup`]: cross-service metadata lookup with fallback order
//! - [`request`]: media requests with conflict detection
//! - [`settings`]: service config CRUD and connection tests

mod builder;
pub mod discovery;
pub mod lookup;
pub mod monitor;
pub mod request;
pub mod settings;

use std::sync::Arc;

use reqwest::Client;

pub use builder::AssistarrBuilder;
pub use lookup::lookup_order;

use crate::cache::{DiscoveryCacheStore, DiscoveryConfig};
use crate::clients::{
    JellyseerrClient, RadarrClient, ServiceClient, SonarrClient, UpstreamTimeouts,
};
use crate::retry::RetryConfig;
use crate::store::ServiceConfigStore;
use crate::types::{ServiceConfig, ServiceName};
use crate::{AssistarrError, Result};

/// Integration core shared by all requests.
///
/// Cheap to share behind an `Arc`; holds no per-request state apart from
/// the per-user discovery cache.
pub struct Assistarr {
    store: Arc<dyn ServiceConfigStore>,
    http: Client,
    timeouts: UpstreamTimeouts,
    discovery: DiscoveryConfig,
    discovery_cache: DiscoveryCacheStore,
    retry: RetryConfig,
}

impl Assistarr {
    pub fn builder() -> AssistarrBuilder {
        AssistarrBuilder::new()
    }

    pub fn store(&self) -> &Arc<dyn ServiceConfigStore> {
        &self.store
    }

    pub fn discovery_config(&self) -> &DiscoveryConfig {
        &self.discovery
    }

    /// The user's config for `service`, if present and enabled.
    ///
    /// Absent → [`AssistarrError::NotConfigured`], disabled →
    /// [`AssistarrError::ServiceDisabled`].
    pub async fn enabled_config(&self, user_id: &str, service: ServiceName) -> Result<ServiceConfig> {
        match self.store.get(user_id, service).await? {
            Some(config) if config.is_enabled => Ok(config),
            Some(_) => Err(AssistarrError::ServiceDisabled(service)),
            None => Err(AssistarrError::NotConfigured(service)),
        }
    }

    /// HTTP client for a config, with this instance's timeouts.
    pub fn client_for(&self, config: &ServiceConfig) -> ServiceClient {
        ServiceClient::from_config(self.http.clone(), config).with_timeouts(self.timeouts)
    }

    async fn service_client(&self, user_id: &str, service: ServiceName) -> Result<ServiceClient> {
        let config = self.enabled_config(user_id, service).await?;
        Ok(self.client_for(&config))
    }

    pub async fn radarr(&self, user_id: &str) -> Result<RadarrClient> {
        let client = self.service_client(user_id, ServiceName::Radarr).await?;
        Ok(RadarrClient::from_service_client(client))
    }

    pub async fn sonarr(&self, user_id: &str) -> Result<SonarrClient> {
        let client = self.service_client(user_id, ServiceName::Sonarr).await?;
        Ok(SonarrClient::from_service_client(client))
    }

    pub async fn jellyseerr(&self, user_id: &str) -> Result<JellyseerrClient> {
        let client = self.service_client(user_id, ServiceName::Jellyseerr).await?;
        Ok(JellyseerrClient::from_service_client(client))
    }
}

/// Turn "not configured"/"disabled" into `None`, keep real failures.
fn optional<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_configuration() => Ok(None),
        Err(e) => Err(e),
    }
}
