//! Status aggregator for the monitor dashboard.
//!
//! One snapshot polls every known service at once. Each poll is
//! fault-isolated: it turns its own failures into an offline status, so
//! the join below never short-circuits and one slow or broken service
//! cannot hide the others. Nothing is retried; the dashboard polls again.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use futures_util::future::{join, join_all};
use tracing::{debug, instrument, warn};

use super::Assistarr;
use crate::Result;
use crate::clients::{
    JellyseerrClient, QbittorrentClient, RadarrClient, SonarrClient, probe_for,
};
use crate::types::{
    MonitorSnapshot, PendingRequest, QueueItem, ServiceConfig, ServiceName, ServiceStatus,
    StalledItem,
};

/// Lists a service contributes beyond its health.
#[derive(Default)]
struct Listings {
    queue: Vec<QueueItem>,
    pending_requests: Vec<PendingRequest>,
    stalled: Vec<StalledItem>,
}

struct Poll {
    service: ServiceName,
    status: ServiceStatus,
    listings: Listings,
}

impl Poll {
    fn without_call(service: ServiceName, status: ServiceStatus) -> Self {
        Self {
            service,
            status,
            listings: Listings::default(),
        }
    }
}

impl Assistarr {
    /// Build a fresh [`MonitorSnapshot`] for `user_id`.
    ///
    /// Only a failure to read the user's configs is an error. Every
    /// upstream failure is reported inline as `online: false`.
    #[instrument(skip(self))]
    pub async fn status_snapshot(&self, user_id: &str) -> Result<MonitorSnapshot> {
        let configs: HashMap<ServiceName, ServiceConfig> = self
            .store
            .list(user_id)
            .await?
            .into_iter()
            .map(|c| (c.service_name, c))
            .collect();

        let polls = join_all(
            ServiceName::ALL
                .into_iter()
                .map(|service| self.poll(service, configs.get(&service))),
        )
        .await;

        let mut snapshot = MonitorSnapshot {
            services: BTreeMap::new(),
            queue: Vec::new(),
            pending_requests: Vec::new(),
            stalled: Vec::new(),
            generated_at: Utc::now(),
        };
        for poll in polls {
            snapshot.services.insert(poll.service, poll.status);
            snapshot.queue.extend(poll.listings.queue);
            snapshot.pending_requests.extend(poll.listings.pending_requests);
            snapshot.stalled.extend(poll.listings.stalled);
        }
        debug!(
            configured = snapshot.configured_count(),
            offline = snapshot.offline_count(),
            "status snapshot assembled"
        );
        Ok(snapshot)
    }

    async fn poll(&self, service: ServiceName, config: Option<&ServiceConfig>) -> Poll {
        let Some(config) = config else {
            return Poll::without_call(service, ServiceStatus::not_configured());
        };
        if !config.is_enabled {
            return Poll::without_call(service, ServiceStatus::disabled());
        }

        let (health, listings) = match service {
            ServiceName::Qbittorrent => self.poll_qbittorrent(config).await,
            _ => {
                let probe = probe_for(self.client_for(config), &config.api_key);
                join(probe.probe(), self.listings(config)).await
            }
        };

        let status = match health {
            Ok(version) => ServiceStatus::online(version),
            Err(e) => {
                warn!(%service, error = %e, "health probe failed");
                ServiceStatus::offline(e.to_string())
            }
        };
        let listings = listings.unwrap_or_else(|e| {
            warn!(%service, error = %e, "listing failed");
            Listings::default()
        });
        Poll {
            service,
            status,
            listings,
        }
    }

    /// Queue and request listings, bounded by the health timeout like the probe.
    async fn listings(&self, config: &ServiceConfig) -> Result<Listings> {
        let client = self.client_for(config).for_health();
        let mut listings = Listings::default();
        match config.service_name {
            ServiceName::Radarr => {
                listings.queue = RadarrClient::from_service_client(client).queue().await?;
            }
            ServiceName::Sonarr => {
                listings.queue = SonarrClient::from_service_client(client).queue().await?;
            }
            ServiceName::Jellyseerr => {
                listings.pending_requests = JellyseerrClient::from_service_client(client)
                    .pending_requests()
                    .await?;
            }
            ServiceName::Qbittorrent | ServiceName::Jellyfin | ServiceName::Portainer => {}
        }
        Ok(listings)
    }

    /// qBittorrent needs a session login; probe and listing share one.
    async fn poll_qbittorrent(
        &self,
        config: &ServiceConfig,
    ) -> (Result<Option<String>>, Result<Listings>) {
        let client = QbittorrentClient::from_service_client(self.client_for(config), &config.api_key);
        match client.version_and_stalled().await {
            Ok((version, stalled)) => (
                Ok(Some(version)),
                stalled.map(|stalled| Listings {
                    stalled,
                    ..Listings::default()
                }),
            ),
            Err(e) => (Err(e), Ok(Listings::default())),
        }
    }
}
