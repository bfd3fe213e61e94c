//! Health probe seam shared by every service client.

use async_trait::async_trait;

use super::{
    JellyfinClient, JellyseerrClient, PortainerClient, QbittorrentClient, RadarrClient,
    ServiceClient, SonarrClient,
};
use crate::Result;
use crate::types::ServiceName;

/// A service that can report whether it is reachable.
///
/// Implementations bound the probe by the client's health timeout
/// ([`HEALTH_TIMEOUT`](super::HEALTH_TIMEOUT) unless overridden) and never
/// retry.
#[async_trait]
pub trait ServiceProbe: Send + Sync {
    fn service(&self) -> ServiceName;

    /// Succeeds when the service answered; carries its version when reported.
    async fn probe(&self) -> Result<Option<String>>;
}

/// Build the probe for `client`'s service.
///
/// `api_key` is the stored credential; only qBittorrent needs it here,
/// every other service already carries it in `client`.
pub fn probe_for(client: ServiceClient, api_key: &str) -> Box<dyn ServiceProbe> {
    match client.service() {
        ServiceName::Radarr => Box::new(RadarrClient::from_service_client(client)),
        ServiceName::Sonarr => Box::new(SonarrClient::from_service_client(client)),
        ServiceName::Jellyfin => Box::new(JellyfinClient::from_service_client(client)),
        ServiceName::Jellyseerr => Box::new(JellyseerrClient::from_service_client(client)),
        ServiceName::Qbittorrent => {
            Box::new(QbittorrentClient::from_service_client(client, api_key))
        }
        ServiceName::Portainer => Box::new(PortainerClient::from_service_client(client)),
    }
}
