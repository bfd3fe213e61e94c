//! Cross-service media lookup.

use tracing::{debug, instrument, warn};

use super::Assistarr;
use crate::types::{LookupQuery, MediaDetails, MediaType, ServiceName};
use crate::{AssistarrError, Result};

/// Services asked for metadata, in order.
///
/// Movies go to Jellyseerr first unless the caller found the title in
/// Radarr. Series always go to Jellyseerr first; the source hint does not
/// apply to them.
pub fn lookup_order(media_type: MediaType, source: Option<ServiceName>) -> [ServiceName; 2] {
    match (media_type, source) {
        (MediaType::Movie, Some(ServiceName::Radarr)) => [ServiceName::Radarr, ServiceName::Jellyseerr],
        (MediaType::Movie, _) => [ServiceName::Jellyseerr, ServiceName::Radarr],
        (MediaType::Tv, _) => [ServiceName::Jellyseerr, ServiceName::Sonarr],
    }
}

impl Assistarr {
    /// Metadata for one title from the first provider that answers.
    ///
    /// Providers that are not configured or disabled are skipped, as are
    /// providers that fail. When every configured provider fails the last
    /// error is returned; a 404 from the last one becomes
    /// [`AssistarrError::NotFound`].
    #[instrument(skip(self))]
    pub async fn lookup(&self, user_id: &str, query: &LookupQuery) -> Result<MediaDetails> {
        let mut last_err = None;
        for service in lookup_order(query.media_type, query.source) {
            match self.lookup_from(user_id, service, query).await {
                Ok(details) => return Ok(details),
                Err(e) if e.is_configuration() => {
                    debug!(%service, "lookup provider unavailable, skipping");
                }
                Err(e @ AssistarrError::Store(_)) => return Err(e),
                Err(e) => {
                    warn!(%service, error = %e, "lookup provider failed");
                    last_err = Some(e);
                }
            }
        }
        match last_err {
            Some(AssistarrError::Upstream { status: 404, .. }) | Some(AssistarrError::NotFound(_)) => Err(
                AssistarrError::NotFound(format!("{} tmdb:{}", query.media_type, query.tmdb_id)),
            ),
            Some(e) => Err(e),
            None => Err(AssistarrError::NoService("media lookup")),
        }
    }

    async fn lookup_from(
        &self,
        user_id: &str,
        service: ServiceName,
        query: &LookupQuery,
    ) -> Result<MediaDetails> {
        match service {
            ServiceName::Jellyseerr => {
                let details = self
                    .jellyseerr(user_id)
                    .await?
                    .details(query.media_type, query.tmdb_id)
                    .await?;
                Ok(MediaDetails {
                    item: details.item,
                    status: details.status,
                })
            }
            ServiceName::Radarr => {
                let item = self.radarr(user_id).await?.lookup_tmdb(query.tmdb_id).await?;
                Ok(MediaDetails { item, status: None })
            }
            ServiceName::Sonarr => {
                let item = self.sonarr(user_id).await?.lookup_tmdb(query.tmdb_id).await?;
                Ok(MediaDetails { item, status: None })
            }
            other => Err(AssistarrError::InvalidInput(format!(
                "{other} does not provide media lookup"
            ))),
        }
    }
}
