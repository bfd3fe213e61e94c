//! Media requests through Jellyseerr.

use tracing::{info, instrument};

use super::Assistarr;
use crate::clients::TitleDetails;
use crate::types::{MediaRequestInput, MediaStatus, RequestReceipt};
use crate::{AssistarrError, Result};

/// Why a title cannot be requested, if it cannot.
pub fn request_conflict(details: &TitleDetails) -> Option<String> {
    let title = &details.item.title;
    match details.status {
        Some(MediaStatus::Available) => Some(format!("{title} is already available")),
        Some(MediaStatus::Pending | MediaStatus::Processing) => {
            Some(format!("{title} is already requested"))
        }
        _ if details.has_active_request() => Some(format!("{title} is already requested")),
        _ => None,
    }
}

impl Assistarr {
    /// File a request for a movie or series.
    ///
    /// Requires Jellyseerr. Titles that are already available, already
    /// being processed or already requested yield
    /// [`AssistarrError::Conflict`] and nothing is written.
    #[instrument(skip(self, input), fields(tmdb_id = input.tmdb_id, media_type = %input.media_type))]
    pub async fn request_media(&self, user_id: &str, input: &MediaRequestInput) -> Result<RequestReceipt> {
        let jellyseerr = self.jellyseerr(user_id).await?;
        let details = jellyseerr.details(input.media_type, input.tmdb_id).await?;

        if let Some(reason) = request_conflict(&details) {
            info!(%reason, "request refused");
            return Err(AssistarrError::Conflict(reason));
        }

        let mut receipt = jellyseerr
            .create_request(input.media_type, input.tmdb_id, input.seasons.as_ref())
            .await?;
        receipt.title = Some(details.item.title);
        info!(request_id = receipt.request_id, "media requested");
        Ok(receipt)
    }
}
