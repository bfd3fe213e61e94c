//! Sonarr v3 API client (series).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::arr::{ArrImage, QUEUE_PAGE_SIZE, QueuePage, SystemStatus, poster_url};
use super::http::ServiceClient;
use super::traits::ServiceProbe;
use crate::types::{MediaItem, MediaType, QueueItem, ServiceName};
use crate::{AssistarrError, Result};

/// Client for one user's Sonarr instance.
#[derive(Clone)]
pub struct SonarrClient {
    http: ServiceClient,
}

impl SonarrClient {
    pub fn new(http: Client, base_url: impl AsRef<str>, api_key: impl Into<String>) -> Self {
        Self::from_service_client(ServiceClient::new(ServiceName::Sonarr, http, base_url, api_key))
    }

    pub fn from_service_client(http: ServiceClient) -> Self {
        Self { http }
    }

    /// `GET /api/v3/system/status`, bounded by the health timeout.
    pub async fn system_status(&self) -> Result<Option<String>> {
        let status: SystemStatus = self
            .http
            .for_health()
            .get("/api/v3/system/status", &[])
            .await?;
        Ok(status.version)
    }

    /// First page of the download queue.
    pub async fn queue(&self) -> Result<Vec<QueueItem>> {
        let page: QueuePage = self
            .http
            .get(
                "/api/v3/queue",
                &[
                    ("page", "1".to_string()),
                    ("pageSize", QUEUE_PAGE_SIZE.to_string()),
                    ("includeSeries", "true".to_string()),
                ],
            )
            .await?;
        Ok(page
            .records
            .into_iter()
            .map(|r| r.into_item(ServiceName::Sonarr))
            .collect())
    }

    /// Every series in the library.
    pub async fn series(&self) -> Result<Vec<MediaItem>> {
        let series: Vec<SonarrSeries> = self.http.get("/api/v3/series", &[]).await?;
        Ok(series.into_iter().map(SonarrSeries::into_item).collect())
    }

    /// Metadata for a TMDB id via Sonarr's term search.
    ///
    /// Only a result carrying the requested id counts as a match; other
    /// search hits yield [`AssistarrError::NotFound`].
    pub async fn lookup_tmdb(&self, tmdb_id: i64) -> Result<MediaItem> {
        let results: Vec<SonarrSeries> = self
            .http
            .get("/api/v3/series/lookup", &[("term", format!("tmdb:{tmdb_id}"))])
            .await?;
        results
            .into_iter()
            .find(|s| s.tmdb_id == Some(tmdb_id))
            .map(SonarrSeries::into_item)
            .ok_or_else(|| AssistarrError::NotFound(format!("series tmdb:{tmdb_id}")))
    }
}

#[async_trait]
impl ServiceProbe for SonarrClient {
    fn service(&self) -> ServiceName {
        ServiceName::Sonarr
    }

    async fn probe(&self) -> Result<Option<String>> {
        self.system_status().await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SonarrSeries {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    title: String,
    year: Option<i32>,
    tvdb_id: Option<i64>,
    tmdb_id: Option<i64>,
    overview: Option<String>,
    #[serde(default)]
    images: Vec<ArrImage>,
    #[serde(default)]
    genres: Vec<String>,
    ratings: Option<SeriesRating>,
    first_aired: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeriesRating {
    value: f64,
}

impl SonarrSeries {
    fn into_item(self) -> MediaItem {
        let poster_path = poster_url(&self.images);
        let id = if self.id == 0 {
            self.tvdb_id.unwrap_or_default()
        } else {
            self.id
        };
        let first_aired = self.first_aired.map(|d| d.chars().take(10).collect::<String>());

        let mut item = MediaItem::new(id, MediaType::Tv, self.title, ServiceName::Sonarr);
        item.tmdb_id = self.tmdb_id.filter(|t| *t > 0);
        item.year = self.year.filter(|y| *y > 0);
        item.overview = self.overview;
        item.poster_path = poster_path;
        item.vote_average = self.ratings.map(|r| r.value);
        item.genres = self.genres;
        item.with_release_date(first_aired)
    }
}
