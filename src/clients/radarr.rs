//! Radarr v3 API client (movies).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::arr::{ArrImage, QUEUE_PAGE_SIZE, QueuePage, SystemStatus, poster_url};
use super::http::ServiceClient;
use super::traits::ServiceProbe;
use crate::types::{MediaItem, MediaType, QueueItem, ServiceName};
use crate::{AssistarrError, Result};

/// Client for one user's Radarr instance.
#[derive(Clone)]
pub struct RadarrClient {
    http: ServiceClient,
}

impl RadarrClient {
    pub fn new(http: Client, base_url: impl AsRef<str>, api_key: impl Into<String>) -> Self {
        Self::from_service_client(ServiceClient::new(ServiceName::Radarr, http, base_url, api_key))
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
                    ("includeMovie", "true".to_string()),
                ],
            )
            .await?;
        Ok(page
            .records
            .into_iter()
            .map(|r| r.into_item(ServiceName::Radarr))
            .collect())
    }

    /// Every movie in the library.
    pub async fn movies(&self) -> Result<Vec<MediaItem>> {
        let movies: Vec<RadarrMovie> = self.http.get("/api/v3/movie", &[]).await?;
        Ok(movies.into_iter().map(RadarrMovie::into_item).collect())
    }

    /// Metadata for a TMDB id, whether or not it is in the library.
    pub async fn lookup_tmdb(&self, tmdb_id: i64) -> Result<MediaItem> {
        let movie: RadarrMovie = self
            .http
            .get("/api/v3/movie/lookup/tmdb", &[("tmdbId", tmdb_id.to_string())])
            .await?;
        if movie.title.is_empty() {
            return Err(AssistarrError::NotFound(format!("movie tmdb:{tmdb_id}")));
        }
        Ok(movie.into_item())
    }
}

#[async_trait]
impl ServiceProbe for RadarrClient {
    fn service(&self) -> ServiceName {
        ServiceName::Radarr
    }

    async fn probe(&self) -> Result<Option<String>> {
        self.system_status().await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RadarrMovie {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    title: String,
    year: Option<i32>,
    tmdb_id: Option<i64>,
    overview: Option<String>,
    #[serde(default)]
    images: Vec<ArrImage>,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    ratings: Ratings,
    in_cinemas: Option<String>,
    digital_release: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Ratings {
    tmdb: Option<Rating>,
}

#[derive(Debug, Deserialize)]
struct Rating {
    value: f64,
}

impl RadarrMovie {
    fn into_item(self) -> MediaItem {
        let poster_path = poster_url(&self.images);
        // Lookup results not yet in the library have id 0.
        let id = if self.id == 0 {
            self.tmdb_id.unwrap_or_default()
        } else {
            self.id
        };
        let release = self
            .in_cinemas
            .or(self.digital_release)
            .map(|d| d.chars().take(10).collect::<String>());

        let mut item = MediaItem::new(id, MediaType::Movie, self.title, ServiceName::Radarr);
        item.tmdb_id = self.tmdb_id.filter(|t| *t > 0);
        item.year = self.year.filter(|y| *y > 0);
        item.overview = self.overview;
        item.poster_path = poster_path;
        item.vote_average = self.ratings.tmdb.map(|r| r.value);
        item.genres = self.genres;
        item.with_release_date(release)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movie_normalizes() {
        let movie: RadarrMovie = serde_json::from_str(
            r#"{"id": 12, "title": "Heat", "year": 1995, "tmdbId": 949,
                "images": [{"coverType": "poster", "remoteUrl": "https://img/heat.jpg"}],
                "genres": ["Crime"], "ratings": {"tmdb": {"value": 7.9, "votes": 10}},
                "inCinemas": "1995-12-15T00:00:00Z", "monitored": true}"#,
        )
        .unwrap();
        let item = movie.into_item();
        assert_eq!(item.id, 12);
        assert_eq!(item.tmdb_id, Some(949));
        assert_eq!(item.year, Some(1995));
        assert_eq!(item.release_date.as_deref(), Some("1995-12-15"));
        assert_eq!(item.poster_path.as_deref(), Some("https://img/heat.jpg"));
        assert_eq!(item.vote_average, Some(7.9));
        assert_eq!(item.source, ServiceName::Radarr);
    }

    #[test]
    fn lookup_result_without_library_id_uses_tmdb() {
        let movie: RadarrMovie =
            serde_json::from_str(r#"{"title": "Alien", "tmdbId": 348, "year": 1979}"#).unwrap();
        assert_eq!(movie.into_item().id, 348);
    }
}
