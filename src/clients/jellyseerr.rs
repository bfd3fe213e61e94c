//! Jellyseerr v1 API client.
//!
//! Jellyseerr proxies TMDB for discovery, tracks availability of titles in
//! the media server and owns the request workflow. Discovery results are a
//! mix of movies, series and people, told apart by `mediaType`; they are
//! decoded into a tagged union and anything that is not a movie or series
//! is dropped during normalization.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::http::ServiceClient;
use super::traits::ServiceProbe;
use crate::Result;
use crate::types::{
    MediaItem, MediaStatus, MediaType, PendingRequest, RequestReceipt, RequestStatus,
    SeasonSelection, ServiceName,
};

/// Pending requests fetched for the monitor dashboard.
const PENDING_TAKE: u32 = 20;

#[derive(Clone)]
pub struct JellyseerrClient {
    http: ServiceClient,
}

impl JellyseerrClient {
    pub fn new(http: Client, base_url: impl AsRef<str>, api_key: impl Into<String>) -> Self {
        Self::from_service_client(ServiceClient::new(
            ServiceName::Jellyseerr,
            http,
            base_url,
            api_key,
        ))
    }

    pub fn from_service_client(http: ServiceClient) -> Self {
        Self { http }
    }

    /// `GET /api/v1/status`, bounded by the health timeout.
    pub async fn status(&self) -> Result<Option<String>> {
        let status: StatusResponse = self
            .http
            .for_health()
            .get("/api/v1/status", &[])
            .await?;
        Ok(status.version)
    }

    /// Trending movies and series.
    pub async fn trending(&self) -> Result<Vec<MediaItem>> {
        self.discover("/api/v1/discover/trending").await
    }

    pub async fn popular_movies(&self) -> Result<Vec<MediaItem>> {
        self.discover("/api/v1/discover/movies").await
    }

    pub async fn popular_tv(&self) -> Result<Vec<MediaItem>> {
        self.discover("/api/v1/discover/tv").await
    }

    /// Titles TMDB recommends for a given title.
    pub async fn recommendations(&self, media_type: MediaType, tmdb_id: i64) -> Result<Vec<MediaItem>> {
        let path = format!("/api/v1/{media_type}/{tmdb_id}/recommendations");
        self.discover(&path).await
    }

    async fn discover(&self, path: &str) -> Result<Vec<MediaItem>> {
        let page: DiscoverPage = self.http.get(path, &[("page", "1".to_string())]).await?;
        Ok(page
            .results
            .into_iter()
            .filter_map(DiscoverResult::into_item)
            .collect())
    }

    /// Movie or series details, including availability.
    pub async fn details(&self, media_type: MediaType, tmdb_id: i64) -> Result<TitleDetails> {
        let path = format!("/api/v1/{media_type}/{tmdb_id}");
        let raw: RawDetails = self.http.get(&path, &[]).await?;
        Ok(raw.into_details(media_type))
    }

    /// Requests waiting for approval.
    pub async fn pending_requests(&self) -> Result<Vec<PendingRequest>> {
        let page: RequestPage = self
            .http
            .get(
                "/api/v1/request",
                &[
                    ("filter", "pending".to_string()),
                    ("take", PENDING_TAKE.to_string()),
                    ("sort", "added".to_string()),
                ],
            )
            .await?;
        Ok(page.results.into_iter().map(RawRequest::into_pending).collect())
    }

    /// `POST /api/v1/request`.
    pub async fn create_request(
        &self,
        media_type: MediaType,
        tmdb_id: i64,
        seasons: Option<&SeasonSelection>,
    ) -> Result<RequestReceipt> {
        let body = CreateRequest {
            media_type,
            media_id: tmdb_id,
            seasons: match media_type {
                MediaType::Tv => Some(seasons.cloned().unwrap_or_default()),
                MediaType::Movie => None,
            },
        };
        let created: RawRequest = self.http.post("/api/v1/request", &body).await?;
        Ok(RequestReceipt {
            request_id: created.id,
            status: RequestStatus::from(created.status),
            tmdb_id: created.media.and_then(|m| m.tmdb_id).unwrap_or(tmdb_id),
            media_type,
            title: None,
        })
    }
}

#[async_trait]
impl ServiceProbe for JellyseerrClient {
    fn service(&self) -> ServiceName {
        ServiceName::Jellyseerr
    }

    async fn probe(&self) -> Result<Option<String>> {
        self.status().await
    }
}

/// What Jellyseerr knows about one title.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleDetails {
    pub item: MediaItem,
    /// `None` when Jellyseerr has never seen the title in the media server.
    pub status: Option<MediaStatus>,
    /// Statuses of requests already filed for the title.
    pub requests: Vec<RequestStatus>,
}

impl TitleDetails {
    /// Whether any filed request is still pending or approved.
    pub fn has_active_request(&self) -> bool {
        self.requests.iter().any(RequestStatus::is_active)
    }
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DiscoverPage {
    #[serde(default)]
    results: Vec<DiscoverResult>,
}

/// One entry of a discovery page, tagged by `mediaType`.
#[derive(Debug, Deserialize)]
#[serde(tag = "mediaType", rename_all = "lowercase")]
enum DiscoverResult {
    Movie(MovieResult),
    Tv(TvResult),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MovieResult {
    id: i64,
    #[serde(default)]
    title: String,
    release_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    vote_average: Option<f64>,
    #[serde(default)]
    genre_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TvResult {
    id: i64,
    #[serde(default)]
    name: String,
    first_air_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    vote_average: Option<f64>,
    #[serde(default)]
    genre_ids: Vec<i64>,
}

impl DiscoverResult {
    /// Normalize, dropping people and titles without a name.
    fn into_item(self) -> Option<MediaItem> {
        let item = match self {
            Self::Movie(m) => title_item(
                m.id,
                m.title,
                m.release_date,
                m.overview,
                m.poster_path,
                m.vote_average,
                &m.genre_ids,
                MediaType::Movie,
            ),
            Self::Tv(t) => title_item(
                t.id,
                t.name,
                t.first_air_date,
                t.overview,
                t.poster_path,
                t.vote_average,
                &t.genre_ids,
                MediaType::Tv,
            ),
            Self::Other => return None,
        };
        (!item.title.is_empty()).then_some(item)
    }
}

#[allow(clippy::too_many_arguments)]
fn title_item(
    tmdb_id: i64,
    title: String,
    date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    vote_average: Option<f64>,
    genre_ids: &[i64],
    media_type: MediaType,
) -> MediaItem {
    let mut item = MediaItem::new(tmdb_id, media_type, title, ServiceName::Jellyseerr)
        .with_tmdb_id(tmdb_id)
        .with_release_date(date);
    item.overview = overview.filter(|o| !o.is_empty());
    item.poster_path = poster_path;
    item.vote_average = vote_average;
    item.genres = genre_ids.iter().filter_map(|id| genre_name(*id)).map(str::to_owned).collect();
    item
}

/// TMDB genre ids, movie and TV lists combined.
fn genre_name(id: i64) -> Option<&'static str> {
    Some(match id {
        28 => "Action",
        12 => "Adventure",
        16 => "Animation",
        35 => "Comedy",
        80 => "Crime",
        99 => "Documentary",
        18 => "Drama",
        10751 => "Family",
        14 => "Fantasy",
        36 => "History",
        27 => "Horror",
        10402 => "Music",
        9648 => "Mystery",
        10749 => "Romance",
        878 => "Science Fiction",
        10770 => "TV Movie",
        53 => "Thriller",
        10752 => "War",
        37 => "Western",
        10759 => "Action & Adventure",
        10762 => "Kids",
        10763 => "News",
        10764 => "Reality",
        10765 => "Sci-Fi & Fantasy",
        10766 => "Soap",
        10767 => "Talk",
        10768 => "War & Politics",
        _ => return None,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDetails {
    id: i64,
    title: Option<String>,
    name: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    vote_average: Option<f64>,
    #[serde(default)]
    genres: Vec<Genre>,
    media_info: Option<MediaInfo>,
}

#[derive(Debug, Deserialize)]
struct Genre {
    name: String,
}

#[derive(Debug, Deserialize)]
struct MediaInfo {
    status: Option<MediaStatus>,
    #[serde(default)]
    requests: Vec<RequestRef>,
}

#[derive(Debug, Deserialize)]
struct RequestRef {
    status: u8,
}

impl RawDetails {
    fn into_details(self, media_type: MediaType) -> TitleDetails {
        let (title, date) = match media_type {
            MediaType::Movie => (self.title.or(self.name), self.release_date),
            MediaType::Tv => (self.name.or(self.title), self.first_air_date),
        };
        let mut item = MediaItem::new(
            self.id,
            media_type,
            title.unwrap_or_default(),
            ServiceName::Jellyseerr,
        )
        .with_tmdb_id(self.id)
        .with_release_date(date);
        item.overview = self.overview.filter(|o| !o.is_empty());
        item.poster_path = self.poster_path;
        item.vote_average = self.vote_average;
        item.genres = self.genres.into_iter().map(|g| g.name).collect();

        let (status, requests) = match self.media_info {
            Some(info) => (
                info.status,
                info.requests
                    .into_iter()
                    .map(|r| RequestStatus::from(r.status))
                    .collect(),
            ),
            None => (None, Vec::new()),
        };
        TitleDetails {
            item,
            status,
            requests,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RequestPage {
    #[serde(default)]
    results: Vec<RawRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRequest {
    id: i64,
    #[serde(default)]
    status: u8,
    #[serde(rename = "type")]
    kind: Option<MediaType>,
    media: Option<RequestMedia>,
    requested_by: Option<RequestUser>,
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestMedia {
    tmdb_id: Option<i64>,
    media_type: Option<MediaType>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestUser {
    display_name: Option<String>,
    email: Option<String>,
}

impl RawRequest {
    fn into_pending(self) -> PendingRequest {
        let media_type = self
            .kind
            .or_else(|| self.media.as_ref().and_then(|m| m.media_type))
            .unwrap_or(MediaType::Movie);
        PendingRequest {
            id: self.id,
            media_type,
            tmdb_id: self.media.and_then(|m| m.tmdb_id),
            requested_by: self.requested_by.and_then(|u| u.display_name.or(u.email)),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest {
    media_type: MediaType,
    media_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    seasons: Option<SeasonSelection>,
}
