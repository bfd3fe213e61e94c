//! qBittorrent Web API v2 client.
//!
//! qBittorrent has no API keys. The stored credential is
//! `username:password`, exchanged for an `SID` session cookie by form
//! login before any other call.

use async_trait::async_trait;
use futures_util::future::join;
use reqwest::Client;
use serde::Deserialize;

use super::http::ServiceClient;
use super::traits::ServiceProbe;
use crate::types::{ServiceName, StalledItem};
use crate::{AssistarrError, Result};

/// Torrent states reported as stalled or failed.
const STALLED_STATES: &[&str] = &["stalledDL", "error", "missingFiles"];

#[derive(Clone)]
pub struct QbittorrentClient {
    http: ServiceClient,
    username: String,
    password: String,
}

impl QbittorrentClient {
    /// `credential` is `username:password`; a missing colon means an
    /// empty password.
    pub fn new(http: Client, base_url: impl AsRef<str>, credential: &str) -> Self {
        Self::from_service_client(
            ServiceClient::new(ServiceName::Qbittorrent, http, base_url, ""),
            credential,
        )
    }

    pub fn from_service_client(http: ServiceClient, credential: &str) -> Self {
        let (username, password) = credential.split_once(':').unwrap_or((credential, ""));
        Self {
            http,
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Log in and return a client carrying the session cookie.
    async fn session(&self, client: &ServiceClient) -> Result<ServiceClient> {
        let reply = client
            .post_form(
                "/api/v2/auth/login",
                &[
                    ("username", self.username.as_str()),
                    ("password", self.password.as_str()),
                ],
            )
            .await?;

        let body = String::from_utf8_lossy(&reply.body);
        if body.trim() != "Ok." {
            return Err(AssistarrError::Upstream {
                service: ServiceName::Qbittorrent,
                status: 401,
                message: "login rejected".to_string(),
            });
        }

        let sid = reply
            .headers
            .get_all(reqwest::header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .find(|pair| pair.trim_start().starts_with("SID="))
            .map(|pair| pair.trim().to_string())
            .ok_or_else(|| AssistarrError::Validation {
                service: ServiceName::Qbittorrent,
                message: "login succeeded without a session cookie".to_string(),
            })?;
        Ok(client.with_session_cookie(sid))
    }

    /// Application version, e.g. `v4.6.2`.
    pub async fn version(&self) -> Result<String> {
        let session = self.session(&self.http.for_health()).await?;
        fetch_version(&session).await
    }

    /// Torrents that stopped downloading or errored.
    pub async fn stalled(&self) -> Result<Vec<StalledItem>> {
        let session = self.session(&self.http).await?;
        fetch_stalled(&session).await
    }

    /// Version and stalled torrents over a single login, bounded by the
    /// health timeout.
    ///
    /// A failed login or version call is the outer error. A failed
    /// torrent listing only fails the inner result.
    pub async fn version_and_stalled(&self) -> Result<(String, Result<Vec<StalledItem>>)> {
        let session = self.session(&self.http.for_health()).await?;
        let (version, stalled) = join(fetch_version(&session), fetch_stalled(&session)).await;
        Ok((version?, stalled))
    }
}

async fn fetch_version(session: &ServiceClient) -> Result<String> {
    Ok(session.get_text("/api/v2/app/version").await?.trim().to_string())
}

async fn fetch_stalled(session: &ServiceClient) -> Result<Vec<StalledItem>> {
    let torrents: Vec<Torrent> = session.get("/api/v2/torrents/info", &[]).await?;
    Ok(torrents
        .into_iter()
        .filter(|t| STALLED_STATES.contains(&t.state.as_str()))
        .map(Torrent::into_stalled)
        .collect())
}

#[async_trait]
impl ServiceProbe for QbittorrentClient {
    fn service(&self) -> ServiceName {
        ServiceName::Qbittorrent
    }

    async fn probe(&self) -> Result<Option<String>> {
        self.version().await.map(Some)
    }
}

#[derive(Debug, Deserialize)]
struct Torrent {
    #[serde(default)]
    name: String,
    #[serde(default)]
    state: String,
    /// 0.0 to 1.0.
    #[serde(default)]
    progress: f64,
}

impl Torrent {
    fn into_stalled(self) -> StalledItem {
        let reason = match self.state.as_str() {
            "stalledDL" => Some("no peers available".to_string()),
            "missingFiles" => Some("files missing on disk".to_string()),
            "error" => Some("torrent reported an error".to_string()),
            _ => None,
        };
        StalledItem {
            service: ServiceName::Qbittorrent,
            title: self.name,
            state: self.state,
            progress: (self.progress * 100.0).clamp(0.0, 100.0),
            reason,
        }
    }
}
