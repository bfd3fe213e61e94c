//! Upstream service identities and per-user service configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AssistarrError, Result};

/// Placeholder returned instead of a stored API key.
///
/// An upsert carrying this value keeps the key already on file.
pub const API_KEY_MASK: &str = "********";

/// One of the self-hosted services Assistarr talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceName {
    Radarr,
    Sonarr,
    Jellyfin,
    Jellyseerr,
    Qbittorrent,
    Portainer,
}

/// How a service expects its credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// API key sent verbatim in the named header.
    Header(&'static str),
    /// `username:password` exchanged for a session cookie by form login.
    SessionCookie,
}

impl ServiceName {
    /// Every known service, in dashboard order.
    pub const ALL: [ServiceName; 6] = [
        ServiceName::Radarr,
        ServiceName::Sonarr,
        ServiceName::Jellyfin,
        ServiceName::Jellyseerr,
        ServiceName::Qbittorrent,
        ServiceName::Portainer,
    ];

    /// Lowercase identifier used in URLs, JSON and the config store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Radarr => "radarr",
            Self::Sonarr => "sonarr",
            Self::Jellyfin => "jellyfin",
            Self::Jellyseerr => "jellyseerr",
            Self::Qbittorrent => "qbittorrent",
            Self::Portainer => "portainer",
        }
    }

    /// Credential scheme for this service.
    pub fn auth(&self) -> AuthScheme {
        match self {
            Self::Radarr | Self::Sonarr | Self::Jellyseerr => AuthScheme::Header("X-Api-Key"),
            Self::Jellyfin => AuthScheme::Header("X-Emby-Token"),
            Self::Portainer => AuthScheme::Header("X-API-Key"),
            Self::Qbittorrent => AuthScheme::SessionCookie,
        }
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceName {
    type Err = AssistarrError;

    fn from_str(s: &str) -> Result<Self> {
        ServiceName::ALL
            .into_iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AssistarrError::InvalidInput(format!("unknown service '{s}'")))
    }
}

/// A user's connection settings for one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    pub user_id: String,
    pub service_name: ServiceName,
    /// Base URL without trailing slash, e.g. `http://radarr:7878`.
    pub base_url: String,
    pub api_key: String,
    pub is_enabled: bool,
}

impl ServiceConfig {
    /// Create an enabled config, normalizing the base URL.
    pub fn new(
        user_id: impl Into<String>,
        service_name: ServiceName,
        base_url: impl AsRef<str>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            service_name,
            base_url: normalize_base_url(base_url.as_ref()),
            api_key: api_key.into(),
            is_enabled: true,
        }
    }

    /// Set the enabled flag.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.is_enabled = enabled;
        self
    }

    /// Copy with the API key replaced by [`API_KEY_MASK`].
    pub fn masked(&self) -> Self {
        let api_key = if self.api_key.is_empty() {
            String::new()
        } else {
            API_KEY_MASK.to_string()
        };
        Self {
            api_key,
            ..self.clone()
        }
    }
}

/// Trim whitespace and trailing slashes so paths can be appended verbatim.
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
