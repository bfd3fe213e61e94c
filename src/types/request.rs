//! Media request, lookup and settings payloads exchanged with the web app.

use serde::{Deserialize, Serialize};

use crate::types::{MediaType, ServiceName};

/// Header carrying the authenticated user id from the web app to assistarrd.
pub const USER_HEADER: &str = "x-assistarr-user";

/// Which seasons of a series to request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SeasonSelection {
    #[default]
    All,
    Numbers(Vec<u32>),
}

impl Serialize for SeasonSelection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_str("all"),
            Self::Numbers(numbers) => numbers.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for SeasonSelection {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Word(String),
            Numbers(Vec<u32>),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Word(word) if word.eq_ignore_ascii_case("all") => Ok(Self::All),
            Repr::Word(word) => Err(serde::de::Error::custom(format!(
                "expected \"all\" or a list of season numbers, got \"{word}\""
            ))),
            Repr::Numbers(numbers) => Ok(Self::Numbers(numbers)),
        }
    }
}

/// Body of `POST /api/media/request`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRequestInput {
    pub tmdb_id: i64,
    pub media_type: MediaType,
    /// Ignored for movies. Defaults to all seasons for series.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasons: Option<SeasonSelection>,
}

/// Jellyseerr request lifecycle (`MediaRequest.status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "u8")]
pub enum RequestStatus {
    PendingApproval,
    Approved,
    Declined,
    Failed,
    Completed,
    Unknown,
}

impl From<u8> for RequestStatus {
    fn from(code: u8) -> Self {
        match code {
            1 => Self::PendingApproval,
            2 => Self::Approved,
            3 => Self::Declined,
            4 => Self::Failed,
            5 => Self::Completed,
            _ => Self::Unknown,
        }
    }
}

impl RequestStatus {
    /// A request in this state still blocks a new one for the same title.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::PendingApproval | Self::Approved)
    }
}

/// What `POST /api/media/request` returns on success.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestReceipt {
    pub request_id: i64,
    pub status: RequestStatus,
    pub tmdb_id: i64,
    pub media_type: MediaType,
    pub title: Option<String>,
}

/// Query of `GET /api/media/lookup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupQuery {
    pub tmdb_id: i64,
    pub media_type: MediaType,
    /// Service the caller found the title through, if any.
    #[serde(default)]
    pub source: Option<ServiceName>,
}

/// Body of `POST /api/settings` and `POST /api/settings/test`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfigInput {
    pub service_name: ServiceName,
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Outcome of a connectivity test. Never an error: failures are reported
/// inline so the settings form can show them next to the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTest {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seasons_all_or_list() {
        let all: SeasonSelection = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(all, SeasonSelection::All);
        let some: SeasonSelection = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(some, SeasonSelection::Numbers(vec![1, 2]));
        assert!(serde_json::from_str::<SeasonSelection>("\"some\"").is_err());

        assert_eq!(serde_json::to_string(&SeasonSelection::All).unwrap(), "\"all\"");
    }

    #[test]
    fn request_input_from_camel_case() {
        let input: MediaRequestInput =
            serde_json::from_str(r#"{"tmdbId": 603, "mediaType": "movie"}"#).unwrap();
        assert_eq!(input.tmdb_id, 603);
        assert_eq!(input.media_type, MediaType::Movie);
        assert!(input.seasons.is_none());
    }

    #[test]
    fn request_status_activity() {
        assert!(RequestStatus::from(1).is_active());
        assert!(RequestStatus::from(2).is_active());
        assert!(!RequestStatus::from(3).is_active());
        assert!(!RequestStatus::from(5).is_active());
    }

    #[test]
    fn config_input_defaults_enabled() {
        let input: ServiceConfigInput =
            serde_json::from_str(r#"{"serviceName": "radarr", "baseUrl": "http://r"}"#).unwrap();
        assert!(input.is_enabled);
        assert_eq!(input.api_key, "");
    }
}
