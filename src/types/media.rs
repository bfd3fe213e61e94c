//! Normalized media items and discovery sections.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cache::IdentityKey;
use crate::types::ServiceName;
use crate::{AssistarrError, Result};

/// Movie or TV series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = AssistarrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" | "movies" => Ok(Self::Movie),
            "tv" | "series" | "show" => Ok(Self::Tv),
            other => Err(AssistarrError::InvalidInput(format!(
                "unknown media type '{other}'"
            ))),
        }
    }
}

/// Availability of a title as tracked by Jellyseerr (`mediaInfo.status`).
///
/// Deserializes from Jellyseerr's numeric codes as well as from the
/// snake_case names this crate serializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "StatusRepr")]
pub enum MediaStatus {
    Unknown,
    Pending,
    Processing,
    PartiallyAvailable,
    Available,
    Blacklisted,
    Deleted,
}

impl From<u8> for MediaStatus {
    fn from(code: u8) -> Self {
        match code {
            2 => Self::Pending,
            3 => Self::Processing,
            4 => Self::PartiallyAvailable,
            5 => Self::Available,
            6 => Self::Blacklisted,
            7 => Self::Deleted,
            _ => Self::Unknown,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StatusRepr {
    Code(u8),
    Name(String),
}

impl From<StatusRepr> for MediaStatus {
    fn from(repr: StatusRepr) -> Self {
        match repr {
            StatusRepr::Code(code) => code.into(),
            StatusRepr::Name(name) => match name.as_str() {
                "pending" => Self::Pending,
                "processing" => Self::Processing,
                "partially_available" => Self::PartiallyAvailable,
                "available" => Self::Available,
                "blacklisted" => Self::Blacklisted,
                "deleted" => Self::Deleted,
                _ => Self::Unknown,
            },
        }
    }
}

/// One recommendation or lookup result, in the shape every section shares.
///
/// `poster_path` is either a TMDB-relative path (`/abc.jpg`, from
/// Jellyseerr) or an absolute URL (from Radarr/Sonarr image lists).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    /// Stable identifier within the source service.
    pub id: i64,
    pub tmdb_id: Option<i64>,
    pub media_type: MediaType,
    pub title: String,
    pub year: Option<i32>,
    pub release_date: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub source: ServiceName,
}

impl MediaItem {
    /// Start an item with only the required fields set.
    pub fn new(id: i64, media_type: MediaType, title: impl Into<String>, source: ServiceName) -> Self {
        Self {
            id,
            tmdb_id: None,
            media_type,
            title: title.into(),
            year: None,
            release_date: None,
            overview: None,
            poster_path: None,
            vote_average: None,
            genres: Vec::new(),
            source,
        }
    }

    pub fn with_tmdb_id(mut self, tmdb_id: i64) -> Self {
        self.tmdb_id = Some(tmdb_id);
        self
    }

    /// Set the release date and derive `year` from its first four digits.
    pub fn with_release_date(mut self, date: Option<String>) -> Self {
        let date = date.filter(|d| !d.is_empty());
        if self.year.is_none() {
            self.year = date.as_deref().and_then(year_of);
        }
        self.release_date = date;
        self
    }
}

impl IdentityKey for MediaItem {
    /// `tmdb:<type>:<id>` when known, otherwise `<source>:<id>`.
    fn identity_key(&self) -> String {
        match self.tmdb_id {
            Some(tmdb) => format!("tmdb:{}:{tmdb}", self.media_type),
            None => format!("{}:{}", self.source, self.id),
        }
    }
}

fn year_of(date: &str) -> Option<i32> {
    date.get(..4)?.parse().ok()
}

/// Identifier of a discovery section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionId {
    Trending,
    PopularMovies,
    PopularTv,
    ForYou,
}

impl SectionId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trending => "trending",
            Self::PopularMovies => "popular-movies",
            Self::PopularTv => "popular-tv",
            Self::ForYou => "for-you",
        }
    }

    /// Heading shown above the section.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Trending => "Trending Now",
            Self::PopularMovies => "Popular Movies",
            Self::PopularTv => "Popular TV",
            Self::ForYou => "For You",
        }
    }
}

/// A named row of normalized items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    pub items: Vec<MediaItem>,
}

impl Section {
    pub fn new(id: SectionId, items: Vec<MediaItem>) -> Self {
        Self {
            id,
            title: id.title().to_string(),
            items,
        }
    }

    /// A section with no items, used when its source is unavailable.
    pub fn empty(id: SectionId) -> Self {
        Self::new(id, Vec::new())
    }
}

/// A lookup result: the normalized item plus what Jellyseerr knows about
/// its availability, when Jellyseerr answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDetails {
    #[serde(flatten)]
    pub item: MediaItem,
    pub status: Option<MediaStatus>,
}
