//! Upstream service clients.
//!
//! Every client wraps a [`ServiceClient`], which owns base URL handling,
//! credential injection, timeouts and error mapping. The typed clients only
//! know their service's paths and response shapes, and normalize the
//! latter into this crate's types.

mod arr;
pub mod http;
pub mod jellyfin;
pub mod jellyseerr;
pub mod portainer;
pub mod qbittorrent;
pub mod radarr;
pub mod sonarr;
pub mod traits;

pub use http::{DEFAULT_TIMEOUT, HEALTH_TIMEOUT, ServiceClient, UpstreamTimeouts};
pub use jellyfin::JellyfinClient;
pub use jellyseerr::{JellyseerrClient, TitleDetails};
pub use portainer::PortainerClient;
pub use qbittorrent::QbittorrentClient;
pub use radarr::RadarrClient;
pub use sonarr::SonarrClient;
pub use traits::{ServiceProbe, probe_for};
