//! Assistarr - integration core for a self-hosted media assistant
//!
//! This crate talks to the services of a home media stack (Radarr, Sonarr,
//! Jellyfin, Jellyseerr, qBittorrent and Portainer) on behalf of a user,
//! using per-user connection settings, and aggregates their answers into
//! the views the web app renders:
//!
//! - a status snapshot of every service plus download queues, pending
//!   requests and stalled torrents
//! - discovery sections, including a rotating "For You" feed
//! - metadata lookup across services and conflict-checked media requests
//!
//! Upstream failures never take a whole view down: each service is polled
//! independently and reported inline.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use assistarr::{Assistarr, MemoryConfigStore, ServiceConfig, ServiceName};
//!
//! #[tokio::main]
//! async fn main() -> assistarr::Result<()> {
//!     let store = MemoryConfigStore::with_configs([ServiceConfig::new(
//!         "alice",
//!         ServiceName::Radarr,
//!         "http://radarr:7878",
//!         "radarr-api-key",
//!     )]);
//!     let assistarr = Assistarr::builder().store(Arc::new(store)).build()?;
//!
//!     let snapshot = assistarr.status_snapshot("alice").await?;
//!     for (service, status) in &snapshot.services {
//!         println!("{service}: online={}", status.online);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
#[cfg(feature = "client")]
pub mod client;
pub mod clients;
pub mod error;
pub mod gateway;
pub mod retry;
#[cfg(feature = "server")]
pub mod server;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod version;

pub use cache::DiscoveryConfig;
pub use clients::UpstreamTimeouts;
pub use error::{AssistarrError, Result};
pub use gateway::{Assistarr, AssistarrBuilder};
pub use retry::RetryConfig;
pub use store::{FileConfigStore, MemoryConfigStore, ServiceConfigStore};
pub use version::{PKG_VERSION, version_string};

pub use types::{
    API_KEY_MASK, ConnectionTest, LookupQuery, MediaDetails, MediaItem, MediaRequestInput,
    MediaStatus, MediaType, MonitorSnapshot, PendingRequest, QueueItem, RequestReceipt,
    RequestStatus, SeasonSelection, Section, SectionId, ServiceConfig, ServiceConfigInput,
    ServiceName, ServiceStatus, StalledItem,
};
