//! Monitor dashboard types. Computed per request, never persisted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{MediaType, ServiceName};

/// Operational state of one service for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub configured: bool,
    pub enabled: bool,
    pub online: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ServiceStatus {
    /// No config row for this service.
    pub fn not_configured() -> Self {
        Self::default()
    }

    /// Config present but switched off.
    pub fn disabled() -> Self {
        Self {
            configured: true,
            ..Self::default()
        }
    }

    /// Health probe succeeded.
    pub fn online(version: Option<String>) -> Self {
        Self {
            configured: true,
            enabled: true,
            online: true,
            error: None,
            version,
        }
    }

    /// Health probe failed.
    pub fn offline(error: impl Into<String>) -> Self {
        Self {
            configured: true,
            enabled: true,
            online: false,
            error: Some(error.into()),
            version: None,
        }
    }

    /// Configured, enabled and not reachable.
    pub fn is_offline(&self) -> bool {
        self.configured && self.enabled && !self.online
    }
}

/// An entry in a Radarr/Sonarr download queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub service: ServiceName,
    pub id: i64,
    pub title: String,
    pub status: String,
    /// Percent complete, 0.0 to 100.0.
    pub progress: f64,
    pub size: u64,
    pub size_left: u64,
    pub time_left: Option<String>,
    pub error: Option<String>,
}

/// A Jellyseerr request waiting for approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequest {
    pub id: i64,
    pub media_type: MediaType,
    pub tmdb_id: Option<i64>,
    pub requested_by: Option<String>,
    pub created_at: Option<String>,
}

/// A download that stopped making progress or failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StalledItem {
    pub service: ServiceName,
    pub title: String,
    pub state: String,
    pub progress: f64,
    pub reason: Option<String>,
}

/// Everything the monitor dashboard shows, assembled fresh on every poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSnapshot {
    /// One entry per known service.
    pub services: BTreeMap<ServiceName, ServiceStatus>,
    pub queue: Vec<QueueItem>,
    pub pending_requests: Vec<PendingRequest>,
    pub stalled: Vec<StalledItem>,
    pub generated_at: DateTime<Utc>,
}

impl MonitorSnapshot {
    /// Number of services that are configured, enabled and offline.
    pub fn offline_count(&self) -> usize {
        self.services.values().filter(|s| s.is_offline()).count()
    }

    /// Number of services with a config row.
    pub fn configured_count(&self) -> usize {
        self.services.values().filter(|s| s.configured).count()
    }
}
