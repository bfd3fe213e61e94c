//! Response shapes shared by Radarr and Sonarr (`/api/v3`).

use serde::Deserialize;

use crate::types::{QueueItem, ServiceName};

/// Queue page size requested from Radarr/Sonarr.
pub(crate) const QUEUE_PAGE_SIZE: u32 = 50;

#[derive(Debug, Deserialize)]
pub(crate) struct SystemStatus {
    pub version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ArrImage {
    pub cover_type: String,
    pub remote_url: Option<String>,
    pub url: Option<String>,
}

/// Remote poster URL, falling back to the service-local path.
pub(crate) fn poster_url(images: &[ArrImage]) -> Option<String> {
    images
        .iter()
        .find(|i| i.cover_type == "poster")
        .and_then(|i| i.remote_url.clone().or_else(|| i.url.clone()))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QueuePage {
    #[serde(default)]
    pub records: Vec<QueueRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueueRecord {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub size: f64,
    #[serde(default, rename = "sizeleft")]
    pub size_left: f64,
    #[serde(rename = "timeleft")]
    pub time_left: Option<String>,
    pub error_message: Option<String>,
    pub tracked_download_status: Option<String>,
}

impl QueueRecord {
    pub fn into_item(self, service: ServiceName) -> QueueItem {
        let progress = if self.size > 0.0 {
            ((self.size - self.size_left) / self.size * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        let error = self.error_message.filter(|m| !m.is_empty()).or_else(|| {
            self.tracked_download_status
                .filter(|s| s == "warning" || s == "error")
                .map(|s| format!("tracked download status: {s}"))
        });
        QueueItem {
            service,
            id: self.id,
            title: self.title,
            status: self.status,
            progress,
            size: self.size.max(0.0) as u64,
            size_left: self.size_left.max(0.0) as u64,
            time_left: self.time_left,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_record_progress_and_error() {
        let record: QueueRecord = serde_json::from_str(
            r#"{"id": 9, "title": "Heat.1995", "status": "downloading",
                "size": 1000, "sizeleft": 250, "timeleft": "00:10:00",
                "trackedDownloadStatus": "warning", "extra": true}"#,
        )
        .unwrap();
        let item = record.into_item(ServiceName::Radarr);
        assert_eq!(item.progress, 75.0);
        assert_eq!(item.size_left, 250);
        assert_eq!(item.error.as_deref(), Some("tracked download status: warning"));
    }

    #[test]
    fn zero_size_has_zero_progress() {
        let record: QueueRecord = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert_eq!(record.into_item(ServiceName::Sonarr).progress, 0.0);
    }

    #[test]
    fn poster_prefers_remote_url() {
        let images: Vec<ArrImage> = serde_json::from_str(
            r#"[{"coverType": "fanart", "remoteUrl": "f"},
                {"coverType": "poster", "url": "/local.jpg", "remoteUrl": "https://img/p.jpg"}]"#,
        )
        .unwrap();
        assert_eq!(poster_url(&images).as_deref(), Some("https://img/p.jpg"));
    }
}
