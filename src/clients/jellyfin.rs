//! Jellyfin client. Only the health probe is needed.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::http::ServiceClient;
use super::traits::ServiceProbe;
use crate::Result;
use crate::types::ServiceName;

#[derive(Clone)]
pub struct JellyfinClient {
    http: ServiceClient,
}

impl JellyfinClient {
    pub fn new(http: Client, base_url: impl AsRef<str>, api_key: impl Into<String>) -> Self {
        Self::from_service_client(ServiceClient::new(ServiceName::Jellyfin, http, base_url, api_key))
    }

    pub fn from_service_client(http: ServiceClient) -> Self {
        Self { http }
    }

    /// `GET /System/Info`, returning the server version.
    pub async fn system_info(&self) -> Result<Option<String>> {
        let info: SystemInfo = self
            .http
            .for_health()
            .get("/System/Info", &[])
            .await?;
        Ok(info.version)
    }
}

#[async_trait]
impl ServiceProbe for JellyfinClient {
    fn service(&self) -> ServiceName {
        ServiceName::Jellyfin
    }

    async fn probe(&self) -> Result<Option<String>> {
        self.system_info().await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SystemInfo {
    version: Option<String>,
}
