//! Portainer client. Only the health probe is needed.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::http::ServiceClient;
use super::traits::ServiceProbe;
use crate::Result;
use crate::types::ServiceName;

#[derive(Clone)]
pub struct PortainerClient {
    http: ServiceClient,
}

impl PortainerClient {
    pub fn new(http: Client, base_url: impl AsRef<str>, api_key: impl Into<String>) -> Self {
        Self::from_service_client(ServiceClient::new(ServiceName::Portainer, http, base_url, api_key))
    }

    pub fn from_service_client(http: ServiceClient) -> Self {
        Self { http }
    }

    /// `GET /api/status`, returning the Portainer version.
    pub async fn status(&self) -> Result<Option<String>> {
        let status: PortainerStatus = self
            .http
            .for_health()
            .get("/api/status", &[])
            .await?;
        Ok(status.version)
    }
}

#[async_trait]
impl ServiceProbe for PortainerClient {
    fn service(&self) -> ServiceName {
        ServiceName::Portainer
    }

    async fn probe(&self) -> Result<Option<String>> {
        self.status().await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PortainerStatus {
    version: Option<String>,
}
