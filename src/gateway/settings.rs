//! Per-user service settings.
//!
//! Stored API keys never leave this module unmasked. A form that sends
//! the mask back unchanged keeps the key on file.

use reqwest::Url;
use tracing::{info, instrument};

use super::Assistarr;
use crate::clients::probe_for;
use crate::types::{
    API_KEY_MASK, ConnectionTest, ServiceConfig, ServiceConfigInput, ServiceName,
    normalize_base_url,
};
use crate::{AssistarrError, Result};

/// Normalize a base URL and require an absolute http(s) URL with a host.
pub fn validate_base_url(raw: &str) -> Result<String> {
    let normalized = normalize_base_url(raw);
    let url = Url::parse(&normalized)
        .map_err(|e| AssistarrError::InvalidInput(format!("invalid base URL '{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(AssistarrError::InvalidInput(format!(
            "base URL must be http(s) with a host, got '{raw}'"
        )));
    }
    Ok(normalized)
}

impl Assistarr {
    /// The user's configs with keys masked.
    pub async fn list_settings(&self, user_id: &str) -> Result<Vec<ServiceConfig>> {
        let configs = self.store.list(user_id).await?;
        Ok(configs.iter().map(ServiceConfig::masked).collect())
    }

    /// Insert or replace a config. Returns it masked.
    #[instrument(skip(self, input), fields(service = %input.service_name))]
    pub async fn save_settings(&self, user_id: &str, input: ServiceConfigInput) -> Result<ServiceConfig> {
        let config = self.resolve_input(user_id, input).await?;
        self.store.upsert(config.clone()).await?;
        // Library and recommendation sources may have changed.
        self.discovery_cache.invalidate(user_id);
        info!(enabled = config.is_enabled, "service settings saved");
        Ok(config.masked())
    }

    /// Remove a config. Unknown rows are [`AssistarrError::NotFound`].
    #[instrument(skip(self))]
    pub async fn delete_settings(&self, user_id: &str, service: ServiceName) -> Result<()> {
        if !self.store.delete(user_id, service).await? {
            return Err(AssistarrError::NotFound(format!("{service} settings")));
        }
        self.discovery_cache.invalidate(user_id);
        info!("service settings deleted");
        Ok(())
    }

    /// Probe a candidate config without saving it.
    ///
    /// Never fails: invalid input and unreachable services are reported in
    /// the returned [`ConnectionTest`].
    #[instrument(skip(self, input), fields(service = %input.service_name))]
    pub async fn test_connection(&self, user_id: &str, input: ServiceConfigInput) -> ConnectionTest {
        let config = match self.resolve_input(user_id, input).await {
            Ok(config) => config,
            Err(e) => {
                return ConnectionTest {
                    success: false,
                    version: None,
                    error: Some(e.to_string()),
                };
            }
        };
        match probe_for(self.client_for(&config), &config.api_key).probe().await {
            Ok(version) => ConnectionTest {
                success: true,
                version,
                error: None,
            },
            Err(e) => ConnectionTest {
                success: false,
                version: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// Validate input and swap a masked key for the stored one.
    async fn resolve_input(&self, user_id: &str, input: ServiceConfigInput) -> Result<ServiceConfig> {
        let base_url = validate_base_url(&input.base_url)?;
        let api_key = if input.api_key == API_KEY_MASK {
            self.store
                .get(user_id, input.service_name)
                .await?
                .map(|stored| stored.api_key)
                .ok_or_else(|| {
                    AssistarrError::InvalidInput(format!(
                        "no stored key for {}; enter the key again",
                        input.service_name
                    ))
                })?
        } else {
            input.api_key.trim().to_string()
        };
        Ok(ServiceConfig {
            user_id: user_id.to_string(),
            service_name: input.service_name,
            base_url,
            api_key,
            is_enabled: input.is_enabled,
        })
    }
}
