//! Configuration loading for assistarrd.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.assistarr/config.toml` (user)
//! 3. `/etc/assistarr/config.toml` (system)
//!
//! Every field has a default, so a missing file (other than an explicit
//! `--config`) yields the default configuration.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{AssistarrError, DiscoveryConfig, Result, RetryConfig, UpstreamTimeouts};

/// Daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub discovery: DiscoverySection,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Server network configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:7474).
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            limits: LimitsConfig::default(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:7474".to_string()
}

/// Resource limits for inbound requests.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum concurrent requests (default: 64).
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
    /// Request timeout in seconds (default: 60).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_max_concurrent() -> usize {
    64
}

fn default_request_timeout() -> u64 {
    60
}

/// Per-call timeouts towards the media services.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Health probes (default: 5).
    #[serde(default = "default_health_timeout")]
    pub health_timeout_secs: u64,
    /// Data calls: queues, libraries, recommendations (default: 30).
    #[serde(default = "default_data_timeout")]
    pub data_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            health_timeout_secs: default_health_timeout(),
            data_timeout_secs: default_data_timeout(),
        }
    }
}

fn default_health_timeout() -> u64 {
    5
}

fn default_data_timeout() -> u64 {
    30
}

impl UpstreamConfig {
    pub fn timeouts(&self) -> UpstreamTimeouts {
        UpstreamTimeouts {
            data: Duration::from_secs(self.data_timeout_secs),
            health: Duration::from_secs(self.health_timeout_secs),
        }
    }
}

/// "For You" rotation cache settings. Unset fields keep the library defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscoverySection {
    pub capacity: Option<usize>,
    pub target: Option<usize>,
    pub fresh_max_age_secs: Option<u64>,
    pub max_users: Option<u64>,
    pub idle_secs: Option<u64>,
}

impl DiscoverySection {
    pub fn to_config(&self) -> DiscoveryConfig {
        let mut config = DiscoveryConfig::new();
        if let Some(capacity) = self.capacity {
            config = config.capacity(capacity);
        }
        if let Some(target) = self.target {
            config = config.target(target);
        }
        if let Some(secs) = self.fresh_max_age_secs {
            config = config.fresh_max_age(Duration::from_secs(secs));
        }
        if let Some(max_users) = self.max_users {
            config = config.max_users(max_users);
        }
        if let Some(secs) = self.idle_secs {
            config = config.idle(Duration::from_secs(secs));
        }
        config
    }
}

/// Retry policy for discovery fetches.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrySection {
    pub max_attempts: Option<u32>,
    pub initial_delay_ms: Option<u64>,
}

impl RetrySection {
    pub fn to_config(&self) -> RetryConfig {
        let mut config = RetryConfig::new();
        if let Some(attempts) = self.max_attempts {
            config = config.max_attempts(attempts);
        }
        if let Some(ms) = self.initial_delay_ms {
            config = config.initial_delay(Duration::from_millis(ms));
        }
        config
    }
}

/// Where per-user service settings are persisted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    /// JSON file for the file-backed store. Unset: in-memory only.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided, must exist)
    /// 2. `~/.assistarr/config.toml`
    /// 3. `/etc/assistarr/config.toml`
    /// 4. Built-in defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AssistarrError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            AssistarrError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(AssistarrError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".assistarr").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = PathBuf::from("/etc/assistarr/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.server.address, "127.0.0.1:7474");
        assert_eq!(config.server.limits.max_concurrent_requests, 64);
        assert_eq!(config.server.limits.request_timeout_secs, 60);
        assert_eq!(config.upstream.timeouts(), UpstreamTimeouts::default());
        assert!(config.store.path.is_none());
    }

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
            [server]
            address = "0.0.0.0:7474"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.address, "0.0.0.0:7474");
        assert_eq!(config.server.limits.max_concurrent_requests, 64);
        assert_eq!(config.discovery.to_config().capacity, DiscoveryConfig::default().capacity);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [server]
            address = "127.0.0.1:8080"

            [server.limits]
            max_concurrent_requests = 16
            request_timeout_secs = 20

            [upstream]
            health_timeout_secs = 2
            data_timeout_secs = 10

            [discovery]
            capacity = 12
            target = 4
            fresh_max_age_secs = 300

            [retry]
            max_attempts = 3
            initial_delay_ms = 100

            [store]
            path = "/var/lib/assistarr/services.json"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.limits.max_concurrent_requests, 16);
        assert_eq!(config.server.limits.request_timeout_secs, 20);

        let timeouts = config.upstream.timeouts();
        assert_eq!(timeouts.health, Duration::from_secs(2));
        assert_eq!(timeouts.data, Duration::from_secs(10));

        let discovery = config.discovery.to_config();
        assert_eq!(discovery.capacity, 12);
        assert_eq!(discovery.target, 4);
        assert_eq!(discovery.fresh_max_age, Duration::from_secs(300));

        let retry = config.retry.to_config();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.initial_delay, Duration::from_millis(100));

        assert_eq!(
            config.store.path,
            Some(PathBuf::from("/var/lib/assistarr/services.json"))
        );
    }

    #[test]
    fn unknown_fields_in_known_sections_are_ignored() {
        let config: Config = toml::from_str("[upstream]\nhealth_timeout_secs = 1\nfoo = 1\n").unwrap();
        assert_eq!(config.upstream.health_timeout_secs, 1);
        assert_eq!(config.upstream.data_timeout_secs, 30);
    }

    #[test]
    fn config_not_found_returns_error() {
        let result = Config::load(Some(Path::new("/nonexistent/config.toml")));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Config file not found"));
    }

    #[test]
    fn malformed_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[server\naddress = ").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, AssistarrError::Configuration(_)));
    }
}
