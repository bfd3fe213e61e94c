//! Persistence of per-user service configs.
//!
//! The web app owns the real database; this crate only needs
//! get/list/upsert/delete keyed by `(user_id, service)`. Two
//! implementations ship:
//!
//! - [`MemoryConfigStore`] for tests and ephemeral daemons.
//! - [`FileConfigStore`], a JSON file rewritten atomically (tmp + rename)
//!   on every change and loaded once at startup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::types::{ServiceConfig, ServiceName};
use crate::{AssistarrError, Result};

/// Current on-disk format version.
const STORE_VERSION: u32 = 1;

/// Storage for [`ServiceConfig`] rows.
#[async_trait]
pub trait ServiceConfigStore: Send + Sync {
    async fn get(&self, user_id: &str, service: ServiceName) -> Result<Option<ServiceConfig>>;

    /// Every config of a user, ordered by service.
    async fn list(&self, user_id: &str) -> Result<Vec<ServiceConfig>>;

    /// Insert or replace the row for `(config.user_id, config.service_name)`.
    async fn upsert(&self, config: ServiceConfig) -> Result<()>;

    /// Remove a row. Returns whether it existed.
    async fn delete(&self, user_id: &str, service: ServiceName) -> Result<bool>;
}

type Rows = BTreeMap<(String, ServiceName), ServiceConfig>;

fn list_rows(rows: &Rows, user_id: &str) -> Vec<ServiceConfig> {
    rows.iter()
        .filter(|((user, _), _)| user == user_id)
        .map(|(_, config)| config.clone())
        .collect()
}

/// In-memory store. Contents are lost on drop.
#[derive(Default)]
pub struct MemoryConfigStore {
    rows: RwLock<Rows>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `configs`.
    pub fn with_configs(configs: impl IntoIterator<Item = ServiceConfig>) -> Self {
        let rows = configs
            .into_iter()
            .map(|c| ((c.user_id.clone(), c.service_name), c))
            .collect();
        Self {
            rows: RwLock::new(rows),
        }
    }
}

#[async_trait]
impl ServiceConfigStore for MemoryConfigStore {
    async fn get(&self, user_id: &str, service: ServiceName) -> Result<Option<ServiceConfig>> {
        let rows = self.rows.read().await;
        Ok(rows.get(&(user_id.to_string(), service)).cloned())
    }

    async fn list(&self, user_id: &str) -> Result<Vec<ServiceConfig>> {
        Ok(list_rows(&*self.rows.read().await, user_id))
    }

    async fn upsert(&self, config: ServiceConfig) -> Result<()> {
        let key = (config.user_id.clone(), config.service_name);
        self.rows.write().await.insert(key, config);
        Ok(())
    }

    async fn delete(&self, user_id: &str, service: ServiceName) -> Result<bool> {
        let mut rows = self.rows.write().await;
        Ok(rows.remove(&(user_id.to_string(), service)).is_some())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    configs: Vec<ServiceConfig>,
}

/// JSON-file store.
///
/// The file holds `{"version": 1, "configs": [...]}`. It is read once in
/// [`open`](Self::open) and rewritten whole after each mutation; the
/// write lock is held across the write so concurrent mutations never
/// interleave on disk.
pub struct FileConfigStore {
    path: PathBuf,
    rows: RwLock<Rows>,
}

impl FileConfigStore {
    /// Open the store at `path`, starting empty when the file is missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let rows = match load(&path)? {
            Some(configs) => {
                info!(path = %path.display(), count = configs.len(), "loaded service configs");
                configs
                    .into_iter()
                    .map(|c| ((c.user_id.clone(), c.service_name), c))
                    .collect()
            }
            None => Rows::new(),
        };
        Ok(Self {
            path,
            rows: RwLock::new(rows),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read the file. `None` when it does not exist.
fn load(path: &Path) -> Result<Option<Vec<ServiceConfig>>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(AssistarrError::Store(format!(
                "failed to read {}: {e}",
                path.display()
            )));
        }
    };
    let file: StoreFile = serde_json::from_str(&content)
        .map_err(|e| AssistarrError::Store(format!("corrupt store {}: {e}", path.display())))?;
    if file.version > STORE_VERSION {
        return Err(AssistarrError::Store(format!(
            "unsupported store version {} (max supported: {STORE_VERSION})",
            file.version
        )));
    }
    Ok(Some(file.configs))
}

/// Write all rows (atomic write via tmp + rename).
fn save(path: &Path, rows: &Rows) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            AssistarrError::Store(format!("failed to create {}: {e}", parent.display()))
        })?;
    }

    let file = StoreFile {
        version: STORE_VERSION,
        configs: rows.values().cloned().collect(),
    };
    let json = serde_json::to_string_pretty(&file)?;
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json).map_err(|e| {
        AssistarrError::Store(format!("failed to write {}: {e}", tmp_path.display()))
    })?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        warn!(path = %tmp_path.display(), error = %e, "store rename failed");
        AssistarrError::Store(format!(
            "failed to rename {} to {}: {e}",
            tmp_path.display(),
            path.display()
        ))
    })
}

#[async_trait]
impl ServiceConfigStore for FileConfigStore {
    async fn get(&self, user_id: &str, service: ServiceName) -> Result<Option<ServiceConfig>> {
        let rows = self.rows.read().await;
        Ok(rows.get(&(user_id.to_string(), service)).cloned())
    }

    async fn list(&self, user_id: &str) -> Result<Vec<ServiceConfig>> {
        Ok(list_rows(&*self.rows.read().await, user_id))
    }

    async fn upsert(&self, config: ServiceConfig) -> Result<()> {
        let mut rows = self.rows.write().await;
        let key = (config.user_id.clone(), config.service_name);
        let previous = rows.insert(key.clone(), config);
        if let Err(e) = save(&self.path, &rows) {
            // Keep memory and disk in agreement.
            match previous {
                Some(old) => rows.insert(key, old),
                None => rows.remove(&key),
            };
            return Err(e);
        }
        Ok(())
    }

    async fn delete(&self, user_id: &str, service: ServiceName) -> Result<bool> {
        let mut rows = self.rows.write().await;
        let key = (user_id.to_string(), service);
        let Some(old) = rows.remove(&key) else {
            return Ok(false);
        };
        if let Err(e) = save(&self.path, &rows) {
            rows.insert(key, old);
            return Err(e);
        }
        Ok(true)
    }
}
