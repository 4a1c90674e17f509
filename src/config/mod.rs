//! Environment-driven configuration and backend selection.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::core::clock::Clock;
use crate::storage::{
    BackupScheduler, DirectorySink, FailoverStore, KvClient, LocalStore, PersistenceStore,
    RemoteStore, StorageResult,
};

/// Environment variables naming the remote key/value endpoint and its
/// credential. Both must be present for remote mode.
pub const KV_URL_VAR: &str = "KV_REST_API_URL";
pub const KV_TOKEN_VAR: &str = "KV_REST_API_TOKEN";

const APP_DIR: &str = "expense_core";
const DEFAULT_BACKUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Remote endpoint coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub token: String,
}

/// Resolved store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Present only when both endpoint and token are configured.
    pub remote: Option<RemoteConfig>,
    pub data_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub backup_interval: Duration,
}

impl StoreConfig {
    /// Reads the environment. Absence of either remote variable forces
    /// local-only mode.
    pub fn from_env() -> Self {
        let remote = match (env::var(KV_URL_VAR), env::var(KV_TOKEN_VAR)) {
            (Ok(endpoint), Ok(token)) if !endpoint.is_empty() && !token.is_empty() => {
                Some(RemoteConfig { endpoint, token })
            }
            _ => None,
        };
        let base = base_dir();
        Self {
            remote,
            data_dir: base.join("data"),
            backup_dir: base.join("backups"),
            backup_interval: DEFAULT_BACKUP_INTERVAL,
        }
    }

    /// Same configuration rooted at an explicit directory. Tests and
    /// embedders use this instead of the user data dir.
    pub fn with_base_dir(mut self, base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        self.data_dir = base.join("data");
        self.backup_dir = base.join("backups");
        self
    }
}

fn base_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Builds the store the process will use, chosen once at startup: the
/// remote backend wrapped with the local fallback when configured, the
/// local store alone otherwise.
pub fn build_store(config: &StoreConfig) -> StorageResult<Arc<dyn PersistenceStore>> {
    let local = LocalStore::new(&config.data_dir)?;
    match &config.remote {
        Some(remote) => {
            info!(endpoint = %remote.endpoint, "using remote key/value store with local fallback");
            let client = KvClient::new(remote.endpoint.clone(), remote.token.clone());
            Ok(Arc::new(FailoverStore::new(RemoteStore::new(client), local)))
        }
        None => {
            info!(dir = %config.data_dir.display(), "remote store not configured, using local store");
            Ok(Arc::new(local))
        }
    }
}

/// Starts the periodic snapshot schedule against the configured backup
/// directory.
pub fn spawn_backup_scheduler(
    config: &StoreConfig,
    store: Arc<dyn PersistenceStore>,
    clock: Arc<dyn Clock>,
) -> StorageResult<BackupScheduler> {
    let sink = Arc::new(DirectorySink::new(&config.backup_dir)?);
    Ok(BackupScheduler::spawn(
        store,
        sink,
        clock,
        config.backup_interval,
    ))
}
