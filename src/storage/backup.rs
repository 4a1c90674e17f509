//! Periodic full-store snapshots.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core::clock::Clock;

use super::{KvEntry, PersistenceStore, StorageError, StorageResult};

const SNAPSHOT_PREFIX: &str = "snapshot_";
const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";
const DEFAULT_RETENTION: usize = 5;

/// A full capture of the store: every key/value pair plus the instant the
/// capture was taken. Serializes with an RFC 3339 timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub data: Vec<KvEntry>,
}

/// Destination for emitted snapshots. Delivery is best effort; a sink
/// failure is reported to the scheduler, logged, and never propagated
/// further.
#[async_trait]
pub trait BackupSink: Send + Sync {
    async fn emit(&self, snapshot: &Snapshot) -> StorageResult<()>;
}

/// Writes each snapshot as a timestamped JSON file and prunes old ones
/// beyond the retention count.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    retention: usize,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        Self::with_retention(dir, DEFAULT_RETENTION)
    }

    pub fn with_retention(dir: impl Into<PathBuf>, retention: usize) -> StorageResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            retention: retention.max(1),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn snapshot_path(&self, snapshot: &Snapshot) -> PathBuf {
        let stamp = snapshot.timestamp.format(SNAPSHOT_TIMESTAMP_FORMAT);
        self.dir.join(format!("{SNAPSHOT_PREFIX}{stamp}.json"))
    }

    async fn prune(&self) -> StorageResult<()> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(SNAPSHOT_PREFIX) && name.ends_with(".json") {
                names.push(name);
            }
        }
        // Timestamped names sort chronologically.
        names.sort();
        while names.len() > self.retention {
            let oldest = names.remove(0);
            fs::remove_file(self.dir.join(oldest)).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl BackupSink for DirectorySink {
    async fn emit(&self, snapshot: &Snapshot) -> StorageResult<()> {
        let payload = serde_json::to_string_pretty(snapshot)?;
        fs::write(self.snapshot_path(snapshot), payload).await?;
        self.prune().await
    }
}

/// Captures the store and hands the snapshot to the sink.
pub async fn run_backup(
    store: &dyn PersistenceStore,
    sink: &dyn BackupSink,
    now: DateTime<Utc>,
) -> StorageResult<Snapshot> {
    let data = store
        .snapshot()
        .await
        .map_err(|err| StorageError::Backup(err.to_string()))?;
    let snapshot = Snapshot {
        timestamp: now,
        data,
    };
    sink.emit(&snapshot)
        .await
        .map_err(|err| StorageError::Backup(err.to_string()))?;
    Ok(snapshot)
}

/// Emits a snapshot on a fixed interval until shut down.
///
/// Failures are logged and the schedule keeps ticking; a backup never blocks
/// or fails a foreground operation. The first snapshot is taken one full
/// interval after spawn.
pub struct BackupScheduler {
    handle: JoinHandle<()>,
}

impl BackupScheduler {
    pub fn spawn(
        store: Arc<dyn PersistenceStore>,
        sink: Arc<dyn BackupSink>,
        clock: Arc<dyn Clock>,
        every: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick of a tokio interval completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match run_backup(store.as_ref(), sink.as_ref(), clock.now()).await {
                    Ok(snapshot) => {
                        debug!(entries = snapshot.data.len(), "backup snapshot emitted")
                    }
                    Err(err) => warn!(error = %err, "backup failed, schedule continues"),
                }
            }
        });
        Self { handle }
    }

    /// Cancels the schedule. In-flight store calls are left to finish or
    /// fail on their own.
    pub fn shutdown(self) {
        self.handle.abort();
    }
}

impl Drop for BackupScheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
