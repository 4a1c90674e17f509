//! Persistence: the typed store trait, its remote, local, and failover
//! implementations, the raw key/value backend seam, and snapshot backups.

pub mod backup;
pub mod failover;
pub mod kv;
pub mod local;
pub mod remote;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Account, TagStat, Transaction};

pub use backup::{run_backup, BackupScheduler, BackupSink, DirectorySink, Snapshot};
pub use failover::FailoverStore;
pub use kv::{KvBackend, KvClient, MemoryKv};
pub use local::LocalStore;
pub use remote::RemoteStore;

/// Errors raised at the storage boundary. They are contained by the
/// failover wrapper and the backup loop; callers of engine mutations only
/// ever see them once the local durability floor has failed as well.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("HTTP transport error: {0}")]
    Http(String),
    #[error("Unexpected status {status} from key/value service: {body}")]
    Status { status: u16, body: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed persisted data: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Backup failed: {0}")]
    Backup(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// One raw key/value pair, as captured by a backup snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KvEntry {
    pub key: String,
    pub value: String,
}

/// Uniform durability interface the engine components are handed.
///
/// Implementations differ in physical layout (per-entity keys remotely,
/// whole-collection documents locally) but agree on logical content. Every
/// write is an overwrite of the entity's slot, last write wins; there is no
/// compare-and-swap, so concurrent writers to the same slot clobber each
/// other. That limitation is accepted for the single-actor model.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    async fn save_account(&self, account: &Account) -> StorageResult<()>;
    async fn load_accounts(&self) -> StorageResult<Vec<Account>>;

    async fn save_transaction(&self, transaction: &Transaction) -> StorageResult<()>;
    /// Bulk rewrite used after tag deletion or rename touches many records.
    async fn save_transactions(&self, transactions: &[Transaction]) -> StorageResult<()>;
    async fn remove_transaction(&self, id: Uuid) -> StorageResult<()>;
    async fn load_transactions(&self) -> StorageResult<Vec<Transaction>>;

    async fn save_tags(&self, tags: &[TagStat]) -> StorageResult<()>;
    async fn load_tags(&self) -> StorageResult<Vec<TagStat>>;

    /// Every stored key/value pair, for backup capture.
    async fn snapshot(&self) -> StorageResult<Vec<KvEntry>>;
    async fn clear(&self) -> StorageResult<()>;
}

#[async_trait]
impl<S: PersistenceStore + ?Sized> PersistenceStore for Arc<S> {
    async fn save_account(&self, account: &Account) -> StorageResult<()> {
        (**self).save_account(account).await
    }

    async fn load_accounts(&self) -> StorageResult<Vec<Account>> {
        (**self).load_accounts().await
    }

    async fn save_transaction(&self, transaction: &Transaction) -> StorageResult<()> {
        (**self).save_transaction(transaction).await
    }

    async fn save_transactions(&self, transactions: &[Transaction]) -> StorageResult<()> {
        (**self).save_transactions(transactions).await
    }

    async fn remove_transaction(&self, id: Uuid) -> StorageResult<()> {
        (**self).remove_transaction(id).await
    }

    async fn load_transactions(&self) -> StorageResult<Vec<Transaction>> {
        (**self).load_transactions().await
    }

    async fn save_tags(&self, tags: &[TagStat]) -> StorageResult<()> {
        (**self).save_tags(tags).await
    }

    async fn load_tags(&self) -> StorageResult<Vec<TagStat>> {
        (**self).load_tags().await
    }

    async fn snapshot(&self) -> StorageResult<Vec<KvEntry>> {
        (**self).snapshot().await
    }

    async fn clear(&self) -> StorageResult<()> {
        (**self).clear().await
    }
}
