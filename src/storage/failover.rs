//! Remote-first persistence with a transparent local fallback.

use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;

use crate::domain::{Account, TagStat, Transaction};

use super::{KvEntry, PersistenceStore, StorageResult};

/// Wraps the remote store and the local floor. Every operation is tried
/// remotely first; on failure it is logged and retried against the local
/// store, for reads and writes alike. The caller never sees a remote error,
/// only a failure of the local floor itself escapes.
///
/// There is no fallback on slowness: a remote call that never resolves
/// stalls that one operation rather than silently forking the data.
pub struct FailoverStore<R, L> {
    remote: R,
    local: L,
}

impl<R, L> FailoverStore<R, L>
where
    R: PersistenceStore,
    L: PersistenceStore,
{
    pub fn new(remote: R, local: L) -> Self {
        Self { remote, local }
    }
}

macro_rules! with_fallback {
    ($self:ident, $op:literal, $call:ident ( $($arg:expr),* )) => {
        match $self.remote.$call($($arg),*).await {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(operation = $op, error = %err, "remote store failed, using local fallback");
                $self.local.$call($($arg),*).await
            }
        }
    };
}

#[async_trait]
impl<R, L> PersistenceStore for FailoverStore<R, L>
where
    R: PersistenceStore,
    L: PersistenceStore,
{
    async fn save_account(&self, account: &Account) -> StorageResult<()> {
        with_fallback!(self, "save_account", save_account(account))
    }

    async fn load_accounts(&self) -> StorageResult<Vec<Account>> {
        with_fallback!(self, "load_accounts", load_accounts())
    }

    async fn save_transaction(&self, transaction: &Transaction) -> StorageResult<()> {
        with_fallback!(self, "save_transaction", save_transaction(transaction))
    }

    async fn save_transactions(&self, transactions: &[Transaction]) -> StorageResult<()> {
        with_fallback!(self, "save_transactions", save_transactions(transactions))
    }

    async fn remove_transaction(&self, id: Uuid) -> StorageResult<()> {
        with_fallback!(self, "remove_transaction", remove_transaction(id))
    }

    async fn load_transactions(&self) -> StorageResult<Vec<Transaction>> {
        with_fallback!(self, "load_transactions", load_transactions())
    }

    async fn save_tags(&self, tags: &[TagStat]) -> StorageResult<()> {
        with_fallback!(self, "save_tags", save_tags(tags))
    }

    async fn load_tags(&self) -> StorageResult<Vec<TagStat>> {
        with_fallback!(self, "load_tags", load_tags())
    }

    async fn snapshot(&self) -> StorageResult<Vec<KvEntry>> {
        with_fallback!(self, "snapshot", snapshot())
    }

    async fn clear(&self) -> StorageResult<()> {
        with_fallback!(self, "clear", clear())
    }
}
