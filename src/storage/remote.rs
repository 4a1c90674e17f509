//! Typed entity persistence over the remote key/value service.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Account, TagStat, Transaction};

use super::kv::KvBackend;
use super::{KvEntry, PersistenceStore, StorageResult};

const ACCOUNT_PREFIX: &str = "account:";
const TRANSACTION_PREFIX: &str = "transaction:";
const TAGS_KEY: &str = "tags";

/// Remote persistence: one key per account (`account:<name>`), one key per
/// transaction (`transaction:<id>`), and a single aggregate `tags` key. All
/// values are JSON strings.
pub struct RemoteStore<K: KvBackend> {
    kv: K,
}

impl<K: KvBackend> RemoteStore<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    pub fn backend(&self) -> &K {
        &self.kv
    }

    async fn load_collection<T>(&self, prefix: &str) -> StorageResult<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut items = Vec::new();
        for key in self.kv.list_keys(prefix).await? {
            if let Some(value) = self.kv.get(&key).await? {
                items.push(serde_json::from_str(&value)?);
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl<K: KvBackend> PersistenceStore for RemoteStore<K> {
    async fn save_account(&self, account: &Account) -> StorageResult<()> {
        let key = format!("{ACCOUNT_PREFIX}{}", account.name);
        self.kv.set(&key, &serde_json::to_string(account)?).await
    }

    async fn load_accounts(&self) -> StorageResult<Vec<Account>> {
        self.load_collection(ACCOUNT_PREFIX).await
    }

    async fn save_transaction(&self, transaction: &Transaction) -> StorageResult<()> {
        let key = format!("{TRANSACTION_PREFIX}{}", transaction.id);
        self.kv
            .set(&key, &serde_json::to_string(transaction)?)
            .await
    }

    async fn save_transactions(&self, transactions: &[Transaction]) -> StorageResult<()> {
        for transaction in transactions {
            self.save_transaction(transaction).await?;
        }
        Ok(())
    }

    async fn remove_transaction(&self, id: Uuid) -> StorageResult<()> {
        self.kv.remove(&format!("{TRANSACTION_PREFIX}{id}")).await
    }

    async fn load_transactions(&self) -> StorageResult<Vec<Transaction>> {
        self.load_collection(TRANSACTION_PREFIX).await
    }

    async fn save_tags(&self, tags: &[TagStat]) -> StorageResult<()> {
        self.kv.set(TAGS_KEY, &serde_json::to_string(tags)?).await
    }

    async fn load_tags(&self) -> StorageResult<Vec<TagStat>> {
        match self.kv.get(TAGS_KEY).await? {
            Some(value) => Ok(serde_json::from_str(&value)?),
            None => Ok(Vec::new()),
        }
    }

    async fn snapshot(&self) -> StorageResult<Vec<KvEntry>> {
        let mut entries = Vec::new();
        for key in self.kv.list_keys("").await? {
            if let Some(value) = self.kv.get(&key).await? {
                entries.push(KvEntry { key, value });
            }
        }
        Ok(entries)
    }

    async fn clear(&self) -> StorageResult<()> {
        self.kv.clear().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv::MemoryKv;
    use chrono::{TimeZone, Utc};

    fn store() -> RemoteStore<MemoryKv> {
        RemoteStore::new(MemoryKv::new())
    }

    #[tokio::test]
    async fn accounts_persist_under_per_entity_keys() {
        let store = store();
        let account = Account::new("Checking", crate::domain::AccountKind::Current, 100.0);
        store.save_account(&account).await.unwrap();

        let raw = store.kv.get("account:Checking").await.unwrap();
        assert!(raw.is_some(), "expected account:<name> key");
        assert_eq!(store.load_accounts().await.unwrap(), vec![account]);
    }

    #[tokio::test]
    async fn saving_an_account_twice_overwrites_by_key() {
        let store = store();
        let mut account = Account::new("Checking", crate::domain::AccountKind::Current, 100.0);
        store.save_account(&account).await.unwrap();
        account.balance = 50.0;
        store.save_account(&account).await.unwrap();

        let loaded = store.load_accounts().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].balance, 50.0);
    }

    #[tokio::test]
    async fn transactions_round_trip_and_delete() {
        let store = store();
        let txn = Transaction::expense("Checking", 10.0, Utc.timestamp_opt(100, 0).unwrap());
        store.save_transaction(&txn).await.unwrap();
        assert_eq!(store.load_transactions().await.unwrap(), vec![txn.clone()]);

        store.remove_transaction(txn.id).await.unwrap();
        assert!(store.load_transactions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn tags_live_under_one_aggregate_key() {
        let store = store();
        let tags = vec![TagStat::new("trip", Utc.timestamp_opt(0, 0).unwrap())];
        store.save_tags(&tags).await.unwrap();

        assert!(store.kv.get("tags").await.unwrap().is_some());
        assert_eq!(store.load_tags().await.unwrap(), tags);
    }

    #[tokio::test]
    async fn snapshot_captures_every_key() {
        let store = store();
        store
            .save_account(&Account::new(
                "Checking",
                crate::domain::AccountKind::Current,
                0.0,
            ))
            .await
            .unwrap();
        store.save_tags(&[]).await.unwrap();

        let entries = store.snapshot().await.unwrap();
        let keys: Vec<_> = entries.iter().map(|e| e.key.as_str()).collect();
        assert!(keys.contains(&"account:Checking"));
        assert!(keys.contains(&"tags"));
    }
}
