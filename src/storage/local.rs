//! Local fallback persistence: whole-collection JSON documents on disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use crate::domain::{Account, TagStat, Transaction};

use super::{KvEntry, PersistenceStore, StorageResult};

const ACCOUNTS_DOC: &str = "accounts";
const TRANSACTIONS_DOC: &str = "transactions";
const TAGS_DOC: &str = "tags";
const TMP_SUFFIX: &str = "tmp";

/// Filesystem-backed store. Each collection lives in one JSON document
/// (`accounts.json`, `transactions.json`, `tags.json`) inside the data
/// directory, so the logical content matches the remote per-entity scheme
/// even though the physical layout differs. This backend is the durability
/// floor: it can stand in for the remote store at every operation.
#[derive(Debug, Clone)]
pub struct LocalStore {
    data_dir: PathBuf,
}

impl LocalStore {
    /// Opens (and creates if needed) the data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn doc_path(&self, doc: &str) -> PathBuf {
        self.data_dir.join(format!("{doc}.json"))
    }

    async fn read_doc<T>(&self, doc: &str) -> StorageResult<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let path = self.doc_path(doc);
        match fs::read_to_string(&path).await {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes the document via a temp file and rename so a failed write
    /// never corrupts the previous version.
    async fn write_doc<T: serde::Serialize>(&self, doc: &str, items: &[T]) -> StorageResult<()> {
        let path = self.doc_path(doc);
        let tmp = path.with_extension(format!("json.{TMP_SUFFIX}"));
        let payload = serde_json::to_string_pretty(items)?;
        fs::write(&tmp, payload).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn raw_doc(&self, doc: &str) -> StorageResult<Option<String>> {
        match fs::read_to_string(self.doc_path(doc)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl PersistenceStore for LocalStore {
    async fn save_account(&self, account: &Account) -> StorageResult<()> {
        let mut accounts: Vec<Account> = self.read_doc(ACCOUNTS_DOC).await?;
        match accounts.iter_mut().find(|a| a.name == account.name) {
            Some(slot) => *slot = account.clone(),
            None => accounts.push(account.clone()),
        }
        self.write_doc(ACCOUNTS_DOC, &accounts).await
    }

    async fn load_accounts(&self) -> StorageResult<Vec<Account>> {
        self.read_doc(ACCOUNTS_DOC).await
    }

    async fn save_transaction(&self, transaction: &Transaction) -> StorageResult<()> {
        let mut transactions: Vec<Transaction> = self.read_doc(TRANSACTIONS_DOC).await?;
        match transactions.iter_mut().find(|t| t.id == transaction.id) {
            Some(slot) => *slot = transaction.clone(),
            None => transactions.insert(0, transaction.clone()),
        }
        self.write_doc(TRANSACTIONS_DOC, &transactions).await
    }

    async fn save_transactions(&self, transactions: &[Transaction]) -> StorageResult<()> {
        self.write_doc(TRANSACTIONS_DOC, transactions).await
    }

    async fn remove_transaction(&self, id: Uuid) -> StorageResult<()> {
        let mut transactions: Vec<Transaction> = self.read_doc(TRANSACTIONS_DOC).await?;
        transactions.retain(|t| t.id != id);
        self.write_doc(TRANSACTIONS_DOC, &transactions).await
    }

    async fn load_transactions(&self) -> StorageResult<Vec<Transaction>> {
        self.read_doc(TRANSACTIONS_DOC).await
    }

    async fn save_tags(&self, tags: &[TagStat]) -> StorageResult<()> {
        self.write_doc(TAGS_DOC, tags).await
    }

    async fn load_tags(&self) -> StorageResult<Vec<TagStat>> {
        self.read_doc(TAGS_DOC).await
    }

    async fn snapshot(&self) -> StorageResult<Vec<KvEntry>> {
        let mut entries = Vec::new();
        for doc in [ACCOUNTS_DOC, TRANSACTIONS_DOC, TAGS_DOC] {
            if let Some(value) = self.raw_doc(doc).await? {
                entries.push(KvEntry {
                    key: doc.to_string(),
                    value,
                });
            }
        }
        Ok(entries)
    }

    async fn clear(&self) -> StorageResult<()> {
        for doc in [ACCOUNTS_DOC, TRANSACTIONS_DOC, TAGS_DOC] {
            let path = self.doc_path(doc);
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}
