//! Orchestration facade wiring the log, the ledger, the tag set, and the
//! injected persistence store.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::core::account_ledger::{AccountLedger, ExportRow, LedgerTotals};
use crate::core::clock::Clock;
use crate::core::errors::{ExpenseError, Result};
use crate::core::tags;
use crate::core::transaction_log::TransactionLog;
use crate::domain::{Account, AccountKind, AccountUpdate, TagStat, Transaction};
use crate::storage::PersistenceStore;

/// The engine entry point. One instance per process; every mutation runs on
/// the single logical actor that owns `&mut self`, suspends only while the
/// store persists, and either commits fully or leaves no trace.
pub struct Tracker {
    store: Arc<dyn PersistenceStore>,
    clock: Arc<dyn Clock>,
    ledger: AccountLedger,
    log: TransactionLog,
    tags: Vec<TagStat>,
}

impl Tracker {
    /// Loads persisted state through the store. Unreadable or corrupt data
    /// is replaced with the default dataset and a warning; loading never
    /// fails. Tag statistics are recomputed from the loaded log so the
    /// preloaded tags exist from the first call on.
    pub async fn load(store: Arc<dyn PersistenceStore>, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();

        let accounts = match store.load_accounts().await {
            Ok(accounts) if !accounts.is_empty() => accounts,
            Ok(_) => {
                let defaults = default_accounts();
                for account in &defaults {
                    if let Err(err) = store.save_account(account).await {
                        warn!(account = %account.name, error = %err, "could not persist seed account");
                    }
                }
                defaults
            }
            Err(err) => {
                warn!(error = %err, "stored accounts unreadable, starting from defaults");
                default_accounts()
            }
        };

        let transactions = match store.load_transactions().await {
            Ok(transactions) => transactions,
            Err(err) => {
                warn!(error = %err, "stored transactions unreadable, starting empty");
                Vec::new()
            }
        };
        let log = TransactionLog::from_transactions(transactions);

        let stored_tags = match store.load_tags().await {
            Ok(tags) => tags,
            Err(err) => {
                warn!(error = %err, "stored tags unreadable, rebuilding from the log");
                Vec::new()
            }
        };
        let tags = tags::recompute(&log, &stored_tags, now);
        if let Err(err) = store.save_tags(&tags).await {
            warn!(error = %err, "could not persist recomputed tags");
        }

        Self {
            store,
            clock,
            ledger: AccountLedger::from_accounts(accounts),
            log,
            tags,
        }
    }

    // ----- accounts -----

    /// Registers a new account and persists it.
    pub async fn add_account(&mut self, account: Account) -> Result<()> {
        self.ledger.add_account(account.clone())?;
        if let Err(err) = self.store.save_account(&account).await {
            self.ledger = AccountLedger::from_accounts(
                self.ledger
                    .accounts()
                    .iter()
                    .filter(|a| a.name != account.name)
                    .cloned()
                    .collect(),
            );
            return Err(err.into());
        }
        Ok(())
    }

    /// Reconciles a manually reported balance against the transaction log
    /// and records the resulting update.
    ///
    /// The reconciled account is persisted before the in-memory state moves,
    /// so a storage failure leaves nothing half-applied. Malformed numeric
    /// input is rejected up front with no state change.
    pub async fn report_balance(
        &mut self,
        account_name: &str,
        reported_balance: &str,
    ) -> Result<AccountUpdate> {
        let candidate =
            self.ledger
                .reconcile(account_name, reported_balance, &self.log, self.clock.now())?;
        self.store.save_account(&candidate).await?;
        let update = candidate
            .latest_update()
            .expect("reconcile always prepends an update")
            .clone();
        self.ledger.commit(candidate);
        Ok(update)
    }

    // ----- transactions -----

    /// Appends a transaction to the head of the log, refreshes tag
    /// statistics, and persists both.
    pub async fn add_transaction(&mut self, transaction: Transaction) -> Result<()> {
        let rollback = (self.log.clone(), self.tags.clone());
        self.log.append(transaction.clone());
        self.refresh_tags();

        if let Err(err) = self.persist_transaction_change(&transaction).await {
            (self.log, self.tags) = rollback;
            return Err(err);
        }
        Ok(())
    }

    /// Replaces a logged transaction in place, keeping its id and whatever
    /// timestamp the caller supplied.
    pub async fn update_transaction(&mut self, id: Uuid, replacement: Transaction) -> Result<()> {
        let rollback = (self.log.clone(), self.tags.clone());
        if !self.log.update(id, replacement) {
            return Err(ExpenseError::TransactionNotFound(id));
        }
        self.refresh_tags();

        let stored = self.log.get(id).expect("just updated").clone();
        if let Err(err) = self.persist_transaction_change(&stored).await {
            (self.log, self.tags) = rollback;
            return Err(err);
        }
        Ok(())
    }

    /// Deletes a transaction. Removing an unknown id is a no-op.
    pub async fn remove_transaction(&mut self, id: Uuid) -> Result<()> {
        let rollback = (self.log.clone(), self.tags.clone());
        if self.log.remove(id).is_none() {
            return Ok(());
        }
        self.refresh_tags();

        let result = async {
            self.store.remove_transaction(id).await?;
            self.store.save_tags(&self.tags).await?;
            Ok(())
        }
        .await;
        if let Err(err) = result {
            (self.log, self.tags) = rollback;
            return Err(ExpenseError::Storage(err));
        }
        Ok(())
    }

    // ----- tags -----

    /// Creates a user tag with zeroed statistics.
    pub async fn create_tag(&mut self, name: &str) -> Result<()> {
        if self.tags.iter().any(|tag| tag.name == name) {
            return Err(ExpenseError::DuplicateTag(name.to_string()));
        }
        self.tags.push(TagStat::new(name, self.clock.now()));
        if let Err(err) = self.store.save_tags(&self.tags).await {
            self.tags.pop();
            return Err(err.into());
        }
        Ok(())
    }

    /// Deletes a tag and strips it from every transaction carrying it.
    /// Preloaded tags are explicitly rejected.
    pub async fn delete_tag(&mut self, name: &str) -> Result<()> {
        if TagStat::is_preloaded(name) {
            return Err(ExpenseError::TagProtected(name.to_string()));
        }
        if !self.tags.iter().any(|tag| tag.name == name) {
            return Err(ExpenseError::TagNotFound(name.to_string()));
        }

        let rollback = (self.log.clone(), self.tags.clone());
        self.log.strip_tag(name);
        self.tags.retain(|tag| tag.name != name);
        self.refresh_tags();

        if let Err(err) = self.persist_log_rewrite().await {
            (self.log, self.tags) = rollback;
            return Err(err);
        }
        Ok(())
    }

    /// Renames a tag everywhere it appears. Preloaded tags are rejected, as
    /// is renaming onto a name that already exists.
    pub async fn rename_tag(&mut self, old: &str, new: &str) -> Result<()> {
        if TagStat::is_preloaded(old) {
            return Err(ExpenseError::TagProtected(old.to_string()));
        }
        if !self.tags.iter().any(|tag| tag.name == old) {
            return Err(ExpenseError::TagNotFound(old.to_string()));
        }
        if old == new {
            return Ok(());
        }
        if self.tags.iter().any(|tag| tag.name == new) {
            return Err(ExpenseError::DuplicateTag(new.to_string()));
        }

        let rollback = (self.log.clone(), self.tags.clone());
        self.log.rename_tag(old, new);
        if let Some(tag) = self.tags.iter_mut().find(|tag| tag.name == old) {
            tag.name = new.to_string();
        }
        self.refresh_tags();

        if let Err(err) = self.persist_log_rewrite().await {
            (self.log, self.tags) = rollback;
            return Err(err);
        }
        Ok(())
    }

    // ----- read views -----

    pub fn accounts(&self) -> &[Account] {
        self.ledger.accounts()
    }

    pub fn account(&self, name: &str) -> Option<&Account> {
        self.ledger.account(name)
    }

    pub fn transactions(&self) -> &TransactionLog {
        &self.log
    }

    pub fn tags(&self) -> &[TagStat] {
        &self.tags
    }

    pub fn totals(&self) -> LedgerTotals {
        self.ledger.totals()
    }

    pub fn export_rows(&self) -> Vec<ExportRow> {
        self.ledger.export_rows(self.clock.now())
    }

    // ----- internals -----

    fn refresh_tags(&mut self) {
        self.tags = tags::recompute(&self.log, &self.tags, self.clock.now());
    }

    async fn persist_transaction_change(&self, transaction: &Transaction) -> Result<()> {
        self.store.save_transaction(transaction).await?;
        self.store.save_tags(&self.tags).await?;
        Ok(())
    }

    async fn persist_log_rewrite(&self) -> Result<()> {
        self.store.save_transactions(self.log.as_slice()).await?;
        self.store.save_tags(&self.tags).await?;
        Ok(())
    }
}

/// Seed accounts used when nothing has been persisted yet or the stored
/// data is unreadable.
fn default_accounts() -> Vec<Account> {
    vec![
        Account::new("Checking", AccountKind::Current, 0.0),
        Account::new("Savings", AccountKind::Savings, 0.0),
        Account::new("Credit Card", AccountKind::CreditCard, 0.0),
    ]
}
