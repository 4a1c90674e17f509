//! Account collection and the balance reconciliation algorithm.

use chrono::{DateTime, TimeZone, Utc};

use crate::core::errors::{ExpenseError, Result};
use crate::core::transaction_log::TransactionLog;
use crate::domain::{Account, AccountKind, AccountUpdate};

/// Holds every tracked account and owns the reconciliation of reported
/// balances against the transaction log.
#[derive(Debug, Clone, Default)]
pub struct AccountLedger {
    accounts: Vec<Account>,
}

impl AccountLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_accounts(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }

    /// Adds an account after checking the name is not already taken.
    pub fn add_account(&mut self, account: Account) -> Result<()> {
        let normalized = account.name.trim().to_ascii_lowercase();
        let duplicate = self
            .accounts
            .iter()
            .any(|existing| existing.name.trim().to_ascii_lowercase() == normalized);
        if duplicate {
            return Err(ExpenseError::DuplicateAccount(account.name));
        }
        self.accounts.push(account);
        Ok(())
    }

    pub fn account(&self, name: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.name == name)
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Builds the reconciled account state for a newly reported balance
    /// without committing it. The caller persists the candidate first and
    /// swaps it in with [`AccountLedger::commit`] once the write stuck.
    ///
    /// The window between the previous report and `now` is charged as
    /// follows: logged income and transfers in are `input_income`, logged
    /// expenses and transfers out are `input_expense`, and
    /// `previous.balance + input_income - new_balance` is the total outflow
    /// the balance delta implies. The gap between that and `input_expense`
    /// is spending no transaction captured; it stays signed, a negative gap
    /// means unexplained income.
    pub fn reconcile(
        &self,
        name: &str,
        reported_balance: &str,
        log: &TransactionLog,
        now: DateTime<Utc>,
    ) -> Result<Account> {
        let new_balance: f64 = reported_balance
            .trim()
            .parse()
            .map_err(|_| ExpenseError::InvalidAmount(reported_balance.to_string()))?;
        let account = self
            .account(name)
            .ok_or_else(|| ExpenseError::AccountNotFound(name.to_string()))?;

        let (previous_date, previous_balance) = match account.latest_update() {
            Some(update) => (update.date, update.balance),
            None => (Utc.timestamp_opt(0, 0).unwrap(), account.balance),
        };

        let mut input_income = 0.0;
        let mut input_expense = 0.0;
        for transaction in log.query(name, previous_date, now) {
            if transaction.credits(name) {
                input_income += transaction.amount;
            } else if transaction.debits(name) {
                input_expense += transaction.amount;
            }
        }
        let balance_based_expense = previous_balance + input_income - new_balance;

        let mut updated = account.clone();
        updated.updates.insert(
            0,
            AccountUpdate {
                date: now,
                balance: new_balance,
                input_income,
                input_expense,
                balance_based_expense,
            },
        );
        updated.balance = new_balance;
        Ok(updated)
    }

    /// Replaces the stored account with a reconciled candidate.
    pub fn commit(&mut self, account: Account) {
        if let Some(slot) = self.accounts.iter_mut().find(|a| a.name == account.name) {
            *slot = account;
        } else {
            self.accounts.push(account);
        }
    }

    /// Snapshot totals across all accounts: the full balance sum plus the
    /// head-of-history income, expense, and residual. Historical updates are
    /// deliberately not summed, this reads as "since the last check-in".
    pub fn totals(&self) -> LedgerTotals {
        let mut totals = LedgerTotals::default();
        for account in &self.accounts {
            totals.balance += account.balance;
            if let Some(latest) = account.latest_update() {
                totals.input_income += latest.input_income;
                totals.input_expense += latest.input_expense;
                totals.balance_based_expense += latest.balance_based_expense;
            }
        }
        totals
    }

    /// The authoritative export field set: a current-state row per account,
    /// one row per recorded update, and a trailing totals row. Serialization
    /// is left to the caller.
    pub fn export_rows(&self, now: DateTime<Utc>) -> Vec<ExportRow> {
        let mut rows = Vec::new();
        for account in &self.accounts {
            rows.push(ExportRow {
                account_name: account.name.clone(),
                account_kind: Some(account.kind),
                current_balance: account.balance,
                date: now,
                balance: account.balance,
                input_income: 0.0,
                input_expense: 0.0,
                balance_based_expense: 0.0,
            });
            for update in &account.updates {
                rows.push(ExportRow {
                    account_name: account.name.clone(),
                    account_kind: Some(account.kind),
                    current_balance: account.balance,
                    date: update.date,
                    balance: update.balance,
                    input_income: update.input_income,
                    input_expense: update.input_expense,
                    balance_based_expense: update.balance_based_expense,
                });
            }
        }
        let totals = self.totals();
        rows.push(ExportRow {
            account_name: "TOTAL".to_string(),
            account_kind: None,
            current_balance: totals.balance,
            date: now,
            balance: totals.balance,
            input_income: totals.input_income,
            input_expense: totals.input_expense,
            balance_based_expense: totals.balance_based_expense,
        });
        rows
    }
}

/// Aggregate view over all accounts, head-of-history only.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LedgerTotals {
    pub balance: f64,
    pub input_income: f64,
    pub input_expense: f64,
    pub balance_based_expense: f64,
}

/// One row of the account export. Field order mirrors the exported columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub account_name: String,
    /// None for the trailing totals row.
    pub account_kind: Option<AccountKind>,
    pub current_balance: f64,
    pub date: DateTime<Utc>,
    pub balance: f64,
    pub input_income: f64,
    pub input_expense: f64,
    pub balance_based_expense: f64,
}
