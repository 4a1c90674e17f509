use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single logged movement of money.
///
/// Expenses and incomes reference one `account`; transfers reference a
/// `from_account`/`to_account` pair. `amount` is always positive, the
/// direction is implied by the kind. Timestamps are stored in UTC.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub date_time: DateTime<Utc>,
    pub amount: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_account: Option<String>,
}

impl Transaction {
    /// Creates an expense against the given account.
    pub fn expense(account: impl Into<String>, amount: f64, date_time: DateTime<Utc>) -> Self {
        Self::single(TransactionKind::Expense, account, amount, date_time)
    }

    /// Creates an income credited to the given account.
    pub fn income(account: impl Into<String>, amount: f64, date_time: DateTime<Utc>) -> Self {
        Self::single(TransactionKind::Income, account, amount, date_time)
    }

    /// Creates a transfer between two accounts.
    pub fn transfer(
        from_account: impl Into<String>,
        to_account: impl Into<String>,
        amount: f64,
        date_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: TransactionKind::Transfer,
            date_time,
            amount,
            tags: Vec::new(),
            description: String::new(),
            account: None,
            from_account: Some(from_account.into()),
            to_account: Some(to_account.into()),
        }
    }

    fn single(
        kind: TransactionKind,
        account: impl Into<String>,
        amount: f64,
        date_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            date_time,
            amount,
            tags: Vec::new(),
            description: String::new(),
            account: Some(account.into()),
            from_account: None,
            to_account: None,
        }
    }

    /// Attaches tags, dropping duplicates while keeping first-seen order.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = dedup_tags(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the free-form description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether the transaction references the account directly or as either
    /// side of a transfer.
    pub fn touches_account(&self, name: &str) -> bool {
        self.account.as_deref() == Some(name)
            || self.from_account.as_deref() == Some(name)
            || self.to_account.as_deref() == Some(name)
    }

    /// Whether the transaction puts money into the account.
    pub fn credits(&self, name: &str) -> bool {
        match self.kind {
            TransactionKind::Income => self.account.as_deref() == Some(name),
            TransactionKind::Transfer => self.to_account.as_deref() == Some(name),
            TransactionKind::Expense => false,
        }
    }

    /// Whether the transaction takes money out of the account.
    pub fn debits(&self, name: &str) -> bool {
        match self.kind {
            TransactionKind::Expense => self.account.as_deref() == Some(name),
            TransactionKind::Transfer => self.from_account.as_deref() == Some(name),
            TransactionKind::Income => false,
        }
    }
}

/// Removes duplicate tag names, preserving first-seen order.
pub(crate) fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(tags.len());
    for tag in tags {
        if !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    seen
}

/// Enumerates the supported transaction kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Expense,
    Income,
    Transfer,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionKind::Expense => "expense",
            TransactionKind::Income => "income",
            TransactionKind::Transfer => "transfer",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_tags_drops_duplicates() {
        let txn = Transaction::expense("Checking", 10.0, Utc::now())
            .with_tags(["petrol", "trip", "petrol"]);
        assert_eq!(txn.tags, vec!["petrol", "trip"]);
    }

    #[test]
    fn transfer_touches_both_sides() {
        let txn = Transaction::transfer("Checking", "Savings", 50.0, Utc::now());
        assert!(txn.touches_account("Checking"));
        assert!(txn.touches_account("Savings"));
        assert!(!txn.touches_account("Credit Card"));
        assert!(txn.debits("Checking"));
        assert!(txn.credits("Savings"));
        assert!(!txn.credits("Checking"));
    }

    #[test]
    fn expense_only_debits_its_account() {
        let txn = Transaction::expense("Checking", 10.0, Utc::now());
        assert!(txn.debits("Checking"));
        assert!(!txn.credits("Checking"));
    }

    #[test]
    fn kind_serializes_lowercase() {
        let json = serde_json::to_string(&TransactionKind::Expense).unwrap();
        assert_eq!(json, "\"expense\"");
    }
}
