use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents a tracked financial account and its check-in history.
///
/// `updates` is ordered newest first; the head is always the most recent
/// balance report. Accounts are identified by `name`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub name: String,
    pub kind: AccountKind,
    pub balance: f64,
    #[serde(default)]
    pub updates: Vec<AccountUpdate>,
}

impl Account {
    /// Creates an account with the given starting balance and no history.
    pub fn new(name: impl Into<String>, kind: AccountKind, balance: f64) -> Self {
        Self {
            name: name.into(),
            kind,
            balance,
            updates: Vec::new(),
        }
    }

    /// Returns the most recent balance report, if any.
    pub fn latest_update(&self) -> Option<&AccountUpdate> {
        self.updates.first()
    }
}

/// One reconciled balance report. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountUpdate {
    pub date: DateTime<Utc>,
    pub balance: f64,
    pub input_income: f64,
    pub input_expense: f64,
    /// Outflow implied by the balance delta net of known income. Exceeds
    /// `input_expense` by whatever spending the log never captured; negative
    /// values mean unexplained income and are preserved as-is.
    pub balance_based_expense: f64,
}

/// Enumerates the supported account classifications.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccountKind {
    Savings,
    CreditCard,
    LoanOrMisc,
    Current,
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AccountKind::Savings => "Savings",
            AccountKind::CreditCard => "Credit Card",
            AccountKind::LoanOrMisc => "Loan and Misc",
            AccountKind::Current => "Current Account",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_update_is_head_of_history() {
        let mut account = Account::new("Checking", AccountKind::Current, 100.0);
        assert!(account.latest_update().is_none());

        account.updates.insert(
            0,
            AccountUpdate {
                date: Utc::now(),
                balance: 80.0,
                input_income: 0.0,
                input_expense: 20.0,
                balance_based_expense: 20.0,
            },
        );
        assert_eq!(account.latest_update().unwrap().balance, 80.0);
    }

    #[test]
    fn kind_labels_are_stable() {
        assert_eq!(AccountKind::CreditCard.to_string(), "Credit Card");
        assert_eq!(AccountKind::LoanOrMisc.to_string(), "Loan and Misc");
    }
}
