//! Domain models for accounts, transactions, and tag statistics.

pub mod account;
pub mod tag;
pub mod transaction;

pub use account::{Account, AccountKind, AccountUpdate};
pub use tag::{TagStat, PRELOADED_TAGS};
pub use transaction::{Transaction, TransactionKind};
