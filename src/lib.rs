//! expense_core
//!
//! Reconciliation and aggregation engine for a personal expense tracker.
//! Tracks accounts and their balance check-ins, attributes logged income and
//! expenses to each check-in window, derives the residual spending the log
//! does not explain, and maintains per-tag usage statistics. Persistence goes
//! through an injected async key/value store with a remote backend, a local
//! JSON fallback, and a periodic snapshot scheduler.
//!
//! No CLI, no terminal I/O. Callers own input validation and rendering.

pub mod config;
pub mod core;
pub mod domain;
pub mod storage;

pub use crate::core::errors::{ExpenseError, Result};
pub use crate::core::{AccountLedger, Clock, SystemClock, Tracker, TransactionLog};
pub use crate::domain::{
    Account, AccountKind, AccountUpdate, TagStat, Transaction, TransactionKind,
};
pub use crate::storage::{
    BackupScheduler, FailoverStore, LocalStore, PersistenceStore, RemoteStore, StorageError,
};
