//! Engine logic: the transaction log, the account ledger with balance
//! reconciliation, the tag aggregator, and the orchestrating tracker.

pub mod account_ledger;
pub mod clock;
pub mod errors;
pub mod tags;
pub mod tracker;
pub mod transaction_log;

pub use account_ledger::{AccountLedger, ExportRow, LedgerTotals};
pub use clock::{Clock, SystemClock};
pub use errors::{ExpenseError, Result};
pub use tracker::Tracker;
pub use transaction_log::TransactionLog;
