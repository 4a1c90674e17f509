use thiserror::Error;
use uuid::Uuid;

use crate::storage::StorageError;

/// Unified error type for engine operations.
///
/// Mutations surface validation failures before touching any state. Storage
/// failures only escape when the local fallback floor gives way too; by then
/// the in-memory mutation has been rolled back.
#[derive(Debug, Error)]
pub enum ExpenseError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Account `{0}` already exists")]
    DuplicateAccount(String),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),
    #[error("Invalid amount: `{0}` is not a number")]
    InvalidAmount(String),
    #[error("Tag not found: {0}")]
    TagNotFound(String),
    #[error("Tag `{0}` already exists")]
    DuplicateTag(String),
    #[error("Tag `{0}` is preloaded and cannot be changed")]
    TagProtected(String),
    #[error("Persistence error: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, ExpenseError>;
