use common::TransactionId;
use thiserror::Error;

/// Errors that can occur when interacting with the transaction store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The transaction was not found in the store.
    #[error("Transaction not found: {0}")]
    NotFound(TransactionId),

    /// A record with this ID already exists.
    #[error("Transaction already exists: {0}")]
    DuplicateTransaction(TransactionId),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
