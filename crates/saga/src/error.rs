//! Saga error types.

use common::{AccountId, TransactionId, TransactionStatus};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during saga operations.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Source and destination accounts are the same.
    #[error("Source and destination accounts must differ")]
    SameAccount,

    /// The transfer amount is zero or negative.
    #[error("Transfer amount must be positive")]
    InvalidAmount,

    /// Transaction record not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// The ledger does not know the account.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Ledger service call failure.
    #[error("Ledger service error: {0}")]
    LedgerService(String),

    /// Compliance service call failure.
    #[error("Compliance service error: {0}")]
    ComplianceService(String),

    /// The compliance service rejected the transfer.
    #[error("Transfer rejected by compliance: {}", reasons.join(", "))]
    ComplianceRejected { reasons: Vec<String> },

    /// A compensating action failed; ledger state may be inconsistent
    /// with the recorded outcome and requires manual remediation.
    #[error("Compensation '{action}' failed: {reason}")]
    CompensationFailed { action: String, reason: String },

    /// Status transition not allowed by the state machine.
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: TransactionStatus,
        to: TransactionStatus,
    },

    /// Transaction store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The saga runner has shut down and is not accepting work.
    #[error("Saga runner is not accepting work")]
    RunnerUnavailable,
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
