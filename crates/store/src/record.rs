//! The transaction record, the unit of saga state.

use chrono::{DateTime, Utc};
use common::{AccountId, Money, TransactionId, TransactionStatus};
use serde::{Deserialize, Serialize};

/// Direction of a transaction relative to one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryDirection {
    /// The account is the source of the transfer.
    Debit,
    /// The account is the destination of the transfer.
    Credit,
}

impl EntryDirection {
    /// Returns the direction name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryDirection::Debit => "debit",
            EntryDirection::Credit => "credit",
        }
    }
}

/// The record of a single transfer saga.
///
/// Exactly one record exists per saga. It is created in `pending` by
/// the orchestrator, mutated only by the owning saga as it advances,
/// and never deleted (retained for audit and history).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Opaque unique identifier, assigned at saga start.
    pub id: TransactionId,
    /// Current lifecycle status; monotonic, never regresses.
    pub status: TransactionStatus,
    pub source_account_id: AccountId,
    pub destination_account_id: AccountId,
    /// Amount to move. The currency is provisional until account
    /// resolution rewrites it (at most once) with the source account's
    /// native currency.
    pub amount: Money,
    pub description: Option<String>,
    /// Caller-supplied dedupe key; a retried POST carrying the same
    /// key maps to this record instead of starting a second saga.
    pub idempotency_key: Option<String>,
    /// Fixed at creation; used only for ordering in listings.
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Creates a fresh record in `pending`.
    pub fn pending(
        source_account_id: AccountId,
        destination_account_id: AccountId,
        amount: Money,
        description: Option<String>,
        idempotency_key: Option<String>,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            status: TransactionStatus::Pending,
            source_account_id,
            destination_account_id,
            amount,
            description,
            idempotency_key,
            created_at: Utc::now(),
        }
    }

    /// Returns the direction of this transaction relative to the given
    /// account, or `None` if the account is not a party to it.
    pub fn direction_for(&self, account_id: &AccountId) -> Option<EntryDirection> {
        if &self.source_account_id == account_id {
            Some(EntryDirection::Debit)
        } else if &self.destination_account_id == account_id {
            Some(EntryDirection::Credit)
        } else {
            None
        }
    }

    /// Returns true if the given account is a party to this transaction.
    pub fn touches(&self, account_id: &AccountId) -> bool {
        self.direction_for(account_id).is_some()
    }
}
