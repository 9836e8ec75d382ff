//! Transfer saga step names and intent types.

use common::{AccountId, Money};

/// The saga type identifier for money transfers.
pub const SAGA_TYPE: &str = "Transfer";

/// Step name: Confirm both accounts and resolve the settlement currency.
pub const STEP_RESOLVE_ACCOUNTS: &str = "resolve_accounts";

/// Step name: Submit the transfer to the compliance service.
pub const STEP_COMPLIANCE_CHECK: &str = "compliance_check";

/// Step name: Move the funds through the ledger.
pub const STEP_MOVE_FUNDS: &str = "move_funds";

/// A validated transfer intent, as handed to the orchestrator by the
/// ingress boundary.
#[derive(Debug, Clone)]
pub struct NewTransfer {
    pub source_account_id: AccountId,
    pub destination_account_id: AccountId,
    pub amount: Money,
    pub description: Option<String>,
    /// Caller-supplied dedupe key; retried requests carrying the same
    /// key map to the same record.
    pub idempotency_key: Option<String>,
}

impl NewTransfer {
    /// Creates a transfer intent with no description or idempotency key.
    pub fn new(
        source_account_id: impl Into<AccountId>,
        destination_account_id: impl Into<AccountId>,
        amount: Money,
    ) -> Self {
        Self {
            source_account_id: source_account_id.into(),
            destination_account_id: destination_account_id.into(),
            amount,
            description: None,
            idempotency_key: None,
        }
    }

    /// Attaches a free-text description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches an idempotency key.
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// How the funds-movement step drives the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FundsMovementPolicy {
    /// One atomic transfer call. Any failure leaves ledger state
    /// unchanged by construction, so no compensation is needed.
    #[default]
    AtomicTransfer,

    /// Debit the source, then credit the destination. A credit failure
    /// is compensated by reversing the debit.
    DebitThenCredit,
}
