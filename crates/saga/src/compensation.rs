//! Compensating actions for partially applied sagas.

use common::{AccountId, Money};

use crate::error::SagaError;
use crate::services::ledger::LedgerService;

/// An action that semantically undoes a previously applied step.
#[derive(Debug, Clone)]
pub enum CompensationAction {
    /// Reverses a debit by crediting the same amount back to the
    /// source account.
    CreditBack {
        account_id: AccountId,
        amount: Money,
        request_id: String,
    },
}

impl CompensationAction {
    /// Short description for logs and errors.
    pub fn describe(&self) -> String {
        match self {
            CompensationAction::CreditBack { account_id, amount, .. } => {
                format!("credit_back {amount} to {account_id}")
            }
        }
    }
}

/// An ordered stack of compensating actions.
///
/// Actions are pushed as each reversible step applies and unwound in
/// reverse order when a later step fails. Each action is attempted
/// exactly once and never retried; a failed compensation leaves the
/// ledger inconsistent with the recorded outcome, so it is surfaced
/// loudly rather than masked.
#[derive(Debug, Default)]
pub struct CompensationStack {
    actions: Vec<CompensationAction>,
}

impl CompensationStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a compensating action for an applied step.
    pub fn push(&mut self, action: CompensationAction) {
        self.actions.push(action);
    }

    /// Returns true if no actions have been recorded.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Executes all recorded actions in reverse order, consuming the
    /// stack. Failures do not stop the unwind; every failure is
    /// returned so the caller can raise the alert.
    pub async fn unwind<L: LedgerService>(self, ledger: &L) -> Vec<SagaError> {
        let mut failures = Vec::new();
        for action in self.actions.into_iter().rev() {
            let described = action.describe();
            let result = match &action {
                CompensationAction::CreditBack {
                    account_id,
                    amount,
                    request_id,
                } => ledger.credit(account_id, amount, request_id).await,
            };
            match result {
                Ok(()) => {
                    tracing::info!(action = %described, "compensation applied");
                }
                Err(e) => {
                    // Manual remediation required: debited, not credited, not reverted
                    tracing::error!(
                        target: "saga::alert",
                        action = %described,
                        error = %e,
                        "compensation failed, ledger state inconsistent"
                    );
                    metrics::counter!("saga_compensation_failures").increment(1);
                    failures.push(SagaError::CompensationFailed {
                        action: described,
                        reason: e.to_string(),
                    });
                }
            }
        }
        failures
    }
}
