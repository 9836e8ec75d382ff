//! Saga orchestrator for money transfers.

use common::{TransactionId, TransactionStatus};
use store::{TransactionRecord, TransactionStore};

use crate::compensation::{CompensationAction, CompensationStack};
use crate::error::SagaError;
use crate::services::compliance::{ComplianceCheck, ComplianceService};
use crate::services::ledger::LedgerService;
use crate::transfer::{
    FundsMovementPolicy, NewTransfer, SAGA_TYPE, STEP_COMPLIANCE_CHECK, STEP_MOVE_FUNDS,
    STEP_RESOLVE_ACCOUNTS,
};

/// Orchestrates the execution of transfer sagas.
///
/// Drives each transaction record through its lifecycle by invoking
/// the ledger and compliance clients in a fixed order (account
/// resolution → compliance check → funds movement), persisting every
/// status transition to the transaction store and compensating
/// already-applied effects when a later step fails.
pub struct SagaOrchestrator<R, L, C>
where
    R: TransactionStore,
    L: LedgerService,
    C: ComplianceService,
{
    store: R,
    ledger: L,
    compliance: C,
    policy: FundsMovementPolicy,
}

impl<R, L, C> SagaOrchestrator<R, L, C>
where
    R: TransactionStore,
    L: LedgerService,
    C: ComplianceService,
{
    /// Creates an orchestrator using the atomic-transfer policy.
    pub fn new(store: R, ledger: L, compliance: C) -> Self {
        Self {
            store,
            ledger,
            compliance,
            policy: FundsMovementPolicy::default(),
        }
    }

    /// Overrides the funds-movement policy.
    pub fn with_policy(mut self, policy: FundsMovementPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Synchronous part of the saga: validates the intent and creates
    /// the record in `pending`.
    ///
    /// A repeated request carrying an already-seen idempotency key
    /// returns the existing record instead of starting a second saga.
    #[tracing::instrument(skip(self, transfer))]
    pub async fn begin(&self, transfer: NewTransfer) -> Result<TransactionRecord, SagaError> {
        if transfer.source_account_id == transfer.destination_account_id {
            return Err(SagaError::SameAccount);
        }
        if !transfer.amount.is_positive() {
            return Err(SagaError::InvalidAmount);
        }

        let record = TransactionRecord::pending(
            transfer.source_account_id,
            transfer.destination_account_id,
            transfer.amount,
            transfer.description,
            transfer.idempotency_key,
        );
        let new_id = record.id;
        // The key lookup and the insert are one atomic store call, so
        // concurrent submissions with the same key settle on one record.
        let record = self.store.create_idempotent(record).await?;
        if record.id != new_id {
            tracing::info!(
                transaction_id = %record.id,
                "duplicate transfer request mapped to existing record"
            );
            return Ok(record);
        }

        metrics::counter!("saga_executions_total").increment(1);
        tracing::info!(transaction_id = %record.id, "transfer accepted");
        Ok(record)
    }

    /// Detached part of the saga: executes the step pipeline for a
    /// previously created record.
    ///
    /// Step failures are a handled outcome — the record ends `failed`
    /// and `Ok(())` is returned. An `Err` means the orchestrator
    /// itself could not make progress (store fault, unknown record).
    #[tracing::instrument(skip(self), fields(saga_type = SAGA_TYPE))]
    pub async fn run(&self, transaction_id: TransactionId) -> Result<(), SagaError> {
        let saga_start = std::time::Instant::now();

        let record = self
            .store
            .get(transaction_id)
            .await?
            .ok_or(SagaError::TransactionNotFound(transaction_id))?;
        if record.status != TransactionStatus::Pending {
            tracing::warn!(
                %transaction_id,
                status = %record.status,
                "saga already advanced, nothing to run"
            );
            return Ok(());
        }

        // Step 1: account resolution. No side effect has been applied
        // yet, so failure needs no compensation.
        tracing::info!(step = STEP_RESOLVE_ACCOUNTS, "saga step started");
        let source = match self.ledger.resolve_account(&record.source_account_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                return self
                    .fail(transaction_id, STEP_RESOLVE_ACCOUNTS, &e, saga_start)
                    .await;
            }
        };
        if let Err(e) = self
            .ledger
            .resolve_account(&record.destination_account_id)
            .await
        {
            return self
                .fail(transaction_id, STEP_RESOLVE_ACCOUNTS, &e, saga_start)
                .await;
        }

        // The settlement currency is whatever the source account
        // reports. Written at most once, before any funds movement.
        let currency = source.balance.currency;
        let record = self
            .store
            .update(
                transaction_id,
                Box::new(move |r| r.amount = r.amount.with_currency(currency)),
            )
            .await?;
        let amount = record.amount.clone();

        // Step 2: compliance check. Funds never move before approval.
        tracing::info!(step = STEP_COMPLIANCE_CHECK, "saga step started");
        let check = ComplianceCheck {
            transaction_id,
            source_account_id: record.source_account_id.clone(),
            destination_account_id: record.destination_account_id.clone(),
            amount: amount.clone(),
        };
        match self.compliance.validate(&check).await {
            Ok(decision) if decision.is_approved() => {}
            Ok(decision) => {
                let e = SagaError::ComplianceRejected {
                    reasons: decision.reasons,
                };
                return self
                    .fail(transaction_id, STEP_COMPLIANCE_CHECK, &e, saga_start)
                    .await;
            }
            Err(e) => {
                return self
                    .fail(transaction_id, STEP_COMPLIANCE_CHECK, &e, saga_start)
                    .await;
            }
        }
        self.transition(transaction_id, TransactionStatus::Processing)
            .await?;

        // Step 3: funds movement.
        tracing::info!(step = STEP_MOVE_FUNDS, policy = ?self.policy, "saga step started");
        if let Err(e) = self.move_funds(&record).await {
            return self
                .fail(transaction_id, STEP_MOVE_FUNDS, &e, saga_start)
                .await;
        }

        // Finalize
        self.transition(transaction_id, TransactionStatus::Completed)
            .await?;
        let duration = saga_start.elapsed().as_secs_f64();
        metrics::histogram!("saga_duration_seconds").record(duration);
        metrics::counter!("saga_completed").increment(1);
        tracing::info!(%transaction_id, duration, "saga completed successfully");
        Ok(())
    }

    /// Moves the funds per the configured policy, compensating an
    /// applied debit if the credit leg fails.
    async fn move_funds(&self, record: &TransactionRecord) -> Result<(), SagaError> {
        let amount = &record.amount;
        match self.policy {
            FundsMovementPolicy::AtomicTransfer => {
                // A failed call leaves ledger state unchanged by
                // construction; nothing to compensate.
                self.ledger
                    .transfer(
                        &record.source_account_id,
                        &record.destination_account_id,
                        amount,
                        &record.id.to_string(),
                    )
                    .await
            }
            FundsMovementPolicy::DebitThenCredit => {
                let mut compensations = CompensationStack::new();

                self.ledger
                    .debit(
                        &record.source_account_id,
                        amount,
                        &format!("{}:debit", record.id),
                    )
                    .await?;
                compensations.push(CompensationAction::CreditBack {
                    account_id: record.source_account_id.clone(),
                    amount: amount.clone(),
                    request_id: format!("{}:reversal", record.id),
                });

                match self
                    .ledger
                    .credit(
                        &record.destination_account_id,
                        amount,
                        &format!("{}:credit", record.id),
                    )
                    .await
                {
                    Ok(()) => Ok(()),
                    Err(e) => {
                        // The stack logs and counts each reversal
                        // failure; the saga fails either way.
                        let _failures = compensations.unwind(&self.ledger).await;
                        Err(e)
                    }
                }
            }
        }
    }

    /// Advances the record's status, enforcing the state machine.
    async fn transition(
        &self,
        id: TransactionId,
        to: TransactionStatus,
    ) -> Result<TransactionRecord, SagaError> {
        let record = self
            .store
            .get(id)
            .await?
            .ok_or(SagaError::TransactionNotFound(id))?;
        if !record.status.can_transition_to(to) {
            return Err(SagaError::InvalidTransition {
                from: record.status,
                to,
            });
        }
        let updated = self
            .store
            .update(id, Box::new(move |r| r.status = to))
            .await?;
        tracing::info!(transaction_id = %id, status = %to, "status advanced");
        Ok(updated)
    }

    /// Marks the saga failed after a step failure.
    async fn fail(
        &self,
        id: TransactionId,
        step: &str,
        error: &SagaError,
        saga_start: std::time::Instant,
    ) -> Result<(), SagaError> {
        tracing::warn!(transaction_id = %id, step, error = %error, "saga step failed");
        self.transition(id, TransactionStatus::Failed).await?;
        metrics::histogram!("saga_duration_seconds").record(saga_start.elapsed().as_secs_f64());
        metrics::counter!("saga_failed").increment(1);
        Ok(())
    }
}
