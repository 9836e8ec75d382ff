//! Detached saga execution.

use std::sync::Arc;

use common::TransactionId;
use tokio::sync::{mpsc, oneshot};

use crate::error::SagaError;
use crate::orchestrator::SagaOrchestrator;
use crate::services::compliance::ComplianceService;
use crate::services::ledger::LedgerService;
use store::TransactionStore;

/// A unit of work for the saga worker.
#[derive(Debug)]
pub struct SagaJob {
    pub transaction_id: TransactionId,
    /// Completion/error channel for the submitter. The HTTP response
    /// path never holds one; it acknowledges with the record id and
    /// lets callers poll the record for the outcome.
    pub completion: Option<oneshot::Sender<Result<(), SagaError>>>,
}

/// Handle for submitting sagas to the background worker.
///
/// The ingress boundary holds only this handle and the record id,
/// never a handle into the running task, keeping the HTTP response
/// path decoupled from saga execution.
#[derive(Clone)]
pub struct SagaRunner {
    queue: mpsc::UnboundedSender<SagaJob>,
}

impl SagaRunner {
    /// Spawns the worker task draining the job queue.
    pub fn spawn<R, L, C>(orchestrator: Arc<SagaOrchestrator<R, L, C>>) -> Self
    where
        R: TransactionStore + 'static,
        L: LedgerService + 'static,
        C: ComplianceService + 'static,
    {
        let (queue, mut jobs) = mpsc::unbounded_channel::<SagaJob>();
        tokio::spawn(async move {
            while let Some(job) = jobs.recv().await {
                let result = orchestrator.run(job.transaction_id).await;
                if let Err(ref e) = result {
                    tracing::error!(
                        transaction_id = %job.transaction_id,
                        error = %e,
                        "saga run aborted"
                    );
                }
                if let Some(done) = job.completion {
                    // Submitter may have stopped listening
                    let _ = done.send(result);
                }
            }
            tracing::info!("saga runner queue closed, worker exiting");
        });
        Self { queue }
    }

    /// Submits a saga for detached execution.
    pub fn submit(&self, transaction_id: TransactionId) -> Result<(), SagaError> {
        self.queue
            .send(SagaJob {
                transaction_id,
                completion: None,
            })
            .map_err(|_| SagaError::RunnerUnavailable)
    }

    /// Submits a saga and returns a channel resolving when it has
    /// finished. Used by tests and operational tooling.
    pub fn submit_with_completion(
        &self,
        transaction_id: TransactionId,
    ) -> Result<oneshot::Receiver<Result<(), SagaError>>, SagaError> {
        let (done, receiver) = oneshot::channel();
        self.queue
            .send(SagaJob {
                transaction_id,
                completion: Some(done),
            })
            .map_err(|_| SagaError::RunnerUnavailable)?;
        Ok(receiver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::compliance::InMemoryComplianceService;
    use crate::services::ledger::InMemoryLedgerService;
    use crate::transfer::NewTransfer;
    use common::{Money, TransactionStatus};
    use rust_decimal::Decimal;
    use store::InMemoryTransactionStore;

    fn setup() -> (
        Arc<
            SagaOrchestrator<
                InMemoryTransactionStore,
                InMemoryLedgerService,
                InMemoryComplianceService,
            >,
        >,
        InMemoryTransactionStore,
    ) {
        let store = InMemoryTransactionStore::new();
        let orchestrator = Arc::new(SagaOrchestrator::new(
            store.clone(),
            InMemoryLedgerService::new(),
            InMemoryComplianceService::new(),
        ));
        (orchestrator, store)
    }

    #[tokio::test]
    async fn submitted_saga_runs_to_completion() {
        let (orchestrator, store) = setup();
        let runner = SagaRunner::spawn(orchestrator.clone());

        let record = orchestrator
            .begin(NewTransfer::new(
                "acc-src",
                "acc-dst",
                Money::new(Decimal::from(100), "USD"),
            ))
            .await
            .unwrap();

        let done = runner.submit_with_completion(record.id).unwrap();
        done.await.unwrap().unwrap();

        let record = store.get(record.id).await.unwrap().unwrap();
        assert_eq!(record.status, TransactionStatus::Completed);
    }

    #[tokio::test]
    async fn fire_and_forget_submit_is_accepted() {
        let (orchestrator, _store) = setup();
        let runner = SagaRunner::spawn(orchestrator.clone());

        let record = orchestrator
            .begin(NewTransfer::new(
                "acc-a",
                "acc-b",
                Money::new(Decimal::from(10), "USD"),
            ))
            .await
            .unwrap();

        runner.submit(record.id).unwrap();
    }

    #[tokio::test]
    async fn worker_survives_a_failed_run() {
        let (orchestrator, store) = setup();
        let runner = SagaRunner::spawn(orchestrator.clone());

        // Unknown record: the run errors, the worker keeps going
        let unknown = runner.submit_with_completion(TransactionId::new()).unwrap();
        assert!(unknown.await.unwrap().is_err());

        let record = orchestrator
            .begin(NewTransfer::new(
                "acc-src",
                "acc-dst",
                Money::new(Decimal::from(100), "USD"),
            ))
            .await
            .unwrap();
        let done = runner.submit_with_completion(record.id).unwrap();
        done.await.unwrap().unwrap();

        let record = store.get(record.id).await.unwrap().unwrap();
        assert_eq!(record.status, TransactionStatus::Completed);
    }
}
