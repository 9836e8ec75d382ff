//! End-to-end saga scenarios against in-memory collaborators.

use std::sync::Arc;

use common::{AccountId, Money, TransactionStatus};
use rust_decimal::Decimal;
use saga::{
    FundsMovementPolicy, InMemoryComplianceService, InMemoryLedgerService, NewTransfer,
    SagaError, SagaOrchestrator,
};
use store::{InMemoryTransactionStore, TransactionStore};

type Orchestrator = SagaOrchestrator<
    InMemoryTransactionStore,
    InMemoryLedgerService,
    InMemoryComplianceService,
>;

fn usd(value: i64) -> Money {
    Money::new(Decimal::from(value), "USD")
}

fn setup(
    policy: FundsMovementPolicy,
) -> (
    Orchestrator,
    InMemoryTransactionStore,
    InMemoryLedgerService,
    InMemoryComplianceService,
) {
    let store = InMemoryTransactionStore::new();
    let ledger = InMemoryLedgerService::new();
    let compliance = InMemoryComplianceService::new();
    let orchestrator =
        SagaOrchestrator::new(store.clone(), ledger.clone(), compliance.clone()).with_policy(policy);
    (orchestrator, store, ledger, compliance)
}

#[tokio::test]
async fn successful_transfer_moves_balances() {
    let (orchestrator, store, ledger, _) = setup(FundsMovementPolicy::AtomicTransfer);
    let source = AccountId::new("acc-src");
    let destination = AccountId::new("acc-dst");

    let record = orchestrator
        .begin(NewTransfer::new("acc-src", "acc-dst", usd(100)).with_description("smoke"))
        .await
        .unwrap();
    assert_eq!(record.status, TransactionStatus::Pending);

    orchestrator.run(record.id).await.unwrap();

    let record = store.get(record.id).await.unwrap().unwrap();
    assert_eq!(record.status, TransactionStatus::Completed);
    // Fresh accounts open at 1000
    assert_eq!(ledger.balance_of(&source), Some(usd(900)));
    assert_eq!(ledger.balance_of(&destination), Some(usd(1100)));
}

#[tokio::test]
async fn balance_conservation_under_two_call_policy() {
    let (orchestrator, store, ledger, _) = setup(FundsMovementPolicy::DebitThenCredit);
    let source = AccountId::new("acc-src");
    let destination = AccountId::new("acc-dst");
    ledger.open_account(&source, usd(700));
    ledger.open_account(&destination, usd(50));

    let record = orchestrator
        .begin(NewTransfer::new("acc-src", "acc-dst", usd(300)))
        .await
        .unwrap();
    orchestrator.run(record.id).await.unwrap();

    let record = store.get(record.id).await.unwrap().unwrap();
    assert_eq!(record.status, TransactionStatus::Completed);
    assert_eq!(ledger.balance_of(&source), Some(usd(400)));
    assert_eq!(ledger.balance_of(&destination), Some(usd(350)));
}

#[tokio::test]
async fn compliance_rejection_leaves_balances_unchanged() {
    let (orchestrator, store, ledger, _) = setup(FundsMovementPolicy::AtomicTransfer);
    let source = AccountId::new("acc-rej-src");
    let destination = AccountId::new("acc-rej-dst");
    ledger.open_account(&source, usd(10_000));
    ledger.open_account(&destination, usd(10_000));

    // Default policy rejects amounts over 5000
    let record = orchestrator
        .begin(NewTransfer::new("acc-rej-src", "acc-rej-dst", usd(6000)))
        .await
        .unwrap();
    orchestrator.run(record.id).await.unwrap();

    let record = store.get(record.id).await.unwrap().unwrap();
    assert_eq!(record.status, TransactionStatus::Failed);
    assert_eq!(ledger.balance_of(&source), Some(usd(10_000)));
    assert_eq!(ledger.balance_of(&destination), Some(usd(10_000)));
}

#[tokio::test]
async fn funds_never_move_without_approval() {
    let (orchestrator, store, ledger, compliance) = setup(FundsMovementPolicy::DebitThenCredit);
    compliance.set_reject_all(true);
    let source = AccountId::new("acc-src");

    let record = orchestrator
        .begin(NewTransfer::new("acc-src", "acc-dst", usd(10)))
        .await
        .unwrap();
    orchestrator.run(record.id).await.unwrap();

    let record = store.get(record.id).await.unwrap().unwrap();
    assert_eq!(record.status, TransactionStatus::Failed);
    assert_eq!(ledger.balance_of(&source), Some(usd(1000)));
    assert_eq!(compliance.validation_count(), 1);
}

#[tokio::test]
async fn credit_failure_restores_source_exactly_once() {
    let (orchestrator, store, ledger, _) = setup(FundsMovementPolicy::DebitThenCredit);
    let source = AccountId::new("acc-src");
    let destination = AccountId::new("acc-dst");
    ledger.open_account(&source, usd(1000));
    ledger.open_account(&destination, usd(1000));
    ledger.set_reject_credit(&destination, true);

    let record = orchestrator
        .begin(NewTransfer::new("acc-src", "acc-dst", usd(100)))
        .await
        .unwrap();
    orchestrator.run(record.id).await.unwrap();

    let record = store.get(record.id).await.unwrap().unwrap();
    assert_eq!(record.status, TransactionStatus::Failed);
    // Source restored to its pre-saga value; destination untouched
    assert_eq!(ledger.balance_of(&source), Some(usd(1000)));
    assert_eq!(ledger.balance_of(&destination), Some(usd(1000)));
}

#[tokio::test]
async fn failed_reversal_is_not_silently_masked() {
    let (orchestrator, store, ledger, _) = setup(FundsMovementPolicy::DebitThenCredit);
    let source = AccountId::new("acc-src");
    let destination = AccountId::new("acc-dst");
    ledger.open_account(&source, usd(1000));
    ledger.open_account(&destination, usd(1000));
    // Credit fails on both legs: the transfer credit and the reversal
    ledger.set_reject_credit(&destination, true);
    ledger.set_reject_credit(&source, true);

    let record = orchestrator
        .begin(NewTransfer::new("acc-src", "acc-dst", usd(100)))
        .await
        .unwrap();
    orchestrator.run(record.id).await.unwrap();

    let record = store.get(record.id).await.unwrap().unwrap();
    assert_eq!(record.status, TransactionStatus::Failed);
    // Debited, not credited, not reverted: the inconsistency is
    // visible, not papered over with a fake restore
    assert_eq!(ledger.balance_of(&source), Some(usd(900)));
    assert_eq!(ledger.balance_of(&destination), Some(usd(1000)));
}

#[tokio::test]
async fn atomic_transfer_failure_needs_no_compensation() {
    let (orchestrator, store, ledger, _) = setup(FundsMovementPolicy::AtomicTransfer);
    let source = AccountId::new("acc-src");
    let destination = AccountId::new("acc-dst");
    ledger.open_account(&source, usd(1000));
    ledger.open_account(&destination, usd(1000));
    ledger.set_fail_on_transfer(true);

    let record = orchestrator
        .begin(NewTransfer::new("acc-src", "acc-dst", usd(100)))
        .await
        .unwrap();
    orchestrator.run(record.id).await.unwrap();

    let record = store.get(record.id).await.unwrap().unwrap();
    assert_eq!(record.status, TransactionStatus::Failed);
    assert_eq!(ledger.balance_of(&source), Some(usd(1000)));
    assert_eq!(ledger.balance_of(&destination), Some(usd(1000)));
}

#[tokio::test]
async fn unknown_account_fails_before_any_effect() {
    let (orchestrator, store, ledger, compliance) = setup(FundsMovementPolicy::AtomicTransfer);
    let source = AccountId::new("acc-ghost");
    ledger.set_unknown_account(&source);

    let record = orchestrator
        .begin(NewTransfer::new("acc-ghost", "acc-dst", usd(100)))
        .await
        .unwrap();
    orchestrator.run(record.id).await.unwrap();

    let record = store.get(record.id).await.unwrap().unwrap();
    assert_eq!(record.status, TransactionStatus::Failed);
    // Compliance was never consulted
    assert_eq!(compliance.validation_count(), 0);
}

#[tokio::test]
async fn settlement_currency_comes_from_source_account() {
    let (orchestrator, store, ledger, _) = setup(FundsMovementPolicy::AtomicTransfer);
    let source = AccountId::new("acc-eur-src");
    let destination = AccountId::new("acc-eur-dst");
    ledger.open_account(&source, Money::new(Decimal::from(1000), "EUR"));
    ledger.open_account(&destination, Money::new(Decimal::from(1000), "EUR"));

    // Caller asked for USD; the source account settles in EUR
    let record = orchestrator
        .begin(NewTransfer::new("acc-eur-src", "acc-eur-dst", usd(100)))
        .await
        .unwrap();
    orchestrator.run(record.id).await.unwrap();

    let record = store.get(record.id).await.unwrap().unwrap();
    assert_eq!(record.status, TransactionStatus::Completed);
    assert_eq!(record.amount.currency, "EUR");
    assert_eq!(record.amount.value, Decimal::from(100));
}

#[tokio::test]
async fn terminal_record_is_never_rerun() {
    let (orchestrator, store, ledger, _) = setup(FundsMovementPolicy::AtomicTransfer);
    let source = AccountId::new("acc-src");

    let record = orchestrator
        .begin(NewTransfer::new("acc-src", "acc-dst", usd(100)))
        .await
        .unwrap();
    orchestrator.run(record.id).await.unwrap();
    // A second run is a no-op, not a second transfer
    orchestrator.run(record.id).await.unwrap();

    let record = store.get(record.id).await.unwrap().unwrap();
    assert_eq!(record.status, TransactionStatus::Completed);
    assert_eq!(ledger.balance_of(&source), Some(usd(900)));
}

#[tokio::test]
async fn same_account_transfer_is_rejected_before_saga_start() {
    let (orchestrator, store, _, _) = setup(FundsMovementPolicy::AtomicTransfer);

    let result = orchestrator
        .begin(NewTransfer::new("acc-a", "acc-a", usd(100)))
        .await;
    assert!(matches!(result, Err(SagaError::SameAccount)));
    assert_eq!(store.record_count().await, 0);
}

#[tokio::test]
async fn non_positive_amount_is_rejected_before_saga_start() {
    let (orchestrator, store, _, _) = setup(FundsMovementPolicy::AtomicTransfer);

    let result = orchestrator
        .begin(NewTransfer::new("acc-a", "acc-b", usd(0)))
        .await;
    assert!(matches!(result, Err(SagaError::InvalidAmount)));
    assert_eq!(store.record_count().await, 0);
}

#[tokio::test]
async fn duplicate_idempotency_key_maps_to_one_record() {
    let (orchestrator, store, ledger, _) = setup(FundsMovementPolicy::AtomicTransfer);
    let source = AccountId::new("acc-src");

    let first = orchestrator
        .begin(NewTransfer::new("acc-src", "acc-dst", usd(100)).with_idempotency_key("retry-1"))
        .await
        .unwrap();
    let second = orchestrator
        .begin(NewTransfer::new("acc-src", "acc-dst", usd(100)).with_idempotency_key("retry-1"))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(store.record_count().await, 1);

    orchestrator.run(first.id).await.unwrap();
    orchestrator.run(second.id).await.unwrap();
    assert_eq!(ledger.balance_of(&source), Some(usd(900)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_begins_with_same_key_settle_on_one_record() {
    let (orchestrator, store, _, _) = setup(FundsMovementPolicy::AtomicTransfer);
    let orchestrator = Arc::new(orchestrator);
    let barrier = Arc::new(tokio::sync::Barrier::new(8));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let orchestrator = orchestrator.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            orchestrator
                .begin(
                    NewTransfer::new("acc-src", "acc-dst", usd(100))
                        .with_idempotency_key("race-1"),
                )
                .await
                .unwrap()
        }));
    }

    let mut ids = std::collections::HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap().id);
    }

    assert_eq!(ids.len(), 1);
    assert_eq!(store.record_count().await, 1);
}

#[tokio::test]
async fn run_of_unknown_transaction_errors() {
    let (orchestrator, _, _, _) = setup(FundsMovementPolicy::AtomicTransfer);
    let result = orchestrator.run(common::TransactionId::new()).await;
    assert!(matches!(result, Err(SagaError::TransactionNotFound(_))));
}
