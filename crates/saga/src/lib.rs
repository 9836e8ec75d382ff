//! Saga orchestration for money transfers.
//!
//! A transfer spans two independently-owned services (an account
//! ledger and a compliance checker), so no single call can make it
//! atomic. This crate coordinates the transfer as a saga:
//! 1. Resolve both accounts and the settlement currency
//! 2. Compliance check
//! 3. Funds movement
//!
//! On partial failure, already-applied effects are undone by
//! compensating actions executed in reverse order. When the ledger
//! exposes its atomic transfer primitive, no orchestrator-side
//! compensation is needed at all.

pub mod compensation;
pub mod error;
pub mod orchestrator;
pub mod runner;
pub mod services;
pub mod transfer;

pub use common::TransactionStatus;
pub use compensation::{CompensationAction, CompensationStack};
pub use error::{Result, SagaError};
pub use orchestrator::SagaOrchestrator;
pub use runner::{SagaJob, SagaRunner};
pub use services::{
    AccountSnapshot, ComplianceCheck, ComplianceDecision, ComplianceService, Decision,
    HttpComplianceClient, HttpLedgerClient, InMemoryComplianceService, InMemoryLedgerService,
    LedgerService,
};
pub use transfer::{FundsMovementPolicy, NewTransfer};
