//! Collaborator service traits and implementations.

pub mod compliance;
pub mod http;
pub mod ledger;

pub use compliance::{
    ComplianceCheck, ComplianceDecision, ComplianceService, Decision, InMemoryComplianceService,
};
pub use http::{HttpComplianceClient, HttpLedgerClient};
pub use ledger::{AccountSnapshot, InMemoryLedgerService, LedgerService};
