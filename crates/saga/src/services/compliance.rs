//! Compliance service trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{AccountId, Money, TransactionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SagaError;

/// Verdict of a compliance validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

/// The compliance service's answer for one transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceDecision {
    pub decision: Decision,
    /// Rejection reasons; empty on approval.
    #[serde(default)]
    pub reasons: Vec<String>,
}

impl ComplianceDecision {
    /// Returns true if the transfer may proceed.
    pub fn is_approved(&self) -> bool {
        self.decision == Decision::Approve
    }
}

/// The payload submitted for validation. The amount carries the
/// resolved settlement currency, not the caller's requested one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceCheck {
    pub transaction_id: TransactionId,
    pub source_account_id: AccountId,
    pub destination_account_id: AccountId,
    pub amount: Money,
}

/// Trait for compliance validation.
#[async_trait]
pub trait ComplianceService: Send + Sync {
    /// Submits a transfer for validation.
    async fn validate(&self, check: &ComplianceCheck) -> Result<ComplianceDecision, SagaError>;
}

/// Default amount above which the in-memory policy rejects.
const DEFAULT_AMOUNT_LIMIT: i64 = 5000;

#[derive(Debug)]
struct InMemoryComplianceState {
    amount_limit: Decimal,
    reject_all: bool,
    validation_count: usize,
}

impl Default for InMemoryComplianceState {
    fn default() -> Self {
        Self {
            amount_limit: Decimal::from(DEFAULT_AMOUNT_LIMIT),
            reject_all: false,
            validation_count: 0,
        }
    }
}

/// In-memory compliance service for the simulated environment and
/// tests. Rejects amounts above a configurable limit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryComplianceService {
    state: Arc<RwLock<InMemoryComplianceState>>,
}

impl InMemoryComplianceService {
    /// Creates a new in-memory compliance service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the amount above which transfers are rejected.
    pub fn set_amount_limit(&self, limit: Decimal) {
        self.state.write().unwrap().amount_limit = limit;
    }

    /// Configures the service to reject every transfer.
    pub fn set_reject_all(&self, reject: bool) {
        self.state.write().unwrap().reject_all = reject;
    }

    /// Returns the number of validations performed.
    pub fn validation_count(&self) -> usize {
        self.state.read().unwrap().validation_count
    }
}

#[async_trait]
impl ComplianceService for InMemoryComplianceService {
    async fn validate(&self, check: &ComplianceCheck) -> Result<ComplianceDecision, SagaError> {
        let mut state = self.state.write().unwrap();
        state.validation_count += 1;

        let mut reasons = Vec::new();
        if state.reject_all {
            reasons.push("POLICY_REJECT_ALL".to_string());
        }
        if check.amount.value > state.amount_limit {
            reasons.push("AMOUNT_OVER_LIMIT".to_string());
        }

        let decision = if reasons.is_empty() {
            Decision::Approve
        } else {
            Decision::Reject
        };
        Ok(ComplianceDecision { decision, reasons })
    }
}
