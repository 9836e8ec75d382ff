//! HTTP-backed ledger and compliance clients.
//!
//! Used when the binary is deployed against real collaborator
//! services. Base URLs and the shared service key come from
//! environment-style configuration with documented defaults; a non-2xx
//! response is treated as call failure.

use async_trait::async_trait;
use common::{AccountId, Money};
use serde::{Deserialize, Serialize};

use crate::error::SagaError;
use crate::services::compliance::{ComplianceCheck, ComplianceDecision, ComplianceService};
use crate::services::ledger::{AccountSnapshot, LedgerService};

/// Header carrying the shared service key on every ledger call.
const SERVICE_KEY_HEADER: &str = "x-service-key";

const DEFAULT_LEDGER_BASE_URL: &str = "http://localhost:4000";
const DEFAULT_COMPLIANCE_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_SERVICE_KEY: &str = "dev-service-key";

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[derive(Debug, Deserialize)]
struct AccountBody {
    id: String,
    balance: Money,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MovementBody<'a> {
    request_id: &'a str,
    amount: &'a Money,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransferBody<'a> {
    request_id: &'a str,
    source_account_id: &'a AccountId,
    destination_account_id: &'a AccountId,
    amount: &'a Money,
}

/// Ledger client speaking to a remote ledger service.
#[derive(Debug, Clone)]
pub struct HttpLedgerClient {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl HttpLedgerClient {
    /// Creates a client for the given base URL and service key.
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            service_key: service_key.into(),
        }
    }

    /// Reads `LEDGER_BASE_URL` and `LEDGER_SERVICE_KEY`, falling back
    /// to the documented defaults.
    pub fn from_env() -> Self {
        Self::new(
            env_or("LEDGER_BASE_URL", DEFAULT_LEDGER_BASE_URL),
            env_or("LEDGER_SERVICE_KEY", DEFAULT_SERVICE_KEY),
        )
    }

    async fn post_movement<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), SagaError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header(SERVICE_KEY_HEADER, &self.service_key)
            .json(body)
            .send()
            .await
            .map_err(|e| SagaError::LedgerService(e.to_string()))?;

        if response.status().is_success() {
            return Ok(());
        }
        let status = response.status();
        let detail = response.text().await.unwrap_or_default();
        Err(SagaError::LedgerService(format!("{status}: {detail}")))
    }
}

#[async_trait]
impl LedgerService for HttpLedgerClient {
    async fn resolve_account(&self, account_id: &AccountId) -> Result<AccountSnapshot, SagaError> {
        let response = self
            .client
            .get(format!("{}/accounts/{}", self.base_url, account_id))
            .header(SERVICE_KEY_HEADER, &self.service_key)
            .send()
            .await
            .map_err(|e| SagaError::LedgerService(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(SagaError::AccountNotFound(account_id.clone()));
        }
        if !response.status().is_success() {
            return Err(SagaError::LedgerService(response.status().to_string()));
        }

        let body: AccountBody = response
            .json()
            .await
            .map_err(|e| SagaError::LedgerService(e.to_string()))?;
        Ok(AccountSnapshot {
            id: AccountId::new(body.id),
            balance: body.balance,
        })
    }

    async fn debit(
        &self,
        account_id: &AccountId,
        amount: &Money,
        request_id: &str,
    ) -> Result<(), SagaError> {
        self.post_movement(
            &format!("/accounts/{account_id}/debit"),
            &MovementBody { request_id, amount },
        )
        .await
    }

    async fn credit(
        &self,
        account_id: &AccountId,
        amount: &Money,
        request_id: &str,
    ) -> Result<(), SagaError> {
        self.post_movement(
            &format!("/accounts/{account_id}/credit"),
            &MovementBody { request_id, amount },
        )
        .await
    }

    async fn transfer(
        &self,
        source: &AccountId,
        destination: &AccountId,
        amount: &Money,
        request_id: &str,
    ) -> Result<(), SagaError> {
        self.post_movement(
            "/transfers",
            &TransferBody {
                request_id,
                source_account_id: source,
                destination_account_id: destination,
                amount,
            },
        )
        .await
    }
}

/// Compliance client speaking to a remote compliance service.
#[derive(Debug, Clone)]
pub struct HttpComplianceClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpComplianceClient {
    /// Creates a client for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Reads `COMPLIANCE_BASE_URL`, falling back to the documented
    /// default.
    pub fn from_env() -> Self {
        Self::new(env_or("COMPLIANCE_BASE_URL", DEFAULT_COMPLIANCE_BASE_URL))
    }
}

#[async_trait]
impl ComplianceService for HttpComplianceClient {
    async fn validate(&self, check: &ComplianceCheck) -> Result<ComplianceDecision, SagaError> {
        let response = self
            .client
            .post(format!("{}/validations", self.base_url))
            .json(check)
            .send()
            .await
            .map_err(|e| SagaError::ComplianceService(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SagaError::ComplianceService(response.status().to_string()));
        }

        response
            .json()
            .await
            .map_err(|e| SagaError::ComplianceService(e.to_string()))
    }
}
