//! Transfer submission and transaction query endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{AccountId, Money, TransactionId, TransactionStatus};
use rust_decimal::Decimal;
use saga::{
    ComplianceService, LedgerService, NewTransfer, SagaOrchestrator, SagaRunner,
};
use serde::{Deserialize, Serialize};
use store::{EntryDirection, Page, TransactionRecord, TransactionStore};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<R, L, C>
where
    R: TransactionStore,
    L: LedgerService,
    C: ComplianceService,
{
    pub orchestrator: Arc<SagaOrchestrator<R, L, C>>,
    pub runner: SagaRunner,
    pub store: R,
    pub ledger: L,
}

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub transaction_type: Option<String>,
    pub source_account_id: Option<String>,
    pub destination_account_id: Option<String>,
    pub amount: Option<AmountRequest>,
    pub description: Option<String>,
    pub idempotency_key: Option<String>,
}

#[derive(Deserialize)]
pub struct AmountRequest {
    pub value: Option<Decimal>,
    pub currency: Option<String>,
}

// Raw signed values; `Page::clamped` brings them into range rather
// than letting the extractor reject the request.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionAcceptedResponse {
    pub transaction_id: String,
    pub status: TransactionStatus,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub transaction_id: String,
    pub status: TransactionStatus,
    pub timestamp: String,
    pub source_account_id: AccountId,
    pub destination_account_id: AccountId,
    pub amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TransactionResponse {
    fn from_record(record: TransactionRecord) -> Self {
        Self {
            transaction_id: record.id.to_string(),
            status: record.status,
            timestamp: record.created_at.to_rfc3339(),
            source_account_id: record.source_account_id,
            destination_account_id: record.destination_account_id,
            amount: record.amount,
            description: record.description,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountEntryResponse {
    pub direction: EntryDirection,
    #[serde(flatten)]
    pub transaction: TransactionResponse,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub account_id: AccountId,
    pub balance: Money,
}

// -- Handlers --

/// POST /transactions — accept a transfer and run its saga detached.
///
/// Only request-shape problems are reported here; everything after the
/// `202` lands in the record, which callers poll.
#[tracing::instrument(skip(state, req))]
pub async fn create<R, L, C>(
    State(state): State<Arc<AppState<R, L, C>>>,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<TransactionAcceptedResponse>), ApiError>
where
    R: TransactionStore + Clone + 'static,
    L: LedgerService + Clone + 'static,
    C: ComplianceService + 'static,
{
    let transaction_type = req
        .transaction_type
        .ok_or_else(|| ApiError::missing_fields("transactionType is required"))?;
    let source = req
        .source_account_id
        .ok_or_else(|| ApiError::missing_fields("sourceAccountId is required"))?;
    let destination = req
        .destination_account_id
        .ok_or_else(|| ApiError::missing_fields("destinationAccountId is required"))?;
    let amount = req
        .amount
        .ok_or_else(|| ApiError::missing_fields("amount is required"))?;
    let value = amount
        .value
        .ok_or_else(|| ApiError::missing_fields("amount.value is required"))?;

    if transaction_type != "transfer" {
        return Err(ApiError::invalid_request(format!(
            "Unsupported transaction type: {transaction_type}"
        )));
    }

    // The request currency is provisional; the saga settles in the
    // source account's currency.
    let currency = amount.currency.unwrap_or_else(|| "USD".to_string());
    let mut transfer = NewTransfer::new(source, destination, Money::new(value, currency));
    if let Some(description) = req.description {
        transfer = transfer.with_description(description);
    }
    if let Some(key) = req.idempotency_key {
        transfer = transfer.with_idempotency_key(key);
    }

    let record = state.orchestrator.begin(transfer).await?;
    state.runner.submit(record.id)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(TransactionAcceptedResponse {
            transaction_id: record.id.to_string(),
            status: record.status,
        }),
    ))
}

/// GET /transactions/:id — current projection of one transaction.
#[tracing::instrument(skip(state))]
pub async fn get<R, L, C>(
    State(state): State<Arc<AppState<R, L, C>>>,
    Path(id): Path<String>,
) -> Result<Json<TransactionResponse>, ApiError>
where
    R: TransactionStore + Clone + 'static,
    L: LedgerService + Clone + 'static,
    C: ComplianceService + 'static,
{
    let transaction_id = parse_transaction_id(&id)?;
    let record = state
        .store
        .get(transaction_id)
        .await?
        .ok_or_else(|| ApiError::transaction_not_found(transaction_id))?;

    Ok(Json(TransactionResponse::from_record(record)))
}

/// GET /accounts/:id/transactions — paginated history for one account,
/// newest first, each entry tagged with its direction.
#[tracing::instrument(skip(state))]
pub async fn list_for_account<R, L, C>(
    State(state): State<Arc<AppState<R, L, C>>>,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<AccountEntryResponse>>, ApiError>
where
    R: TransactionStore + Clone + 'static,
    L: LedgerService + Clone + 'static,
    C: ComplianceService + 'static,
{
    let account_id = AccountId::new(id);
    let page = Page::clamped(query.limit, query.offset);
    let records = state.store.list_by_account(&account_id, page).await?;

    let entries: Vec<AccountEntryResponse> = records
        .into_iter()
        .filter_map(|record| {
            record.direction_for(&account_id).map(|direction| {
                AccountEntryResponse {
                    direction,
                    transaction: TransactionResponse::from_record(record),
                }
            })
        })
        .collect();

    Ok(Json(entries))
}

/// GET /accounts/:id/balance — balance probe against the ledger.
#[tracing::instrument(skip(state))]
pub async fn balance<R, L, C>(
    State(state): State<Arc<AppState<R, L, C>>>,
    Path(id): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError>
where
    R: TransactionStore + Clone + 'static,
    L: LedgerService + Clone + 'static,
    C: ComplianceService + 'static,
{
    let account_id = AccountId::new(id);
    let snapshot = state.ledger.resolve_account(&account_id).await?;

    Ok(Json(BalanceResponse {
        account_id: snapshot.id,
        balance: snapshot.balance,
    }))
}

fn parse_transaction_id(id: &str) -> Result<TransactionId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::invalid_request(format!("Invalid transaction ID: {e}")))?;
    Ok(TransactionId::from_uuid(uuid))
}
