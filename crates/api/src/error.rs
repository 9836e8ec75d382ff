//! API error types with HTTP response mapping.
//!
//! Every error renders as `{ "code": ..., "message": ... }` so clients
//! can branch on a stable code instead of parsing prose.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::TransactionId;
use saga::SagaError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Request shape or content rejected before any saga starts.
    BadRequest {
        code: &'static str,
        message: String,
    },
    /// Referenced resource does not exist.
    NotFound {
        code: &'static str,
        message: String,
    },
    /// Saga-layer error surfaced on the synchronous path.
    Saga(SagaError),
    /// Internal server error.
    Internal(String),
}

impl ApiError {
    pub fn missing_fields(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            code: "MISSING_FIELDS",
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            code: "INVALID_REQUEST",
            message: message.into(),
        }
    }

    pub fn transaction_not_found(id: TransactionId) -> Self {
        ApiError::NotFound {
            code: "TRANSACTION_NOT_FOUND",
            message: format!("Transaction {id} not found"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            ApiError::NotFound { code, message } => (StatusCode::NOT_FOUND, code, message),
            ApiError::Saga(err) => saga_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
        };

        let body = serde_json::json!({ "code": code, "message": message });
        (status, axum::Json(body)).into_response()
    }
}

fn saga_error_to_response(err: SagaError) -> (StatusCode, &'static str, String) {
    let message = err.to_string();
    match err {
        SagaError::SameAccount => (StatusCode::BAD_REQUEST, "SAME_ACCOUNT", message),
        SagaError::InvalidAmount => (StatusCode::BAD_REQUEST, "INVALID_AMOUNT", message),
        SagaError::TransactionNotFound(_) => {
            (StatusCode::NOT_FOUND, "TRANSACTION_NOT_FOUND", message)
        }
        SagaError::AccountNotFound(_) => (StatusCode::NOT_FOUND, "ACCOUNT_NOT_FOUND", message),
        SagaError::ComplianceRejected { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "COMPLIANCE_REJECTED",
            message,
        ),
        SagaError::RunnerUnavailable => (
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            message,
        ),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message),
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ApiError::transaction_not_found(id),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
