//! HTTP ingress for the transfer saga service.
//!
//! Accepts transfer requests, hands them to the detached saga runner,
//! and serves transaction projections, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{
    ComplianceService, FundsMovementPolicy, HttpComplianceClient, HttpLedgerClient,
    InMemoryComplianceService, InMemoryLedgerService, LedgerService, SagaOrchestrator, SagaRunner,
};
use store::{InMemoryTransactionStore, TransactionStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::transactions::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<R, L, C>(
    state: Arc<AppState<R, L, C>>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    R: TransactionStore + Clone + 'static,
    L: LedgerService + Clone + 'static,
    C: ComplianceService + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/transactions", post(routes::transactions::create::<R, L, C>))
        .route("/transactions/{id}", get(routes::transactions::get::<R, L, C>))
        .route(
            "/accounts/{id}/transactions",
            get(routes::transactions::list_for_account::<R, L, C>),
        )
        .route(
            "/accounts/{id}/balance",
            get(routes::transactions::balance::<R, L, C>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// State wired against the in-memory ledger and compliance
/// simulations, used for local runs and tests.
pub type DefaultAppState =
    AppState<InMemoryTransactionStore, InMemoryLedgerService, InMemoryComplianceService>;

/// Creates the default application state with in-memory collaborators
/// and the atomic-transfer policy.
///
/// Must be called from within a Tokio runtime; it spawns the saga
/// worker task.
pub fn create_default_state() -> Arc<DefaultAppState> {
    create_default_state_with_policy(FundsMovementPolicy::default())
}

/// Same as [`create_default_state`] with an explicit funds-movement
/// policy.
pub fn create_default_state_with_policy(policy: FundsMovementPolicy) -> Arc<DefaultAppState> {
    let store = InMemoryTransactionStore::new();
    let ledger = InMemoryLedgerService::new();
    let compliance = InMemoryComplianceService::new();

    let orchestrator = Arc::new(
        SagaOrchestrator::new(store.clone(), ledger.clone(), compliance).with_policy(policy),
    );
    let runner = SagaRunner::spawn(orchestrator.clone());

    Arc::new(AppState {
        orchestrator,
        runner,
        store,
        ledger,
    })
}

/// Creates application state wired against remote ledger and
/// compliance services, configured from the environment.
pub fn create_remote_state()
-> Arc<AppState<InMemoryTransactionStore, HttpLedgerClient, HttpComplianceClient>> {
    let store = InMemoryTransactionStore::new();
    let ledger = HttpLedgerClient::from_env();
    let compliance = HttpComplianceClient::from_env();

    let orchestrator = Arc::new(SagaOrchestrator::new(store.clone(), ledger.clone(), compliance));
    let runner = SagaRunner::spawn(orchestrator.clone());

    Arc::new(AppState {
        orchestrator,
        runner,
        store,
        ledger,
    })
}
