// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    blockchain::{Balance, ClockAction, ClockRecord, Receipt, RecordSource},
    credentials::Identity,
    error::ClockError,
    geofence::{GeofenceResult, Position, ReferenceSite, ReportedPosition},
    models::{
        ClockOutRequest, ClockResponse, CreateWalletRequest, HistoryResponse,
        ResetWalletsRequest, ResetWalletsResponse, UnlockWalletRequest, WalletListResponse,
    },
    state::AppState,
    workflow::{SessionSnapshot, WorkflowState},
};

pub mod clock;
pub mod health;
pub mod history;
pub mod location;
pub mod wallets;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route(
            "/wallets",
            get(wallets::list_wallets)
                .post(wallets::create_wallet)
                .delete(wallets::reset_wallets),
        )
        .route("/wallets/unlock", post(wallets::unlock_wallet))
        .route("/wallets/lock", post(wallets::lock_wallet))
        .route("/wallet/balance", get(wallets::wallet_balance))
        .route("/location", post(location::capture_location))
        .route("/session", get(location::get_session))
        .route("/clock/in", post(clock::clock_in))
        .route("/clock/out", post(clock::clock_out))
        .route("/history", get(history::get_history))
        .with_state(state.clone());

    Router::new()
        .route("/health", get(health::health))
        .with_state(state)
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Run CPU-bound work (key derivation) on the blocking pool.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, ClockError>
where
    F: FnOnce() -> Result<T, ClockError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ClockError::Storage(format!("worker task failed: {e}")))?
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        wallets::list_wallets,
        wallets::create_wallet,
        wallets::reset_wallets,
        wallets::unlock_wallet,
        wallets::lock_wallet,
        wallets::wallet_balance,
        location::capture_location,
        location::get_session,
        clock::clock_in,
        clock::clock_out,
        history::get_history
    ),
    components(
        schemas(
            Identity,
            Balance,
            Position,
            ReferenceSite,
            GeofenceResult,
            ReportedPosition,
            SessionSnapshot,
            WorkflowState,
            ClockRecord,
            ClockAction,
            RecordSource,
            Receipt,
            CreateWalletRequest,
            UnlockWalletRequest,
            ResetWalletsRequest,
            ResetWalletsResponse,
            WalletListResponse,
            ClockOutRequest,
            ClockResponse,
            HistoryResponse,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Wallets", description = "Local encrypted credential store"),
        (name = "Location", description = "Position capture and geofence"),
        (name = "Clock", description = "Geofenced clock-in and clock-out"),
        (name = "History", description = "Clock history")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::test_state;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (state, _dir) = test_state();
        let app = router(state);
        let _ = app.into_make_service();
    }

    #[test]
    fn openapi_lists_every_endpoint() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/v1/wallets",
            "/v1/wallets/unlock",
            "/v1/wallets/lock",
            "/v1/wallet/balance",
            "/v1/location",
            "/v1/session",
            "/v1/clock/in",
            "/v1/clock/out",
            "/v1/history",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[tokio::test]
    async fn blocking_errors_propagate() {
        let result: Result<(), ClockError> =
            run_blocking(|| Err(ClockError::Validation("nope".into()))).await;
        assert!(matches!(result, Err(ClockError::Validation(_))));
    }
}
