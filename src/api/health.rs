// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    /// Whether the service process is running.
    pub service: String,
    /// Whether the credential vault can be read.
    pub vault: String,
}

/// Health check endpoint handler.
///
/// Returns 200 if the vault is readable, 503 otherwise. Chain endpoints are
/// not probed.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let vault_ok = match state.store.identities() {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check: vault unreadable");
            false
        }
    };

    let response = HealthResponse {
        status: if vault_ok { "ok" } else { "degraded" }.to_string(),
        service: "ok".to_string(),
        vault: if vault_ok { "ok" } else { "unavailable" }.to_string(),
    };

    let status = if vault_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}
