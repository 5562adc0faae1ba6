// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::str::FromStr;

use alloy::primitives::Address;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::{ApiError, ClockError},
    models::HistoryResponse,
    state::AppState,
    workflow::fetch_history,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// Address to look up; defaults to the unlocked wallet
    pub address: Option<String>,
}

/// Clock history, newest first.
///
/// Read from the contract, falling back to the block explorer when the
/// contract call fails. Results are cached briefly per address.
#[utoipa::path(
    get,
    path = "/v1/history",
    params(HistoryQuery),
    tag = "History",
    responses(
        (status = 200, body = HistoryResponse),
        (status = 400, description = "No address given and wallet locked"),
        (status = 502, description = "Contract and explorer both unavailable")
    )
)]
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let employee = match query.address {
        Some(raw) => Address::from_str(raw.trim())
            .map_err(|e| ClockError::Validation(format!("invalid address: {e}")))?,
        None => state
            .session()?
            .signer()
            .map(|s| s.address())
            .ok_or_else(|| ClockError::Validation("wallet is locked".to_string()))?,
    };
    let address = employee.to_checksum(None);

    if let Some(records) = state.history.fresh(employee) {
        return Ok(Json(HistoryResponse {
            address,
            records,
            cached: true,
        }));
    }

    let records = fetch_history(state.ledger.as_ref(), state.explorer.as_ref(), employee).await?;
    state.history.store(employee, records.clone());

    Ok(Json(HistoryResponse {
        address,
        records,
        cached: false,
    }))
}
