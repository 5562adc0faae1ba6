// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::{
    error::ApiError,
    geofence::ReportedPosition,
    state::AppState,
    workflow::SessionSnapshot,
};

/// Report the client's geolocation reading and evaluate it against the site.
///
/// A reading carrying an error (or invalid coordinates) is rejected with 422
/// and leaves the session untouched.
#[utoipa::path(
    post,
    path = "/v1/location",
    request_body = ReportedPosition,
    tag = "Location",
    responses(
        (status = 200, body = SessionSnapshot),
        (status = 409, description = "Another operation is in progress"),
        (status = 422, description = "Location unavailable")
    )
)]
pub async fn capture_location(
    State(state): State<AppState>,
    Json(reading): Json<ReportedPosition>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let mut session = state.session()?;
    session.capture(&reading).await?;
    Ok(Json(session.snapshot()))
}

#[utoipa::path(
    get,
    path = "/v1/session",
    tag = "Location",
    responses(
        (status = 200, body = SessionSnapshot),
        (status = 409, description = "Another operation is in progress")
    )
)]
pub async fn get_session(State(state): State<AppState>) -> Result<Json<SessionSnapshot>, ApiError> {
    Ok(Json(state.session()?.snapshot()))
}
