// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::blockchain::ChainError;
use crate::storage::VaultError;

/// Errors surfaced by the credential store, the geofence gate and the
/// dispatch workflow.
///
/// None of these are retried and none are fatal: after any of them the
/// session is left exactly as it was before the failed operation.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("contract call failed: {0}")]
    ContractCall(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error(
        "you are {distance_km:.2} km away from the workplace (limit {max_distance_km:.2} km); clock-in/out is not allowed"
    )]
    OutOfRange {
        distance_km: f64,
        max_distance_km: f64,
    },

    #[error("another operation is already in progress")]
    Busy,

    #[error("storage error: {0}")]
    Storage(String),
}

impl ClockError {
    /// Stable machine-readable kind, returned to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            ClockError::Validation(_) => "validation",
            ClockError::NotFound(_) => "not_found",
            ClockError::Decryption(_) => "decryption",
            ClockError::LocationUnavailable(_) => "location_unavailable",
            ClockError::Network(_) => "network",
            ClockError::ContractCall(_) => "contract_call",
            ClockError::Decode(_) => "decode",
            ClockError::OutOfRange { .. } => "out_of_range",
            ClockError::Busy => "busy",
            ClockError::Storage(_) => "storage",
        }
    }
}

impl From<VaultError> for ClockError {
    fn from(e: VaultError) -> Self {
        match e {
            VaultError::NotFound(what) => ClockError::NotFound(what),
            VaultError::AlreadyExists(what) => {
                ClockError::Validation(format!("credential already exists: {what}"))
            }
            other => ClockError::Storage(other.to_string()),
        }
    }
}

impl From<ChainError> for ClockError {
    fn from(e: ChainError) -> Self {
        match e {
            ChainError::InvalidRpcUrl(_) | ChainError::InvalidAddress(_) => {
                ClockError::Validation(e.to_string())
            }
            ChainError::RpcError(_) | ChainError::Explorer(_) => ClockError::Network(e.to_string()),
            ChainError::ContractError(_) | ChainError::TransactionFailed(_) => {
                ClockError::ContractCall(e.to_string())
            }
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation", message)
    }
}

impl From<ClockError> for ApiError {
    fn from(e: ClockError) -> Self {
        let status = match &e {
            ClockError::Validation(_) => StatusCode::BAD_REQUEST,
            ClockError::NotFound(_) => StatusCode::NOT_FOUND,
            ClockError::Decryption(_) => StatusCode::UNAUTHORIZED,
            ClockError::LocationUnavailable(_)
            | ClockError::OutOfRange { .. }
            | ClockError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ClockError::Network(_) | ClockError::ContractCall(_) => StatusCode::BAD_GATEWAY,
            ClockError::Busy => StatusCode::CONFLICT,
            ClockError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.code(), e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            code: self.code,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn bad_request_uses_validation_code() {
        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.code, "validation");
        assert_eq!(bad.message, "bad");
    }

    #[test]
    fn chain_errors_map_to_clock_errors() {
        assert!(matches!(
            ClockError::from(ChainError::InvalidAddress("x".into())),
            ClockError::Validation(_)
        ));
        assert!(matches!(
            ClockError::from(ChainError::Explorer("down".into())),
            ClockError::Network(_)
        ));
        assert!(matches!(
            ClockError::from(ChainError::TransactionFailed("reverted".into())),
            ClockError::ContractCall(_)
        ));
    }

    #[test]
    fn clock_errors_map_to_statuses() {
        let cases = [
            (ClockError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ClockError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ClockError::Decryption("x".into()), StatusCode::UNAUTHORIZED),
            (
                ClockError::OutOfRange {
                    distance_km: 70.0,
                    max_distance_km: 20.0,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (ClockError::Network("x".into()), StatusCode::BAD_GATEWAY),
            (ClockError::Busy, StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn out_of_range_message_reports_distance() {
        let err = ClockError::OutOfRange {
            distance_km: 70.2865,
            max_distance_km: 20.0,
        };
        assert!(err.to_string().contains("70.29 km"));
        assert_eq!(err.code(), "out_of_range");
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data","code":"validation"}"#);
    }
}
