// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Clock endpoints.
//!
//! Dispatch runs on its own task holding the session. A client that hangs up
//! after the transaction was sent does not stop the session from recording
//! the outcome.

use std::sync::Arc;

use axum::{extract::State, Json};
use tokio::sync::Mutex;

use crate::{
    error::{ApiError, ClockError},
    models::{ClockOutRequest, ClockResponse},
    state::AppState,
    storage::HistoryCache,
    workflow::{ClockLedger, Session},
};

/// Clock in at the last captured position.
///
/// The contract is only called when a wallet is unlocked and the captured
/// position is inside the geofence. Resolves once the transaction is mined.
#[utoipa::path(
    post,
    path = "/v1/clock/in",
    tag = "Clock",
    responses(
        (status = 200, body = ClockResponse),
        (status = 400, description = "Wallet locked or location not set"),
        (status = 409, description = "Another operation is in progress"),
        (status = 422, description = "Outside the allowed range"),
        (status = 502, description = "Transaction failed")
    )
)]
pub async fn clock_in(State(state): State<AppState>) -> Result<Json<ClockResponse>, ApiError> {
    let response = dispatch(
        state.session.clone(),
        state.ledger.clone(),
        state.history.clone(),
        ClockRequest::In,
    )
    .await?;
    Ok(Json(response))
}

/// Clock out at the last captured position, optionally reporting overtime.
///
/// The body may be omitted entirely when there is no overtime.
#[utoipa::path(
    post,
    path = "/v1/clock/out",
    request_body(content = ClockOutRequest, description = "Optional; omit when there is no overtime"),
    tag = "Clock",
    responses(
        (status = 200, body = ClockResponse),
        (status = 400, description = "Wallet locked, location not set or overtime out of range"),
        (status = 409, description = "Another operation is in progress"),
        (status = 422, description = "Outside the allowed range"),
        (status = 502, description = "Transaction failed")
    )
)]
pub async fn clock_out(
    State(state): State<AppState>,
    body: Option<Json<ClockOutRequest>>,
) -> Result<Json<ClockResponse>, ApiError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let response = dispatch(
        state.session.clone(),
        state.ledger.clone(),
        state.history.clone(),
        ClockRequest::Out {
            overtime_minutes: request.overtime_minutes,
        },
    )
    .await?;
    Ok(Json(response))
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum ClockRequest {
    In,
    Out { overtime_minutes: Option<u64> },
}

/// Run one clock operation to completion on a spawned task.
///
/// Fails with `Busy` if the session is held. Once spawned, the task keeps the
/// session until the receipt is in and the cached history is dropped, even if
/// this future is no longer polled.
pub(crate) async fn dispatch<L>(
    session: Arc<Mutex<Session>>,
    ledger: Arc<L>,
    history: Arc<HistoryCache>,
    request: ClockRequest,
) -> Result<ClockResponse, ClockError>
where
    L: ClockLedger + Send + Sync + 'static,
{
    let mut session = session.try_lock_owned().map_err(|_| ClockError::Busy)?;

    let task = tokio::spawn(async move {
        let receipt = match request {
            ClockRequest::In => session.clock_in(ledger.as_ref()).await?,
            ClockRequest::Out { overtime_minutes } => {
                session.clock_out(ledger.as_ref(), overtime_minutes).await?
            }
        };

        let location = session
            .position()
            .map(|p| p.location_encoding())
            .unwrap_or_default();
        if let Some(signer) = session.signer() {
            history.forget(signer.address());
        }

        Ok::<_, ClockError>(ClockResponse {
            state: session.state(),
            location,
            receipt,
        })
    });

    task.await
        .map_err(|e| ClockError::Storage(format!("clock task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::{ClockRecord, Receipt};
    use crate::credentials::Signer;
    use crate::geofence::{ReferenceSite, ReportedPosition};
    use crate::state::tests::test_state;
    use crate::workflow::{DispatchPolicy, WorkflowState};
    use alloy::primitives::Address;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;
    use tower::ServiceExt;

    /// Ledger whose transactions are mined only when `mine` is notified.
    #[derive(Default)]
    struct PendingLedger {
        sent: AtomicUsize,
        mine: Notify,
    }

    impl PendingLedger {
        async fn send(&self) -> Result<Receipt, ClockError> {
            let n = self.sent.fetch_add(1, Ordering::SeqCst) + 1;
            self.mine.notified().await;
            Ok(Receipt {
                tx_hash: format!("0x{n:02x}"),
                block_number: Some(7),
                gas_used: 21_000,
            })
        }
    }

    impl ClockLedger for PendingLedger {
        async fn clock_in(&self, _signer: &Signer, _location: &str) -> Result<Receipt, ClockError> {
            self.send().await
        }

        async fn clock_out(
            &self,
            _signer: &Signer,
            _location: &str,
            _overtime_minutes: Option<u64>,
        ) -> Result<Receipt, ClockError> {
            self.send().await
        }

        async fn clock_records(&self, _employee: Address) -> Result<Vec<ClockRecord>, ClockError> {
            Ok(Vec::new())
        }

        async fn is_clocked_in(&self, _employee: Address) -> Result<bool, ClockError> {
            Ok(false)
        }
    }

    async fn on_site_session() -> (Arc<Mutex<Session>>, Address) {
        let mut session = Session::new(ReferenceSite::default(), DispatchPolicy::default());
        let signer = Signer::ephemeral();
        let employee = signer.address();
        session.sign_in(signer);
        session
            .capture(&ReportedPosition::at(-33.931672, 151.165399))
            .await
            .unwrap();
        (Arc::new(Mutex::new(session)), employee)
    }

    fn cache() -> Arc<HistoryCache> {
        Arc::new(HistoryCache::new(4, Duration::from_secs(300)))
    }

    #[tokio::test]
    async fn successful_dispatch_forgets_cached_history() {
        let (session, employee) = on_site_session().await;
        let ledger = Arc::new(PendingLedger::default());
        let history = cache();
        history.store(employee, Vec::new());
        ledger.mine.notify_one();

        let response = dispatch(session, ledger, history.clone(), ClockRequest::In)
            .await
            .unwrap();
        assert_eq!(response.state, WorkflowState::ClockedIn);
        assert_eq!(response.location, "-33.931672, 151.165399");
        assert_eq!(response.receipt.tx_hash, "0x01");
        assert!(history.fresh(employee).is_none());
    }

    #[tokio::test]
    async fn dispatch_finishes_when_caller_hangs_up() {
        let (session, employee) = on_site_session().await;
        let ledger = Arc::new(PendingLedger::default());
        let history = cache();
        history.store(employee, Vec::new());

        let caller = dispatch(
            session.clone(),
            ledger.clone(),
            history.clone(),
            ClockRequest::Out {
                overtime_minutes: Some(30),
            },
        );
        assert!(tokio::time::timeout(Duration::from_millis(20), caller)
            .await
            .is_err());
        assert_eq!(ledger.sent.load(Ordering::SeqCst), 1);

        ledger.mine.notify_one();
        let session = session.lock().await;
        assert_eq!(session.state(), WorkflowState::ClockedOut);
        assert!(history.fresh(employee).is_none());
    }

    #[tokio::test]
    async fn failed_precondition_keeps_cached_history() {
        let session = Arc::new(Mutex::new(Session::new(
            ReferenceSite::default(),
            DispatchPolicy::default(),
        )));
        let ledger = Arc::new(PendingLedger::default());
        let history = cache();
        let someone = Address::repeat_byte(0x42);
        history.store(someone, Vec::new());

        let err = dispatch(session, ledger.clone(), history.clone(), ClockRequest::In)
            .await
            .unwrap_err();
        assert!(matches!(err, ClockError::Validation(_)));
        assert_eq!(ledger.sent.load(Ordering::SeqCst), 0);
        assert!(history.fresh(someone).is_some());
    }

    #[tokio::test]
    async fn clock_in_without_wallet_is_bad_request() {
        let (state, _dir) = test_state();
        let err = clock_in(State(state)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn clock_in_without_location_is_bad_request() {
        let (state, _dir) = test_state();
        state.session().unwrap().sign_in(Signer::ephemeral());

        let err = clock_in(State(state)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "location not set");
    }

    #[tokio::test]
    async fn out_of_range_is_refused_without_dispatch() {
        let (state, _dir) = test_state();
        {
            let mut session = state.session().unwrap();
            session.sign_in(Signer::ephemeral());
            session
                .capture(&ReportedPosition::at(-34.5, 151.5))
                .await
                .unwrap();
        }

        let err = clock_in(State(state.clone())).await.unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code, "out_of_range");
        assert!(err.message.contains("70.29 km"));
        assert_eq!(
            state.session().unwrap().state(),
            WorkflowState::LocationCaptured
        );
    }

    #[tokio::test]
    async fn excessive_overtime_is_bad_request() {
        let (state, _dir) = test_state();
        {
            let mut session = state.session().unwrap();
            session.sign_in(Signer::ephemeral());
            session
                .capture(&ReportedPosition::at(-33.931672, 151.165399))
                .await
                .unwrap();
        }

        let err = clock_out(
            State(state),
            Some(Json(ClockOutRequest {
                overtime_minutes: Some(800),
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn clock_out_accepts_empty_body() {
        let (state, _dir) = test_state();
        let request = Request::builder()
            .method("POST")
            .uri("/v1/clock/out")
            .body(Body::empty())
            .unwrap();

        let response = crate::api::router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["code"], "validation");
        assert_eq!(body["error"], "wallet is locked");
    }

    #[tokio::test]
    async fn clock_while_busy_is_conflict() {
        let (state, _dir) = test_state();
        let _held = state.session().unwrap();
        let err = clock_in(State(state.clone())).await.unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "busy");
    }
}
