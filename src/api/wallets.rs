// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet endpoints: create, enumerate, unlock, lock, reset and balance.
//!
//! Key derivation runs on the blocking pool. Unlock and reset hold the
//! session for their whole duration, so they are refused with 409 while a
//! clock operation is in flight (and vice versa).

use axum::{extract::State, http::StatusCode, Json};

use super::run_blocking;
use crate::{
    blockchain::Balance,
    credentials::Identity,
    error::{ApiError, ClockError},
    models::{
        CreateWalletRequest, ResetWalletsRequest, ResetWalletsResponse, UnlockWalletRequest,
        WalletListResponse,
    },
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/v1/wallets",
    tag = "Wallets",
    responses((status = 200, body = WalletListResponse))
)]
pub async fn list_wallets(
    State(state): State<AppState>,
) -> Result<Json<WalletListResponse>, ApiError> {
    let wallets = state.store.identities()?;
    Ok(Json(WalletListResponse { wallets }))
}

#[utoipa::path(
    post,
    path = "/v1/wallets",
    request_body = CreateWalletRequest,
    tag = "Wallets",
    responses(
        (status = 201, body = Identity),
        (status = 400, description = "Password too short")
    )
)]
pub async fn create_wallet(
    State(state): State<AppState>,
    Json(request): Json<CreateWalletRequest>,
) -> Result<(StatusCode, Json<Identity>), ApiError> {
    let store = state.store.clone();
    let identity = run_blocking(move || store.create(&request.password)).await?;
    Ok((StatusCode::CREATED, Json(identity)))
}

#[utoipa::path(
    delete,
    path = "/v1/wallets",
    request_body = ResetWalletsRequest,
    tag = "Wallets",
    responses(
        (status = 200, body = ResetWalletsResponse),
        (status = 400, description = "Missing confirmation")
    )
)]
pub async fn reset_wallets(
    State(state): State<AppState>,
    Json(request): Json<ResetWalletsRequest>,
) -> Result<Json<ResetWalletsResponse>, ApiError> {
    if !request.confirm {
        return Err(ApiError::bad_request(
            "resetting deletes every stored key; set \"confirm\": true",
        ));
    }

    let mut session = state.session()?;
    let removed = state.store.reset()?;
    session.sign_out();
    state.history.clear();

    Ok(Json(ResetWalletsResponse { removed }))
}

#[utoipa::path(
    post,
    path = "/v1/wallets/unlock",
    request_body = UnlockWalletRequest,
    tag = "Wallets",
    responses(
        (status = 200, body = Identity),
        (status = 401, description = "Wrong password or corrupted key"),
        (status = 404, description = "No such wallet"),
        (status = 409, description = "Another operation is in progress")
    )
)]
pub async fn unlock_wallet(
    State(state): State<AppState>,
    Json(request): Json<UnlockWalletRequest>,
) -> Result<Json<Identity>, ApiError> {
    let mut session = state.session()?;

    let store = state.store.clone();
    let signer = run_blocking(move || match &request.address {
        Some(address) => store.unlock_address(&request.password, address),
        None => store.unlock(&request.password, request.index),
    })
    .await?;

    let identity = signer.identity().clone();
    session.sign_in(signer);
    tracing::info!(address = %identity.address, "Wallet unlocked");

    Ok(Json(identity))
}

#[utoipa::path(
    post,
    path = "/v1/wallets/lock",
    tag = "Wallets",
    responses((status = 204))
)]
pub async fn lock_wallet(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.session()?.sign_out();
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/wallet/balance",
    tag = "Wallets",
    responses(
        (status = 200, body = Balance),
        (status = 400, description = "Wallet is locked"),
        (status = 502, description = "RPC endpoint unavailable")
    )
)]
pub async fn wallet_balance(State(state): State<AppState>) -> Result<Json<Balance>, ApiError> {
    let signer = state
        .session()?
        .signer()
        .cloned()
        .ok_or_else(|| ClockError::Validation("wallet is locked".to_string()))?;

    let balance = state.store.balance(&signer).await?;
    Ok(Json(balance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::test_state;

    fn create_request(password: &str) -> CreateWalletRequest {
        CreateWalletRequest {
            password: password.to_string(),
        }
    }

    fn unlock_request(password: &str) -> UnlockWalletRequest {
        UnlockWalletRequest {
            password: password.to_string(),
            index: None,
            address: None,
        }
    }

    #[tokio::test]
    async fn create_list_and_unlock() {
        let (state, _dir) = test_state();

        let (status, Json(created)) =
            create_wallet(State(state.clone()), Json(create_request("hunter2hunter2")))
                .await
                .expect("wallet creation succeeds");
        assert_eq!(status, StatusCode::CREATED);
        assert!(created.address.starts_with("0x"));

        let Json(list) = list_wallets(State(state.clone())).await.unwrap();
        assert_eq!(list.wallets, vec![created.clone()]);

        let Json(unlocked) =
            unlock_wallet(State(state.clone()), Json(unlock_request("hunter2hunter2")))
                .await
                .expect("unlock succeeds");
        assert_eq!(unlocked, created);

        let session = state.session().unwrap();
        assert_eq!(session.signer().unwrap().identity(), &created);
    }

    #[tokio::test]
    async fn short_password_is_bad_request() {
        let (state, _dir) = test_state();
        let err = create_wallet(State(state.clone()), Json(create_request("short")))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(state.store.identities().unwrap().is_empty());
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let (state, _dir) = test_state();
        create_wallet(State(state.clone()), Json(create_request("hunter2hunter2")))
            .await
            .unwrap();

        let err = unlock_wallet(State(state.clone()), Json(unlock_request("hunter3hunter3")))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert!(state.session().unwrap().signer().is_none());
    }

    #[tokio::test]
    async fn unlock_without_wallets_is_not_found() {
        let (state, _dir) = test_state();
        let err = unlock_wallet(State(state), Json(unlock_request("hunter2hunter2")))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unlock_by_address() {
        let (state, _dir) = test_state();
        create_wallet(State(state.clone()), Json(create_request("first-password")))
            .await
            .unwrap();
        let (_, Json(second)) =
            create_wallet(State(state.clone()), Json(create_request("second-password")))
                .await
                .unwrap();

        let Json(unlocked) = unlock_wallet(
            State(state),
            Json(UnlockWalletRequest {
                password: "second-password".to_string(),
                index: None,
                address: Some(second.address.clone()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(unlocked.index, 1);
        assert_eq!(unlocked.address, second.address);
    }

    #[tokio::test]
    async fn lock_forgets_signer() {
        let (state, _dir) = test_state();
        create_wallet(State(state.clone()), Json(create_request("hunter2hunter2")))
            .await
            .unwrap();
        unlock_wallet(State(state.clone()), Json(unlock_request("hunter2hunter2")))
            .await
            .unwrap();

        let status = lock_wallet(State(state.clone())).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.session().unwrap().signer().is_none());

        let err = wallet_balance(State(state)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reset_requires_confirmation() {
        let (state, _dir) = test_state();
        create_wallet(State(state.clone()), Json(create_request("hunter2hunter2")))
            .await
            .unwrap();

        let err = reset_wallets(
            State(state.clone()),
            Json(ResetWalletsRequest { confirm: false }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(state.store.identities().unwrap().len(), 1);

        let Json(reset) = reset_wallets(
            State(state.clone()),
            Json(ResetWalletsRequest { confirm: true }),
        )
        .await
        .unwrap();
        assert_eq!(reset.removed, 1);
        assert!(state.store.identities().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unlock_while_busy_is_conflict() {
        let (state, _dir) = test_state();
        let _held = state.session().unwrap();
        let err = unlock_wallet(State(state.clone()), Json(unlock_request("hunter2hunter2")))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }
}
