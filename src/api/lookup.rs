// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 WalletGate Team

//! Availability probes used by the sign-up form, plus the sign-in
//! challenge fetch. All endpoints are unauthenticated by design: they
//! leak exactly one bit (taken or not) per probe.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    auth::error::AuthFlowError,
    auth::signature,
    models::{ExistsResponse, NonceResponse},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/v1/lookup/users/{name}",
    params(("name" = String, Path, description = "User name to probe")),
    tag = "Lookup",
    responses((status = 200, body = ExistsResponse))
)]
pub async fn user_exists(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ExistsResponse>, AuthFlowError> {
    let exists = state.db.name_exists(&name)?;
    Ok(Json(ExistsResponse { exists }))
}

#[utoipa::path(
    get,
    path = "/v1/lookup/emails/{email}",
    params(("email" = String, Path, description = "Email address to probe")),
    tag = "Lookup",
    responses((status = 200, body = ExistsResponse))
)]
pub async fn email_exists(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<ExistsResponse>, AuthFlowError> {
    let exists = state.db.email_exists(&email)?;
    Ok(Json(ExistsResponse { exists }))
}

#[utoipa::path(
    get,
    path = "/v1/lookup/wallets/{address}",
    params(("address" = String, Path, description = "Wallet address to probe")),
    tag = "Lookup",
    responses(
        (status = 200, body = ExistsResponse),
        (status = 400, description = "Malformed address")
    )
)]
pub async fn wallet_exists(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ExistsResponse>, AuthFlowError> {
    let address = signature::parse_address(&address)?;
    let exists = state.db.address_exists(&address)?;
    Ok(Json(ExistsResponse { exists }))
}

#[utoipa::path(
    get,
    path = "/v1/wallets/{address}/nonce",
    params(("address" = String, Path, description = "Registered wallet address")),
    tag = "Lookup",
    responses(
        (status = 200, body = NonceResponse),
        (status = 404, description = "Address is not registered")
    )
)]
pub async fn wallet_nonce(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<NonceResponse>, AuthFlowError> {
    let nonce = state.sessions.challenge(&address)?;
    Ok(Json(NonceResponse { nonce }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::api::test_support::test_state;
    use crate::auth::signature::test_support::{address, personal_sign, signing_key};
    use crate::registration::REGISTRATION_INTENT;

    use super::*;

    #[tokio::test]
    async fn probes_report_registered_values() {
        let (state, delivery, _dir) = test_state();
        let key = signing_key(1);
        let addr = address(&key).to_string();
        let sig = personal_sign(&key, REGISTRATION_INTENT);
        state
            .registration
            .request_challenge("alice", "alice@example.com", &addr, &sig)
            .unwrap();
        let code = delivery.last_code().unwrap();
        state
            .registration
            .complete_registration("alice", "alice@example.com", &addr, &code)
            .unwrap();

        let Json(by_name) = user_exists(State(state.clone()), Path("alice".into()))
            .await
            .unwrap();
        assert!(by_name.exists);

        let Json(by_email) = email_exists(State(state.clone()), Path("alice@example.com".into()))
            .await
            .unwrap();
        assert!(by_email.exists);

        let Json(by_addr) = wallet_exists(State(state.clone()), Path(addr.clone()))
            .await
            .unwrap();
        assert!(by_addr.exists);

        let Json(free) = user_exists(State(state.clone()), Path("bob".into()))
            .await
            .unwrap();
        assert!(!free.exists);
    }

    #[tokio::test]
    async fn malformed_address_is_a_bad_request() {
        let (state, _delivery, _dir) = test_state();
        let err = wallet_exists(State(state), Path("0xnothex".into()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn nonce_for_unregistered_wallet_is_not_found() {
        let (state, _delivery, _dir) = test_state();
        let key = signing_key(5);
        let err = wallet_nonce(State(state), Path(address(&key).to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
