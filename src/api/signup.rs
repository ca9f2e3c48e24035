// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 WalletGate Team

//! The two-step sign-up exchange.
//!
//! Step one proves wallet ownership with a signature and mails a
//! verification code; step two redeems the code and commits the
//! identity. Nothing is persisted until step two succeeds.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::error::AuthFlowError,
    models::{CompleteSignupRequest, IdentityResponse, SignupRequest},
    registration::AuthMethod,
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/v1/sign-up/{method}",
    params(("method" = String, Path, description = "Authentication method, currently only `wallet`")),
    request_body = SignupRequest,
    tag = "Sign-up",
    responses(
        (status = 202, description = "Ownership verified, verification code sent"),
        (status = 400, description = "Malformed input or unknown method"),
        (status = 401, description = "Signature does not prove ownership"),
        (status = 409, description = "Name, email, or address already taken")
    )
)]
pub async fn request_challenge(
    State(state): State<AppState>,
    Path(method): Path<String>,
    Json(request): Json<SignupRequest>,
) -> Result<StatusCode, AuthFlowError> {
    AuthMethod::parse(&method)?.require_wallet()?;
    state.registration.request_challenge(
        &request.name,
        &request.email,
        &request.address,
        &request.signature,
    )?;
    Ok(StatusCode::ACCEPTED)
}

#[utoipa::path(
    post,
    path = "/v1/sign-up/{method}/complete",
    params(("method" = String, Path, description = "Authentication method, currently only `wallet`")),
    request_body = CompleteSignupRequest,
    tag = "Sign-up",
    responses(
        (status = 201, body = IdentityResponse),
        (status = 400, description = "Malformed input or unknown method"),
        (status = 401, description = "Wrong, expired, or missing verification code"),
        (status = 409, description = "Name, email, or address taken since step one")
    )
)]
pub async fn complete_registration(
    State(state): State<AppState>,
    Path(method): Path<String>,
    Json(request): Json<CompleteSignupRequest>,
) -> Result<(StatusCode, Json<IdentityResponse>), AuthFlowError> {
    AuthMethod::parse(&method)?.require_wallet()?;
    let identity = state.registration.complete_registration(
        &request.name,
        &request.email,
        &request.address,
        &request.code,
    )?;
    let wallets = state.db.addresses_for(identity.id)?;
    Ok((
        StatusCode::CREATED,
        Json(IdentityResponse::from_parts(identity, wallets)),
    ))
}
