// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 WalletGate Team

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    auth::error::AuthFlowError,
    models::{IdentityResponse, SigninRequest, SigninResponse},
    registration::AuthMethod,
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/v1/sign-in/{method}",
    params(("method" = String, Path, description = "Authentication method, currently only `wallet`")),
    request_body = SigninRequest,
    tag = "Sign-in",
    responses(
        (status = 200, body = SigninResponse),
        (status = 400, description = "Malformed input or unknown method"),
        (status = 401, description = "Signature does not match the current nonce"),
        (status = 404, description = "Address is not registered")
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Path(method): Path<String>,
    Json(request): Json<SigninRequest>,
) -> Result<Json<SigninResponse>, AuthFlowError> {
    AuthMethod::parse(&method)?.require_wallet()?;
    let grant = state.sessions.sign_in(&request.address, &request.signature)?;
    Ok(Json(SigninResponse {
        user: IdentityResponse::from_parts(grant.identity, grant.wallets),
        token: grant.token,
    }))
}
