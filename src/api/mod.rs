// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 WalletGate Team

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        CompleteSignupRequest, ExistsResponse, IdentityResponse, NonceResponse, SigninRequest,
        SigninResponse, SignupRequest,
    },
    state::AppState,
    storage::Role,
};

pub mod health;
pub mod lookup;
pub mod signin;
pub mod signup;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/lookup/users/{name}", get(lookup::user_exists))
        .route("/lookup/emails/{email}", get(lookup::email_exists))
        .route("/lookup/wallets/{address}", get(lookup::wallet_exists))
        .route("/wallets/{address}/nonce", get(lookup::wallet_nonce))
        .route("/sign-up/{method}", post(signup::request_challenge))
        .route(
            "/sign-up/{method}/complete",
            post(signup::complete_registration),
        )
        .route("/sign-in/{method}", post(signin::sign_in))
        .with_state(state);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::health))
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        lookup::user_exists,
        lookup::email_exists,
        lookup::wallet_exists,
        lookup::wallet_nonce,
        signup::request_challenge,
        signup::complete_registration,
        signin::sign_in
    ),
    components(
        schemas(
            health::HealthResponse,
            ExistsResponse,
            NonceResponse,
            SignupRequest,
            CompleteSignupRequest,
            IdentityResponse,
            SigninRequest,
            SigninResponse,
            Role
        )
    ),
    tags(
        (name = "Health", description = "Service liveness"),
        (name = "Lookup", description = "Availability probes and sign-in challenges"),
        (name = "Sign-up", description = "Wallet registration"),
        (name = "Sign-in", description = "Wallet authentication")
    )
)]
struct ApiDoc;
