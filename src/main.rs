// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 WalletGate Team

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use walletgate::api::router;
use walletgate::auth::SessionIssuer;
use walletgate::config::{self, Config};
use walletgate::registration::{PendingStore, RegistrationService, TracingDelivery};
use walletgate::state::AppState;
use walletgate::storage::IdentityDb;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = Config::from_env().expect("invalid configuration");

    let db_path = config.data_dir.join("identity.redb");
    let db = Arc::new(IdentityDb::open(&db_path).expect("failed to open identity database"));

    let registration = RegistrationService::new(
        db.clone(),
        Arc::new(PendingStore::new(config::PENDING_CAPACITY, config.pending_ttl)),
        Arc::new(TracingDelivery),
    );
    let sessions = SessionIssuer::new(
        db.clone(),
        config.jwt_secret.as_bytes(),
        config.token_lifetime,
    );

    let app = router(AppState::new(db, registration, sessions));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("failed to parse bind address");

    tracing::info!(%addr, db = %db_path.display(), "walletgate listening (docs at /docs)");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server failed");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let json = std::env::var(config::LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install shutdown handler");
    }
}
