// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 WalletGate Team

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values, and the
//! [`Config`] snapshot loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Root directory for the identity database | `/data` |
//! | `JWT_SECRET` | Symmetric key for session token signing | Required |
//! | `TOKEN_LIFETIME_SECS` | Session token validity window | `86400` (24h) |
//! | `PENDING_TTL_SECS` | Verification code validity window | `7200` (2h) |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable name for the server bind address.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the server bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the identity database directory.
///
/// The directory must exist and be writable; the database file is created
/// inside it on first start.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable name for the token signing secret.
///
/// There is no default. The server refuses to start without it.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";

/// Environment variable name for the session token lifetime, in seconds.
pub const TOKEN_LIFETIME_ENV: &str = "TOKEN_LIFETIME_SECS";

/// Environment variable name for the verification code lifetime, in seconds.
pub const PENDING_TTL_ENV: &str = "PENDING_TTL_SECS";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_DIR: &str = "/data";
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 86_400;
const DEFAULT_PENDING_TTL_SECS: u64 = 7_200;

/// Pending registrations held at once before the oldest is evicted.
pub const PENDING_CAPACITY: usize = 4_096;

/// Configuration snapshot taken once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub jwt_secret: String,
    pub token_lifetime: Duration,
    pub pending_ttl: Duration,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Missing optional variables fall back to their documented defaults;
    /// a missing `JWT_SECRET` or an unparsable numeric value is an error.
    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = env::var(JWT_SECRET_ENV)
            .map_err(|_| format!("{JWT_SECRET_ENV} must be set"))?;
        if jwt_secret.trim().is_empty() {
            return Err(format!("{JWT_SECRET_ENV} must not be empty"));
        }

        Ok(Self {
            host: env::var(HOST_ENV).unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: parse_env(PORT_ENV, DEFAULT_PORT)?,
            data_dir: env::var(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR)),
            jwt_secret,
            token_lifetime: Duration::from_secs(parse_env(
                TOKEN_LIFETIME_ENV,
                DEFAULT_TOKEN_LIFETIME_SECS,
            )?),
            pending_ttl: Duration::from_secs(parse_env(
                PENDING_TTL_ENV,
                DEFAULT_PENDING_TTL_SECS,
            )?),
        })
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, String> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| format!("{name} is not a valid value: {raw}")),
        Err(_) => Ok(default),
    }
}
