// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 WalletGate Team

//! Authentication and registration flow errors.
//!
//! This is the error taxonomy shared by the signature verifier, the
//! registration orchestrator and the session issuer. Handlers return it
//! directly; the `IntoResponse` impl maps each variant to an HTTP status
//! and a stable machine-readable `error_code`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// The uniquely-constrained identity field that a registration collided on.
///
/// Reported to the caller so they can correct exactly the offending field,
/// and nothing beyond it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    /// User name
    Name,
    /// Email address
    Email,
    /// Wallet address
    Address,
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UniqueField::Name => write!(f, "name"),
            UniqueField::Email => write!(f, "email"),
            UniqueField::Address => write!(f, "address"),
        }
    }
}

/// Errors produced by the wallet authentication flows.
#[derive(Debug, thiserror::Error)]
pub enum AuthFlowError {
    /// Malformed or missing input (including a malformed signature encoding).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The signature could not be decoded or recovered.
    #[error("signature verification failed")]
    InvalidSignature,

    /// The recovered signer does not match the claimed wallet address.
    #[error("recovered address does not match the claimed address")]
    AddressMismatch,

    /// A uniqueness constraint was violated, either at pre-check or commit.
    #[error("{0} already exists")]
    AlreadyExists(UniqueField),

    /// The one-time code is absent, expired, or does not match.
    #[error("invalid or expired verification code")]
    InvalidCode,

    /// No wallet binding exists for the given address.
    #[error("wallet address is not registered")]
    UnknownAddress,

    /// A looked-up resource does not exist.
    #[error("not found")]
    NotFound,

    /// The requested sign-up/sign-in method is not implemented.
    #[error("method '{0}' is not supported")]
    Unsupported(String),

    /// Storage, delivery, or signing infrastructure failure. Safe to retry.
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    error_code: String,
}

impl AuthFlowError {
    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthFlowError::InvalidArgument(_) => "invalid_argument",
            AuthFlowError::InvalidSignature => "invalid_signature",
            AuthFlowError::AddressMismatch => "address_mismatch",
            AuthFlowError::AlreadyExists(UniqueField::Name) => "name_exists",
            AuthFlowError::AlreadyExists(UniqueField::Email) => "email_exists",
            AuthFlowError::AlreadyExists(UniqueField::Address) => "address_exists",
            AuthFlowError::InvalidCode => "invalid_code",
            AuthFlowError::UnknownAddress => "unknown_address",
            AuthFlowError::NotFound => "not_found",
            AuthFlowError::Unsupported(_) => "unsupported_method",
            AuthFlowError::Internal(_) => "internal_error",
        }
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthFlowError::InvalidArgument(_) | AuthFlowError::Unsupported(_) => {
                StatusCode::BAD_REQUEST
            }
            AuthFlowError::InvalidSignature
            | AuthFlowError::AddressMismatch
            | AuthFlowError::InvalidCode => StatusCode::UNAUTHORIZED,
            AuthFlowError::UnknownAddress | AuthFlowError::NotFound => StatusCode::NOT_FOUND,
            AuthFlowError::AlreadyExists(_) => StatusCode::CONFLICT,
            AuthFlowError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthFlowError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "auth flow internal error");
        }
        let body = Json(ErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
