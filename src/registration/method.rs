// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 WalletGate Team

//! Sign-up / sign-in methods.
//!
//! The method arrives as a path parameter. It is a closed set: every
//! variant the frontend may send is named here, and the ones without an
//! implementation reject with `Unsupported` instead of falling through a
//! default case.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::error::AuthFlowError;

/// Supported (and recognized-but-unimplemented) authentication methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// Wallet signature challenge-response. The only implemented method.
    Wallet,
    Email,
    Phone,
    Twitter,
    Facebook,
    Instagram,
}

impl AuthMethod {
    /// Parse the path segment. Unknown strings are `InvalidArgument`;
    /// known-but-unimplemented methods pass parsing and are rejected by
    /// [`AuthMethod::require_wallet`].
    pub fn parse(segment: &str) -> Result<Self, AuthFlowError> {
        match segment {
            "wallet" => Ok(AuthMethod::Wallet),
            "email" => Ok(AuthMethod::Email),
            "phone" => Ok(AuthMethod::Phone),
            "twitter" => Ok(AuthMethod::Twitter),
            "facebook" => Ok(AuthMethod::Facebook),
            "instagram" => Ok(AuthMethod::Instagram),
            other => Err(AuthFlowError::InvalidArgument(format!(
                "unknown method '{other}'"
            ))),
        }
    }

    /// Reject everything but the wallet method.
    pub fn require_wallet(self) -> Result<(), AuthFlowError> {
        match self {
            AuthMethod::Wallet => Ok(()),
            other => Err(AuthFlowError::Unsupported(other.as_str().to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AuthMethod::Wallet => "wallet",
            AuthMethod::Email => "email",
            AuthMethod::Phone => "phone",
            AuthMethod::Twitter => "twitter",
            AuthMethod::Facebook => "facebook",
            AuthMethod::Instagram => "instagram",
        }
    }
}
