// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 WalletGate Team

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. All types derive `Serialize`, `Deserialize`, and `ToSchema`
//! for automatic JSON handling and OpenAPI documentation.
//!
//! ## Model Categories
//!
//! - **Lookup**: Availability checks on names, emails, and addresses
//! - **Sign-up**: The two-step challenge / complete registration exchange
//! - **Sign-in**: Nonce-signature authentication and the session token

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::{Identity, Role};

// =============================================================================
// Lookup Models
// =============================================================================

/// Answer to an availability probe on a name, email, or address.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ExistsResponse {
    /// Whether the probed value is already taken.
    pub exists: bool,
}

/// The current sign-in challenge for a registered wallet.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct NonceResponse {
    /// Nonce the wallet must sign to authenticate.
    pub nonce: String,
}

// =============================================================================
// Sign-up Models
// =============================================================================

/// First step of registration: the signed proof of wallet ownership.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignupRequest {
    /// Requested user name.
    pub name: String,
    /// Email address the verification code is sent to.
    pub email: String,
    /// Wallet address being registered (0x-prefixed hex).
    pub address: String,
    /// Signature over the registration intent message (0x-prefixed hex).
    pub signature: String,
}

/// Second step of registration: the emailed verification code.
///
/// `name`, `email`, and `address` must match the first step exactly.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompleteSignupRequest {
    /// User name from the first step.
    pub name: String,
    /// Email from the first step.
    pub email: String,
    /// Wallet address from the first step.
    pub address: String,
    /// Verification code delivered to the email.
    pub code: String,
}

/// A registered identity, as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct IdentityResponse {
    /// Identity id.
    pub id: u64,
    /// User name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Assigned role.
    pub role: Role,
    /// Every wallet address bound to the identity.
    pub wallets: Vec<String>,
}

impl IdentityResponse {
    pub fn from_parts(identity: Identity, wallets: Vec<String>) -> Self {
        Self {
            id: identity.id,
            name: identity.name,
            email: identity.email,
            role: identity.role,
            wallets,
        }
    }
}

// =============================================================================
// Sign-in Models
// =============================================================================

/// Sign-in proof: a signature over the current challenge nonce.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SigninRequest {
    /// Wallet address signing in (0x-prefixed hex).
    pub address: String,
    /// Signature over the nonce intent message (0x-prefixed hex).
    pub signature: String,
}

/// A granted session: the identity and its bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SigninResponse {
    /// The authenticated identity.
    pub user: IdentityResponse,
    /// Signed session token (HS256 JWT).
    pub token: String,
}
