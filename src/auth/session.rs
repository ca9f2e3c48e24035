// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 WalletGate Team

//! Session issuance: wallet sign-in and the signed session token.
//!
//! Sign-in verifies the wallet's signature over its *current* challenge
//! nonce, rotates the nonce before anything is returned, and mints a
//! self-contained HS256 token. No session state is kept server-side; the
//! token is verified by signature alone.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::auth::error::AuthFlowError;
use crate::auth::signature;
use crate::rng;
use crate::storage::{Identity, IdentityDb};

/// `iss` claim of every issued token.
pub const TOKEN_ISSUER: &str = "walletgate";

/// `sub` claim of every issued token.
pub const TOKEN_SUBJECT: &str = "user";

/// Sign-in intent message wrapping the current challenge nonce.
pub fn login_message(nonce: &str) -> String {
    format!("WalletGate is signing the nonce: {nonce} for login.")
}

/// Claims carried by a session token.
///
/// A derived view over the identity and its bindings at sign-in time;
/// never stored server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Identity id.
    pub id: u64,
    /// User name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Role, as its lowercase string form.
    pub user_role: String,
    /// Every wallet address bound to the identity.
    pub wallets: Vec<String>,
    /// Expiry as a unix timestamp: now + configured lifetime.
    pub exp: i64,
    /// Unique token id.
    pub jti: String,
    /// Always [`TOKEN_ISSUER`].
    pub iss: String,
    /// Always [`TOKEN_SUBJECT`].
    pub sub: String,
}

/// A successful sign-in: the identity summary plus the signed token.
#[derive(Debug)]
pub struct SessionGrant {
    pub identity: Identity,
    pub wallets: Vec<String>,
    pub token: String,
}

/// Verifies sign-in proofs and mints session tokens.
pub struct SessionIssuer {
    db: Arc<IdentityDb>,
    encoding_key: EncodingKey,
    lifetime: Duration,
}

impl SessionIssuer {
    /// `secret` is the configuration-provided symmetric signing key;
    /// `lifetime` bounds how long issued tokens stay valid.
    pub fn new(db: Arc<IdentityDb>, secret: &[u8], lifetime: Duration) -> Self {
        Self {
            db,
            encoding_key: EncodingKey::from_secret(secret),
            lifetime,
        }
    }

    /// The current sign-in challenge for a wallet.
    pub fn challenge(&self, address: &str) -> Result<String, AuthFlowError> {
        let address = signature::parse_address(address)?;
        let binding = self
            .db
            .binding(&address)?
            .ok_or(AuthFlowError::NotFound)?;
        Ok(binding.nonce)
    }

    /// Authenticate a wallet and issue a session token.
    ///
    /// The nonce is rotated after verification and before this function
    /// returns, so the signature just consumed can never verify again.
    /// Rotation is a compare-and-swap on the verified nonce: of any number
    /// of racing sign-ins presenting the same signature, exactly one wins
    /// the swap and the rest are rejected.
    pub fn sign_in(&self, address: &str, signature_hex: &str) -> Result<SessionGrant, AuthFlowError> {
        let address = signature::parse_address(address)?;

        let binding = self
            .db
            .binding(&address)?
            .ok_or(AuthFlowError::UnknownAddress)?;

        signature::verify_ownership(&login_message(&binding.nonce), signature_hex, address)?;

        let fresh = rng::challenge_nonce()?;
        self.db.rotate_nonce(&address, &binding.nonce, &fresh)?;

        let identity = self
            .db
            .identity(binding.user_id)?
            .ok_or_else(|| {
                AuthFlowError::Internal(format!("binding without identity: user {}", binding.user_id))
            })?;
        let wallets = self.db.addresses_for(identity.id)?;

        let token = self.mint(&identity, wallets.clone())?;

        tracing::info!(user_id = identity.id, address = %address, "wallet signed in");
        Ok(SessionGrant {
            identity,
            wallets,
            token,
        })
    }

    fn mint(&self, identity: &Identity, wallets: Vec<String>) -> Result<String, AuthFlowError> {
        let lifetime = chrono::Duration::from_std(self.lifetime)
            .map_err(|e| AuthFlowError::Internal(format!("token lifetime out of range: {e}")))?;
        let claims = SessionClaims {
            id: identity.id,
            name: identity.name.clone(),
            email: identity.email.clone(),
            user_role: identity.role.to_string(),
            wallets,
            exp: (Utc::now() + lifetime).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            iss: TOKEN_ISSUER.to_string(),
            sub: TOKEN_SUBJECT.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthFlowError::Internal(format!("token signing failed: {e}")))
    }
}
