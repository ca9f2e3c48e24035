// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 WalletGate Team

//! Cryptographically secure random values for challenges and one-time codes.

use ring::rand::{SecureRandom, SystemRandom};

use crate::auth::error::AuthFlowError;

/// Length in bytes of a challenge nonce before hex encoding.
const NONCE_BYTES: usize = 16;

/// Generate a fresh opaque challenge nonce (32 hex characters).
pub fn challenge_nonce() -> Result<String, AuthFlowError> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; NONCE_BYTES];
    rng.fill(&mut bytes)
        .map_err(|_| AuthFlowError::Internal("random generator unavailable".into()))?;
    Ok(alloy::hex::encode(bytes))
}

/// Generate a one-time registration code of `len` decimal digits.
pub fn numeric_code(len: usize) -> Result<String, AuthFlowError> {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)
        .map_err(|_| AuthFlowError::Internal("random generator unavailable".into()))?;

    // Rejection sampling per byte to avoid modulo bias toward low digits.
    let mut code = String::with_capacity(len);
    for slot in bytes.iter_mut() {
        loop {
            if *slot < 250 {
                code.push(char::from(b'0' + *slot % 10));
                break;
            }
            let mut next = [0u8; 1];
            rng.fill(&mut next)
                .map_err(|_| AuthFlowError::Internal("random generator unavailable".into()))?;
            *slot = next[0];
        }
    }
    Ok(code)
}
