// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 WalletGate Team

//! EIP-191 personal-message signature recovery.
//!
//! A wallet proves control of its private key by signing a challenge
//! message with `personal_sign`. The signer's address is recovered
//! directly from the 65-byte signature; no public key is transmitted.
//!
//! This module is pure: no I/O, deterministic, safe to retry.

use alloy::primitives::{keccak256, Address, B256};
use k256::{
    ecdsa::{RecoveryId, Signature, VerifyingKey},
    elliptic_curve::sec1::ToEncodedPoint,
};

use super::error::AuthFlowError;

/// Length of a recoverable signature: 64 bytes of (r, s) + 1 recovery byte.
const SIGNATURE_LEN: usize = 65;

/// Offset of the recovery-id byte within the signature.
const RECOVERY_ID_OFFSET: usize = 64;

/// Hash a message the way `personal_sign` does: prefix with the
/// `"\x19Ethereum Signed Message:\n{len}"` domain separator, then keccak256.
pub fn personal_message_hash(message: &[u8]) -> B256 {
    let mut data = format!("\x19Ethereum Signed Message:\n{}", message.len()).into_bytes();
    data.extend_from_slice(message);
    keccak256(&data)
}

/// Recover the signing address from a message and a 65-byte signature.
///
/// The recovery byte must be 27 or 28 (the yellow-paper encoding wallets
/// emit); it is normalized to the curve's 0/1 form before recovery. All
/// decode and recovery failures collapse into `InvalidSignature`.
pub fn recover_address(message: &[u8], signature: &[u8]) -> Result<Address, AuthFlowError> {
    if signature.len() != SIGNATURE_LEN {
        return Err(AuthFlowError::InvalidSignature);
    }

    let v = signature[RECOVERY_ID_OFFSET];
    if v != 27 && v != 28 {
        return Err(AuthFlowError::InvalidSignature);
    }
    let recovery_id =
        RecoveryId::from_byte(v - 27).ok_or(AuthFlowError::InvalidSignature)?;

    let sig = Signature::from_slice(&signature[..RECOVERY_ID_OFFSET])
        .map_err(|_| AuthFlowError::InvalidSignature)?;

    let digest = personal_message_hash(message);
    let verifying_key = VerifyingKey::recover_from_prehash(digest.as_slice(), &sig, recovery_id)
        .map_err(|_| AuthFlowError::InvalidSignature)?;

    Ok(address_of(&verifying_key))
}

/// Derive the Ethereum address of a public key: the last 20 bytes of
/// keccak256(uncompressed point without the 0x04 tag).
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Parse a `0x`-prefixed wallet address. Case-insensitive; no checksum
/// enforcement (addresses are compared as 20-byte values).
pub fn parse_address(address: &str) -> Result<Address, AuthFlowError> {
    address
        .parse::<Address>()
        .map_err(|_| AuthFlowError::InvalidArgument(format!("malformed wallet address: {address}")))
}

/// Verify that `signature_hex` over `message` was produced by the claimed
/// address. The signature arrives hex-encoded with a `0x` prefix, as sent
/// by wallets.
pub fn verify_ownership(
    message: &str,
    signature_hex: &str,
    claimed: Address,
) -> Result<(), AuthFlowError> {
    let stripped = signature_hex
        .strip_prefix("0x")
        .ok_or_else(|| AuthFlowError::InvalidArgument("signature must be 0x-prefixed hex".into()))?;
    let signature = alloy::hex::decode(stripped)
        .map_err(|_| AuthFlowError::InvalidArgument("signature is not valid hex".into()))?;

    let recovered = recover_address(message.as_bytes(), &signature)?;
    if recovered != claimed {
        return Err(AuthFlowError::AddressMismatch);
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use k256::ecdsa::SigningKey;

    use super::*;

    /// Deterministic test key.
    pub fn signing_key(seed: u8) -> SigningKey {
        let mut bytes = [0u8; 32];
        bytes[31] = seed.max(1);
        SigningKey::from_slice(&bytes).expect("valid scalar")
    }

    /// Sign a message the way a wallet's `personal_sign` does, producing a
    /// 0x-prefixed 65-byte hex signature with v in {27, 28}.
    pub fn personal_sign(key: &SigningKey, message: &str) -> String {
        let digest = personal_message_hash(message.as_bytes());
        let (sig, recovery_id) = key
            .sign_prehash_recoverable(digest.as_slice())
            .expect("signing cannot fail");

        let mut bytes = [0u8; SIGNATURE_LEN];
        bytes[..RECOVERY_ID_OFFSET].copy_from_slice(&sig.to_bytes());
        bytes[RECOVERY_ID_OFFSET] = recovery_id.to_byte() + 27;
        format!("0x{}", alloy::hex::encode(bytes))
    }

    /// The address belonging to a test key.
    pub fn address(key: &SigningKey) -> Address {
        address_of(key.verifying_key())
    }
}
