// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 WalletGate Team

//! # Registration Orchestrator
//!
//! Sequences a wallet sign-up from challenge request to committed
//! identity:
//!
//! ```text
//! request_challenge → (uniqueness checks) → code issued → (delivery)
//!     → complete_registration → atomic commit
//! ```
//!
//! The uniqueness pre-checks in `request_challenge` are a fast-reject
//! optimization with an inherent check-then-act race; the commit in
//! [`IdentityDb::create_identity`] re-checks all three constraints inside
//! its write transaction and is the sole durability boundary. A late race
//! therefore surfaces as a commit-time `AlreadyExists`, never a duplicate
//! identity.

pub mod delivery;
pub mod method;
pub mod pending;

use std::sync::Arc;

use alloy::primitives::Address;

use crate::auth::error::{AuthFlowError, UniqueField};
use crate::auth::signature;
use crate::rng;
use crate::storage::{IdentityDb, Identity, NewIdentity, Role};

pub use delivery::{CodeDelivery, TracingDelivery};
pub use method::AuthMethod;
pub use pending::{Fingerprint, PendingStore};

/// Fixed registration-intent message the wallet signs.
///
/// Registration cannot use a rotating nonce (the wallet is not bound
/// yet), so ownership is proven over this constant instead.
pub const REGISTRATION_INTENT: &str =
    "WalletGate uses this cryptographic signature to verify that you are the owner of this address.";

/// One-time codes are 6 decimal digits.
const CODE_LEN: usize = 6;

/// Orchestrates wallet sign-up.
pub struct RegistrationService {
    db: Arc<IdentityDb>,
    pending: Arc<PendingStore>,
    delivery: Arc<dyn CodeDelivery>,
}

impl RegistrationService {
    pub fn new(
        db: Arc<IdentityDb>,
        pending: Arc<PendingStore>,
        delivery: Arc<dyn CodeDelivery>,
    ) -> Self {
        Self {
            db,
            pending,
            delivery,
        }
    }

    /// First half of sign-up: prove wallet ownership, fast-reject taken
    /// identities, issue a one-time code and hand it to delivery.
    pub fn request_challenge(
        &self,
        name: &str,
        email: &str,
        address: &str,
        signature_hex: &str,
    ) -> Result<(), AuthFlowError> {
        let (name, email, address) = validate_identity_input(name, email, address)?;

        signature::verify_ownership(REGISTRATION_INTENT, signature_hex, address)?;

        // Check order is fixed: address, then name, then email. The first
        // failing check short-circuits so only one field is reported.
        if self.db.address_exists(&address)? {
            return Err(AuthFlowError::AlreadyExists(UniqueField::Address));
        }
        if self.db.name_exists(&name)? {
            return Err(AuthFlowError::AlreadyExists(UniqueField::Name));
        }
        if self.db.email_exists(&email)? {
            return Err(AuthFlowError::AlreadyExists(UniqueField::Email));
        }

        let code = rng::numeric_code(CODE_LEN)?;
        let fingerprint = Fingerprint::new(&name, &email, &address.to_string());
        self.pending.put(fingerprint, code.clone());

        self.delivery.deliver(&email, &code)?;

        tracing::info!(address = %address, "registration challenge issued");
        Ok(())
    }

    /// Second half of sign-up: verify the one-time code and commit the
    /// identity with its initial wallet binding atomically.
    pub fn complete_registration(
        &self,
        name: &str,
        email: &str,
        address: &str,
        code: &str,
    ) -> Result<Identity, AuthFlowError> {
        let (name, email, address) = validate_identity_input(name, email, address)?;
        if code.is_empty() {
            return Err(AuthFlowError::InvalidArgument("code is required".into()));
        }

        let fingerprint = Fingerprint::new(&name, &email, &address.to_string());
        let expected = self
            .pending
            .get(&fingerprint)
            .ok_or(AuthFlowError::InvalidCode)?;
        // Exact, case-sensitive match only.
        if expected != code {
            return Err(AuthFlowError::InvalidCode);
        }

        let nonce = rng::challenge_nonce()?;
        let (identity, _binding) = self.db.create_identity(&NewIdentity {
            name,
            email,
            address,
            nonce,
            role: Role::Member,
        })?;

        // Best-effort cleanup; TTL expiry is the backstop if this is lost.
        self.pending.remove(&fingerprint);

        tracing::info!(user_id = identity.id, address = %address, "identity registered");
        Ok(identity)
    }
}

/// Validate the shared (name, email, address) triple of both sign-up
/// operations.
fn validate_identity_input(
    name: &str,
    email: &str,
    address: &str,
) -> Result<(String, String, Address), AuthFlowError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthFlowError::InvalidArgument("name is required".into()));
    }
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AuthFlowError::InvalidArgument(
            "a valid email is required".into(),
        ));
    }
    let address = signature::parse_address(address)?;
    Ok((name.to_string(), email.to_string(), address))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::delivery::test_support::{CapturingDelivery, FailingDelivery};
    use crate::auth::signature::test_support::{address, personal_sign, signing_key};

    use super::*;

    fn service_with(
        delivery: Arc<dyn CodeDelivery>,
    ) -> (RegistrationService, Arc<IdentityDb>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(IdentityDb::open(&dir.path().join("identity.redb")).unwrap());
        let pending = Arc::new(PendingStore::new(64, Duration::from_secs(7200)));
        let service = RegistrationService::new(db.clone(), pending, delivery);
        (service, db, dir)
    }

    fn capturing_service() -> (
        RegistrationService,
        Arc<IdentityDb>,
        Arc<CapturingDelivery>,
        tempfile::TempDir,
    ) {
        let delivery = Arc::new(CapturingDelivery::default());
        let (service, db, dir) = service_with(delivery.clone());
        (service, db, delivery, dir)
    }

    #[test]
    fn full_registration_flow() {
        let (service, db, delivery, _dir) = capturing_service();
        let key = signing_key(1);
        let addr = address(&key).to_string();
        let sig = personal_sign(&key, REGISTRATION_INTENT);

        service
            .request_challenge("alice", "alice@example.com", &addr, &sig)
            .unwrap();

        let code = delivery.last_code().expect("code delivered");
        let identity = service
            .complete_registration("alice", "alice@example.com", &addr, &code)
            .unwrap();

        assert_eq!(identity.name, "alice");
        assert!(db.address_exists(&address(&key)).unwrap());
        // The fresh binding carries a nonce ready for sign-in.
        let binding = db.binding(&address(&key)).unwrap().unwrap();
        assert_eq!(binding.nonce.len(), 32);
    }

    #[test]
    fn challenge_rejects_wrong_signer() {
        let (service, _db, _delivery, _dir) = capturing_service();
        let signer = signing_key(1);
        let claimed = signing_key(2);
        let sig = personal_sign(&signer, REGISTRATION_INTENT);

        let err = service
            .request_challenge(
                "alice",
                "alice@example.com",
                &address(&claimed).to_string(),
                &sig,
            )
            .unwrap_err();
        assert!(matches!(err, AuthFlowError::AddressMismatch));
    }

    #[test]
    fn challenge_rejects_signature_over_other_message() {
        let (service, _db, _delivery, _dir) = capturing_service();
        let key = signing_key(1);
        let sig = personal_sign(&key, "some other statement");

        let err = service
            .request_challenge("alice", "alice@example.com", &address(&key).to_string(), &sig)
            .unwrap_err();
        assert!(matches!(
            err,
            AuthFlowError::AddressMismatch | AuthFlowError::InvalidSignature
        ));
    }

    #[test]
    fn challenge_fast_rejects_taken_fields() {
        let (service, _db, delivery, _dir) = capturing_service();
        let key = signing_key(1);
        let addr = address(&key).to_string();
        let sig = personal_sign(&key, REGISTRATION_INTENT);

        service
            .request_challenge("alice", "alice@example.com", &addr, &sig)
            .unwrap();
        let code = delivery.last_code().unwrap();
        service
            .complete_registration("alice", "alice@example.com", &addr, &code)
            .unwrap();

        // Same address again.
        let err = service
            .request_challenge("bob", "bob@example.com", &addr, &sig)
            .unwrap_err();
        assert!(matches!(
            err,
            AuthFlowError::AlreadyExists(UniqueField::Address)
        ));

        // Fresh address, taken name.
        let key2 = signing_key(2);
        let sig2 = personal_sign(&key2, REGISTRATION_INTENT);
        let err = service
            .request_challenge("alice", "bob@example.com", &address(&key2).to_string(), &sig2)
            .unwrap_err();
        assert!(matches!(err, AuthFlowError::AlreadyExists(UniqueField::Name)));

        // Fresh address and name, taken email.
        let err = service
            .request_challenge("bob", "alice@example.com", &address(&key2).to_string(), &sig2)
            .unwrap_err();
        assert!(matches!(
            err,
            AuthFlowError::AlreadyExists(UniqueField::Email)
        ));
    }

    #[test]
    fn wrong_code_is_rejected() {
        let (service, _db, delivery, _dir) = capturing_service();
        let key = signing_key(1);
        let addr = address(&key).to_string();
        let sig = personal_sign(&key, REGISTRATION_INTENT);

        service
            .request_challenge("alice", "alice@example.com", &addr, &sig)
            .unwrap();
        let code = delivery.last_code().unwrap();
        let wrong = if code == "482913" { "482914" } else { "482913" };

        let err = service
            .complete_registration("alice", "alice@example.com", &addr, wrong)
            .unwrap_err();
        assert!(matches!(err, AuthFlowError::InvalidCode));
    }

    #[test]
    fn code_cannot_be_replayed_after_success() {
        let (service, _db, delivery, _dir) = capturing_service();
        let key = signing_key(1);
        let addr = address(&key).to_string();
        let sig = personal_sign(&key, REGISTRATION_INTENT);

        service
            .request_challenge("alice", "alice@example.com", &addr, &sig)
            .unwrap();
        let code = delivery.last_code().unwrap();
        service
            .complete_registration("alice", "alice@example.com", &addr, &code)
            .unwrap();

        let err = service
            .complete_registration("alice", "alice@example.com", &addr, &code)
            .unwrap_err();
        assert!(matches!(err, AuthFlowError::InvalidCode));
    }

    #[test]
    fn code_expires_with_ttl() {
        let delivery = Arc::new(CapturingDelivery::default());
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(IdentityDb::open(&dir.path().join("identity.redb")).unwrap());
        let pending = Arc::new(PendingStore::new(64, Duration::from_millis(1)));
        let service = RegistrationService::new(db, pending, delivery.clone());

        let key = signing_key(1);
        let addr = address(&key).to_string();
        let sig = personal_sign(&key, REGISTRATION_INTENT);

        service
            .request_challenge("alice", "alice@example.com", &addr, &sig)
            .unwrap();
        let code = delivery.last_code().unwrap();

        std::thread::sleep(Duration::from_millis(5));
        let err = service
            .complete_registration("alice", "alice@example.com", &addr, &code)
            .unwrap_err();
        assert!(matches!(err, AuthFlowError::InvalidCode));
    }

    #[test]
    fn code_does_not_transfer_between_fingerprints() {
        let (service, _db, delivery, _dir) = capturing_service();
        let key = signing_key(1);
        let addr = address(&key).to_string();
        let sig = personal_sign(&key, REGISTRATION_INTENT);

        service
            .request_challenge("alice", "alice@example.com", &addr, &sig)
            .unwrap();
        let code = delivery.last_code().unwrap();

        // Valid code, different name: fresh non-matching fingerprint.
        let err = service
            .complete_registration("mallory", "alice@example.com", &addr, &code)
            .unwrap_err();
        assert!(matches!(err, AuthFlowError::InvalidCode));
    }

    #[test]
    fn completion_rejects_address_bound_meanwhile() {
        let (service, db, delivery, _dir) = capturing_service();
        let key = signing_key(1);
        let addr = address(&key).to_string();
        let sig = personal_sign(&key, REGISTRATION_INTENT);

        service
            .request_challenge("alice", "alice@example.com", &addr, &sig)
            .unwrap();
        let code = delivery.last_code().unwrap();

        // The same address gets bound to another identity before alice
        // redeems her code.
        db.create_identity(&NewIdentity {
            name: "bob".to_string(),
            email: "bob@example.com".to_string(),
            address: address(&key),
            nonce: "aabbccdd00112233".to_string(),
            role: Role::Member,
        })
        .unwrap();

        // The code still matches, but the commit-time constraint check
        // reports the conflict, not an internal error.
        let err = service
            .complete_registration("alice", "alice@example.com", &addr, &code)
            .unwrap_err();
        assert!(matches!(
            err,
            AuthFlowError::AlreadyExists(UniqueField::Address)
        ));
        assert!(!db.name_exists("alice").unwrap());
    }

    #[test]
    fn delivery_failure_is_internal() {
        let (service, _db, _dir) = {
            let (s, db, dir) = service_with(Arc::new(FailingDelivery));
            (s, db, dir)
        };
        let key = signing_key(1);
        let sig = personal_sign(&key, REGISTRATION_INTENT);

        let err = service
            .request_challenge("alice", "alice@example.com", &address(&key).to_string(), &sig)
            .unwrap_err();
        assert!(matches!(err, AuthFlowError::Internal(_)));
    }

    #[test]
    fn malformed_inputs_are_invalid_argument() {
        let (service, _db, _delivery, _dir) = capturing_service();
        let key = signing_key(1);
        let addr = address(&key).to_string();
        let sig = personal_sign(&key, REGISTRATION_INTENT);

        for (name, email, a) in [
            ("", "alice@example.com", addr.as_str()),
            ("alice", "not-an-email", addr.as_str()),
            ("alice", "alice@example.com", "0x123"),
        ] {
            let err = service.request_challenge(name, email, a, &sig).unwrap_err();
            assert!(matches!(err, AuthFlowError::InvalidArgument(_)));
        }
    }

    #[test]
    fn concurrent_completions_commit_at_most_once() {
        let (service, db, delivery, _dir) = capturing_service();
        let key = signing_key(1);
        let addr = address(&key).to_string();
        let sig = personal_sign(&key, REGISTRATION_INTENT);

        service
            .request_challenge("alice", "alice@example.com", &addr, &sig)
            .unwrap();
        let code = delivery.last_code().unwrap();

        let service = Arc::new(service);
        let mut handles = Vec::new();
        for _ in 0..3 {
            let service = service.clone();
            let addr = addr.clone();
            let code = code.clone();
            handles.push(std::thread::spawn(move || {
                service.complete_registration("alice", "alice@example.com", &addr, &code)
            }));
        }

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one completion may commit");

        for failed in results.iter().filter(|r| r.is_err()) {
            assert!(matches!(
                failed.as_ref().unwrap_err(),
                AuthFlowError::AlreadyExists(_) | AuthFlowError::InvalidCode
            ));
        }

        // One identity, not three.
        assert!(db.identity(1).unwrap().is_some());
        assert!(db.identity(2).unwrap().is_none());
    }
}
