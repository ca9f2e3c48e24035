// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 WalletGate Team

//! Embedded identity database backed by redb.
//!
//! All uniqueness constraints (name, email, wallet address) are enforced
//! here, inside the write transaction that creates the records. The
//! pre-checks the orchestrator runs earlier are a fast-reject courtesy;
//! this module is the source of truth.

use std::path::Path;

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::error::UniqueField;

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: user_id → serialized Identity (JSON bytes).
const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");

/// Uniqueness index: user name → user_id.
const USERS_BY_NAME: TableDefinition<&str, u64> = TableDefinition::new("users_by_name");

/// Uniqueness index: email → user_id.
const USERS_BY_EMAIL: TableDefinition<&str, u64> = TableDefinition::new("users_by_email");

/// Primary table: lowercase wallet address → serialized WalletBinding.
const WALLET_BINDINGS: TableDefinition<&str, &[u8]> = TableDefinition::new("wallet_bindings");

/// Index: composite key (user_id_be|lowercase_address) → display address.
const USER_BINDING_INDEX: TableDefinition<&[u8], &str> =
    TableDefinition::new("user_binding_index");

/// Meta state: key → u64 (e.g. "next_user_id").
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_USER_ID_KEY: &str = "next_user_id";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum IdentityDbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0} already exists")]
    AlreadyExists(UniqueField),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("nonce was already consumed")]
    NonceConsumed,
}

pub type IdentityDbResult<T> = Result<T, IdentityDbError>;

impl From<IdentityDbError> for crate::auth::error::AuthFlowError {
    fn from(err: IdentityDbError) -> Self {
        use crate::auth::error::AuthFlowError;
        match err {
            // Commit-time constraint hits keep their field; they are a
            // caller error, not an infrastructure failure.
            IdentityDbError::AlreadyExists(field) => AuthFlowError::AlreadyExists(field),
            IdentityDbError::NotFound(_) => AuthFlowError::UnknownAddress,
            // A consumed nonce means the presented signature verified
            // against a value that is no longer current, so it fails the
            // same way any other bad proof does.
            IdentityDbError::NonceConsumed => AuthFlowError::InvalidSignature,
            other => AuthFlowError::Internal(other.to_string()),
        }
    }
}

// =============================================================================
// Records
// =============================================================================

/// A registered user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Normal registered user
    Member,
    /// Administrative user
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Self::Member
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Member => write!(f, "member"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// A registered user. Name and email are immutable and globally unique.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Identity {
    /// Monotonically allocated user identifier.
    pub id: u64,
    /// Unique user name.
    pub name: String,
    /// Unique email address.
    pub email: String,
    /// User role.
    pub role: Role,
    /// When the identity was created.
    pub created_at: DateTime<Utc>,
}

/// Associates one signing address with exactly one identity.
///
/// The `nonce` is the wallet's current sign-in challenge. It is replaced
/// atomically by [`IdentityDb::rotate_nonce`] after every successful
/// verification and is never reused across proofs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletBinding {
    /// Checksummed wallet address as registered.
    pub address: String,
    /// Owning user id.
    pub user_id: u64,
    /// Current challenge nonce.
    pub nonce: String,
    /// When the binding was created.
    pub created_at: DateTime<Utc>,
}

/// Input for the atomic registration commit.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub name: String,
    pub email: String,
    pub address: Address,
    pub nonce: String,
    pub role: Role,
}

/// Composite key for the per-user binding index:
/// `user_id_be_bytes | '|' | lowercase_address`.
fn binding_index_key(user_id: u64, address_lower: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + 1 + address_lower.len());
    key.extend_from_slice(&user_id.to_be_bytes());
    key.push(b'|');
    key.extend_from_slice(address_lower.as_bytes());
    key
}

/// Range bounds covering every binding of one user.
fn binding_index_prefix(user_id: u64) -> (Vec<u8>, Vec<u8>) {
    let mut start = Vec::with_capacity(9);
    start.extend_from_slice(&user_id.to_be_bytes());
    start.push(b'|');

    let mut end = start.clone();
    end.extend_from_slice(&[0xFF; 44]);
    (start, end)
}

// =============================================================================
// IdentityDb
// =============================================================================

/// Embedded ACID identity database.
pub struct IdentityDb {
    db: Database,
}

impl IdentityDb {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> IdentityDbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail.
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERS_BY_NAME)?;
            let _ = write_txn.open_table(USERS_BY_EMAIL)?;
            let _ = write_txn.open_table(WALLET_BINDINGS)?;
            let _ = write_txn.open_table(USER_BINDING_INDEX)?;
            let _ = write_txn.open_table(META)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    // =========================================================================
    // Registration commit
    // =========================================================================

    /// Create an identity together with its initial wallet binding.
    ///
    /// Runs in a single write transaction: the three uniqueness
    /// constraints are re-checked here and the identity, both index
    /// entries and the binding land together or not at all. A constraint
    /// hit aborts the transaction with `AlreadyExists` naming only the
    /// offending field (checked in the order address, name, email).
    pub fn create_identity(
        &self,
        new: &NewIdentity,
    ) -> IdentityDbResult<(Identity, WalletBinding)> {
        let address_display = new.address.to_string();
        let address_lower = address_display.to_lowercase();
        let now = Utc::now();

        let write_txn = self.db.begin_write()?;
        let (identity, binding) = {
            let mut bindings = write_txn.open_table(WALLET_BINDINGS)?;
            let mut by_name = write_txn.open_table(USERS_BY_NAME)?;
            let mut by_email = write_txn.open_table(USERS_BY_EMAIL)?;
            let mut users = write_txn.open_table(USERS)?;
            let mut binding_index = write_txn.open_table(USER_BINDING_INDEX)?;
            let mut meta = write_txn.open_table(META)?;

            if bindings.get(address_lower.as_str())?.is_some() {
                return Err(IdentityDbError::AlreadyExists(UniqueField::Address));
            }
            if by_name.get(new.name.as_str())?.is_some() {
                return Err(IdentityDbError::AlreadyExists(UniqueField::Name));
            }
            if by_email.get(new.email.as_str())?.is_some() {
                return Err(IdentityDbError::AlreadyExists(UniqueField::Email));
            }

            let id = meta.get(NEXT_USER_ID_KEY)?.map(|v| v.value()).unwrap_or(1);
            meta.insert(NEXT_USER_ID_KEY, id + 1)?;

            let identity = Identity {
                id,
                name: new.name.clone(),
                email: new.email.clone(),
                role: new.role,
                created_at: now,
            };
            let binding = WalletBinding {
                address: address_display.clone(),
                user_id: id,
                nonce: new.nonce.clone(),
                created_at: now,
            };

            users.insert(id, serde_json::to_vec(&identity)?.as_slice())?;
            by_name.insert(new.name.as_str(), id)?;
            by_email.insert(new.email.as_str(), id)?;
            bindings.insert(
                address_lower.as_str(),
                serde_json::to_vec(&binding)?.as_slice(),
            )?;
            let key = binding_index_key(id, &address_lower);
            binding_index.insert(key.as_slice(), address_display.as_str())?;

            (identity, binding)
        };
        write_txn.commit()?;

        Ok((identity, binding))
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Whether a user name is already taken.
    pub fn name_exists(&self, name: &str) -> IdentityDbResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS_BY_NAME)?;
        Ok(table.get(name)?.is_some())
    }

    /// Whether an email is already taken.
    pub fn email_exists(&self, email: &str) -> IdentityDbResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS_BY_EMAIL)?;
        Ok(table.get(email)?.is_some())
    }

    /// Whether a wallet address is already bound to an identity.
    pub fn address_exists(&self, address: &Address) -> IdentityDbResult<bool> {
        Ok(self.binding(address)?.is_some())
    }

    /// Look up the binding for a wallet address.
    pub fn binding(&self, address: &Address) -> IdentityDbResult<Option<WalletBinding>> {
        let key = address.to_string().to_lowercase();
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WALLET_BINDINGS)?;
        match table.get(key.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Look up an identity by id.
    pub fn identity(&self, user_id: u64) -> IdentityDbResult<Option<Identity>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        match table.get(user_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All wallet addresses bound to a user, in display form.
    pub fn addresses_for(&self, user_id: u64) -> IdentityDbResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USER_BINDING_INDEX)?;

        let (start, end) = binding_index_prefix(user_id);
        let mut addresses = Vec::new();
        for entry in table.range(start.as_slice()..end.as_slice())? {
            let entry = entry?;
            addresses.push(entry.1.value().to_string());
        }
        Ok(addresses)
    }

    // =========================================================================
    // Nonce rotation
    // =========================================================================

    /// Conditionally replace the challenge nonce for a wallet.
    ///
    /// Compare-and-swap inside a single write transaction: the rotation
    /// commits only while the stored nonce still equals `expected_nonce`,
    /// the value the caller just verified a signature against. If another
    /// sign-in consumed it first, the transaction aborts with
    /// `NonceConsumed`, so a nonce value can be spent by at most one
    /// verification no matter how many attempts race. Returns the binding
    /// as it was *before* rotation (the verified state).
    pub fn rotate_nonce(
        &self,
        address: &Address,
        expected_nonce: &str,
        new_nonce: &str,
    ) -> IdentityDbResult<WalletBinding> {
        let key = address.to_string().to_lowercase();

        let write_txn = self.db.begin_write()?;
        let previous = {
            let mut table = write_txn.open_table(WALLET_BINDINGS)?;

            let existing_bytes = {
                let existing = table
                    .get(key.as_str())?
                    .ok_or_else(|| IdentityDbError::NotFound(format!("binding {key}")))?;
                existing.value().to_vec()
            };

            let mut binding: WalletBinding = serde_json::from_slice(&existing_bytes)?;
            if binding.nonce != expected_nonce {
                return Err(IdentityDbError::NonceConsumed);
            }
            let previous = binding.clone();
            binding.nonce = new_nonce.to_string();

            table.insert(key.as_str(), serde_json::to_vec(&binding)?.as_slice())?;
            previous
        };
        write_txn.commit()?;

        Ok(previous)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db() -> (IdentityDb, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = IdentityDb::open(&dir.path().join("identity.redb")).unwrap();
        (db, dir)
    }

    fn addr(last_byte: u8) -> Address {
        let mut bytes = [0x11u8; 20];
        bytes[19] = last_byte;
        Address::from_slice(&bytes)
    }

    fn new_identity(name: &str, email: &str, address: Address) -> NewIdentity {
        NewIdentity {
            name: name.to_string(),
            email: email.to_string(),
            address,
            nonce: "aabbccdd00112233".to_string(),
            role: Role::Member,
        }
    }

    #[test]
    fn create_and_look_up_identity() {
        let (db, _dir) = temp_db();
        let (identity, binding) = db
            .create_identity(&new_identity("alice", "alice@example.com", addr(1)))
            .unwrap();

        assert_eq!(identity.id, 1);
        assert_eq!(binding.user_id, 1);
        assert_eq!(binding.nonce, "aabbccdd00112233");

        let loaded = db.identity(1).unwrap().unwrap();
        assert_eq!(loaded.name, "alice");
        assert_eq!(loaded.role, Role::Member);

        assert!(db.name_exists("alice").unwrap());
        assert!(db.email_exists("alice@example.com").unwrap());
        assert!(db.address_exists(&addr(1)).unwrap());
        assert!(!db.name_exists("bob").unwrap());
    }

    #[test]
    fn user_ids_are_monotonic() {
        let (db, _dir) = temp_db();
        let (first, _) = db
            .create_identity(&new_identity("alice", "alice@example.com", addr(1)))
            .unwrap();
        let (second, _) = db
            .create_identity(&new_identity("bob", "bob@example.com", addr(2)))
            .unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[test]
    fn duplicate_address_rejected_first() {
        let (db, _dir) = temp_db();
        db.create_identity(&new_identity("alice", "alice@example.com", addr(1)))
            .unwrap();

        // Same address, everything else fresh: address wins the check order.
        let err = db
            .create_identity(&new_identity("bob", "bob@example.com", addr(1)))
            .unwrap_err();
        assert!(matches!(
            err,
            IdentityDbError::AlreadyExists(UniqueField::Address)
        ));
    }

    #[test]
    fn duplicate_name_and_email_name_their_field() {
        let (db, _dir) = temp_db();
        db.create_identity(&new_identity("alice", "alice@example.com", addr(1)))
            .unwrap();

        let err = db
            .create_identity(&new_identity("alice", "fresh@example.com", addr(2)))
            .unwrap_err();
        assert!(matches!(
            err,
            IdentityDbError::AlreadyExists(UniqueField::Name)
        ));

        let err = db
            .create_identity(&new_identity("bob", "alice@example.com", addr(2)))
            .unwrap_err();
        assert!(matches!(
            err,
            IdentityDbError::AlreadyExists(UniqueField::Email)
        ));
    }

    #[test]
    fn failed_commit_leaves_no_partial_records() {
        let (db, _dir) = temp_db();
        db.create_identity(&new_identity("alice", "alice@example.com", addr(1)))
            .unwrap();

        // Fails on the email constraint, after name would have been new.
        let err = db
            .create_identity(&new_identity("bob", "alice@example.com", addr(2)))
            .unwrap_err();
        assert!(matches!(err, IdentityDbError::AlreadyExists(_)));

        // Nothing from the aborted attempt is visible.
        assert!(!db.name_exists("bob").unwrap());
        assert!(!db.address_exists(&addr(2)).unwrap());
        assert!(db.identity(2).unwrap().is_none());
    }

    #[test]
    fn binding_lookup_is_case_insensitive() {
        let (db, _dir) = temp_db();
        db.create_identity(&new_identity("alice", "alice@example.com", addr(0xAB)))
            .unwrap();

        let binding = db.binding(&addr(0xAB)).unwrap().unwrap();
        assert_eq!(binding.user_id, 1);
        // Display form keeps the checksummed casing.
        assert_eq!(binding.address, addr(0xAB).to_string());
    }

    #[test]
    fn rotate_nonce_replaces_and_returns_previous() {
        let (db, _dir) = temp_db();
        db.create_identity(&new_identity("alice", "alice@example.com", addr(1)))
            .unwrap();

        let previous = db
            .rotate_nonce(&addr(1), "aabbccdd00112233", "ffee0011")
            .unwrap();
        assert_eq!(previous.nonce, "aabbccdd00112233");

        let current = db.binding(&addr(1)).unwrap().unwrap();
        assert_eq!(current.nonce, "ffee0011");
        assert_ne!(current.nonce, previous.nonce);
    }

    #[test]
    fn rotate_nonce_unknown_address_is_not_found() {
        let (db, _dir) = temp_db();
        let err = db
            .rotate_nonce(&addr(9), "aabbccdd00112233", "ffee0011")
            .unwrap_err();
        assert!(matches!(err, IdentityDbError::NotFound(_)));
    }

    #[test]
    fn rotate_nonce_fails_once_consumed() {
        let (db, _dir) = temp_db();
        db.create_identity(&new_identity("alice", "alice@example.com", addr(1)))
            .unwrap();

        db.rotate_nonce(&addr(1), "aabbccdd00112233", "ffee0011")
            .unwrap();

        // Second rotation against the spent value loses the swap.
        let err = db
            .rotate_nonce(&addr(1), "aabbccdd00112233", "11223344")
            .unwrap_err();
        assert!(matches!(err, IdentityDbError::NonceConsumed));

        // The winner's nonce is untouched by the failed attempt.
        let current = db.binding(&addr(1)).unwrap().unwrap();
        assert_eq!(current.nonce, "ffee0011");
    }

    #[test]
    fn addresses_for_scans_only_that_user() {
        let (db, _dir) = temp_db();
        db.create_identity(&new_identity("alice", "alice@example.com", addr(1)))
            .unwrap();
        db.create_identity(&new_identity("bob", "bob@example.com", addr(2)))
            .unwrap();

        let alice_addrs = db.addresses_for(1).unwrap();
        assert_eq!(alice_addrs, vec![addr(1).to_string()]);

        let bob_addrs = db.addresses_for(2).unwrap();
        assert_eq!(bob_addrs, vec![addr(2).to_string()]);

        assert!(db.addresses_for(3).unwrap().is_empty());
    }
}
