// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 WalletGate Team

//! # Durable Identity Storage
//!
//! Identities and wallet bindings live in an embedded redb database
//! (pure Rust, ACID). redb write transactions are single-writer and
//! serializable, which gives this module its two load-bearing
//! guarantees:
//!
//! - the multi-record registration commit (identity + initial wallet
//!   binding + uniqueness indexes) is atomic: either all records land
//!   or none do, and concurrent readers never observe a partial state;
//! - nonce rotation is a compare-and-swap on the previously verified
//!   value: no two sign-ins can both consume the same nonce and both
//!   succeed.
//!
//! ## Table Layout
//!
//! - `users`: user_id → serialized Identity
//! - `users_by_name`: name → user_id (uniqueness index)
//! - `users_by_email`: email → user_id (uniqueness index)
//! - `wallet_bindings`: lowercase address → serialized WalletBinding
//! - `user_binding_index`: composite key (user_id_be|address) → display address
//! - `meta`: key → u64 (user id counter)

pub mod identity_db;

pub use identity_db::{
    Identity, IdentityDb, IdentityDbError, IdentityDbResult, NewIdentity, Role, WalletBinding,
};
