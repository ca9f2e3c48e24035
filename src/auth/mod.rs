// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 WalletGate Team

//! Wallet-based authentication.
//!
//! [`signature`] recovers and checks EIP-191 personal-sign proofs,
//! [`session`] turns a verified proof into a session token, and
//! [`error`] is the error surface shared by every authentication flow.

pub mod error;
pub mod session;
pub mod signature;

pub use error::{AuthFlowError, UniqueField};
pub use session::{SessionClaims, SessionGrant, SessionIssuer};
