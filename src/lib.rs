// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 WalletGate Team

//! # WalletGate
//!
//! Challenge-response authentication and identity registration for
//! EVM-style wallets.
//!
//! A wallet proves ownership of its address by producing an EIP-191
//! personal-sign signature over a server-chosen message. Registration is
//! a two-step exchange (signed intent, then an emailed verification
//! code); sign-in signs the wallet's current rotating nonce and yields a
//! self-contained session token.
//!
//! ## Layout
//!
//! - [`auth`]: signature recovery, sign-in, session tokens
//! - [`registration`]: the two-step sign-up orchestrator
//! - [`storage`]: the embedded ACID identity database
//! - [`api`]: the REST surface over all of the above

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod registration;
pub mod rng;
pub mod state;
pub mod storage;
