// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 WalletGate Team

//! TTL-bounded store for in-flight registrations.
//!
//! Maps a registration fingerprint (the exact name/email/address triple
//! proposed at challenge time) to its one-time code. Entries expire
//! passively: expiry is checked on read and no background sweep runs.
//! Capacity-bounded, so a flood of challenge requests evicts the oldest
//! attempts instead of growing without bound.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

/// Composite key identifying one in-flight registration attempt.
///
/// All three fields must match at verification time; a mismatch in any of
/// them is a different fingerprint, so a valid code cannot be combined
/// with a different identity triple. The address component is lowercased
/// because address comparisons are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    name: String,
    email: String,
    address: String,
}

impl Fingerprint {
    pub fn new(name: &str, email: &str, address: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            address: address.to_lowercase(),
        }
    }
}

struct PendingEntry {
    code: String,
    inserted_at: Instant,
}

/// In-process store for pending registration codes.
pub struct PendingStore {
    entries: Mutex<LruCache<Fingerprint, PendingEntry>>,
    ttl: Duration,
}

impl PendingStore {
    /// Create a store with the given capacity and per-entry TTL.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            ttl,
        }
    }

    /// Store a one-time code for a fingerprint.
    ///
    /// Overwrites any prior entry for the same fingerprint, restarting
    /// its TTL.
    pub fn put(&self, fingerprint: Fingerprint, code: String) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(
                fingerprint,
                PendingEntry {
                    code,
                    inserted_at: Instant::now(),
                },
            );
        }
    }

    /// Fetch the code for a fingerprint.
    ///
    /// Returns `None` for absent and expired entries alike; an expired
    /// entry is evicted on the way out.
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<String> {
        let mut entries = self.entries.lock().ok()?;
        if let Some(entry) = entries.get(fingerprint) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.code.clone());
            }
            entries.pop(fingerprint);
        }
        None
    }

    /// Remove a fingerprint's entry. Idempotent.
    pub fn remove(&self, fingerprint: &Fingerprint) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.pop(fingerprint);
        }
    }
}
