// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 WalletGate Team

use std::sync::Arc;

use crate::auth::SessionIssuer;
use crate::registration::RegistrationService;
use crate::storage::IdentityDb;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<IdentityDb>,
    pub registration: Arc<RegistrationService>,
    pub sessions: Arc<SessionIssuer>,
}

impl AppState {
    pub fn new(
        db: Arc<IdentityDb>,
        registration: RegistrationService,
        sessions: SessionIssuer,
    ) -> Self {
        Self {
            db,
            registration: Arc::new(registration),
            sessions: Arc::new(sessions),
        }
    }
}
