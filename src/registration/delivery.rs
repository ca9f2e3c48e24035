// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 WalletGate Team

//! Outbound delivery of one-time registration codes.
//!
//! The transport (SMTP, SMS gateway, ...) is an external collaborator;
//! this crate only defines the seam. The orchestrator holds a
//! `dyn CodeDelivery`, so tests substitute a capturing fake and
//! deployments plug in a real sender.

use crate::auth::error::AuthFlowError;

#[derive(Debug, thiserror::Error)]
#[error("code delivery failed: {0}")]
pub struct DeliveryError(pub String);

impl From<DeliveryError> for AuthFlowError {
    fn from(err: DeliveryError) -> Self {
        AuthFlowError::Internal(err.to_string())
    }
}

/// Delivers a one-time code to the registrant.
pub trait CodeDelivery: Send + Sync {
    fn deliver(&self, email: &str, code: &str) -> Result<(), DeliveryError>;
}

/// Logs the dispatch instead of sending it. Default for local runs,
/// where no mail relay is configured.
pub struct TracingDelivery;

impl CodeDelivery for TracingDelivery {
    fn deliver(&self, email: &str, code: &str) -> Result<(), DeliveryError> {
        tracing::info!(email = %email, code_len = code.len(), "one-time code dispatched");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use super::*;

    /// Captures delivered codes for assertions.
    #[derive(Default)]
    pub struct CapturingDelivery {
        pub sent: Mutex<Vec<(String, String)>>,
    }

    impl CapturingDelivery {
        pub fn last_code(&self) -> Option<String> {
            self.sent.lock().unwrap().last().map(|(_, code)| code.clone())
        }
    }

    impl CodeDelivery for CapturingDelivery {
        fn deliver(&self, email: &str, code: &str) -> Result<(), DeliveryError> {
            self.sent
                .lock()
                .unwrap()
                .push((email.to_string(), code.to_string()));
            Ok(())
        }
    }

    /// Always fails, for exercising the Internal path.
    pub struct FailingDelivery;

    impl CodeDelivery for FailingDelivery {
        fn deliver(&self, _email: &str, _code: &str) -> Result<(), DeliveryError> {
            Err(DeliveryError("relay unreachable".to_string()))
        }
    }
}
