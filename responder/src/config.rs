//! Responder configuration.

use std::time::Duration;

use pactledger_common::time::constants;

/// Configuration for the responding side of sessions.
#[derive(Debug, Clone)]
pub struct ResponderConfig {
    /// Largest record value this node will co-sign. Proposals above the
    /// ceiling are rejected regardless of structural validity.
    pub max_accepted_value: i64,
    /// How long to wait for the proposal message on a new session.
    pub proposal_timeout: Duration,
    /// How long to wait for the finality push after signing.
    pub finality_timeout: Duration,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            max_accepted_value: 100,
            proposal_timeout: constants::session_timeout(),
            finality_timeout: constants::finality_timeout(),
        }
    }
}

impl ResponderConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("RESPONDER_MAX_VALUE") {
            if let Ok(value) = value.parse() {
                config.max_accepted_value = value;
            }
        }

        if let Ok(secs) = std::env::var("RESPONDER_FINALITY_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.finality_timeout = Duration::from_secs(secs);
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_accepted_value <= 0 {
            return Err("Acceptance ceiling must be positive".to_string());
        }

        if self.finality_timeout.is_zero() || self.proposal_timeout.is_zero() {
            return Err("Timeouts cannot be zero".to_string());
        }

        Ok(())
    }
}
