//! Initiator flow configuration.

use std::time::Duration;

use pactledger_common::time::constants;

/// Configuration for the initiating side of the protocol.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Identity of the commitment authority named in every proposal.
    pub notary_name: String,
    /// How long to wait for the counterparty's signature response.
    pub session_timeout: Duration,
    /// How long to wait for the commitment authority.
    pub notarization_timeout: Duration,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            notary_name: "notary-0".to_string(),
            session_timeout: constants::session_timeout(),
            notarization_timeout: constants::notarization_timeout(),
        }
    }
}

impl FlowConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(name) = std::env::var("FLOW_NOTARY_NAME") {
            config.notary_name = name;
        }

        if let Ok(secs) = std::env::var("FLOW_SESSION_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.session_timeout = Duration::from_secs(secs);
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.notary_name.is_empty() {
            return Err("Notary name cannot be empty".to_string());
        }

        if self.session_timeout.is_zero() || self.notarization_timeout.is_zero() {
            return Err("Timeouts cannot be zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FlowConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_notary_name() {
        let config = FlowConfig {
            notary_name: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
