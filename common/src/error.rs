//! Error types for the PactLedger protocol.

use crate::{AccountId, FlowPhase, RecordId, ResponderPhase, SessionId};
use thiserror::Error;

/// Main error type for PactLedger operations.
#[derive(Error, Debug)]
pub enum PactLedgerError {
    /// The account ID is unknown to the local registry.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// The proposal violates a structural or business rule.
    #[error("Invalid proposal: {reason}")]
    InvalidProposal { reason: String },

    /// A counterparty session did not reply in time. The session id is
    /// absent when the wait ended before a session's first message named it.
    #[error("Session timed out during {operation}")]
    SessionTimeout {
        session_id: Option<SessionId>,
        operation: String,
    },

    /// The counterparty vetoed the proposal.
    #[error("Session rejected: {reason}")]
    SessionRejected { reason: String },

    /// The commitment authority refused the proposal.
    #[error("Notarization rejected: {reason}")]
    NotarizationRejected { reason: String },

    /// The commitment authority could not be reached.
    #[error("Notarization unavailable: {0}")]
    NotarizationUnavailable(String),

    /// A signature failed verification.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Invalid initiator phase transition.
    #[error("Invalid transition from {from:?} to {to:?}")]
    InvalidTransition { from: FlowPhase, to: FlowPhase },

    /// Invalid responder phase transition.
    #[error("Invalid responder transition from {from:?} to {to:?}")]
    InvalidResponderTransition {
        from: ResponderPhase,
        to: ResponderPhase,
    },

    /// The record is not present in the local vault.
    #[error("Record not found: {0}")]
    RecordNotFound(RecordId),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Session transport error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Internal protocol error.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl PactLedgerError {
    /// Check whether this failure class is detected before any network
    /// interaction (fail-fast, no partial side effects anywhere).
    pub fn failed_before_network(&self) -> bool {
        matches!(
            self,
            PactLedgerError::AccountNotFound(_) | PactLedgerError::InvalidProposal { .. }
        )
    }

    /// Get error code for façade responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            PactLedgerError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            PactLedgerError::InvalidProposal { .. } => "INVALID_PROPOSAL",
            PactLedgerError::SessionTimeout { .. } => "SESSION_TIMEOUT",
            PactLedgerError::SessionRejected { .. } => "SESSION_REJECTED",
            PactLedgerError::NotarizationRejected { .. } => "NOTARIZATION_REJECTED",
            PactLedgerError::NotarizationUnavailable(_) => "NOTARIZATION_UNAVAILABLE",
            PactLedgerError::InvalidSignature(_) => "INVALID_SIGNATURE",
            PactLedgerError::InvalidTransition { .. } => "INVALID_TRANSITION",
            PactLedgerError::InvalidResponderTransition { .. } => "INVALID_TRANSITION",
            PactLedgerError::RecordNotFound(_) => "RECORD_NOT_FOUND",
            PactLedgerError::ConfigurationError(_) => "CONFIGURATION_ERROR",
            PactLedgerError::NetworkError(_) => "NETWORK_ERROR",
            PactLedgerError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Shorthand constructor for proposal rule violations.
    pub fn invalid_proposal(reason: impl Into<String>) -> Self {
        PactLedgerError::InvalidProposal {
            reason: reason.into(),
        }
    }
}

/// Result type alias for PactLedger operations.
pub type Result<T> = std::result::Result<T, PactLedgerError>;
