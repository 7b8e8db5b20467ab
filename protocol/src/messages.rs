//! Session message types.
//!
//! A successful exchange carries exactly three messages in order: the
//! partially-signed proposal, the counterparty's signature (or rejection),
//! and the finalized transaction. An abort is sent best-effort when the
//! initiator abandons a session and never appears in a successful exchange.

use pactledger_common::{
    CommittedRecord, PartyKey, PartySignature, SessionId, SignedProposal, Timestamp,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Protocol version carried by every message.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Message type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    Proposal,
    SignatureResponse,
    Finality,
    Abort,
}

/// First message: the initiator's partially-signed proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalMessage {
    /// Protocol version.
    pub version: String,
    /// Message type identifier.
    pub message_type: MessageType,
    /// Session this message belongs to.
    pub session_id: SessionId,
    /// The proposal with the initiator-side signatures attached.
    pub proposal: SignedProposal,
    /// The key the responder is asked to sign with.
    pub signer_key: PartyKey,
    /// Message timestamp.
    pub timestamp: Timestamp,
}

impl ProposalMessage {
    /// Create a new proposal message.
    pub fn new(session_id: SessionId, proposal: SignedProposal, signer_key: PartyKey) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_string(),
            message_type: MessageType::Proposal,
            session_id,
            proposal,
            signer_key,
            timestamp: Utc::now(),
        }
    }
}

/// The responder's verdict on a proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "verdict")]
pub enum SignatureVerdict {
    /// Proposal accepted; the signature is attached.
    Signed { signature: PartySignature },
    /// Proposal vetoed; nothing was recorded on the responding side.
    Rejected { reason: String },
}

/// Second message: signature or rejection from the responder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureResponseMessage {
    /// Protocol version.
    pub version: String,
    /// Message type identifier.
    pub message_type: MessageType,
    /// Session this message belongs to.
    pub session_id: SessionId,
    /// The verdict.
    pub verdict: SignatureVerdict,
    /// Message timestamp.
    pub timestamp: Timestamp,
}

impl SignatureResponseMessage {
    /// Create a signed response.
    pub fn signed(session_id: SessionId, signature: PartySignature) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_string(),
            message_type: MessageType::SignatureResponse,
            session_id,
            verdict: SignatureVerdict::Signed { signature },
            timestamp: Utc::now(),
        }
    }

    /// Create a rejection response.
    pub fn rejected(session_id: SessionId, reason: impl Into<String>) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_string(),
            message_type: MessageType::SignatureResponse,
            session_id,
            verdict: SignatureVerdict::Rejected {
                reason: reason.into(),
            },
            timestamp: Utc::now(),
        }
    }
}

/// Third message: the notarized transaction pushed back to the responder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalityMessage {
    /// Protocol version.
    pub version: String,
    /// Message type identifier.
    pub message_type: MessageType,
    /// Session this message belongs to.
    pub session_id: SessionId,
    /// The committed record, proof included.
    pub committed: CommittedRecord,
    /// Message timestamp.
    pub timestamp: Timestamp,
}

impl FinalityMessage {
    /// Create a new finality message.
    pub fn new(session_id: SessionId, committed: CommittedRecord) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_string(),
            message_type: MessageType::Finality,
            session_id,
            committed,
            timestamp: Utc::now(),
        }
    }
}

/// Best-effort notification that the initiator abandoned the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbortMessage {
    /// Protocol version.
    pub version: String,
    /// Message type identifier.
    pub message_type: MessageType,
    /// Session this message belongs to.
    pub session_id: SessionId,
    /// Abort reason.
    pub reason: String,
    /// Message timestamp.
    pub timestamp: Timestamp,
}

impl AbortMessage {
    /// Create a new abort message.
    pub fn new(session_id: SessionId, reason: impl Into<String>) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_string(),
            message_type: MessageType::Abort,
            session_id,
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Envelope for everything a session channel can carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "message")]
pub enum SessionMessage {
    Proposal(ProposalMessage),
    SignatureResponse(SignatureResponseMessage),
    Finality(FinalityMessage),
    Abort(AbortMessage),
}

impl SessionMessage {
    /// The session this message belongs to.
    pub fn session_id(&self) -> SessionId {
        match self {
            SessionMessage::Proposal(m) => m.session_id,
            SessionMessage::SignatureResponse(m) => m.session_id,
            SessionMessage::Finality(m) => m.session_id,
            SessionMessage::Abort(m) => m.session_id,
        }
    }

    /// The message type.
    pub fn message_type(&self) -> MessageType {
        match self {
            SessionMessage::Proposal(_) => MessageType::Proposal,
            SessionMessage::SignatureResponse(_) => MessageType::SignatureResponse,
            SessionMessage::Finality(_) => MessageType::Finality,
            SessionMessage::Abort(_) => MessageType::Abort,
        }
    }
}
