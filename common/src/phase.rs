//! Flow state machines for both sides of the protocol.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of an initiating flow.
///
/// The single-party path skips `Collecting` entirely; the remote path passes
/// through it exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowPhase {
    /// Assembling and verifying the proposal.
    Building,
    /// Signing with locally-custodied keys.
    LocallySigning,
    /// Awaiting the counterparty's signature over a session.
    Collecting,
    /// Submitting to the commitment authority and distributing the result.
    Finalizing,
    /// Committed and persisted everywhere required.
    Committed,
    /// Terminally failed; no partial commit exists.
    Failed,
}

impl FlowPhase {
    /// Check if this is a terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowPhase::Committed | FlowPhase::Failed)
    }

    /// Get valid next phases from the current phase.
    pub fn valid_transitions(&self) -> &[FlowPhase] {
        match self {
            FlowPhase::Building => &[FlowPhase::LocallySigning, FlowPhase::Failed],
            FlowPhase::LocallySigning => &[
                FlowPhase::Finalizing,
                FlowPhase::Collecting,
                FlowPhase::Failed,
            ],
            FlowPhase::Collecting => &[FlowPhase::Finalizing, FlowPhase::Failed],
            FlowPhase::Finalizing => &[FlowPhase::Committed, FlowPhase::Failed],
            FlowPhase::Committed => &[],
            FlowPhase::Failed => &[],
        }
    }

    /// Check if a transition to the given phase is valid.
    pub fn can_transition_to(&self, next: FlowPhase) -> bool {
        self.valid_transitions().contains(&next)
    }
}

/// Lifecycle phase of a responding session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponderPhase {
    /// Session open, waiting for the proposal message.
    AwaitingProposal,
    /// Re-verifying the proposal under local rules and policy.
    Verifying,
    /// Signed and replied; shorthand phase on the way to awaiting finality.
    Signed,
    /// Rejected the proposal; terminal, nothing recorded.
    Rejected,
    /// Waiting for the initiator to push the notarized transaction.
    AwaitingFinality,
    /// Finality received, proof verified, record persisted.
    Complete,
}

impl ResponderPhase {
    /// Check if this is a terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ResponderPhase::Rejected | ResponderPhase::Complete)
    }

    /// Get valid next phases from the current phase.
    pub fn valid_transitions(&self) -> &[ResponderPhase] {
        match self {
            ResponderPhase::AwaitingProposal => &[ResponderPhase::Verifying],
            ResponderPhase::Verifying => &[ResponderPhase::Signed, ResponderPhase::Rejected],
            ResponderPhase::Signed => &[ResponderPhase::AwaitingFinality],
            ResponderPhase::AwaitingFinality => &[ResponderPhase::Complete],
            ResponderPhase::Rejected => &[],
            ResponderPhase::Complete => &[],
        }
    }

    /// Check if a transition to the given phase is valid.
    pub fn can_transition_to(&self, next: ResponderPhase) -> bool {
        self.valid_transitions().contains(&next)
    }
}
