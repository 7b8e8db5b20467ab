//! Transaction proposal types.
//!
//! A proposal starts unsigned, accumulates signatures append-only, and once
//! every required signer is present may be submitted for notarization. The
//! notarized result is a [`CommittedRecord`], which is terminal.

use crate::{PartyKey, Record, RecordId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reference to a prior transaction output.
///
/// Record creation consumes nothing, so creation proposals always carry an
/// empty input set; the type exists because the commitment authority's
/// uniqueness guarantee is defined over input sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateRef {
    /// Hex digest of the transaction that produced the state.
    pub txn_digest: String,
    /// Output index within that transaction.
    pub output_index: u32,
}

/// The command authorizing a proposal, naming every key that must sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "kind")]
pub enum AuthorizationCommand {
    /// Issue a new record onto the ledger.
    Create {
        /// Keys whose signatures are required before finalization.
        required_signers: Vec<PartyKey>,
    },
}

impl AuthorizationCommand {
    /// The keys that must sign under this command.
    pub fn required_signers(&self) -> &[PartyKey] {
        match self {
            AuthorizationCommand::Create { required_signers } => required_signers,
        }
    }
}

/// An unsigned candidate transaction, built fresh per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionProposal {
    /// Consumed states. Always empty for creation.
    pub inputs: Vec<StateRef>,
    /// Produced records. Exactly one for creation.
    pub outputs: Vec<Record>,
    /// Authorization command with the required signer set.
    pub command: AuthorizationCommand,
    /// Identity of the commitment authority selected for this proposal.
    pub notary: String,
}

impl TransactionProposal {
    /// The single output record, if the proposal is well-formed.
    pub fn output_record(&self) -> Option<&Record> {
        match self.outputs.as_slice() {
            [record] => Some(record),
            _ => None,
        }
    }

    /// The ID of the output record, if present.
    pub fn record_id(&self) -> Option<RecordId> {
        self.output_record().map(|r| r.id)
    }
}

/// A single party's signature over a transaction digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartySignature {
    /// Key that produced the signature.
    pub key: PartyKey,
    /// Raw Ed25519 signature bytes.
    pub bytes: Vec<u8>,
}

/// A proposal together with the signatures collected so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedProposal {
    /// The underlying proposal. Never mutated after the first signature.
    pub proposal: TransactionProposal,
    /// Collected signatures, keyed by signer.
    pub signatures: BTreeMap<PartyKey, Vec<u8>>,
}

impl SignedProposal {
    /// Wrap an unsigned proposal.
    pub fn new(proposal: TransactionProposal) -> Self {
        Self {
            proposal,
            signatures: BTreeMap::new(),
        }
    }

    /// Append a signature. Later signatures for the same key are ignored;
    /// a key's first signature is authoritative.
    pub fn add_signature(&mut self, signature: PartySignature) {
        self.signatures
            .entry(signature.key)
            .or_insert(signature.bytes);
    }

    /// Keys named by the command that have not signed yet.
    pub fn missing_signers(&self) -> Vec<PartyKey> {
        self.proposal
            .command
            .required_signers()
            .iter()
            .filter(|key| !self.signatures.contains_key(key))
            .copied()
            .collect()
    }

    /// Check whether every required signer has an entry.
    pub fn is_fully_signed(&self) -> bool {
        self.missing_signers().is_empty()
    }
}

/// Proof of notarization issued by the commitment authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentProof {
    /// The notary's signing key.
    pub notary_key: PartyKey,
    /// Hex digest of the transaction that was committed.
    pub txn_digest: String,
    /// The notary's signature over the digest.
    pub signature: Vec<u8>,
    /// When the commitment was issued.
    pub committed_at: Timestamp,
}

/// A record with proof of successful notarization.
///
/// Terminal and immutable; persisted at every participant that is a party
/// to it or whose node hosts a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedRecord {
    /// The agreed record.
    pub record: Record,
    /// Commitment proof from the notary.
    pub proof: CommitmentProof,
    /// The full party signature set, keyed by signer.
    pub signatures: BTreeMap<PartyKey, Vec<u8>>,
}

impl CommittedRecord {
    /// The record's unique identifier.
    pub fn id(&self) -> RecordId {
        self.record.id
    }
}
