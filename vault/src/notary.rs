//! Commitment authority (notary) interface.
//!
//! The notary guarantees global uniqueness and ordering over a proposal's
//! input set. Creation proposals have empty inputs, so the check is trivial
//! for them, but the interface generalizes to consuming transactions.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{info, warn};

use pactledger_common::{
    now, CommitmentProof, PactLedgerError, Result, SignedProposal, StateRef,
};
use pactledger_crypto::signing::verify_party_signature;
use pactledger_crypto::{transaction_digest, SigningKey};

/// The commitment authority the initiator submits signed proposals to.
#[async_trait]
pub trait Notary: Send + Sync {
    /// The notary's identity, as named in proposals.
    fn identity(&self) -> &str;

    /// Notarize a fully-signed proposal.
    ///
    /// Fails with `NotarizationRejected` for incomplete signature sets,
    /// invalid signatures, or inputs already consumed by a different
    /// transaction, and `NotarizationUnavailable` when unreachable.
    async fn notarize(&self, signed: &SignedProposal) -> Result<CommitmentProof>;
}

/// Single-process notary implementation.
pub struct LocalNotary {
    identity: String,
    signing_key: SigningKey,
    /// Input refs consumed so far, mapped to the consuming digest.
    consumed: DashMap<StateRef, String>,
    /// Proofs issued so far, keyed by digest. Resubmission of an identical
    /// transaction returns the original proof instead of double-committing.
    issued: DashMap<String, CommitmentProof>,
    available: AtomicBool,
}

impl LocalNotary {
    /// Create a new notary with a fresh signing key.
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            signing_key: SigningKey::generate(),
            consumed: DashMap::new(),
            issued: DashMap::new(),
            available: AtomicBool::new(true),
        }
    }

    /// Mark the notary reachable or unreachable. Test hook for the
    /// `NotarizationUnavailable` path.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// The notary's public key.
    pub fn party_key(&self) -> pactledger_common::PartyKey {
        self.signing_key.party_key()
    }
}

#[async_trait]
impl Notary for LocalNotary {
    fn identity(&self) -> &str {
        &self.identity
    }

    async fn notarize(&self, signed: &SignedProposal) -> Result<CommitmentProof> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(PactLedgerError::NotarizationUnavailable(format!(
                "notary {} unreachable",
                self.identity
            )));
        }

        let digest = transaction_digest(&signed.proposal)
            .map_err(|e| PactLedgerError::InternalError(e.to_string()))?;

        let missing = signed.missing_signers();
        if !missing.is_empty() {
            return Err(PactLedgerError::NotarizationRejected {
                reason: format!("missing signatures from {:?}", missing),
            });
        }

        for (key, bytes) in &signed.signatures {
            verify_party_signature(key, digest.as_bytes(), bytes).map_err(|_| {
                PactLedgerError::NotarizationRejected {
                    reason: format!("invalid signature from {}", key),
                }
            })?;
        }

        if let Some(proof) = self.issued.get(&digest) {
            warn!(digest = %digest, "Duplicate notarization request, returning issued proof");
            return Ok(proof.clone());
        }

        // Claim inputs one at a time through the entry API so two concurrent
        // proposals can never both pass a read check before either writes.
        let mut claimed: Vec<StateRef> = Vec::new();
        for input in &signed.proposal.inputs {
            let conflict = match self.consumed.entry(input.clone()) {
                Entry::Occupied(entry) => *entry.get() != digest,
                Entry::Vacant(entry) => {
                    entry.insert(digest.clone());
                    claimed.push(input.clone());
                    false
                }
            };

            if conflict {
                // Release only the claims this call made.
                for prior in &claimed {
                    self.consumed.remove_if(prior, |_, holder| holder == &digest);
                }
                return Err(PactLedgerError::NotarizationRejected {
                    reason: format!(
                        "input {}:{} already consumed",
                        input.txn_digest, input.output_index
                    ),
                });
            }
        }

        let signature = self.signing_key.sign(digest.as_bytes());
        let proof = CommitmentProof {
            notary_key: self.party_key(),
            txn_digest: digest.clone(),
            signature: signature.bytes,
            committed_at: now(),
        };
        self.issued.insert(digest.clone(), proof.clone());

        info!(notary = %self.identity, digest = %digest, "Transaction notarized");
        Ok(proof)
    }
}

/// Verify a commitment proof against the digest of the transaction it is
/// claimed to cover. Every party persisting a committed record runs this
/// before storing.
pub fn verify_commitment(proof: &CommitmentProof, expected_digest: &str) -> Result<()> {
    if proof.txn_digest != expected_digest {
        return Err(PactLedgerError::InvalidSignature(
            "commitment proof covers a different transaction".to_string(),
        ));
    }

    verify_party_signature(&proof.notary_key, proof.txn_digest.as_bytes(), &proof.signature)
        .map_err(|_| PactLedgerError::InvalidSignature("invalid notary signature".to_string()))
}
