//! Transaction digests.
//!
//! Every signature in the protocol, party signatures and the notary's
//! commitment proof alike, covers the SHA-256 digest of the proposal's
//! canonical JSON encoding.

use sha2::{Digest, Sha256};

use pactledger_common::TransactionProposal;

use crate::{CryptoError, Result};

/// SHA-256 of arbitrary bytes.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute the hex digest a proposal is signed under.
///
/// The digest covers the proposal only, never the attached signatures, so
/// appending signatures does not change what later signers sign.
pub fn transaction_digest(proposal: &TransactionProposal) -> Result<String> {
    let bytes = serde_json::to_vec(proposal)
        .map_err(|e| CryptoError::SerializationFailed(e.to_string()))?;
    Ok(hex::encode(sha256(&bytes)))
}
