//! Responder session state machine.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{info, instrument, warn};

use pactledger_common::{
    validate_proposal, CommittedRecord, NodeAddress, PactLedgerError, ResponderPhase, Result,
};
use pactledger_crypto::signing::verify_party_signature;
use pactledger_crypto::transaction_digest;
use pactledger_protocol::{
    SessionAcceptor, SessionChannel, SessionMessage, SignatureResponseMessage,
};
use pactledger_registry::KeyService;
use pactledger_vault::{verify_commitment, RecordStore};

use crate::config::ResponderConfig;
use crate::handler::CommitHandler;

/// A node's responding side: accepts sessions and runs the counterparty
/// protocol for each.
pub struct ResponderNode {
    config: ResponderConfig,
    address: NodeAddress,
    keys: Arc<dyn KeyService>,
    vault: Arc<dyn RecordStore>,
    handler: Arc<dyn CommitHandler>,
}

impl ResponderNode {
    /// Create a new responder node.
    pub fn new(
        config: ResponderConfig,
        address: NodeAddress,
        keys: Arc<dyn KeyService>,
        vault: Arc<dyn RecordStore>,
        handler: Arc<dyn CommitHandler>,
    ) -> Self {
        Self {
            config,
            address,
            keys,
            vault,
            handler,
        }
    }

    /// This node's network address.
    pub fn address(&self) -> &NodeAddress {
        &self.address
    }

    /// Run the session protocol on one inbound channel.
    #[instrument(skip(self, channel), fields(node = %self.address))]
    pub async fn run_session(&self, channel: &dyn SessionChannel) -> Result<CommittedRecord> {
        let mut phase = ResponderPhase::AwaitingProposal;

        let message = timeout(self.config.proposal_timeout, channel.recv())
            .await
            .map_err(|_| PactLedgerError::SessionTimeout {
                session_id: None,
                operation: "awaiting proposal".to_string(),
            })??;

        let proposal_msg = match message {
            SessionMessage::Proposal(m) => m,
            other => {
                return Err(PactLedgerError::NetworkError(format!(
                    "expected proposal, got {:?}",
                    other.message_type()
                )));
            }
        };
        let session_id = proposal_msg.session_id;
        advance(&mut phase, ResponderPhase::Verifying)?;

        let digest = transaction_digest(&proposal_msg.proposal.proposal)
            .map_err(|e| PactLedgerError::InternalError(e.to_string()))?;

        if let Err(reason) = self.check_proposal(&proposal_msg, &digest) {
            info!(session_id = %session_id, reason = %reason, "Rejecting proposal");
            let reply = SignatureResponseMessage::rejected(session_id, reason.clone());
            let _ = channel.send(SessionMessage::SignatureResponse(reply)).await;
            advance(&mut phase, ResponderPhase::Rejected)?;
            return Err(PactLedgerError::SessionRejected { reason });
        }

        let signature = self
            .keys
            .sign(&proposal_msg.signer_key, digest.as_bytes())
            .await?;
        channel
            .send(SessionMessage::SignatureResponse(
                SignatureResponseMessage::signed(session_id, signature),
            ))
            .await?;
        advance(&mut phase, ResponderPhase::Signed)?;
        advance(&mut phase, ResponderPhase::AwaitingFinality)?;

        info!(session_id = %session_id, "Signed, awaiting finality");

        let message = match timeout(self.config.finality_timeout, channel.recv()).await {
            Ok(received) => received?,
            Err(_) => {
                // Liveness gap inherent to the two-phase design: our
                // signature is out there but the transaction never became
                // final here. Surface it loudly.
                warn!(
                    session_id = %session_id,
                    digest = %digest,
                    "Finality never received; signature remains unexploited"
                );
                return Err(PactLedgerError::SessionTimeout {
                    session_id: Some(session_id),
                    operation: "awaiting finality".to_string(),
                });
            }
        };

        let finality = match message {
            SessionMessage::Finality(m) => m,
            SessionMessage::Abort(m) => {
                info!(session_id = %session_id, reason = %m.reason, "Session aborted by initiator");
                return Err(PactLedgerError::NetworkError(format!(
                    "session aborted: {}",
                    m.reason
                )));
            }
            other => {
                return Err(PactLedgerError::NetworkError(format!(
                    "expected finality, got {:?}",
                    other.message_type()
                )));
            }
        };

        let committed = finality.committed;
        self.check_finality(&proposal_msg, &committed, &digest)?;

        self.vault.store(committed.clone()).await?;
        self.handler.on_committed(&committed).await;
        advance(&mut phase, ResponderPhase::Complete)?;

        info!(
            session_id = %session_id,
            record_id = %committed.id(),
            "Session complete, record persisted"
        );
        Ok(committed)
    }

    /// Re-verify a received proposal under this node's rules and policy.
    /// Returns the rejection reason on failure.
    fn check_proposal(
        &self,
        message: &pactledger_protocol::ProposalMessage,
        digest: &str,
    ) -> std::result::Result<(), String> {
        let proposal = &message.proposal.proposal;

        validate_proposal(proposal).map_err(|e| e.to_string())?;

        let record = proposal
            .output_record()
            .ok_or_else(|| "proposal has no output record".to_string())?;

        if record.value > self.config.max_accepted_value {
            return Err(format!(
                "records with a value over {} are not accepted",
                self.config.max_accepted_value
            ));
        }

        if !proposal
            .command
            .required_signers()
            .contains(&message.signer_key)
        {
            return Err("requested signer is not a required signer".to_string());
        }

        if !self.keys.holds(&message.signer_key) {
            return Err("requested signing key is not custodied here".to_string());
        }

        for (key, bytes) in &message.proposal.signatures {
            verify_party_signature(key, digest.as_bytes(), bytes)
                .map_err(|_| format!("invalid initiator signature from {}", key))?;
        }

        Ok(())
    }

    /// Verify the finality push before persisting anything.
    fn check_finality(
        &self,
        proposal_msg: &pactledger_protocol::ProposalMessage,
        committed: &CommittedRecord,
        digest: &str,
    ) -> Result<()> {
        verify_commitment(&committed.proof, digest)?;

        let expected = proposal_msg
            .proposal
            .proposal
            .output_record()
            .ok_or_else(|| PactLedgerError::InternalError("verified proposal lost".to_string()))?;
        if &committed.record != expected {
            return Err(PactLedgerError::InvalidSignature(
                "finalized record differs from the signed proposal".to_string(),
            ));
        }

        for signer in proposal_msg.proposal.proposal.command.required_signers() {
            let bytes = committed.signatures.get(signer).ok_or_else(|| {
                PactLedgerError::InvalidSignature(format!("missing signature from {}", signer))
            })?;
            verify_party_signature(signer, digest.as_bytes(), bytes).map_err(|_| {
                PactLedgerError::InvalidSignature(format!("invalid signature from {}", signer))
            })?;
        }

        Ok(())
    }
}

fn advance(phase: &mut ResponderPhase, to: ResponderPhase) -> Result<()> {
    if !phase.can_transition_to(to) {
        return Err(PactLedgerError::InvalidResponderTransition { from: *phase, to });
    }
    *phase = to;
    Ok(())
}

#[async_trait]
impl SessionAcceptor for ResponderNode {
    async fn accept(&self, channel: Box<dyn SessionChannel>) {
        if let Err(e) = self.run_session(channel.as_ref()).await {
            warn!(node = %self.address, error = %e, "Session ended with error");
        }
    }
}
