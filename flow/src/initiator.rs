//! The initiating flow state machine.

use std::sync::Arc;

use tokio::time::timeout;
use tracing::{info, instrument, warn};

use pactledger_common::{
    AccountId, CommittedRecord, FlowPhase, NodeAddress, PactLedgerError, PartyKey, RecordId,
    Result, SessionId, SignedProposal,
};
use pactledger_crypto::signing::verify_party_signature;
use pactledger_crypto::{transaction_digest, SigningKey};
use pactledger_protocol::{
    AbortMessage, FinalityMessage, ProposalMessage, SessionChannel, SessionDialer, SessionMessage,
    SignatureVerdict,
};
use pactledger_registry::{AccountResolver, KeyCache};
use pactledger_vault::{Notary, RecordStore};

use crate::builder::TransactionBuilder;
use crate::config::FlowConfig;
use crate::observer::FlowObserver;

/// An open counterparty session awaiting the finality push.
struct OpenSession {
    channel: Box<dyn SessionChannel>,
    session_id: SessionId,
}

/// Drives one record creation from proposal to commitment.
///
/// The flow signs with the node identity and the lender's key, collects the
/// borrower's signature locally when the borrower is hosted here and over
/// one session otherwise, notarizes exactly once, then persists and
/// distributes the result.
pub struct InitiatorFlow {
    config: FlowConfig,
    address: NodeAddress,
    identity: SigningKey,
    resolver: Arc<AccountResolver>,
    builder: TransactionBuilder,
    dialer: Arc<dyn SessionDialer>,
    notary: Arc<dyn Notary>,
    vault: Arc<dyn RecordStore>,
    observer: Arc<dyn FlowObserver>,
}

impl InitiatorFlow {
    /// Create a new initiator flow for a node.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: FlowConfig,
        address: NodeAddress,
        identity: SigningKey,
        resolver: Arc<AccountResolver>,
        dialer: Arc<dyn SessionDialer>,
        notary: Arc<dyn Notary>,
        vault: Arc<dyn RecordStore>,
        observer: Arc<dyn FlowObserver>,
    ) -> Self {
        let builder = TransactionBuilder::new(resolver.clone(), config.notary_name.clone());
        Self {
            config,
            address,
            identity,
            resolver,
            builder,
            dialer,
            notary,
            vault,
            observer,
        }
    }

    /// Run the flow to completion.
    ///
    /// Returns the committed record, or an error with no partial commit
    /// anywhere. A failure before the first session message leaves no trace
    /// outside this node.
    #[instrument(skip(self), fields(node = %self.address))]
    pub async fn run(
        &self,
        lender: AccountId,
        borrower: AccountId,
        value: i64,
    ) -> Result<CommittedRecord> {
        let mut phase = FlowPhase::Building;
        let mut record_id = RecordId::default();

        match self.execute(&mut phase, &mut record_id, lender, borrower, value).await {
            Ok(committed) => Ok(committed),
            Err(e) => {
                if !phase.is_terminal() {
                    let from = phase;
                    phase = FlowPhase::Failed;
                    self.observer.on_transition(record_id, from, phase);
                }
                warn!(record_id = %record_id, error = %e, "Flow failed");
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        phase: &mut FlowPhase,
        record_id: &mut RecordId,
        lender: AccountId,
        borrower: AccountId,
        value: i64,
    ) -> Result<CommittedRecord> {
        let cache = KeyCache::new();
        let built = self.builder.build(lender, borrower, value, &cache).await?;
        *record_id = built
            .proposal
            .record_id()
            .ok_or_else(|| PactLedgerError::InternalError("built proposal has no output".into()))?;

        let digest = transaction_digest(&built.proposal)
            .map_err(|e| PactLedgerError::InternalError(e.to_string()))?;

        self.advance(phase, FlowPhase::LocallySigning, *record_id)?;

        let mut signed = SignedProposal::new(built.proposal.clone());
        signed.add_signature(self.identity.sign(digest.as_bytes()));
        signed.add_signature(
            self.resolver
                .key_service()
                .sign(&built.lender.key, digest.as_bytes())
                .await?,
        );

        let session = if built.borrower.info.is_hosted_at(&self.address) {
            signed.add_signature(
                self.resolver
                    .key_service()
                    .sign(&built.borrower.key, digest.as_bytes())
                    .await?,
            );
            info!(record_id = %record_id, "Borrower hosted locally, signed without a session");
            None
        } else {
            self.advance(phase, FlowPhase::Collecting, *record_id)?;
            let open = self
                .collect_signature(&mut signed, &digest, built.borrower.key, &built.borrower.info.host)
                .await?;
            Some(open)
        };

        self.advance(phase, FlowPhase::Finalizing, *record_id)?;

        let result = self.finalize(&signed, &digest, session.as_ref()).await;
        let committed = match result {
            Ok(committed) => committed,
            Err(e) => {
                if let Some(open) = &session {
                    self.abort(open, &e.to_string()).await;
                }
                return Err(e);
            }
        };

        self.advance(phase, FlowPhase::Committed, *record_id)?;
        info!(record_id = %record_id, value, "Record committed");
        Ok(committed)
    }

    /// Collect the borrower's signature over one counterparty session.
    async fn collect_signature(
        &self,
        signed: &mut SignedProposal,
        digest: &str,
        borrower_key: PartyKey,
        host: &NodeAddress,
    ) -> Result<OpenSession> {
        let channel = self.dialer.open(host).await?;
        let session_id = SessionId::new();
        let open = OpenSession {
            channel,
            session_id,
        };

        info!(session_id = %session_id, peer = %host, "Session opened");

        open.channel
            .send(SessionMessage::Proposal(ProposalMessage::new(
                session_id,
                signed.clone(),
                borrower_key,
            )))
            .await?;

        let reply = match timeout(self.config.session_timeout, open.channel.recv()).await {
            Ok(received) => received?,
            Err(_) => {
                self.abort(&open, "signature response timed out").await;
                return Err(PactLedgerError::SessionTimeout {
                    session_id: Some(session_id),
                    operation: "collecting counterparty signature".to_string(),
                });
            }
        };

        let response = match reply {
            SessionMessage::SignatureResponse(m) => m,
            other => {
                self.abort(&open, "unexpected message").await;
                return Err(PactLedgerError::NetworkError(format!(
                    "expected signature response, got {:?}",
                    other.message_type()
                )));
            }
        };

        match response.verdict {
            SignatureVerdict::Signed { signature } => {
                if signature.key != borrower_key {
                    self.abort(&open, "signature from wrong key").await;
                    return Err(PactLedgerError::InvalidSignature(format!(
                        "expected signature from {}, got {}",
                        borrower_key, signature.key
                    )));
                }
                verify_party_signature(&signature.key, digest.as_bytes(), &signature.bytes)
                    .map_err(|_| {
                        PactLedgerError::InvalidSignature(format!(
                            "counterparty signature from {} does not verify",
                            signature.key
                        ))
                    })?;
                signed.add_signature(signature);
                Ok(open)
            }
            SignatureVerdict::Rejected { reason } => {
                info!(session_id = %session_id, reason = %reason, "Counterparty rejected proposal");
                Err(PactLedgerError::SessionRejected { reason })
            }
        }
    }

    /// Notarize, persist locally, and push finality to the open session.
    async fn finalize(
        &self,
        signed: &SignedProposal,
        digest: &str,
        session: Option<&OpenSession>,
    ) -> Result<CommittedRecord> {
        if !signed.is_fully_signed() {
            return Err(PactLedgerError::InternalError(format!(
                "finalizing with missing signers {:?}",
                signed.missing_signers()
            )));
        }

        let proof = match timeout(
            self.config.notarization_timeout,
            self.notary.notarize(signed),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(PactLedgerError::NotarizationUnavailable(format!(
                    "notary {} did not answer",
                    self.config.notary_name
                )));
            }
        };

        let record = signed
            .proposal
            .output_record()
            .ok_or_else(|| PactLedgerError::InternalError("signed proposal has no output".into()))?
            .clone();
        let committed = CommittedRecord {
            record,
            proof,
            signatures: signed.signatures.clone(),
        };

        self.vault.store(committed.clone()).await?;

        if let Some(open) = session {
            // Notarization already happened; a failed push here leaves the
            // counterparty to its finality timeout, it cannot unwind the
            // commit.
            if let Err(e) = open
                .channel
                .send(SessionMessage::Finality(FinalityMessage::new(
                    open.session_id,
                    committed.clone(),
                )))
                .await
            {
                warn!(
                    session_id = %open.session_id,
                    digest = %digest,
                    error = %e,
                    "Finality push failed after commit"
                );
            }
        }

        Ok(committed)
    }

    async fn abort(&self, open: &OpenSession, reason: &str) {
        let message = SessionMessage::Abort(AbortMessage::new(open.session_id, reason));
        if let Err(e) = open.channel.send(message).await {
            warn!(session_id = %open.session_id, error = %e, "Abort notification failed");
        }
    }

    fn advance(&self, phase: &mut FlowPhase, to: FlowPhase, record_id: RecordId) -> Result<()> {
        if !phase.can_transition_to(to) {
            return Err(PactLedgerError::InvalidTransition { from: *phase, to });
        }
        let from = *phase;
        *phase = to;
        self.observer.on_transition(record_id, from, to);
        Ok(())
    }
}
