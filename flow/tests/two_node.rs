//! Two-node end-to-end tests over the in-memory transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::timeout;

use pactledger_common::{AccountInfo, CommittedRecord, FlowPhase, NodeAddress};
use pactledger_crypto::SigningKey;
use pactledger_flow::{
    CreateRecordRequest, FlowConfig, InitiatorFlow, RecordService, RecordingObserver,
};
use pactledger_protocol::{
    InMemoryTransport, SessionAcceptor, SessionChannel, SessionDialer, TransportCounters,
};
use pactledger_registry::{AccountDirectory, AccountResolver, InMemoryKeyService, KeyService};
use pactledger_responder::{CommitHandler, ResponderConfig, ResponderNode};
use pactledger_vault::{InMemoryVault, LocalNotary, Notary, RecordStore};

/// Commit handler that forwards records to the test, so assertions can wait
/// for the responder's persistence instead of sleeping.
struct ChannelCommitHandler {
    tx: mpsc::Sender<CommittedRecord>,
}

#[async_trait]
impl CommitHandler for ChannelCommitHandler {
    async fn on_committed(&self, record: &CommittedRecord) {
        let _ = self.tx.send(record.clone()).await;
    }
}

/// Acceptor that reads the proposal and never answers.
struct SilentAcceptor;

#[async_trait]
impl SessionAcceptor for SilentAcceptor {
    async fn accept(&self, channel: Box<dyn SessionChannel>) {
        let _ = channel.recv().await;
        // Hold the channel open until the peer gives up.
        let _ = channel.recv().await;
    }
}

struct TestNet {
    directory: Arc<AccountDirectory>,
    transport: Arc<InMemoryTransport>,
    notary: Arc<LocalNotary>,
    vault_a: Arc<InMemoryVault>,
    vault_b: Arc<InMemoryVault>,
    service: RecordService,
    observer: Arc<RecordingObserver>,
    committed_rx: mpsc::Receiver<CommittedRecord>,
    alice: AccountInfo,
    bob: AccountInfo,
    carol: AccountInfo,
}

impl TestNet {
    /// Node A hosts Alice and Carol and initiates; node B hosts Bob and
    /// responds. One key service backs both, standing in for the
    /// network-wide key request sub-protocol.
    fn build(config: FlowConfig) -> Self {
        let directory = Arc::new(AccountDirectory::new());
        let keys: Arc<dyn KeyService> = Arc::new(InMemoryKeyService::new());
        let transport = Arc::new(InMemoryTransport::new());
        let notary = Arc::new(LocalNotary::new(config.notary_name.clone()));

        let node_a = NodeAddress::new("node-a");
        let node_b = NodeAddress::new("node-b");

        let (tx, committed_rx) = mpsc::channel(8);
        let vault_b = Arc::new(InMemoryVault::new());
        let responder = Arc::new(ResponderNode::new(
            ResponderConfig::default(),
            node_b.clone(),
            keys.clone(),
            vault_b.clone(),
            Arc::new(ChannelCommitHandler { tx }),
        ));
        transport.register(node_b.clone(), responder);

        let vault_a = Arc::new(InMemoryVault::new());
        let resolver = Arc::new(AccountResolver::new(directory.clone(), keys));
        let observer = Arc::new(RecordingObserver::new());
        let dialer: Arc<dyn SessionDialer> = transport.clone();
        let notary_dyn: Arc<dyn Notary> = notary.clone();
        let flow = Arc::new(InitiatorFlow::new(
            config,
            node_a.clone(),
            SigningKey::generate(),
            resolver,
            dialer,
            notary_dyn,
            vault_a.clone(),
            observer.clone(),
        ));
        let service = RecordService::new(flow, vault_a.clone());

        let alice = directory.register("Alice", node_a.clone());
        let carol = directory.register("Carol", node_a);
        let bob = directory.register("Bob", node_b);

        Self {
            directory,
            transport,
            notary,
            vault_a,
            vault_b,
            service,
            observer,
            committed_rx,
            alice,
            bob,
            carol,
        }
    }

    fn counters(&self) -> Arc<TransportCounters> {
        self.transport.counters()
    }

    async fn responder_committed(&mut self) -> CommittedRecord {
        timeout(Duration::from_secs(5), self.committed_rx.recv())
            .await
            .expect("responder never persisted")
            .expect("commit channel closed")
    }
}

fn request(lender: &AccountInfo, borrower: &AccountInfo, value: i64) -> CreateRecordRequest {
    CreateRecordRequest {
        lender: lender.id,
        borrower: borrower.id,
        value,
    }
}

#[tokio::test]
async fn test_local_path_commits_without_network() {
    let net = TestNet::build(FlowConfig::default());

    let committed = net
        .service
        .create_record(request(&net.alice, &net.carol, 25))
        .await
        .unwrap();

    assert_eq!(committed.record.value, 25);
    assert_eq!(net.vault_a.count().await, 1);
    assert_eq!(net.counters().sessions_opened(), 0);
    assert_eq!(net.counters().messages_sent(), 0);
}

#[tokio::test]
async fn test_remote_path_commits_on_both_nodes() {
    let mut net = TestNet::build(FlowConfig::default());

    let committed = net
        .service
        .create_record(request(&net.alice, &net.bob, 60))
        .await
        .unwrap();

    let responder_copy = net.responder_committed().await;
    assert_eq!(responder_copy, committed);
    assert_eq!(net.vault_a.lookup(committed.id()).await.unwrap(), committed);
    assert_eq!(net.vault_b.lookup(committed.id()).await.unwrap(), committed);

    // Exactly one session, carrying proposal, signature, and finality.
    assert_eq!(net.counters().sessions_opened(), 1);
    assert_eq!(net.counters().messages_sent(), 3);
}

#[tokio::test]
async fn test_self_dealing_rejected_before_network() {
    let net = TestNet::build(FlowConfig::default());

    let err = net
        .service
        .create_record(request(&net.alice, &net.alice, 10))
        .await
        .unwrap_err();

    assert!(err.failed_before_network());
    assert_eq!(net.counters().sessions_opened(), 0);
    assert_eq!(net.vault_a.count().await, 0);
}

#[tokio::test]
async fn test_non_positive_value_rejected() {
    let net = TestNet::build(FlowConfig::default());

    for value in [0, -7] {
        let err = net
            .service
            .create_record(request(&net.alice, &net.bob, value))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PROPOSAL");
    }

    assert_eq!(net.counters().sessions_opened(), 0);
}

#[tokio::test]
async fn test_unknown_account_rejected() {
    let net = TestNet::build(FlowConfig::default());
    let ghost = AccountInfo::new("Ghost", NodeAddress::new("node-b"));

    let err = net
        .service
        .create_record(request(&net.alice, &ghost, 10))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "ACCOUNT_NOT_FOUND");
    assert!(err.failed_before_network());
}

#[tokio::test]
async fn test_counterparty_rejects_over_ceiling() {
    let net = TestNet::build(FlowConfig::default());

    let err = net
        .service
        .create_record(request(&net.alice, &net.bob, 101))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "SESSION_REJECTED");
    assert_eq!(net.vault_a.count().await, 0);
    assert_eq!(net.vault_b.count().await, 0);
    // Proposal out, rejection back, nothing more.
    assert_eq!(net.counters().messages_sent(), 2);
}

#[tokio::test]
async fn test_notary_unavailable_is_terminal() {
    let net = TestNet::build(FlowConfig::default());
    net.notary.set_available(false);

    let err = net
        .service
        .create_record(request(&net.alice, &net.carol, 10))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "NOTARIZATION_UNAVAILABLE");
    assert_eq!(net.vault_a.count().await, 0);
}

#[tokio::test]
async fn test_remote_notarization_failure_leaves_no_record_anywhere() {
    let net = TestNet::build(FlowConfig::default());
    net.notary.set_available(false);

    let err = net
        .service
        .create_record(request(&net.alice, &net.bob, 60))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "NOTARIZATION_UNAVAILABLE");
    assert_eq!(net.vault_a.count().await, 0);
    assert_eq!(net.vault_b.count().await, 0);
    // Proposal, signature, then a best-effort abort.
    assert_eq!(net.counters().messages_sent(), 3);
}

#[tokio::test]
async fn test_committed_record_signatures_cover_its_keys() {
    let mut net = TestNet::build(FlowConfig::default());

    let first = net
        .service
        .create_record(request(&net.alice, &net.bob, 30))
        .await
        .unwrap();
    net.responder_committed().await;

    // The keys embedded in the record are the keys that signed.
    assert!(first.signatures.contains_key(&first.record.lender));
    assert!(first.signatures.contains_key(&first.record.borrower));

    // A second creation for the same accounts uses fresh keys.
    let second = net
        .service
        .create_record(request(&net.alice, &net.bob, 30))
        .await
        .unwrap();
    assert_ne!(first.record.lender, second.record.lender);
    assert_ne!(first.record.borrower, second.record.borrower);
}

#[tokio::test]
async fn test_local_path_skips_collecting_phase() {
    let net = TestNet::build(FlowConfig::default());

    net.service
        .create_record(request(&net.alice, &net.carol, 10))
        .await
        .unwrap();

    let phases = net.observer.phases_entered();
    assert_eq!(
        phases,
        vec![
            FlowPhase::LocallySigning,
            FlowPhase::Finalizing,
            FlowPhase::Committed
        ]
    );
}

#[tokio::test]
async fn test_remote_path_passes_through_collecting() {
    let net = TestNet::build(FlowConfig::default());

    net.service
        .create_record(request(&net.alice, &net.bob, 10))
        .await
        .unwrap();

    let phases = net.observer.phases_entered();
    assert_eq!(
        phases,
        vec![
            FlowPhase::LocallySigning,
            FlowPhase::Collecting,
            FlowPhase::Finalizing,
            FlowPhase::Committed
        ]
    );
}

#[tokio::test]
async fn test_session_timeout_on_silent_peer() {
    let config = FlowConfig {
        session_timeout: Duration::from_millis(100),
        ..Default::default()
    };
    let net = TestNet::build(config);

    let node_c = NodeAddress::new("node-c");
    net.transport.register(node_c.clone(), Arc::new(SilentAcceptor));
    let dora = net.directory.register("Dora", node_c);

    let err = net
        .service
        .create_record(request(&net.alice, &dora, 10))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "SESSION_TIMEOUT");
    assert_eq!(net.vault_a.count().await, 0);
}
