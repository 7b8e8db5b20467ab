//! PactLedger Demo Binary
//!
//! Wires two in-memory nodes and runs one local and one remote record
//! creation end to end.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pactledger_common::NodeAddress;
use pactledger_crypto::SigningKey;
use pactledger_flow::{
    CreateRecordRequest, FlowConfig, InitiatorFlow, RecordService, TracingObserver,
};
use pactledger_protocol::{InMemoryTransport, SessionDialer};
use pactledger_registry::{AccountDirectory, AccountResolver, InMemoryKeyService, KeyService};
use pactledger_responder::{LoggingCommitHandler, ResponderConfig, ResponderNode};
use pactledger_vault::{InMemoryVault, LocalNotary, Notary, RecordStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting PactLedger demo");

    let config = FlowConfig::from_env();
    if let Err(e) = config.validate() {
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    // Network-wide collaborators: directory, key service, transport, notary.
    let directory = Arc::new(AccountDirectory::new());
    let keys: Arc<dyn KeyService> = Arc::new(InMemoryKeyService::new());
    let transport = Arc::new(InMemoryTransport::new());
    let notary: Arc<dyn Notary> = Arc::new(LocalNotary::new(config.notary_name.clone()));

    let node_a = NodeAddress::new("node-a");
    let node_b = NodeAddress::new("node-b");

    // Node B answers sessions and keeps its own vault.
    let vault_b: Arc<dyn RecordStore> = Arc::new(InMemoryVault::new());
    let responder_b = Arc::new(ResponderNode::new(
        ResponderConfig::from_env(),
        node_b.clone(),
        keys.clone(),
        vault_b.clone(),
        Arc::new(LoggingCommitHandler),
    ));
    transport.register(node_b.clone(), responder_b);

    // Node A initiates.
    let vault_a: Arc<dyn RecordStore> = Arc::new(InMemoryVault::new());
    let resolver = Arc::new(AccountResolver::new(directory.clone(), keys));
    let dialer: Arc<dyn SessionDialer> = transport.clone();
    let flow = Arc::new(InitiatorFlow::new(
        config,
        node_a.clone(),
        SigningKey::generate(),
        resolver,
        dialer,
        notary,
        vault_a.clone(),
        Arc::new(TracingObserver),
    ));
    let service = RecordService::new(flow, vault_a.clone());

    let alice = directory.register("Alice", node_a.clone());
    let carol = directory.register("Carol", node_a);
    let bob = directory.register("Bob", node_b);

    let local = service
        .create_record(CreateRecordRequest {
            lender: alice.id,
            borrower: carol.id,
            value: 25,
        })
        .await?;
    info!(record_id = %local.id(), "Local record committed");

    let remote = service
        .create_record(CreateRecordRequest {
            lender: alice.id,
            borrower: bob.id,
            value: 60,
        })
        .await?;
    info!(record_id = %remote.id(), "Remote record committed");

    // The finality push is handled on the responder's task; give it a beat
    // before reading node B's vault.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    info!(
        vault_a = vault_a.count().await,
        vault_b = vault_b.count().await,
        sessions = transport.counters().sessions_opened(),
        messages = transport.counters().messages_sent(),
        "Demo complete"
    );

    Ok(())
}
