//! Session channel abstraction.
//!
//! A session is an ordered, reliable, point-to-point exchange between two
//! participants for one proposal. The initiator opens channels through a
//! [`SessionDialer`]; a node answers them through its [`SessionAcceptor`].
//! The in-memory transport backs tests and the demo; a production transport
//! would implement the same traits over the wire.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use pactledger_common::{NodeAddress, PactLedgerError, Result};

use crate::SessionMessage;

/// One endpoint of an open session.
#[async_trait]
pub trait SessionChannel: Send + Sync {
    /// Send a message to the peer.
    async fn send(&self, message: SessionMessage) -> Result<()>;

    /// Receive the next message from the peer. Blocks until one arrives;
    /// callers impose timeouts. Fails when the peer has gone away.
    async fn recv(&self) -> Result<SessionMessage>;
}

/// Opens sessions to remote nodes, addressed by network location.
#[async_trait]
pub trait SessionDialer: Send + Sync {
    /// Open a session to the given peer.
    async fn open(&self, peer: &NodeAddress) -> Result<Box<dyn SessionChannel>>;
}

/// Answers sessions opened by remote initiators.
#[async_trait]
pub trait SessionAcceptor: Send + Sync {
    /// Handle one inbound session. Runs for the session's whole lifetime.
    async fn accept(&self, channel: Box<dyn SessionChannel>);
}

/// Traffic counters for a transport. Tests assert on these to prove the
/// local signing path never touches the network.
#[derive(Debug, Default)]
pub struct TransportCounters {
    /// Sessions opened through the dialer.
    pub sessions_opened: AtomicUsize,
    /// Messages sent across all channels.
    pub messages_sent: AtomicUsize,
}

impl TransportCounters {
    /// Number of sessions opened so far.
    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    /// Number of messages sent so far.
    pub fn messages_sent(&self) -> usize {
        self.messages_sent.load(Ordering::SeqCst)
    }
}

/// In-memory channel endpoint over crossed tokio mpsc queues.
pub struct InMemoryChannel {
    tx: mpsc::Sender<SessionMessage>,
    rx: Mutex<mpsc::Receiver<SessionMessage>>,
    counters: Arc<TransportCounters>,
}

impl InMemoryChannel {
    /// Create a connected pair of endpoints sharing the given counters.
    pub fn pair(counters: Arc<TransportCounters>) -> (Self, Self) {
        let (tx_a, rx_a) = mpsc::channel(8);
        let (tx_b, rx_b) = mpsc::channel(8);

        let a = Self {
            tx: tx_a,
            rx: Mutex::new(rx_b),
            counters: counters.clone(),
        };
        let b = Self {
            tx: tx_b,
            rx: Mutex::new(rx_a),
            counters,
        };
        (a, b)
    }
}

#[async_trait]
impl SessionChannel for InMemoryChannel {
    async fn send(&self, message: SessionMessage) -> Result<()> {
        debug!(
            session_id = %message.session_id(),
            message_type = ?message.message_type(),
            "Sending session message"
        );
        self.counters.messages_sent.fetch_add(1, Ordering::SeqCst);
        self.tx
            .send(message)
            .await
            .map_err(|_| PactLedgerError::NetworkError("session peer gone".to_string()))
    }

    async fn recv(&self) -> Result<SessionMessage> {
        self.rx
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| PactLedgerError::NetworkError("session closed".to_string()))
    }
}

/// In-memory transport connecting registered acceptors by address.
pub struct InMemoryTransport {
    acceptors: DashMap<NodeAddress, Arc<dyn SessionAcceptor>>,
    counters: Arc<TransportCounters>,
}

impl InMemoryTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        Self {
            acceptors: DashMap::new(),
            counters: Arc::new(TransportCounters::default()),
        }
    }

    /// Register a node's acceptor under its address.
    pub fn register(&self, addr: NodeAddress, acceptor: Arc<dyn SessionAcceptor>) {
        self.acceptors.insert(addr, acceptor);
    }

    /// The transport's traffic counters.
    pub fn counters(&self) -> Arc<TransportCounters> {
        self.counters.clone()
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionDialer for InMemoryTransport {
    async fn open(&self, peer: &NodeAddress) -> Result<Box<dyn SessionChannel>> {
        let acceptor = self
            .acceptors
            .get(peer)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                PactLedgerError::NetworkError(format!("no node listening at {}", peer))
            })?;

        self.counters.sessions_opened.fetch_add(1, Ordering::SeqCst);

        let (initiator_end, responder_end) = InMemoryChannel::pair(self.counters.clone());
        tokio::spawn(async move {
            acceptor.accept(Box::new(responder_end)).await;
        });

        Ok(Box::new(initiator_end))
    }
}
