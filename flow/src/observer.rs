//! Flow lifecycle observation.

use parking_lot::Mutex;

use pactledger_common::{FlowPhase, RecordId};

/// Observes phase transitions of an initiating flow.
pub trait FlowObserver: Send + Sync {
    /// Called after the flow moves to a new phase.
    fn on_transition(&self, record_id: RecordId, from: FlowPhase, to: FlowPhase);
}

/// Default observer that emits a log line per transition.
pub struct TracingObserver;

impl FlowObserver for TracingObserver {
    fn on_transition(&self, record_id: RecordId, from: FlowPhase, to: FlowPhase) {
        tracing::info!(
            record_id = %record_id,
            from = ?from,
            to = ?to,
            "Flow phase transition"
        );
    }
}

/// Observer that records the transition sequence. Used by tests asserting
/// the phase order of the local and remote paths.
#[derive(Default)]
pub struct RecordingObserver {
    transitions: Mutex<Vec<(FlowPhase, FlowPhase)>>,
}

impl RecordingObserver {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// The phases entered so far, in order.
    pub fn phases_entered(&self) -> Vec<FlowPhase> {
        self.transitions.lock().iter().map(|(_, to)| *to).collect()
    }
}

impl FlowObserver for RecordingObserver {
    fn on_transition(&self, _record_id: RecordId, from: FlowPhase, to: FlowPhase) {
        self.transitions.lock().push((from, to));
    }
}
