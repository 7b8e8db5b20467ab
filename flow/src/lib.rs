//! PactLedger Initiator Flow
//!
//! Drives record creation from the lender's node: build and validate the
//! proposal, sign with locally-custodied keys, collect the counterparty's
//! signature over one session when needed, notarize, then persist and
//! distribute the committed record.

pub mod builder;
pub mod config;
pub mod initiator;
pub mod observer;
pub mod service;

pub use builder::{BuiltProposal, TransactionBuilder};
pub use config::FlowConfig;
pub use initiator::InitiatorFlow;
pub use observer::{FlowObserver, RecordingObserver, TracingObserver};
pub use service::{CreateRecordRequest, RecordService};
