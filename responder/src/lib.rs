//! PactLedger Responder
//!
//! The state machine run on the responding side of a counterparty session:
//! receive a proposal, re-verify it under this node's own rules and policy,
//! sign or reject, then await and durably record the finalized transaction.

pub mod config;
pub mod handler;
pub mod responder;

pub use config::ResponderConfig;
pub use handler::{CommitHandler, LoggingCommitHandler};
pub use responder::ResponderNode;
