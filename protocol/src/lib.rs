//! PactLedger Protocol Messages
//!
//! Message types exchanged over a counterparty session, and the session
//! channel abstraction the initiator and responder communicate through.

pub mod messages;
pub mod session;

pub use messages::*;
pub use session::*;
