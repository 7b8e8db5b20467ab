//! PactLedger Vault
//!
//! Durable storage for committed records and the commitment authority
//! (notary) interface. Each participant holds its own vault; the notary is
//! the single point of serialized truth for conflicting proposals.

pub mod notary;
pub mod store;

pub use notary::{verify_commitment, LocalNotary, Notary};
pub use store::{InMemoryVault, RecordStore};
