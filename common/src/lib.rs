//! PactLedger Common Types
//!
//! This crate contains shared types used across the PactLedger protocol,
//! including identifiers, the record/proposal data model, the flow state
//! machines, and the structural validation rules both sides apply.

pub mod identifiers;
pub mod record;
pub mod proposal;
pub mod phase;
pub mod validate;
pub mod error;
pub mod time;

pub use identifiers::*;
pub use record::*;
pub use proposal::*;
pub use phase::*;
pub use validate::*;
pub use error::*;
pub use time::*;
