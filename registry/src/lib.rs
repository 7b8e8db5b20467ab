//! PactLedger Identity & Key Resolver
//!
//! Resolves logical account identifiers to their current signing key and
//! hosting node. The directory is a pure lookup; the key service may mint a
//! fresh key on every request, so proposal builds go through a per-proposal
//! cache that pins one key per account.

pub mod directory;
pub mod keys;
pub mod resolver;

pub use directory::AccountDirectory;
pub use keys::{InMemoryKeyService, KeyService};
pub use resolver::{AccountResolver, KeyCache, ResolvedAccount};
