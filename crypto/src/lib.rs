//! PactLedger Cryptographic Primitives
//!
//! Provides Ed25519 signing/verification and transaction digests.

pub mod hash;
pub mod signing;

pub use hash::{sha256, transaction_digest};
pub use signing::{SigningKey, VerifyingKey};

/// Errors from cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
