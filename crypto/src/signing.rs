//! Digital signature support using Ed25519.

use ed25519_dalek::{
    Signer, SigningKey as Ed25519SigningKey, Verifier, VerifyingKey as Ed25519VerifyingKey,
};
use rand::rngs::OsRng;

use pactledger_common::{PartyKey, PartySignature};

use crate::{CryptoError, Result};

/// A signing key (private key) for creating party signatures.
pub struct SigningKey {
    inner: Ed25519SigningKey,
}

impl SigningKey {
    /// Generate a new random signing key.
    pub fn generate() -> Self {
        let mut csprng = OsRng;
        Self {
            inner: Ed25519SigningKey::generate(&mut csprng),
        }
    }

    /// Create from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKey("Invalid key length".to_string()))?;

        Ok(Self {
            inner: Ed25519SigningKey::from_bytes(&bytes),
        })
    }

    /// The public half as a party key.
    pub fn party_key(&self) -> PartyKey {
        PartyKey::from_bytes(self.inner.verifying_key().to_bytes())
    }

    /// Get the corresponding verifying key.
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey {
            inner: self.inner.verifying_key(),
        }
    }

    /// Sign a message, producing a party signature.
    pub fn sign(&self, message: &[u8]) -> PartySignature {
        let sig = self.inner.sign(message);
        PartySignature {
            key: self.party_key(),
            bytes: sig.to_bytes().to_vec(),
        }
    }

    /// Get raw key bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }
}

/// A verifying key (public key) for verifying party signatures.
#[derive(Clone)]
pub struct VerifyingKey {
    inner: Ed25519VerifyingKey,
}

impl VerifyingKey {
    /// Create from a party key.
    pub fn from_party_key(key: &PartyKey) -> Result<Self> {
        let inner = Ed25519VerifyingKey::from_bytes(key.as_bytes())
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(Self { inner })
    }

    /// The key as a party key.
    pub fn party_key(&self) -> PartyKey {
        PartyKey::from_bytes(self.inner.to_bytes())
    }

    /// Verify raw signature bytes over a message.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        let sig_bytes: [u8; 64] = signature
            .try_into()
            .map_err(|_| CryptoError::InvalidSignature)?;

        let sig = ed25519_dalek::Signature::from_bytes(&sig_bytes);

        self.inner
            .verify(message, &sig)
            .map_err(|_| CryptoError::InvalidSignature)
    }
}

/// Verify a signature attributed to a party key over a message.
pub fn verify_party_signature(key: &PartyKey, message: &[u8], signature: &[u8]) -> Result<()> {
    VerifyingKey::from_party_key(key)?.verify(message, signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify() {
        let signing_key = SigningKey::generate();

        let message = b"pactledger transaction digest";
        let signature = signing_key.sign(message);

        assert_eq!(signature.key, signing_key.party_key());
        assert!(
            verify_party_signature(&signature.key, message, &signature.bytes).is_ok()
        );
    }

    #[test]
    fn test_corrupted_signature_rejected() {
        let signing_key = SigningKey::generate();

        let message = b"pactledger transaction digest";
        let mut signature = signing_key.sign(message);
        signature.bytes[0] ^= 0xff;

        assert!(
            verify_party_signature(&signature.key, message, &signature.bytes).is_err()
        );
    }

    #[test]
    fn test_wrong_key_rejected() {
        let signer = SigningKey::generate();
        let other = SigningKey::generate();

        let message = b"pactledger transaction digest";
        let signature = signer.sign(message);

        assert!(
            verify_party_signature(&other.party_key(), message, &signature.bytes).is_err()
        );
    }

    #[test]
    fn test_key_round_trip() {
        let signing_key = SigningKey::generate();
        let bytes = signing_key.to_bytes();

        let restored = SigningKey::from_bytes(&bytes).unwrap();
        assert_eq!(signing_key.party_key(), restored.party_key());
    }
}
