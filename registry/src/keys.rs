//! Key service: fresh account keys and custodial signing.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use pactledger_common::{AccountInfo, PactLedgerError, PartyKey, PartySignature, Result};
use pactledger_crypto::SigningKey;

/// Requests signing keys bound to accounts and signs with custodied keys.
///
/// `request_key` is a sub-protocol: each call may legitimately return a
/// fresh, one-time key for the same account. Callers that need a stable key
/// across one proposal build must go through [`crate::KeyCache`].
#[async_trait]
pub trait KeyService: Send + Sync {
    /// Request a signing key bound to the given account.
    async fn request_key(&self, account: &AccountInfo) -> Result<PartyKey>;

    /// Sign a message with a custodied key.
    async fn sign(&self, key: &PartyKey, message: &[u8]) -> Result<PartySignature>;

    /// Check whether the private half of a key is custodied here.
    fn holds(&self, key: &PartyKey) -> bool;
}

/// Key service holding every generated key in memory.
///
/// Stands in for the network-wide key-request sub-protocol (HSM and
/// key-distribution internals are out of scope): one instance is shared by
/// all nodes of a simulated network.
pub struct InMemoryKeyService {
    keys: DashMap<PartyKey, Arc<SigningKey>>,
}

impl InMemoryKeyService {
    /// Create an empty key service.
    pub fn new() -> Self {
        Self {
            keys: DashMap::new(),
        }
    }

    /// Number of keys minted so far.
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }
}

impl Default for InMemoryKeyService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyService for InMemoryKeyService {
    async fn request_key(&self, account: &AccountInfo) -> Result<PartyKey> {
        let signing_key = SigningKey::generate();
        let party_key = signing_key.party_key();
        self.keys.insert(party_key, Arc::new(signing_key));

        debug!(
            account_id = %account.id,
            key_id = %party_key.key_id(),
            "Fresh key issued for account"
        );
        Ok(party_key)
    }

    async fn sign(&self, key: &PartyKey, message: &[u8]) -> Result<PartySignature> {
        let signing_key = self
            .keys
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                PactLedgerError::InternalError(format!("signing key {} not custodied", key))
            })?;

        Ok(signing_key.sign(message))
    }

    fn holds(&self, key: &PartyKey) -> bool {
        self.keys.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactledger_common::NodeAddress;
    use pactledger_crypto::signing::verify_party_signature;

    #[tokio::test]
    async fn test_fresh_key_per_request() {
        let service = InMemoryKeyService::new();
        let account = AccountInfo::new("Alice", NodeAddress::new("node-a"));

        let first = service.request_key(&account).await.unwrap();
        let second = service.request_key(&account).await.unwrap();

        assert_ne!(first, second);
        assert!(service.holds(&first));
        assert!(service.holds(&second));
    }

    #[tokio::test]
    async fn test_sign_with_requested_key() {
        let service = InMemoryKeyService::new();
        let account = AccountInfo::new("Alice", NodeAddress::new("node-a"));
        let key = service.request_key(&account).await.unwrap();

        let signature = service.sign(&key, b"digest").await.unwrap();
        assert!(verify_party_signature(&key, b"digest", &signature.bytes).is_ok());
    }

    #[tokio::test]
    async fn test_sign_unknown_key_fails() {
        let service = InMemoryKeyService::new();
        let stranger = PartyKey::from_bytes([9; 32]);
        assert!(service.sign(&stranger, b"digest").await.is_err());
    }
}
