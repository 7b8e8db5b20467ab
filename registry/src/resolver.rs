//! Account resolution with per-proposal key pinning.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use pactledger_common::{AccountId, AccountInfo, PartyKey, Result};

use crate::{AccountDirectory, KeyService};

/// The output of resolving an account: its directory entry and the signing
/// key pinned for the current proposal.
#[derive(Debug, Clone)]
pub struct ResolvedAccount {
    /// Directory entry (display name, hosting node).
    pub info: AccountInfo,
    /// Signing key to use for this proposal.
    pub key: PartyKey,
}

/// Per-proposal key cache.
///
/// The key service may mint a fresh key on every request; within one
/// proposal build the first resolved key for an account is pinned and
/// reused, so the key that lands in the record is the key that signs.
pub struct KeyCache {
    pinned: Mutex<HashMap<AccountId, PartyKey>>,
}

impl KeyCache {
    /// Create an empty cache. One cache per proposal build.
    pub fn new() -> Self {
        Self {
            pinned: Mutex::new(HashMap::new()),
        }
    }

    /// Get the pinned key for an account, requesting one on first use.
    pub async fn get_or_request(
        &self,
        account: &AccountInfo,
        keys: &dyn KeyService,
    ) -> Result<PartyKey> {
        if let Some(key) = self.pinned.lock().get(&account.id) {
            return Ok(*key);
        }

        let key = keys.request_key(account).await?;
        // First pin wins if two lookups raced the request.
        Ok(*self.pinned.lock().entry(account.id).or_insert(key))
    }
}

impl Default for KeyCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves account IDs to host and signing key.
pub struct AccountResolver {
    directory: Arc<AccountDirectory>,
    keys: Arc<dyn KeyService>,
}

impl AccountResolver {
    /// Create a new resolver.
    pub fn new(directory: Arc<AccountDirectory>, keys: Arc<dyn KeyService>) -> Self {
        Self { directory, keys }
    }

    /// Resolve an account, pinning its key in the given proposal cache.
    ///
    /// Fails with `AccountNotFound` before any key is requested.
    pub async fn resolve(&self, id: AccountId, cache: &KeyCache) -> Result<ResolvedAccount> {
        let info = self.directory.require(&id)?;
        let key = cache.get_or_request(&info, self.keys.as_ref()).await?;
        Ok(ResolvedAccount { info, key })
    }

    /// The underlying key service.
    pub fn key_service(&self) -> &Arc<dyn KeyService> {
        &self.keys
    }

    /// The underlying directory.
    pub fn directory(&self) -> &Arc<AccountDirectory> {
        &self.directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryKeyService;
    use pactledger_common::NodeAddress;

    fn test_resolver() -> (AccountResolver, AccountInfo) {
        let directory = Arc::new(AccountDirectory::new());
        let account = directory.register("Alice", NodeAddress::new("node-a"));
        let keys: Arc<dyn KeyService> = Arc::new(InMemoryKeyService::new());
        (AccountResolver::new(directory, keys), account)
    }

    #[tokio::test]
    async fn test_key_pinned_within_one_cache() {
        let (resolver, account) = test_resolver();
        let cache = KeyCache::new();

        let first = resolver.resolve(account.id, &cache).await.unwrap();
        let second = resolver.resolve(account.id, &cache).await.unwrap();

        assert_eq!(first.key, second.key);
    }

    #[tokio::test]
    async fn test_fresh_key_across_proposals() {
        let (resolver, account) = test_resolver();

        let first = resolver
            .resolve(account.id, &KeyCache::new())
            .await
            .unwrap();
        let second = resolver
            .resolve(account.id, &KeyCache::new())
            .await
            .unwrap();

        assert_ne!(first.key, second.key);
    }

    #[tokio::test]
    async fn test_unknown_account_fails_before_key_request() {
        let (resolver, _) = test_resolver();
        let err = resolver
            .resolve(AccountId::new(), &KeyCache::new())
            .await
            .unwrap_err();
        assert!(err.failed_before_network());
    }
}
