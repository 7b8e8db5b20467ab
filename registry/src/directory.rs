//! Account directory.

use dashmap::DashMap;
use tracing::info;

use pactledger_common::{AccountId, AccountInfo, NodeAddress, PactLedgerError, Result};

/// Directory of known accounts, keyed by logical identifier.
///
/// Read-only from the protocol's perspective: entries are created once by
/// the account-creation path and then only queried, concurrently.
pub struct AccountDirectory {
    accounts: DashMap<AccountId, AccountInfo>,
}

impl AccountDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Register a newly created account and return its info.
    pub fn register(&self, display_name: impl Into<String>, host: NodeAddress) -> AccountInfo {
        let info = AccountInfo::new(display_name, host);
        info!(
            account_id = %info.id,
            display_name = %info.display_name,
            host = %info.host,
            "Account registered"
        );
        self.accounts.insert(info.id, info.clone());
        info
    }

    /// Insert an account created elsewhere (e.g. replicated directory state).
    pub fn insert(&self, info: AccountInfo) {
        self.accounts.insert(info.id, info);
    }

    /// Look up an account.
    pub fn get(&self, id: &AccountId) -> Option<AccountInfo> {
        self.accounts.get(id).map(|entry| entry.clone())
    }

    /// Look up an account, failing if unknown.
    pub fn require(&self, id: &AccountId) -> Result<AccountInfo> {
        self.get(id).ok_or(PactLedgerError::AccountNotFound(*id))
    }

    /// Number of registered accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Check if the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl Default for AccountDirectory {
    fn default() -> Self {
        Self::new()
    }
}
