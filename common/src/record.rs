//! Record and account types.

use crate::{AccountId, NodeAddress, PartyKey, RecordId};
use serde::{Deserialize, Serialize};

/// The business fact being agreed upon: a value transfer between a lender
/// and a borrower account.
///
/// Immutable once created. The two party keys are the only participant
/// references a record carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Transferred value. Must be strictly positive.
    pub value: i64,
    /// Key of the lending party.
    pub lender: PartyKey,
    /// Key of the borrowing party.
    pub borrower: PartyKey,
    /// Globally unique identifier, assigned at creation.
    pub id: RecordId,
}

impl Record {
    /// Create a new record with a fresh ID.
    pub fn new(value: i64, lender: PartyKey, borrower: PartyKey) -> Self {
        Self {
            value,
            lender,
            borrower,
            id: RecordId::new(),
        }
    }

    /// The keys of the involved parties, lender first.
    pub fn participants(&self) -> [PartyKey; 2] {
        [self.lender, self.borrower]
    }
}

/// A long-lived logical account, created once by the account-creation
/// protocol and registered in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Logical identifier.
    pub id: AccountId,
    /// Human-readable name.
    pub display_name: String,
    /// Node that hosts (custodies) this account.
    pub host: NodeAddress,
}

impl AccountInfo {
    /// Create a new account info.
    pub fn new(display_name: impl Into<String>, host: NodeAddress) -> Self {
        Self {
            id: AccountId::new(),
            display_name: display_name.into(),
            host,
        }
    }

    /// Check whether the account is hosted at the given address.
    pub fn is_hosted_at(&self, addr: &NodeAddress) -> bool {
        &self.host == addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_participants() {
        let lender = PartyKey::from_bytes([1; 32]);
        let borrower = PartyKey::from_bytes([2; 32]);
        let record = Record::new(50, lender, borrower);

        assert_eq!(record.participants(), [lender, borrower]);
    }

    #[test]
    fn test_record_ids_unique() {
        let key = PartyKey::from_bytes([1; 32]);
        let other = PartyKey::from_bytes([2; 32]);
        let a = Record::new(10, key, other);
        let b = Record::new(10, key, other);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_account_hosting() {
        let account = AccountInfo::new("Alice", NodeAddress::new("node-a"));
        assert!(account.is_hosted_at(&NodeAddress::new("node-a")));
        assert!(!account.is_hosted_at(&NodeAddress::new("node-b")));
    }
}
