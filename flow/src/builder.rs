//! Proposal assembly.

use std::sync::Arc;

use tracing::{debug, instrument};

use pactledger_common::{
    validate_proposal, AccountId, AuthorizationCommand, PactLedgerError, Record, Result,
    TransactionProposal,
};
use pactledger_registry::{AccountResolver, KeyCache, ResolvedAccount};

/// A proposal together with the resolved parties it was built from.
#[derive(Debug, Clone)]
pub struct BuiltProposal {
    /// The validated, unsigned proposal.
    pub proposal: TransactionProposal,
    /// Resolved lender (key custodied on the initiating node).
    pub lender: ResolvedAccount,
    /// Resolved borrower (key custodied wherever the account is hosted).
    pub borrower: ResolvedAccount,
}

/// Assembles creation proposals from account identifiers.
///
/// Resolution pins one key per account in the caller's [`KeyCache`], so
/// building the same request twice against one cache yields the same
/// proposal apart from the record ID.
pub struct TransactionBuilder {
    resolver: Arc<AccountResolver>,
    notary_name: String,
}

impl TransactionBuilder {
    /// Create a builder naming the given commitment authority.
    pub fn new(resolver: Arc<AccountResolver>, notary_name: impl Into<String>) -> Self {
        Self {
            resolver,
            notary_name: notary_name.into(),
        }
    }

    /// Build and validate a creation proposal.
    ///
    /// Fails before any key is requested when either account is unknown or
    /// the lender and borrower are the same account.
    #[instrument(skip(self, cache))]
    pub async fn build(
        &self,
        lender: AccountId,
        borrower: AccountId,
        value: i64,
        cache: &KeyCache,
    ) -> Result<BuiltProposal> {
        if lender == borrower {
            return Err(PactLedgerError::invalid_proposal(
                "an account cannot lend to itself",
            ));
        }

        let lender = self.resolver.resolve(lender, cache).await?;
        let borrower = self.resolver.resolve(borrower, cache).await?;

        let record = Record::new(value, lender.key, borrower.key);
        let proposal = TransactionProposal {
            inputs: vec![],
            outputs: vec![record],
            command: AuthorizationCommand::Create {
                required_signers: vec![lender.key, borrower.key],
            },
            notary: self.notary_name.clone(),
        };

        validate_proposal(&proposal)?;

        debug!(
            record_id = %proposal.record_id().unwrap_or_default(),
            lender = %lender.info.display_name,
            borrower = %borrower.info.display_name,
            value,
            "Proposal built"
        );

        Ok(BuiltProposal {
            proposal,
            lender,
            borrower,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactledger_common::NodeAddress;
    use pactledger_registry::{AccountDirectory, InMemoryKeyService, KeyService};

    fn test_builder() -> (TransactionBuilder, Arc<AccountDirectory>) {
        let directory = Arc::new(AccountDirectory::new());
        let keys: Arc<dyn KeyService> = Arc::new(InMemoryKeyService::new());
        let resolver = Arc::new(AccountResolver::new(directory.clone(), keys));
        (TransactionBuilder::new(resolver, "notary-0"), directory)
    }

    #[tokio::test]
    async fn test_builds_valid_proposal() {
        let (builder, directory) = test_builder();
        let alice = directory.register("Alice", NodeAddress::new("node-a"));
        let bob = directory.register("Bob", NodeAddress::new("node-b"));

        let built = builder
            .build(alice.id, bob.id, 42, &KeyCache::new())
            .await
            .unwrap();

        let record = built.proposal.output_record().unwrap();
        assert_eq!(record.value, 42);
        assert_eq!(record.lender, built.lender.key);
        assert_eq!(record.borrower, built.borrower.key);
        assert!(built.proposal.inputs.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_self_dealing() {
        let (builder, directory) = test_builder();
        let alice = directory.register("Alice", NodeAddress::new("node-a"));

        let err = builder
            .build(alice.id, alice.id, 42, &KeyCache::new())
            .await
            .unwrap_err();
        assert!(err.failed_before_network());
    }

    #[tokio::test]
    async fn test_rejects_non_positive_value() {
        let (builder, directory) = test_builder();
        let alice = directory.register("Alice", NodeAddress::new("node-a"));
        let bob = directory.register("Bob", NodeAddress::new("node-b"));

        for value in [0, -5] {
            let err = builder
                .build(alice.id, bob.id, value, &KeyCache::new())
                .await
                .unwrap_err();
            assert_eq!(err.error_code(), "INVALID_PROPOSAL");
        }
    }

    #[tokio::test]
    async fn test_rejects_unknown_account() {
        let (builder, directory) = test_builder();
        let alice = directory.register("Alice", NodeAddress::new("node-a"));

        let err = builder
            .build(alice.id, AccountId::new(), 42, &KeyCache::new())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "ACCOUNT_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_same_cache_pins_keys() {
        let (builder, directory) = test_builder();
        let alice = directory.register("Alice", NodeAddress::new("node-a"));
        let bob = directory.register("Bob", NodeAddress::new("node-b"));

        let cache = KeyCache::new();
        let first = builder.build(alice.id, bob.id, 42, &cache).await.unwrap();
        let second = builder.build(alice.id, bob.id, 42, &cache).await.unwrap();

        assert_eq!(first.lender.key, second.lender.key);
        assert_eq!(first.borrower.key, second.borrower.key);
    }
}
