//! Durable record storage.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::info;

use pactledger_common::{CommittedRecord, PactLedgerError, RecordId, Result};

/// Durable store of committed records, keyed by record ID.
///
/// `lookup` and `list_all` are the read paths the façade consumes; the
/// protocol only ever writes terminal, notarized records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a committed record.
    async fn store(&self, record: CommittedRecord) -> Result<()>;

    /// Fetch a record by ID.
    async fn lookup(&self, id: RecordId) -> Result<CommittedRecord>;

    /// List every stored record.
    async fn list_all(&self) -> Vec<CommittedRecord>;

    /// Number of stored records.
    async fn count(&self) -> usize;
}

/// In-memory vault implementation.
pub struct InMemoryVault {
    records: DashMap<RecordId, CommittedRecord>,
}

impl InMemoryVault {
    /// Create an empty vault.
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }
}

impl Default for InMemoryVault {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryVault {
    async fn store(&self, record: CommittedRecord) -> Result<()> {
        let id = record.id();
        if let Some(existing) = self.records.get(&id) {
            // Committed records are immutable; a re-store must be the same
            // finality push arriving twice.
            if *existing != record {
                return Err(PactLedgerError::InternalError(format!(
                    "conflicting committed record for {}",
                    id
                )));
            }
            return Ok(());
        }

        info!(record_id = %id, value = record.record.value, "Committed record stored");
        self.records.insert(id, record);
        Ok(())
    }

    async fn lookup(&self, id: RecordId) -> Result<CommittedRecord> {
        self.records
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or(PactLedgerError::RecordNotFound(id))
    }

    async fn list_all(&self) -> Vec<CommittedRecord> {
        self.records.iter().map(|entry| entry.clone()).collect()
    }

    async fn count(&self) -> usize {
        self.records.len()
    }
}
