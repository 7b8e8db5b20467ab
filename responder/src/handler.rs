//! Committed-record notification seam.

use async_trait::async_trait;

use pactledger_common::CommittedRecord;

/// Called after a finalized record has been verified and persisted on the
/// responding side.
#[async_trait]
pub trait CommitHandler: Send + Sync {
    /// Handle a newly committed record.
    async fn on_committed(&self, record: &CommittedRecord);
}

/// Default handler that logs committed records.
pub struct LoggingCommitHandler;

#[async_trait]
impl CommitHandler for LoggingCommitHandler {
    async fn on_committed(&self, record: &CommittedRecord) {
        tracing::info!(
            record_id = %record.id(),
            value = record.record.value,
            "Committed record received"
        );
    }
}
