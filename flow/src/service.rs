//! Record service façade.

use std::sync::Arc;

use tracing::{info, instrument};

use pactledger_common::{AccountId, CommittedRecord, RecordId, Result};
use pactledger_vault::RecordStore;

use crate::initiator::InitiatorFlow;

/// A request to create a record between two accounts.
#[derive(Debug, Clone)]
pub struct CreateRecordRequest {
    /// Account lending the value. Must be hosted on this node.
    pub lender: AccountId,
    /// Account borrowing the value. May be hosted anywhere.
    pub borrower: AccountId,
    /// Amount lent. Must be positive.
    pub value: i64,
}

/// The node-facing entry point for record operations.
pub struct RecordService {
    flow: Arc<InitiatorFlow>,
    vault: Arc<dyn RecordStore>,
}

impl RecordService {
    /// Create a new service over a node's flow and vault.
    pub fn new(flow: Arc<InitiatorFlow>, vault: Arc<dyn RecordStore>) -> Self {
        Self { flow, vault }
    }

    /// Create a record, running the full flow to commitment.
    #[instrument(skip(self, request), fields(value = request.value))]
    pub async fn create_record(&self, request: CreateRecordRequest) -> Result<CommittedRecord> {
        info!(
            lender = %request.lender,
            borrower = %request.borrower,
            value = request.value,
            "Record creation requested"
        );
        self.flow
            .run(request.lender, request.borrower, request.value)
            .await
    }

    /// Fetch a committed record from this node's vault.
    pub async fn get_record(&self, id: RecordId) -> Result<CommittedRecord> {
        self.vault.lookup(id).await
    }

    /// List every committed record in this node's vault.
    pub async fn list_records(&self) -> Vec<CommittedRecord> {
        self.vault.list_all().await
    }
}
