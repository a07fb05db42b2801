//! Staged transactions for the in-memory backend.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use oauth2_store_core::{BasicGrantRecord, IndexRecord, StoreError, StoreResult, StoreTransaction};

use crate::fault::FaultPlan;
use crate::storage::{Row, Tables};

/// In-memory transaction.
///
/// Inserts are buffered and checked for key collisions as they are staged,
/// then applied together under the backend's write lock on commit. Nothing
/// is visible to readers before that, and a failed commit applies nothing.
pub struct MemoryTransaction {
    state: Arc<RwLock<Tables>>,
    faults: Arc<FaultPlan>,
    /// `None` once committed or rolled back.
    staged: Option<Vec<(String, Row)>>,
}

impl MemoryTransaction {
    pub(crate) fn new(state: Arc<RwLock<Tables>>, faults: Arc<FaultPlan>) -> Self {
        Self {
            state,
            faults,
            staged: Some(Vec::new()),
        }
    }

    async fn stage(&mut self, table: &str, row: Row) -> StoreResult<()> {
        if self.faults.insert_fails(table) {
            return Err(StoreError::unavailable(format!(
                "injected insert failure for table {table}"
            )));
        }

        let staged = self.staged.as_mut().ok_or_else(|| {
            StoreError::internal("Transaction already completed (committed or rolled back)")
        })?;

        let staged_dup = staged.iter().any(|(t, r)| t == table && r.id() == row.id());
        let committed_dup = {
            let state = self.state.read().await;
            state.ensure_open()?;
            state.contains(table, row.id())
        };
        if staged_dup || committed_dup {
            return Err(StoreError::duplicate_key(table, row.id()));
        }

        staged.push((table.to_string(), row));
        Ok(())
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn insert_basic(&mut self, table: &str, record: &BasicGrantRecord) -> StoreResult<()> {
        self.stage(table, Row::Basic(record.clone())).await
    }

    async fn insert_index(&mut self, table: &str, record: &IndexRecord) -> StoreResult<()> {
        self.stage(table, Row::Index(record.clone())).await
    }

    async fn commit(mut self: Box<Self>) -> StoreResult<()> {
        let staged = self.staged.take().unwrap_or_default();

        if self.faults.commit_fails() {
            return Err(StoreError::internal("injected commit failure"));
        }

        let mut state = self.state.write().await;
        state.ensure_open()?;

        // Another transaction may have committed the same key since staging.
        if let Some((table, row)) = staged.iter().find(|(t, r)| state.contains(t, r.id())) {
            return Err(StoreError::duplicate_key(table.as_str(), row.id()));
        }

        let count = staged.len();
        for (table, row) in staged {
            state.insert(&table, row)?;
        }
        debug!(count, "Transaction committed");
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> StoreResult<()> {
        if let Some(staged) = self.staged.take() {
            debug!(count = staged.len(), "Transaction rolled back");
        }
        Ok(())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if let Some(staged) = &self.staged
            && !staged.is_empty()
        {
            debug!(
                count = staged.len(),
                "MemoryTransaction dropped without commit/rollback - discarding staged writes"
            );
        }
    }
}
