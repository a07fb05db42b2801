use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use oauth2_store_core::{
    BasicGrantRecord, ClientRecord, IndexRecord, StoreBackend, StoreError, StoreResult,
    StoreTransaction, TableKind, token_prefix,
};

use crate::fault::FaultPlan;
use crate::transaction::MemoryTransaction;

/// A stored record of any table kind.
#[derive(Debug, Clone)]
pub(crate) enum Row {
    Client(ClientRecord),
    Basic(BasicGrantRecord),
    Index(IndexRecord),
}

impl Row {
    pub(crate) fn id(&self) -> &str {
        match self {
            Self::Client(c) => &c.id,
            Self::Basic(b) => &b.id,
            Self::Index(i) => &i.id,
        }
    }

    fn is_live(&self, now: OffsetDateTime) -> bool {
        match self {
            Self::Client(_) => true,
            Self::Basic(b) => b.expires_at > now,
            Self::Index(i) => i.expires_at > now,
        }
    }
}

/// All tables, guarded together so a commit is applied atomically.
#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub(crate) data: HashMap<String, HashMap<String, Row>>,
    pub(crate) closed: bool,
}

impl Tables {
    pub(crate) fn ensure_open(&self) -> StoreResult<()> {
        if self.closed {
            Err(StoreError::unavailable("in-memory backend is closed"))
        } else {
            Ok(())
        }
    }

    pub(crate) fn contains(&self, table: &str, id: &str) -> bool {
        self.data
            .get(table)
            .is_some_and(|rows| rows.contains_key(id))
    }

    pub(crate) fn insert(&mut self, table: &str, row: Row) -> StoreResult<()> {
        let rows = self.data.entry(table.to_string()).or_default();
        if rows.contains_key(row.id()) {
            return Err(StoreError::duplicate_key(table, row.id()));
        }
        rows.insert(row.id().to_string(), row);
        Ok(())
    }

    fn live(&self, table: &str, id: &str) -> Option<&Row> {
        let now = OffsetDateTime::now_utc();
        self.data
            .get(table)
            .and_then(|rows| rows.get(id))
            .filter(|row| row.is_live(now))
    }
}

/// In-memory backend with TTL-style expiry.
///
/// This storage implementation provides:
/// - Expiry-aware reads (expired records are never returned)
/// - An explicit sweep via [`purge_expired`](Self::purge_expired)
/// - Staged transactions applied under a single write lock
/// - Fault injection through [`faults`](Self::faults)
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Arc<RwLock<Tables>>,
    faults: Arc<FaultPlan>,
}

impl InMemoryBackend {
    /// Creates a new, empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the fault plan used by this backend and its transactions.
    #[must_use]
    pub fn faults(&self) -> &FaultPlan {
        &self.faults
    }

    /// Number of records in `table`, including expired ones not yet swept.
    pub async fn len(&self, table: &str) -> usize {
        self.state
            .read()
            .await
            .data
            .get(table)
            .map_or(0, HashMap::len)
    }

    /// Returns `true` if `table` holds no records at all.
    pub async fn is_empty(&self, table: &str) -> bool {
        self.len(table).await == 0
    }

    /// Returns `true` if a record with `id` exists in `table`, expired or not.
    pub async fn contains(&self, table: &str, id: &str) -> bool {
        self.state.read().await.contains(table, id)
    }

    /// Overrides the expiry of a stored record. Returns `false` if the record
    /// does not exist or does not expire.
    pub async fn set_expiry(&self, table: &str, id: &str, expires_at: OffsetDateTime) -> bool {
        let mut state = self.state.write().await;
        match state.data.get_mut(table).and_then(|rows| rows.get_mut(id)) {
            Some(Row::Basic(b)) => {
                b.expires_at = expires_at;
                true
            }
            Some(Row::Index(i)) => {
                i.expires_at = expires_at;
                true
            }
            _ => false,
        }
    }

    /// Removes every expired record from every table, returning how many
    /// were removed.
    #[instrument(skip(self))]
    pub async fn purge_expired(&self) -> u64 {
        let now = OffsetDateTime::now_utc();
        let mut state = self.state.write().await;
        let mut removed = 0u64;

        for (table, rows) in &mut state.data {
            let before = rows.len();
            rows.retain(|_, row| row.is_live(now));
            let swept = (before - rows.len()) as u64;
            if swept > 0 {
                debug!(table = %table, count = swept, "Swept expired records");
            }
            removed += swept;
        }

        if removed > 0 {
            info!(count = removed, "Purged expired records");
        }
        removed
    }

    fn check_insert_fault(&self, table: &str) -> StoreResult<()> {
        if self.faults.insert_fails(table) {
            return Err(StoreError::unavailable(format!(
                "injected insert failure for table {table}"
            )));
        }
        Ok(())
    }

    async fn insert_row(&self, table: &str, row: Row) -> StoreResult<()> {
        self.check_insert_fault(table)?;
        let mut state = self.state.write().await;
        state.ensure_open()?;
        state.insert(table, row)
    }
}

#[async_trait]
impl StoreBackend for InMemoryBackend {
    async fn ensure_table(&self, table: &str, kind: TableKind) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.ensure_open()?;
        state.data.entry(table.to_string()).or_default();
        debug!(table = %table, ?kind, "Table ready");
        Ok(())
    }

    #[instrument(skip(self, client), fields(client_id = %client.id))]
    async fn insert_client(&self, table: &str, client: &ClientRecord) -> StoreResult<()> {
        self.insert_row(table, Row::Client(client.clone())).await
    }

    #[instrument(skip(self))]
    async fn find_client(&self, table: &str, id: &str) -> StoreResult<Option<ClientRecord>> {
        let state = self.state.read().await;
        state.ensure_open()?;
        match state.live(table, id) {
            Some(Row::Client(c)) => Ok(Some(c.clone())),
            Some(_) => Err(StoreError::decode(format!(
                "record {table}/{id} is not a client record"
            ))),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, record), fields(id_prefix = token_prefix(&record.id)))]
    async fn insert_basic(&self, table: &str, record: &BasicGrantRecord) -> StoreResult<()> {
        self.insert_row(table, Row::Basic(record.clone())).await
    }

    #[instrument(skip(self, id), fields(id_prefix = token_prefix(id)))]
    async fn find_basic(&self, table: &str, id: &str) -> StoreResult<Option<BasicGrantRecord>> {
        let state = self.state.read().await;
        state.ensure_open()?;
        match state.live(table, id) {
            Some(Row::Basic(b)) => Ok(Some(b.clone())),
            Some(_) => Err(StoreError::decode(format!(
                "record {table}/{} is not a basic grant record",
                token_prefix(id)
            ))),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, token), fields(prefix = token_prefix(token)))]
    async fn find_index(&self, table: &str, token: &str) -> StoreResult<Option<IndexRecord>> {
        let state = self.state.read().await;
        state.ensure_open()?;
        match state.live(table, token) {
            Some(Row::Index(i)) => Ok(Some(i.clone())),
            Some(_) => Err(StoreError::decode(format!(
                "record in {table} is not an index record"
            ))),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, id), fields(id_prefix = token_prefix(id)))]
    async fn delete_by_id(&self, table: &str, id: &str) -> StoreResult<u64> {
        let mut state = self.state.write().await;
        state.ensure_open()?;
        let removed = state
            .data
            .get_mut(table)
            .and_then(|rows| rows.remove(id))
            .is_some();
        Ok(u64::from(removed))
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        self.state.read().await.ensure_open()?;
        Ok(Box::new(MemoryTransaction::new(
            Arc::clone(&self.state),
            Arc::clone(&self.faults),
        )))
    }

    async fn close(&self) {
        self.state.write().await.closed = true;
        debug!("In-memory backend closed");
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
