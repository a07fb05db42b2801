//! Storage engine traits.
//!
//! A [`StoreBackend`] is the shared handle to the external store. The client
//! and token stores hold one behind an `Arc` and issue typed single-record
//! operations against named tables. Multi-record writes go through a
//! [`StoreTransaction`], normally via [`run_in_transaction`].
//!
//! Backends own expiry: a read must never return a record whose
//! `expires_at` has passed, and reclaiming such records is the engine's job.

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use tracing::warn;

use crate::types::{BasicGrantRecord, ClientRecord, IndexRecord, TableKind};
use crate::StoreResult;

/// The storage engine behind the client and token stores.
///
/// Implementations must be thread-safe; any number of callers may use one
/// handle concurrently.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    // ==================== Schema ====================

    /// Creates `table` if it does not exist. For expiring kinds this also
    /// declares the expiry index the engine sweeps by.
    ///
    /// # Errors
    ///
    /// Returns an error for infrastructure issues or an unusable table name.
    async fn ensure_table(&self, table: &str, kind: TableKind) -> StoreResult<()>;

    // ==================== Clients ====================

    /// Inserts a client record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateKey` if the id is taken.
    async fn insert_client(&self, table: &str, client: &ClientRecord) -> StoreResult<()>;

    /// Reads a client record by id.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing records.
    async fn find_client(&self, table: &str, id: &str) -> StoreResult<Option<ClientRecord>>;

    // ==================== Grants ====================

    /// Inserts a basic grant record outside any transaction.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateKey` if the id is taken.
    async fn insert_basic(&self, table: &str, record: &BasicGrantRecord) -> StoreResult<()>;

    /// Reads an unexpired basic grant record by id.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing records.
    async fn find_basic(&self, table: &str, id: &str) -> StoreResult<Option<BasicGrantRecord>>;

    /// Reads an unexpired index record by token string.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing records.
    async fn find_index(&self, table: &str, token: &str) -> StoreResult<Option<IndexRecord>>;

    // ==================== Deletes ====================

    /// Deletes the record with primary key `id`, returning how many records
    /// were removed (0 or 1).
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues.
    async fn delete_by_id(&self, table: &str, id: &str) -> StoreResult<u64>;

    // ==================== Transactions ====================

    /// Begins a new transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if a transaction cannot be started.
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>>;

    // ==================== Lifecycle ====================

    /// Releases the engine connection. Further calls fail.
    async fn close(&self);

    /// Returns the name of this backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}

/// An all-or-nothing group of inserts.
///
/// Staged inserts are invisible to every other reader until `commit`.
/// Dropping a transaction without committing rolls it back.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Stages a basic grant record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateKey` if the id is taken.
    async fn insert_basic(&mut self, table: &str, record: &BasicGrantRecord) -> StoreResult<()>;

    /// Stages an index record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateKey` if the token string is taken.
    async fn insert_index(&mut self, table: &str, record: &IndexRecord) -> StoreResult<()>;

    /// Makes every staged insert visible at once.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails; nothing staged is visible then.
    async fn commit(self: Box<Self>) -> StoreResult<()>;

    /// Discards every staged insert.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine reports a rollback failure.
    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}

/// Runs `op` inside a transaction: commits when it returns `Ok`, rolls back
/// when it returns `Err`.
///
/// The closure receives the open transaction and must return a boxed future,
/// so the records it writes are moved in:
///
/// ```ignore
/// run_in_transaction(backend.as_ref(), move |tx| {
///     Box::pin(async move {
///         tx.insert_basic("oauth2_basic", &basic).await?;
///         tx.insert_index("oauth2_access", &access).await
///     })
/// })
/// .await?;
/// ```
///
/// # Errors
///
/// Returns the error of `begin`, of `op`, or of `commit`. A failed rollback
/// is logged and the error from `op` is returned.
pub async fn run_in_transaction<T, F>(backend: &dyn StoreBackend, op: F) -> StoreResult<T>
where
    T: Send,
    F: for<'t> FnOnce(&'t mut Box<dyn StoreTransaction>) -> BoxFuture<'t, StoreResult<T>>
        + Send,
{
    let mut tx = backend.begin().await?;

    match op(&mut tx).await {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(
                    backend = backend.backend_name(),
                    error = %rollback_err,
                    "Transaction rollback failed"
                );
            }
            Err(err)
        }
    }
}
