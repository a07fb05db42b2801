//! PostgreSQL transaction for multi-record token issuance.

use async_trait::async_trait;
use sqlx_core::query::query;
use sqlx_postgres::PgTransaction;
use tracing::debug;

use oauth2_store_core::{BasicGrantRecord, IndexRecord, StoreError, StoreResult, StoreTransaction};

use crate::error::{PostgresError, insert_error};
use crate::schema::quoted;

/// PostgreSQL transaction wrapper.
///
/// The underlying sqlx transaction rolls back on drop if it was not
/// committed.
pub struct PostgresTransaction {
    /// `None` once committed or rolled back.
    tx: Option<PgTransaction<'static>>,
}

impl PostgresTransaction {
    pub(crate) fn new(tx: PgTransaction<'static>) -> Self {
        Self { tx: Some(tx) }
    }

    fn active(&mut self) -> StoreResult<&mut PgTransaction<'static>> {
        self.tx.as_mut().ok_or_else(|| {
            StoreError::internal("Transaction already completed (committed or rolled back)")
        })
    }
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    async fn insert_basic(&mut self, table: &str, record: &BasicGrantRecord) -> StoreResult<()> {
        let sql = format!(
            "INSERT INTO {} (id, data, expires_at) VALUES ($1, $2, $3)",
            quoted(table)?
        );
        let tx = self.active()?;
        query(&sql)
            .bind(&record.id)
            .bind(&record.data)
            .bind(record.expires_at)
            .execute(&mut **tx)
            .await
            .map_err(|e| insert_error(e, table, &record.id))?;
        Ok(())
    }

    async fn insert_index(&mut self, table: &str, record: &IndexRecord) -> StoreResult<()> {
        let sql = format!(
            "INSERT INTO {} (id, basic_id, expires_at) VALUES ($1, $2, $3)",
            quoted(table)?
        );
        let tx = self.active()?;
        query(&sql)
            .bind(&record.id)
            .bind(&record.basic_id)
            .bind(record.expires_at)
            .execute(&mut **tx)
            .await
            .map_err(|e| insert_error(e, table, &record.id))?;
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> StoreResult<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await.map_err(PostgresError::from)?;
            debug!("Transaction committed");
        }
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> StoreResult<()> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await.map_err(PostgresError::from)?;
            debug!("Transaction rolled back");
        }
        Ok(())
    }
}

impl Drop for PostgresTransaction {
    fn drop(&mut self) {
        if self.tx.is_some() {
            debug!("PostgresTransaction dropped without commit/rollback - will auto-rollback");
        }
    }
}
