//! PostgreSQL implementation of [`StoreBackend`].

use std::sync::Arc;

use async_trait::async_trait;
use sqlx_core::error::Error as SqlxError;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_postgres::PgPool;
use time::OffsetDateTime;
use tracing::{debug, info, instrument};

use oauth2_store_core::{
    BasicGrantRecord, ClientRecord, IndexRecord, StoreBackend, StoreError, StoreResult,
    StoreTransaction, TableKind, token_prefix,
};

use crate::config::PostgresConfig;
use crate::error::{PostgresError, insert_error};
use crate::schema::{create_statements, quoted};
use crate::transaction::PostgresTransaction;

/// PostgreSQL storage backend.
///
/// Reads only return records whose `expires_at` lies in the future. Expired
/// rows stay on disk until [`sweep_expired`](Self::sweep_expired) deletes
/// them, usually from an [`ExpirySweeper`](crate::ExpirySweeper).
#[derive(Clone)]
pub struct PostgresBackend {
    pool: Arc<PgPool>,
}

impl PostgresBackend {
    /// Wraps an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Opens a pool configured by `config`.
    ///
    /// The pool keeps at least one connection, so an unreachable server is
    /// reported here rather than on first use.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the server cannot be reached, or
    /// `InvalidConfig` if the pool settings or URL are unusable.
    #[instrument(skip(config), fields(url = %config.redacted_url()))]
    pub async fn connect(config: &PostgresConfig) -> StoreResult<Self> {
        let options = config.pool_options()?;
        let pool = options.connect(&config.url).await.map_err(|e| match e {
            SqlxError::Configuration(_) => StoreError::invalid_config(e.to_string()),
            _ => StoreError::unavailable(format!(
                "cannot reach PostgreSQL at {}: {e}",
                config.redacted_url()
            )),
        })?;

        info!(pool_size = config.pool_size, "PostgreSQL pool ready");
        Ok(Self::new(pool))
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Deletes expired records from `tables`, returning how many were
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns an error if a delete fails. Tables swept before the failure
    /// stay swept.
    #[instrument(skip(self))]
    pub async fn sweep_expired(&self, tables: &[&str]) -> StoreResult<u64> {
        let mut removed = 0u64;
        for &table in tables {
            let sql = format!("DELETE FROM {} WHERE expires_at <= NOW()", quoted(table)?);
            let swept = query(&sql)
                .execute(&*self.pool)
                .await
                .map_err(PostgresError::from)?
                .rows_affected();
            if swept > 0 {
                debug!(table = %table, count = swept, "Swept expired records");
            }
            removed += swept;
        }

        if removed > 0 {
            info!(count = removed, "Purged expired records");
        }
        Ok(removed)
    }
}

#[async_trait]
impl StoreBackend for PostgresBackend {
    #[instrument(skip(self))]
    async fn ensure_table(&self, table: &str, kind: TableKind) -> StoreResult<()> {
        for statement in create_statements(table, kind)? {
            query(&statement)
                .execute(&*self.pool)
                .await
                .map_err(PostgresError::from)?;
        }
        debug!(table = %table, ?kind, "Table ready");
        Ok(())
    }

    #[instrument(skip(self, client), fields(client_id = %client.id))]
    async fn insert_client(&self, table: &str, client: &ClientRecord) -> StoreResult<()> {
        let sql = format!(
            "INSERT INTO {} (id, secret, domain, user_id) VALUES ($1, $2, $3, $4)",
            quoted(table)?
        );
        query(&sql)
            .bind(&client.id)
            .bind(&client.secret)
            .bind(&client.domain)
            .bind(&client.user_id)
            .execute(&*self.pool)
            .await
            .map_err(|e| insert_error(e, table, &client.id))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_client(&self, table: &str, id: &str) -> StoreResult<Option<ClientRecord>> {
        let sql = format!(
            "SELECT id, secret, domain, user_id FROM {} WHERE id = $1",
            quoted(table)?
        );
        let row: Option<(String, String, String, String)> = query_as(&sql)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(PostgresError::from)?;

        Ok(row.map(|(id, secret, domain, user_id)| ClientRecord {
            id,
            secret,
            domain,
            user_id,
        }))
    }

    #[instrument(skip(self, record), fields(id_prefix = token_prefix(&record.id)))]
    async fn insert_basic(&self, table: &str, record: &BasicGrantRecord) -> StoreResult<()> {
        let sql = format!(
            "INSERT INTO {} (id, data, expires_at) VALUES ($1, $2, $3)",
            quoted(table)?
        );
        query(&sql)
            .bind(&record.id)
            .bind(&record.data)
            .bind(record.expires_at)
            .execute(&*self.pool)
            .await
            .map_err(|e| insert_error(e, table, &record.id))?;
        Ok(())
    }

    #[instrument(skip(self, id), fields(id_prefix = token_prefix(id)))]
    async fn find_basic(&self, table: &str, id: &str) -> StoreResult<Option<BasicGrantRecord>> {
        let sql = format!(
            "SELECT id, data, expires_at FROM {} WHERE id = $1 AND expires_at > NOW()",
            quoted(table)?
        );
        let row: Option<(String, Vec<u8>, OffsetDateTime)> = query_as(&sql)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(PostgresError::from)?;

        Ok(row.map(|(id, data, expires_at)| BasicGrantRecord {
            id,
            data,
            expires_at,
        }))
    }

    #[instrument(skip(self, token), fields(prefix = token_prefix(token)))]
    async fn find_index(&self, table: &str, token: &str) -> StoreResult<Option<IndexRecord>> {
        let sql = format!(
            "SELECT id, basic_id, expires_at FROM {} WHERE id = $1 AND expires_at > NOW()",
            quoted(table)?
        );
        let row: Option<(String, String, OffsetDateTime)> = query_as(&sql)
            .bind(token)
            .fetch_optional(&*self.pool)
            .await
            .map_err(PostgresError::from)?;

        Ok(row.map(|(id, basic_id, expires_at)| IndexRecord {
            id,
            basic_id,
            expires_at,
        }))
    }

    #[instrument(skip(self, id), fields(id_prefix = token_prefix(id)))]
    async fn delete_by_id(&self, table: &str, id: &str) -> StoreResult<u64> {
        let sql = format!("DELETE FROM {} WHERE id = $1", quoted(table)?);
        let removed = query(&sql)
            .bind(id)
            .execute(&*self.pool)
            .await
            .map_err(PostgresError::from)?
            .rows_affected();
        Ok(removed)
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await.map_err(PostgresError::from)?;
        Ok(Box::new(PostgresTransaction::new(tx)))
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL pool closed");
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
