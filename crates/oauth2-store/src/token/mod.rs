//! Token grant storage.
//!
//! A grant lives in the basic table, keyed by its authorization code or by
//! a generated surrogate id. Access and refresh tokens are index records in
//! their own tables pointing at that id:
//!
//! ```text
//! access token  ──► oauth2_access  { basic_id, expires_at = access expiry  } ─┐
//!                                                                              ├─► oauth2_basic { data, expires_at = refresh expiry }
//! refresh token ──► oauth2_refresh { basic_id, expires_at = refresh expiry } ─┘
//! ```
//!
//! Each record expires on its own; nothing cascades. Revoking a token
//! deletes only its index record.

mod reader;
mod revocation;
mod writer;

use std::sync::Arc;

use async_trait::async_trait;

use oauth2_store_core::{
    DynBackend, StoreResult, SurrogateIdGenerator, TableKind, TokenConfig, TokenGrant,
    UuidV7Generator,
};

use crate::storage::TokenStorage;

/// Token grant store.
#[derive(Clone)]
pub struct TokenStore {
    backend: DynBackend,
    config: TokenConfig,
    ids: Arc<dyn SurrogateIdGenerator>,
}

impl TokenStore {
    /// Creates a token store over existing tables.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidConfig` if a table name is unusable.
    pub fn new(backend: DynBackend, config: TokenConfig) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self {
            backend,
            config,
            ids: Arc::new(UuidV7Generator),
        })
    }

    /// Creates a token store, creating its tables and their expiry indexes
    /// if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a table cannot be
    /// created.
    pub async fn open(backend: DynBackend, config: TokenConfig) -> StoreResult<Self> {
        let store = Self::new(backend, config)?;
        store
            .backend
            .ensure_table(&store.config.basic_table, TableKind::Basic)
            .await?;
        store
            .backend
            .ensure_table(&store.config.access_table, TableKind::Index)
            .await?;
        store
            .backend
            .ensure_table(&store.config.refresh_table, TableKind::Index)
            .await?;
        Ok(store)
    }

    /// Replaces the surrogate id generator.
    #[must_use]
    pub fn with_id_generator(mut self, ids: Arc<dyn SurrogateIdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Returns the store configuration.
    #[must_use]
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Releases the backend.
    pub async fn close(&self) {
        self.backend.close().await;
    }
}

#[async_trait]
impl TokenStorage for TokenStore {
    async fn create(&self, grant: &TokenGrant) -> StoreResult<()> {
        TokenStore::create(self, grant).await
    }

    async fn get_by_code(&self, code: &str) -> StoreResult<Option<TokenGrant>> {
        TokenStore::get_by_code(self, code).await
    }

    async fn get_by_access(&self, access: &str) -> StoreResult<Option<TokenGrant>> {
        TokenStore::get_by_access(self, access).await
    }

    async fn get_by_refresh(&self, refresh: &str) -> StoreResult<Option<TokenGrant>> {
        TokenStore::get_by_refresh(self, refresh).await
    }

    async fn remove_by_code(&self, code: &str) -> StoreResult<()> {
        TokenStore::remove_by_code(self, code).await
    }

    async fn remove_by_access(&self, access: &str) -> StoreResult<()> {
        TokenStore::remove_by_access(self, access).await
    }

    async fn remove_by_refresh(&self, refresh: &str) -> StoreResult<()> {
        TokenStore::remove_by_refresh(self, refresh).await
    }
}
