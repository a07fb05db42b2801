//! OAuth client storage.
//!
//! Plain keyed CRUD over client credential records. Client records never
//! expire; the engine's per-record atomicity is the only coordination.

use async_trait::async_trait;
use tracing::{debug, instrument};

use oauth2_store_core::{
    ClientConfig, ClientRecord, DynBackend, StoreError, StoreResult, TableKind,
};

use crate::storage::ClientStorage;

/// Client credential store.
#[derive(Clone)]
pub struct ClientStore {
    backend: DynBackend,
    config: ClientConfig,
}

impl ClientStore {
    /// Creates a client store over an existing table.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidConfig` if the table name is unusable.
    pub fn new(backend: DynBackend, config: ClientConfig) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self { backend, config })
    }

    /// Creates a client store, creating its table if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the table cannot
    /// be created.
    pub async fn open(backend: DynBackend, config: ClientConfig) -> StoreResult<Self> {
        let store = Self::new(backend, config)?;
        store
            .backend
            .ensure_table(&store.config.clients_table, TableKind::Clients)
            .await?;
        Ok(store)
    }

    /// Returns the store configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Registers a client.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateKey` if the client id is already taken.
    #[instrument(skip(self, client), fields(client_id = %client.id))]
    pub async fn set(&self, client: &ClientRecord) -> StoreResult<()> {
        self.backend
            .insert_client(&self.config.clients_table, client)
            .await?;
        debug!("Client registered");
        Ok(())
    }

    /// Looks up a client by id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no client has this id.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: &str) -> StoreResult<ClientRecord> {
        self.backend
            .find_client(&self.config.clients_table, id)
            .await?
            .ok_or_else(|| StoreError::not_found(&self.config.clients_table, id))
    }

    /// Removes a client.
    ///
    /// Unlike token revocation this is not idempotent: removing an unknown
    /// client is reported.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no client has this id.
    #[instrument(skip(self))]
    pub async fn remove_by_id(&self, id: &str) -> StoreResult<()> {
        let removed = self
            .backend
            .delete_by_id(&self.config.clients_table, id)
            .await?;
        if removed == 0 {
            return Err(StoreError::not_found(&self.config.clients_table, id));
        }
        debug!("Client removed");
        Ok(())
    }

    /// Releases the backend.
    pub async fn close(&self) {
        self.backend.close().await;
    }
}

#[async_trait]
impl ClientStorage for ClientStore {
    async fn set(&self, client: &ClientRecord) -> StoreResult<()> {
        ClientStore::set(self, client).await
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<ClientRecord> {
        ClientStore::get_by_id(self, id).await
    }

    async fn remove_by_id(&self, id: &str) -> StoreResult<()> {
        ClientStore::remove_by_id(self, id).await
    }
}
