//! Persistent OAuth 2.0 client and token stores.
//!
//! Provides the storage an authorization server needs to survive restarts
//! and run as several instances:
//!
//! - [`ClientStore`] - registered client credentials
//! - [`TokenStore`] - issued grants, reachable by authorization code,
//!   access token or refresh token
//!
//! A grant is stored once. Access and refresh tokens are separate index
//! records pointing at it, each with its own expiry, so an access token
//! stops resolving before its refresh token does. The access index, the
//! refresh index and the grant become visible in one transaction.
//!
//! Both stores work over any [`StoreBackend`](oauth2_store_core::StoreBackend).
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use oauth2_store::{OAuthStore, ClientConfig, TokenConfig};
//! use oauth2_store_postgres::{PostgresBackend, PostgresConfig};
//!
//! let backend = PostgresBackend::connect(&PostgresConfig::new("postgres://localhost/oauth")).await?;
//! let store = OAuthStore::open(Arc::new(backend), ClientConfig::default(), TokenConfig::default()).await?;
//!
//! store.tokens().create(&grant).await?;
//! let grant = store.tokens().get_by_access(&access_token).await?;
//!
//! store.close().await;
//! ```

pub mod client;
pub mod storage;
pub mod token;

use oauth2_store_core::DynBackend;
use tracing::info;

pub use client::ClientStore;
pub use storage::{ClientStorage, TokenStorage};
pub use token::TokenStore;

pub use oauth2_store_core::{
    BasicGrantRecord, ClientConfig, ClientRecord, ErrorCategory, IndexRecord, Issuance,
    IssuedToken, StoreBackend, StoreError, StoreResult, StoreTransaction, TokenConfig,
    TokenExpiry, TokenGrant, TokenKind,
};

/// Client and token stores sharing one backend handle.
///
/// Owns the handle's lifetime: [`close`](Self::close) releases it once for
/// both stores.
pub struct OAuthStore {
    backend: DynBackend,
    clients: ClientStore,
    tokens: TokenStore,
}

impl OAuthStore {
    /// Validates both configurations without touching the backend.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidConfig` if a table name is unusable.
    pub fn new(
        backend: DynBackend,
        client_config: ClientConfig,
        token_config: TokenConfig,
    ) -> StoreResult<Self> {
        Ok(Self {
            clients: ClientStore::new(backend.clone(), client_config)?,
            tokens: TokenStore::new(backend.clone(), token_config)?,
            backend,
        })
    }

    /// Validates both configurations and makes sure every table exists.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration is invalid or a table cannot be
    /// created.
    pub async fn open(
        backend: DynBackend,
        client_config: ClientConfig,
        token_config: TokenConfig,
    ) -> StoreResult<Self> {
        let clients = ClientStore::open(backend.clone(), client_config).await?;
        let tokens = TokenStore::open(backend.clone(), token_config).await?;
        info!(backend = backend.backend_name(), "OAuth store opened");
        Ok(Self {
            backend,
            clients,
            tokens,
        })
    }

    /// Client credential store.
    #[must_use]
    pub fn clients(&self) -> &ClientStore {
        &self.clients
    }

    /// Token grant store.
    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Releases the backend.
    pub async fn close(self) {
        self.backend.close().await;
        info!(backend = self.backend.backend_name(), "OAuth store closed");
    }
}
