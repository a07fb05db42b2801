//! Storage traits consumed by an authorization server.
//!
//! [`ClientStore`](crate::ClientStore) and [`TokenStore`](crate::TokenStore)
//! implement these; servers that want to swap in another implementation
//! (or a test double) depend on the traits instead.

use async_trait::async_trait;

use oauth2_store_core::{ClientRecord, StoreResult, TokenGrant};

/// Storage trait for registered OAuth clients.
#[async_trait]
pub trait ClientStorage: Send + Sync {
    /// Registers a client.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateKey` if the client id is already taken.
    async fn set(&self, client: &ClientRecord) -> StoreResult<()>;

    /// Looks up a client by id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no client has this id.
    async fn get_by_id(&self, id: &str) -> StoreResult<ClientRecord>;

    /// Removes a client.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no client has this id.
    async fn remove_by_id(&self, id: &str) -> StoreResult<()>;
}

/// Storage trait for issued token grants.
///
/// Lookups return `Ok(None)` when the code or token is unknown, expired or
/// revoked, and when the grant behind a token no longer exists.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    /// Persists a new issuance.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidGrant` for a grant with neither code nor
    /// access token, `StoreError::TransactionAborted` if the token records
    /// could not be written together.
    async fn create(&self, grant: &TokenGrant) -> StoreResult<()>;

    /// Finds the grant issued with an authorization code.
    async fn get_by_code(&self, code: &str) -> StoreResult<Option<TokenGrant>>;

    /// Finds the grant behind an access token.
    async fn get_by_access(&self, access: &str) -> StoreResult<Option<TokenGrant>>;

    /// Finds the grant behind a refresh token.
    async fn get_by_refresh(&self, refresh: &str) -> StoreResult<Option<TokenGrant>>;

    /// Deletes an authorization code grant.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no grant is stored under the code.
    async fn remove_by_code(&self, code: &str) -> StoreResult<()>;

    /// Revokes an access token. Revoking an unknown token succeeds.
    async fn remove_by_access(&self, access: &str) -> StoreResult<()>;

    /// Revokes a refresh token. Revoking an unknown token succeeds.
    async fn remove_by_refresh(&self, refresh: &str) -> StoreResult<()>;
}
