use oauth2_store_core::{StoreResult, TokenGrant, TokenKind, token_prefix};
use tracing::{debug, instrument};

use super::TokenStore;

impl TokenStore {
    /// Finds the grant issued with an authorization code.
    ///
    /// Returns `Ok(None)` once the code has expired or been removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the stored grant cannot be
    /// decoded.
    #[instrument(skip_all, fields(code_prefix = token_prefix(code)))]
    pub async fn get_by_code(&self, code: &str) -> StoreResult<Option<TokenGrant>> {
        self.load_grant(code).await
    }

    /// Finds the grant behind an access token.
    ///
    /// Returns `Ok(None)` once the access token has expired or been revoked,
    /// even while its refresh token still resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if a read fails or the stored grant cannot be
    /// decoded.
    #[instrument(skip_all, fields(access_prefix = token_prefix(access)))]
    pub async fn get_by_access(&self, access: &str) -> StoreResult<Option<TokenGrant>> {
        self.resolve(TokenKind::Access, access).await
    }

    /// Finds the grant behind a refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if a read fails or the stored grant cannot be
    /// decoded.
    #[instrument(skip_all, fields(refresh_prefix = token_prefix(refresh)))]
    pub async fn get_by_refresh(&self, refresh: &str) -> StoreResult<Option<TokenGrant>> {
        self.resolve(TokenKind::Refresh, refresh).await
    }

    /// Follows an index record to its grant.
    async fn resolve(&self, kind: TokenKind, token: &str) -> StoreResult<Option<TokenGrant>> {
        let table = self.index_table(kind);
        let Some(index) = self.backend.find_index(table, token).await? else {
            debug!(%kind, "Token not found");
            return Ok(None);
        };

        let grant = self.load_grant(&index.basic_id).await?;
        if grant.is_none() {
            debug!(%kind, basic_id = %index.basic_id, "Grant no longer exists");
        }
        Ok(grant)
    }

    async fn load_grant(&self, basic_id: &str) -> StoreResult<Option<TokenGrant>> {
        self.backend
            .find_basic(&self.config.basic_table, basic_id)
            .await?
            .map(|record| TokenGrant::from_bytes(&record.data))
            .transpose()
    }

    pub(super) fn index_table(&self, kind: TokenKind) -> &str {
        match kind {
            TokenKind::Access => &self.config.access_table,
            TokenKind::Refresh => &self.config.refresh_table,
            TokenKind::Code => &self.config.basic_table,
        }
    }
}
