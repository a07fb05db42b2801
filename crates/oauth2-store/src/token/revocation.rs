use oauth2_store_core::{StoreError, StoreResult, TokenKind, token_prefix};
use tracing::{debug, instrument};

use super::TokenStore;

// Code removal reports a missing record; token revocation does not. Both
// behaviors are relied on by callers.

impl TokenStore {
    /// Deletes the grant stored under an authorization code.
    ///
    /// An expired code that has not been swept yet is deleted as well, but
    /// counts as absent.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no unexpired grant is stored under
    /// the code.
    #[instrument(skip_all, fields(code_prefix = token_prefix(code)))]
    pub async fn remove_by_code(&self, code: &str) -> StoreResult<()> {
        let table = &self.config.basic_table;
        let live = self.backend.find_basic(table, code).await?.is_some();
        let removed = self.backend.delete_by_id(table, code).await?;
        if !live || removed == 0 {
            if removed > 0 {
                debug!("Expired authorization code removed");
            }
            return Err(StoreError::not_found(table, token_prefix(code)));
        }
        debug!("Authorization code removed");
        Ok(())
    }

    /// Revokes an access token. The grant and any refresh token are kept.
    ///
    /// Revoking an unknown, expired or already revoked token succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error only if the delete fails.
    #[instrument(skip_all, fields(access_prefix = token_prefix(access)))]
    pub async fn remove_by_access(&self, access: &str) -> StoreResult<()> {
        self.revoke(TokenKind::Access, access).await
    }

    /// Revokes a refresh token. The grant and any access token are kept.
    ///
    /// Revoking an unknown, expired or already revoked token succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error only if the delete fails.
    #[instrument(skip_all, fields(refresh_prefix = token_prefix(refresh)))]
    pub async fn remove_by_refresh(&self, refresh: &str) -> StoreResult<()> {
        self.revoke(TokenKind::Refresh, refresh).await
    }

    async fn revoke(&self, kind: TokenKind, token: &str) -> StoreResult<()> {
        let removed = self
            .backend
            .delete_by_id(self.index_table(kind), token)
            .await?;
        if removed == 0 {
            debug!(%kind, "Token already absent");
        } else {
            debug!(%kind, "Token revoked");
        }
        Ok(())
    }
}
