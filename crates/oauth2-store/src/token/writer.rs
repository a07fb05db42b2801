use oauth2_store_core::{
    BasicGrantRecord, IndexRecord, Issuance, IssuedToken, StoreError, StoreResult, TokenExpiry,
    TokenGrant, run_in_transaction, token_prefix,
};
use tracing::{debug, instrument, warn};

use super::TokenStore;

impl TokenStore {
    /// Persists a new issuance.
    ///
    /// A grant carrying an authorization code is stored as one basic record
    /// keyed by the code. Otherwise the grant is stored under a fresh
    /// surrogate id together with an access index record and, if issued, a
    /// refresh index record, all in one transaction. The access record never
    /// outlives the refresh record.
    ///
    /// # Errors
    ///
    /// - `InvalidGrant` if the grant has neither code nor access token.
    /// - `DuplicateKey` if the code is already stored.
    /// - `TransactionAborted` if the token records could not be written
    ///   together; nothing from the issuance is visible and the call may be
    ///   retried.
    /// - `StorageUnavailable` if the engine could not be reached.
    #[instrument(skip(self, grant), fields(client_id = %grant.client_id))]
    pub async fn create(&self, grant: &TokenGrant) -> StoreResult<()> {
        let issuance = grant.issuance()?;
        let data = grant.to_bytes()?;

        match issuance {
            Issuance::Code(code) => self.create_code(code, data).await,
            Issuance::Tokens { access, refresh } => {
                self.create_tokens(access, refresh, data).await
            }
        }
    }

    async fn create_code(&self, code: &IssuedToken, data: Vec<u8>) -> StoreResult<()> {
        let record = BasicGrantRecord {
            id: code.value.clone(),
            data,
            expires_at: code.expires_at()?,
        };
        self.backend
            .insert_basic(&self.config.basic_table, &record)
            .await?;

        debug!(
            code_prefix = token_prefix(&code.value),
            expires_at = %record.expires_at,
            "Stored authorization code grant"
        );
        Ok(())
    }

    async fn create_tokens(
        &self,
        access: &IssuedToken,
        refresh: Option<&IssuedToken>,
        data: Vec<u8>,
    ) -> StoreResult<()> {
        let expiry = TokenExpiry::compute(access, refresh)?;
        let basic_id = self.ids.next_id();

        let basic = BasicGrantRecord {
            id: basic_id.clone(),
            data,
            expires_at: expiry.refresh,
        };
        let access_index = IndexRecord {
            id: access.value.clone(),
            basic_id: basic_id.clone(),
            expires_at: expiry.access,
        };
        let refresh_index = refresh.map(|refresh| IndexRecord {
            id: refresh.value.clone(),
            basic_id: basic_id.clone(),
            expires_at: expiry.refresh,
        });

        let basic_table = self.config.basic_table.clone();
        let access_table = self.config.access_table.clone();
        let refresh_table = self.config.refresh_table.clone();

        run_in_transaction(self.backend.as_ref(), move |tx| {
            Box::pin(async move {
                tx.insert_basic(&basic_table, &basic).await?;
                tx.insert_index(&access_table, &access_index).await?;
                if let Some(refresh_index) = &refresh_index {
                    tx.insert_index(&refresh_table, refresh_index).await?;
                }
                Ok(())
            })
        })
        .await
        .map_err(|err| {
            warn!(basic_id = %basic_id, error = %err, "Token issuance rolled back");
            if err.is_unavailable() {
                err
            } else {
                StoreError::transaction_aborted(format!("token issuance rolled back: {err}"))
            }
        })?;

        debug!(
            basic_id = %basic_id,
            access_prefix = token_prefix(&access.value),
            has_refresh = refresh.is_some(),
            access_expires_at = %expiry.access,
            refresh_expires_at = %expiry.refresh,
            "Stored token grant"
        );
        Ok(())
    }
}
