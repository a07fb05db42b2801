pub mod client;
pub mod grant;
pub mod maintenance;

use std::sync::Arc;

use anyhow::{Context, Result};
use oauth2_store::OAuthStore;
use oauth2_store_postgres::PostgresBackend;
use tracing::debug;

use crate::settings::Settings;

/// Connects to PostgreSQL and builds the stores, creating tables first when
/// `ensure_schema` is set or `bootstrap` is requested.
pub async fn connect(
    settings: &Settings,
    bootstrap: bool,
) -> Result<(PostgresBackend, OAuthStore)> {
    let backend = PostgresBackend::connect(&settings.postgres)
        .await
        .context("failed to connect to PostgreSQL")?;
    let handle = Arc::new(backend.clone());
    debug!(
        ensure_schema = settings.postgres.ensure_schema,
        bootstrap, "Connected to PostgreSQL"
    );

    let store = if bootstrap || settings.postgres.ensure_schema {
        OAuthStore::open(handle, settings.clients.clone(), settings.tokens.clone())
            .await
            .context("failed to prepare tables")?
    } else {
        OAuthStore::new(handle, settings.clients.clone(), settings.tokens.clone())?
    };
    Ok((backend, store))
}
