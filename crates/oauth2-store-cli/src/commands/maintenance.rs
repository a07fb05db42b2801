use anyhow::{Context, Result};
use oauth2_store_postgres::{ExpirySweeper, PostgresBackend};
use tracing::info;

use crate::output::print_success;
use crate::settings::Settings;

pub fn init(settings: &Settings) {
    let tokens = &settings.tokens;
    print_success(&format!(
        "Tables ready: {}, {}, {}, {}",
        settings.clients.clients_table,
        tokens.basic_table,
        tokens.access_table,
        tokens.refresh_table
    ));
}

pub async fn sweep(backend: &PostgresBackend, settings: &Settings) -> Result<()> {
    let removed = backend.sweep_expired(&settings.tokens.expiring_tables()).await?;
    print_success(&format!("Removed {removed} expired records"));
    Ok(())
}

/// Sweeps every `postgres.sweep_interval` until Ctrl-C.
pub async fn watch(backend: &PostgresBackend, settings: &Settings) -> Result<()> {
    let sweeper = ExpirySweeper::start(
        backend.clone(),
        &settings.tokens,
        settings.postgres.sweep_interval,
    );
    print_success(&format!(
        "Sweeping {} every {:?}, Ctrl-C to stop",
        sweeper.tables().join(", "),
        settings.postgres.sweep_interval
    ));

    let signal = tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C");
    info!("Stopping expiry sweeper");
    sweeper.shutdown().await;
    signal
}
