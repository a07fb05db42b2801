//! Background deletion of expired records.
//!
//! Reads already hide expired records; the sweeper only reclaims space. It
//! sweeps the grant tables named by a [`TokenConfig`], whether or not they
//! were created through this process.
//!
//! # Example
//!
//! ```ignore
//! let sweeper = ExpirySweeper::start(backend.clone(), &tokens, config.sweep_interval);
//! // ...
//! sweeper.shutdown().await;
//! ```

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, warn};

use oauth2_store_core::{StoreResult, TokenConfig};

use crate::storage::PostgresBackend;

/// Handle to a running expiry sweep task.
pub struct ExpirySweeper {
    backend: PostgresBackend,
    tables: Vec<String>,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ExpirySweeper {
    /// Starts sweeping the grant tables of `tokens` every `period`.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn start(backend: PostgresBackend, tokens: &TokenConfig, period: Duration) -> Self {
        let tables: Vec<String> = tokens
            .expiring_tables()
            .iter()
            .map(ToString::to_string)
            .collect();
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let task_backend = backend.clone();
        let task_tables = tables.clone();
        let period = period.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            info!(interval = ?period, tables = ?task_tables, "Expiry sweeper started");

            let targets: Vec<&str> = task_tables.iter().map(String::as_str).collect();
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = task_backend.sweep_expired(&targets).await {
                            error!(error = %e, "Expiry sweep failed");
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!("Expiry sweeper shutting down");
                            break;
                        }
                    }
                }
            }
        });

        Self {
            backend,
            tables,
            shutdown_tx,
            handle,
        }
    }

    /// Tables visited on every sweep.
    #[must_use]
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    /// Runs one sweep immediately, outside the schedule.
    ///
    /// # Errors
    ///
    /// Returns an error if a delete fails.
    pub async fn sweep_once(&self) -> StoreResult<u64> {
        let targets: Vec<&str> = self.tables.iter().map(String::as_str).collect();
        self.backend.sweep_expired(&targets).await
    }

    /// Stops the task and waits for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            warn!(error = %e, "Expiry sweeper task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use oauth2_store::OAuthStore;
    use oauth2_store_core::ClientConfig;
    use sqlx_postgres::PgPoolOptions;

    #[tokio::test]
    async fn test_sweeper_targets_grant_tables_without_bootstrap() {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://oauth@127.0.0.1:1/oauth2")
            .unwrap();
        let backend = PostgresBackend::new(pool);
        let tokens = TokenConfig::default().with_refresh_table("refresh_tokens");

        // No tables are created or registered on this path.
        let _store = OAuthStore::new(
            Arc::new(backend.clone()),
            ClientConfig::default(),
            tokens.clone(),
        )
        .unwrap();

        let sweeper = ExpirySweeper::start(backend, &tokens, Duration::from_secs(3600));
        assert_eq!(sweeper.tables(), ["oauth2_basic", "oauth2_access", "refresh_tokens"]);

        // The sweep reaches the database even though nothing was bootstrapped.
        let err = sweeper.sweep_once().await.unwrap_err();
        assert!(err.is_unavailable());

        sweeper.shutdown().await;
    }
}
