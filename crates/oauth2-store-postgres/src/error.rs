//! Error types for the PostgreSQL storage backend.

use oauth2_store_core::StoreError;
use sqlx_core::error::Error as SqlxError;

/// PostgreSQL error code for unique constraint violations (23505).
pub const PG_UNIQUE_VIOLATION: &str = "23505";

/// Checks if a sqlx error has a specific PostgreSQL error code.
pub fn has_pg_error_code(err: &SqlxError, code: &str) -> bool {
    if let SqlxError::Database(db_err) = err {
        db_err.code().as_deref() == Some(code)
    } else {
        false
    }
}

/// Checks if a sqlx error is a unique constraint violation (23505).
pub fn is_unique_violation(err: &SqlxError) -> bool {
    has_pg_error_code(err, PG_UNIQUE_VIOLATION)
}

/// Errors specific to the PostgreSQL storage backend.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Error reported by sqlx.
    #[error("Database error: {0}")]
    Sqlx(#[from] SqlxError),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl PostgresError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<PostgresError> for StoreError {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::Sqlx(e) => classify(e),
            PostgresError::Config { message } => StoreError::invalid_config(message),
        }
    }
}

/// Maps a sqlx error onto the store taxonomy.
fn classify(err: SqlxError) -> StoreError {
    match err {
        SqlxError::Io(_)
        | SqlxError::Tls(_)
        | SqlxError::PoolTimedOut
        | SqlxError::PoolClosed
        | SqlxError::WorkerCrashed => StoreError::unavailable(err.to_string()),
        SqlxError::ColumnDecode { .. } | SqlxError::Decode(_) | SqlxError::ColumnNotFound(_) => {
            StoreError::decode(err.to_string())
        }
        SqlxError::Configuration(_) => StoreError::invalid_config(err.to_string()),
        other => StoreError::internal(other.to_string()),
    }
}

/// Maps an insert failure, reporting key collisions as `DuplicateKey`.
pub(crate) fn insert_error(err: SqlxError, table: &str, id: &str) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::duplicate_key(table, id)
    } else {
        PostgresError::from(err).into()
    }
}

/// Result type alias for PostgreSQL operations.
pub type Result<T> = std::result::Result<T, PostgresError>;
