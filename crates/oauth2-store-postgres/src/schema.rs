//! DDL for the store tables.
//!
//! Table names come from validated configuration and are always quoted.

use oauth2_store_core::{StoreResult, TableKind, validate_table_name};

/// Quotes a validated table name for use in SQL.
pub(crate) fn quoted(table: &str) -> StoreResult<String> {
    validate_table_name(table)?;
    Ok(format!("\"{table}\""))
}

/// Statements that create `table` and its expiry index, if missing.
pub(crate) fn create_statements(table: &str, kind: TableKind) -> StoreResult<Vec<String>> {
    let name = quoted(table)?;
    let mut statements = vec![match kind {
        TableKind::Clients => format!(
            r#"
            CREATE TABLE IF NOT EXISTS {name} (
                id TEXT PRIMARY KEY,
                secret TEXT NOT NULL,
                domain TEXT NOT NULL,
                user_id TEXT NOT NULL
            )
            "#
        ),
        TableKind::Basic => format!(
            r#"
            CREATE TABLE IF NOT EXISTS {name} (
                id TEXT PRIMARY KEY,
                data BYTEA NOT NULL,
                expires_at TIMESTAMPTZ NOT NULL
            )
            "#
        ),
        TableKind::Index => format!(
            r#"
            CREATE TABLE IF NOT EXISTS {name} (
                id TEXT PRIMARY KEY,
                basic_id TEXT NOT NULL,
                expires_at TIMESTAMPTZ NOT NULL
            )
            "#
        ),
    }];

    if kind.expires() {
        statements.push(format!(
            "CREATE INDEX IF NOT EXISTS \"{table}_expires_at_idx\" ON {name} (expires_at)"
        ));
    }
    Ok(statements)
}
