//! Table-name configuration for the client and token stores.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::{StoreError, StoreResult};

/// Plain SQL identifier, at most 63 bytes (the PostgreSQL limit).
static TABLE_NAME_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("Invalid table name regex")
});

/// Checks that a table name can be used unquoted by every backend.
///
/// # Errors
///
/// Returns `InvalidConfig` if the name is not a plain identifier.
pub fn validate_table_name(name: &str) -> StoreResult<()> {
    if TABLE_NAME_REGEX.is_match(name) {
        Ok(())
    } else {
        Err(StoreError::invalid_config(format!(
            "invalid table name '{name}': expected [A-Za-z_][A-Za-z0-9_]*, at most 63 characters"
        )))
    }
}

/// Client store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Table holding client credentials.
    pub clients_table: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            clients_table: "oauth2_clients".into(),
        }
    }
}

impl ClientConfig {
    /// Sets the clients table name.
    #[must_use]
    pub fn with_clients_table(mut self, name: impl Into<String>) -> Self {
        self.clients_table = name.into();
        self
    }

    /// Validates the table name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the name is not a plain identifier.
    pub fn validate(&self) -> StoreResult<()> {
        validate_table_name(&self.clients_table)
    }
}

/// Token store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Table holding serialized grants.
    pub basic_table: String,
    /// Access token index table.
    pub access_table: String,
    /// Refresh token index table.
    pub refresh_table: String,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            basic_table: "oauth2_basic".into(),
            access_table: "oauth2_access".into(),
            refresh_table: "oauth2_refresh".into(),
        }
    }
}

impl TokenConfig {
    /// Sets the basic grant table name.
    #[must_use]
    pub fn with_basic_table(mut self, name: impl Into<String>) -> Self {
        self.basic_table = name.into();
        self
    }

    /// Sets the access index table name.
    #[must_use]
    pub fn with_access_table(mut self, name: impl Into<String>) -> Self {
        self.access_table = name.into();
        self
    }

    /// Sets the refresh index table name.
    #[must_use]
    pub fn with_refresh_table(mut self, name: impl Into<String>) -> Self {
        self.refresh_table = name.into();
        self
    }

    /// The three grant tables, all of which expire.
    #[must_use]
    pub fn expiring_tables(&self) -> [&str; 3] {
        [&self.basic_table, &self.access_table, &self.refresh_table]
    }

    /// Validates the table names. All three must be distinct.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on a malformed or duplicated name.
    pub fn validate(&self) -> StoreResult<()> {
        validate_table_name(&self.basic_table)?;
        validate_table_name(&self.access_table)?;
        validate_table_name(&self.refresh_table)?;

        if self.basic_table == self.access_table
            || self.basic_table == self.refresh_table
            || self.access_table == self.refresh_table
        {
            return Err(StoreError::invalid_config(
                "basic, access and refresh tables must be distinct",
            ));
        }
        Ok(())
    }
}
