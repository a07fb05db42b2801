//! Settings loading: optional TOML file overlaid with environment variables.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use config::{Config, Environment, File};
use serde::Deserialize;

use oauth2_store::{ClientConfig, TokenConfig};
use oauth2_store_postgres::PostgresConfig;

/// Default settings file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "oauth2-store.toml";

/// Environment variable prefix, e.g. `OAUTH2_STORE__POSTGRES__URL`.
pub const ENV_PREFIX: &str = "OAUTH2_STORE";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log_level: String,
    pub postgres: PostgresConfig,
    pub clients: ClientConfig,
    pub tokens: TokenConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            postgres: PostgresConfig::default(),
            clients: ClientConfig::default(),
            tokens: TokenConfig::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.clients.validate().context("invalid [clients] settings")?;
        self.tokens.validate().context("invalid [tokens] settings")?;

        let clients_table = &self.clients.clients_table;
        if [
            &self.tokens.basic_table,
            &self.tokens.access_table,
            &self.tokens.refresh_table,
        ]
        .contains(&clients_table)
        {
            bail!("clients table '{clients_table}' is also used as a token table");
        }
        if self.postgres.url.trim().is_empty() {
            bail!("postgres.url must not be empty");
        }
        Ok(())
    }
}

/// Loads settings from `path` (or [`DEFAULT_CONFIG_FILE`] if present), then
/// applies `OAUTH2_STORE__*` overrides and validates the result.
///
/// An explicit `path` that does not exist is an error; a missing default
/// file is not.
pub fn load_settings(path: Option<&str>) -> Result<Settings> {
    let mut builder = Config::builder();
    match path {
        Some(p) => {
            let pathbuf = PathBuf::from(p);
            if !pathbuf.exists() {
                bail!("config file not found: {p}");
            }
            builder = builder.add_source(File::from(pathbuf));
        }
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                builder = builder.add_source(File::from(default_path));
            }
        }
    }
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .separator("__"),
    );

    let settings: Settings = builder
        .build()
        .context("config build error")?
        .try_deserialize()
        .context("config deserialize error")?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_are_valid() {
        Settings::default().validate().unwrap();
    }

    #[test]
    fn test_load_from_file() {
        let file = write_temp(
            r#"
log_level = "debug"

[postgres]
url = "postgres://oauth:secret@db/oauth2"
pool_size = 4
sweep_interval = "5m"

[tokens]
access_table = "access_tokens"
"#,
        );

        let settings = load_settings(file.path().to_str()).unwrap();

        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.postgres.url, "postgres://oauth:secret@db/oauth2");
        assert_eq!(settings.postgres.pool_size, 4);
        assert_eq!(settings.postgres.sweep_interval, Duration::from_secs(300));
        assert_eq!(settings.tokens.access_table, "access_tokens");
        assert_eq!(settings.tokens.basic_table, "oauth2_basic");
        assert_eq!(settings.clients.clients_table, "oauth2_clients");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        assert!(load_settings(Some("/nonexistent/oauth2-store.toml")).is_err());
    }

    #[test]
    fn test_table_collision_rejected() {
        let mut settings = Settings::default();
        settings.clients.clients_table = settings.tokens.basic_table.clone();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_invalid_table_name_rejected() {
        let file = write_temp(
            r#"
[clients]
clients_table = "bad name"
"#,
        );
        assert!(load_settings(file.path().to_str()).is_err());
    }
}
