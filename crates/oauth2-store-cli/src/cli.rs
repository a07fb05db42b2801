use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "oauth2-store-admin")]
#[command(about = "Administer OAuth 2.0 clients and grants stored in PostgreSQL")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a TOML settings file (defaults to ./oauth2-store.toml)
    #[arg(short, long, global = true, env = "OAUTH2_STORE_CONFIG")]
    pub config: Option<String>,

    /// Log level or filter directive (overrides settings; RUST_LOG wins over both)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create every table and expiry index that does not exist yet
    Init,
    /// Manage registered clients
    Client(ClientArgs),
    /// Inspect or revoke issued grants
    Grant(GrantArgs),
    /// Delete expired records and report how many were removed
    Sweep(SweepArgs),
}

#[derive(Args)]
pub struct SweepArgs {
    /// Keep sweeping every `postgres.sweep_interval` until interrupted
    #[arg(long)]
    pub watch: bool,
}

#[derive(Args)]
pub struct ClientArgs {
    #[command(subcommand)]
    pub command: ClientCommands,
}

#[derive(Subcommand)]
pub enum ClientCommands {
    /// Register a client
    Set(ClientSetArgs),
    /// Show a registered client
    Get(ClientIdArgs),
    /// Delete a registered client
    Remove(ClientIdArgs),
}

#[derive(Args)]
pub struct ClientSetArgs {
    /// Client ID
    #[arg(long)]
    pub id: String,
    /// Client secret
    #[arg(long)]
    pub secret: String,
    /// Redirect domain
    #[arg(long)]
    pub domain: String,
    /// Owning user ID
    #[arg(long)]
    pub user_id: String,
}

#[derive(Args)]
pub struct ClientIdArgs {
    /// Client ID
    pub id: String,
}

#[derive(Args)]
pub struct GrantArgs {
    #[command(subcommand)]
    pub command: GrantCommands,
}

#[derive(Subcommand)]
pub enum GrantCommands {
    /// Print the grant behind a code or token as JSON
    Get(GrantTokenArgs),
    /// Remove a code or revoke a token
    Revoke(GrantTokenArgs),
}

#[derive(Args)]
pub struct GrantTokenArgs {
    #[command(flatten)]
    pub kind: TokenKindArgs,
    /// The code or token string
    pub token: String,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct TokenKindArgs {
    /// The value is an authorization code
    #[arg(long)]
    pub code: bool,
    /// The value is an access token
    #[arg(long)]
    pub access: bool,
    /// The value is a refresh token
    #[arg(long)]
    pub refresh: bool,
}

impl TokenKindArgs {
    pub fn kind(&self) -> oauth2_store::TokenKind {
        if self.code {
            oauth2_store::TokenKind::Code
        } else if self.access {
            oauth2_store::TokenKind::Access
        } else {
            oauth2_store::TokenKind::Refresh
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oauth2_store::TokenKind;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_grant_get_parses_kind() {
        let cli = Cli::try_parse_from(["oauth2-store-admin", "grant", "get", "--refresh", "tok"])
            .unwrap();
        let Commands::Grant(GrantArgs {
            command: GrantCommands::Get(args),
        }) = cli.command
        else {
            panic!("expected grant get");
        };
        assert_eq!(args.kind.kind(), TokenKind::Refresh);
        assert_eq!(args.token, "tok");
    }

    #[test]
    fn test_grant_requires_exactly_one_kind() {
        assert!(Cli::try_parse_from(["oauth2-store-admin", "grant", "get", "tok"]).is_err());
        assert!(
            Cli::try_parse_from([
                "oauth2-store-admin",
                "grant",
                "revoke",
                "--code",
                "--access",
                "tok"
            ])
            .is_err()
        );
    }

    #[test]
    fn test_sweep_watch_flag() {
        let cli = Cli::try_parse_from(["oauth2-store-admin", "sweep"]).unwrap();
        assert!(matches!(cli.command, Commands::Sweep(SweepArgs { watch: false })));

        let cli = Cli::try_parse_from(["oauth2-store-admin", "sweep", "--watch"]).unwrap();
        assert!(matches!(cli.command, Commands::Sweep(SweepArgs { watch: true })));
    }

    #[test]
    fn test_client_set_parses() {
        let cli = Cli::try_parse_from([
            "oauth2-store-admin",
            "--log-level",
            "debug",
            "client",
            "set",
            "--id",
            "app",
            "--secret",
            "s3cret",
            "--domain",
            "https://app.example",
            "--user-id",
            "alice",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        let Commands::Client(ClientArgs {
            command: ClientCommands::Set(args),
        }) = cli.command
        else {
            panic!("expected client set");
        };
        assert_eq!(args.id, "app");
        assert_eq!(args.user_id, "alice");
    }
}
