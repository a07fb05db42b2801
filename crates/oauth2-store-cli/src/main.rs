mod cli;
mod commands;
mod observability;
mod output;
mod settings;

use anyhow::Result;
use clap::Parser;

use cli::{ClientCommands, Cli, Commands, GrantCommands};
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = settings::load_settings(cli.config.as_deref())?;
    observability::init_tracing_with_level(cli.log_level.as_deref().unwrap_or(&settings.log_level));

    let bootstrap = matches!(cli.command, Commands::Init);
    let (backend, store) = commands::connect(&settings, bootstrap).await?;

    let result = match &cli.command {
        Commands::Init => {
            commands::maintenance::init(&settings);
            Ok(())
        }
        Commands::Client(args) => match &args.command {
            ClientCommands::Set(set_args) => commands::client::set(&store, set_args).await,
            ClientCommands::Get(id_args) => commands::client::get(&store, &id_args.id).await,
            ClientCommands::Remove(id_args) => commands::client::remove(&store, &id_args.id).await,
        },
        Commands::Grant(args) => match &args.command {
            GrantCommands::Get(token_args) => {
                commands::grant::get(&store, token_args.kind.kind(), &token_args.token).await
            }
            GrantCommands::Revoke(token_args) => {
                commands::grant::revoke(&store, token_args.kind.kind(), &token_args.token).await
            }
        },
        Commands::Sweep(args) if args.watch => {
            commands::maintenance::watch(&backend, &settings).await
        }
        Commands::Sweep(_) => commands::maintenance::sweep(&backend, &settings).await,
    };

    store.close().await;
    result
}
