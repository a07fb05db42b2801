use anyhow::Result;
use colored::Colorize;
use oauth2_store::{ClientRecord, OAuthStore};

use crate::cli::ClientSetArgs;
use crate::output::{print_field, print_success};

pub async fn set(store: &OAuthStore, args: &ClientSetArgs) -> Result<()> {
    let client = ClientRecord::new(&args.id, &args.secret, &args.domain, &args.user_id);
    store.clients().set(&client).await?;
    print_success(&format!("Registered client {}", args.id.cyan()));
    Ok(())
}

pub async fn get(store: &OAuthStore, id: &str) -> Result<()> {
    let client = store.clients().get_by_id(id).await?;
    print_field("ID", &client.id);
    print_field("Domain", &client.domain);
    print_field("User", &client.user_id);
    print_field("Secret", &"*".repeat(client.secret.len().min(8)));
    Ok(())
}

pub async fn remove(store: &OAuthStore, id: &str) -> Result<()> {
    store.clients().remove_by_id(id).await?;
    print_success(&format!("Removed client {}", id.cyan()));
    Ok(())
}
