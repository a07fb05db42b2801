use anyhow::{Result, bail};
use oauth2_store::{OAuthStore, TokenKind};

use crate::output::{print_json, print_success};

pub async fn get(store: &OAuthStore, kind: TokenKind, token: &str) -> Result<()> {
    let tokens = store.tokens();
    let grant = match kind {
        TokenKind::Code => tokens.get_by_code(token).await?,
        TokenKind::Access => tokens.get_by_access(token).await?,
        TokenKind::Refresh => tokens.get_by_refresh(token).await?,
    };
    match grant {
        Some(grant) => print_json(&grant),
        None => bail!("no live grant for this {kind}"),
    }
}

pub async fn revoke(store: &OAuthStore, kind: TokenKind, token: &str) -> Result<()> {
    let tokens = store.tokens();
    match kind {
        TokenKind::Code => tokens.remove_by_code(token).await?,
        TokenKind::Access => tokens.remove_by_access(token).await?,
        TokenKind::Refresh => tokens.remove_by_refresh(token).await?,
    }
    print_success(&format!("Revoked {kind}"));
    Ok(())
}
