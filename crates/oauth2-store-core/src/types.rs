//! Persisted record shapes.
//!
//! Four logical tables back the stores: one for client credentials, one for
//! serialized grants ("basic" records) and two index tables that map bearer
//! token strings to a basic record. Index records carry no grant data.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Registered OAuth 2.0 client credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    /// Client identifier (primary key).
    pub id: String,
    /// Client secret.
    pub secret: String,
    /// Registered redirect domain.
    pub domain: String,
    /// Owning user.
    pub user_id: String,
}

impl ClientRecord {
    /// Creates a new client record.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        secret: impl Into<String>,
        domain: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
            domain: domain.into(),
            user_id: user_id.into(),
        }
    }
}

/// One serialized grant, keyed by authorization code or surrogate id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicGrantRecord {
    /// Authorization code or generated surrogate id.
    pub id: String,
    /// Encoded [`TokenGrant`](crate::TokenGrant) payload.
    pub data: Vec<u8>,
    /// Instant after which the engine may reclaim the record.
    pub expires_at: OffsetDateTime,
}

/// Pointer from a bearer token string to a [`BasicGrantRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    /// Access or refresh token string (primary key).
    pub id: String,
    /// Id of the basic record holding the grant.
    pub basic_id: String,
    /// Instant after which the engine may reclaim the record.
    pub expires_at: OffsetDateTime,
}

/// Shape of a logical table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// Client credentials; never expire.
    Clients,
    /// Serialized grants.
    Basic,
    /// Token string to basic id mapping.
    Index,
}

impl TableKind {
    /// Returns `true` if records of this kind carry an `expires_at` field
    /// that the engine sweeps.
    #[must_use]
    pub fn expires(self) -> bool {
        !matches!(self, Self::Clients)
    }
}

/// Lookup path used to reach a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Authorization code (basic table, direct).
    Code,
    /// Access token (access index, then basic table).
    Access,
    /// Refresh token (refresh index, then basic table).
    Refresh,
}

impl TokenKind {
    /// Short lowercase name for logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shortened token string for log fields.
#[must_use]
pub fn token_prefix(token: &str) -> &str {
    let end = token
        .char_indices()
        .nth(8)
        .map_or(token.len(), |(idx, _)| idx);
    &token[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_kind_expiry() {
        assert!(!TableKind::Clients.expires());
        assert!(TableKind::Basic.expires());
        assert!(TableKind::Index.expires());
    }

    #[test]
    fn test_token_prefix() {
        assert_eq!(token_prefix("abcdefghijkl"), "abcdefgh");
        assert_eq!(token_prefix("abc"), "abc");
        assert_eq!(token_prefix("ééééééééé"), "éééééééé");
    }

    #[test]
    fn test_client_record_serialization() {
        let client = ClientRecord::new("app", "s3cret", "https://app.example", "u-1");
        let json = serde_json::to_value(&client).expect("serialize client");
        assert_eq!(json["userId"], "u-1");
    }
}
