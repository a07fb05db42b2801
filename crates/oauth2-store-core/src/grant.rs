//! Token grant payload.
//!
//! A [`TokenGrant`] is the single source of truth for everything an
//! issuance carries. It is encoded once (camelCase JSON) into a basic record;
//! the index tables only point at it.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{StoreError, StoreResult};

/// A token string together with when it was issued and how long it lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    /// The code or bearer token string.
    pub value: String,
    /// When the token was issued.
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
    /// How long the token stays valid after `issued_at`.
    #[serde(with = "humantime_serde")]
    pub lifetime: Duration,
}

impl IssuedToken {
    /// Creates a new issued token.
    #[must_use]
    pub fn new(value: impl Into<String>, issued_at: OffsetDateTime, lifetime: Duration) -> Self {
        Self {
            value: value.into(),
            issued_at,
            lifetime,
        }
    }

    /// Instant at which the token stops being valid.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGrant` if the lifetime does not fit the timestamp range.
    pub fn expires_at(&self) -> StoreResult<OffsetDateTime> {
        time::Duration::try_from(self.lifetime)
            .ok()
            .and_then(|lifetime| self.issued_at.checked_add(lifetime))
            .ok_or_else(|| {
                StoreError::invalid_grant(format!(
                    "lifetime {:?} overflows the expiry timestamp",
                    self.lifetime
                ))
            })
    }
}

/// Everything recorded about one token issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    /// Client the grant was issued to.
    pub client_id: String,
    /// Resource owner, absent for client-credentials grants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Redirect URI bound to the authorization code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    /// Granted scopes (space-separated).
    #[serde(default)]
    pub scope: String,
    /// Authorization code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<IssuedToken>,
    /// Access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<IssuedToken>,
    /// Refresh token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<IssuedToken>,
}

impl TokenGrant {
    /// Creates an empty grant for a client.
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            user_id: None,
            redirect_uri: None,
            scope: String::new(),
            code: None,
            access: None,
            refresh: None,
        }
    }

    /// Sets the resource owner.
    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Sets the granted scopes.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Sets the redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    /// Attaches an authorization code.
    #[must_use]
    pub fn with_code(mut self, code: IssuedToken) -> Self {
        self.code = Some(code);
        self
    }

    /// Attaches an access token.
    #[must_use]
    pub fn with_access(mut self, access: IssuedToken) -> Self {
        self.access = Some(access);
        self
    }

    /// Attaches a refresh token.
    #[must_use]
    pub fn with_refresh(mut self, refresh: IssuedToken) -> Self {
        self.refresh = Some(refresh);
        self
    }

    /// Encodes the grant for storage.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGrant` if the grant cannot be serialized.
    pub fn to_bytes(&self) -> StoreResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| StoreError::invalid_grant(e.to_string()))
    }

    /// Decodes a stored grant.
    ///
    /// # Errors
    ///
    /// Returns `DecodeFailure` if the bytes are not a valid encoded grant.
    pub fn from_bytes(data: &[u8]) -> StoreResult<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Determines which issuance shape this grant describes.
    ///
    /// A code takes precedence over any token fields.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGrant` if the grant carries neither a code nor an
    /// access token, or if any present token string is empty.
    pub fn issuance(&self) -> StoreResult<Issuance<'_>> {
        if let Some(code) = &self.code {
            if code.value.is_empty() {
                return Err(StoreError::invalid_grant("authorization code is empty"));
            }
            return Ok(Issuance::Code(code));
        }

        let access = self.access.as_ref().ok_or_else(|| {
            StoreError::invalid_grant("grant carries neither code nor access token")
        })?;
        if access.value.is_empty() {
            return Err(StoreError::invalid_grant("access token is empty"));
        }

        let refresh = self.refresh.as_ref();
        if refresh.is_some_and(|r| r.value.is_empty()) {
            return Err(StoreError::invalid_grant("refresh token is empty"));
        }

        Ok(Issuance::Tokens { access, refresh })
    }
}

/// The two shapes an issuance can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Issuance<'a> {
    /// Authorization code only; stored as a single basic record.
    Code(&'a IssuedToken),
    /// Access token with an optional refresh token.
    Tokens {
        /// Access token.
        access: &'a IssuedToken,
        /// Refresh token, if issued.
        refresh: Option<&'a IssuedToken>,
    },
}

/// Expiry instants for a token issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenExpiry {
    /// When the access index record expires.
    pub access: OffsetDateTime,
    /// When the refresh index record and the basic record expire.
    pub refresh: OffsetDateTime,
}

impl TokenExpiry {
    /// Computes expiries so that the access token never outlives the
    /// refresh token. Without a refresh token both instants are the access
    /// expiry.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGrant` if a lifetime overflows.
    pub fn compute(access: &IssuedToken, refresh: Option<&IssuedToken>) -> StoreResult<Self> {
        let access_expiry = access.expires_at()?;
        match refresh {
            Some(refresh) => {
                let refresh_expiry = refresh.expires_at()?;
                Ok(Self {
                    access: access_expiry.min(refresh_expiry),
                    refresh: refresh_expiry,
                })
            }
            None => Ok(Self {
                access: access_expiry,
                refresh: access_expiry,
            }),
        }
    }
}
