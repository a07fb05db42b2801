//! Error types for token and client persistence.
//!
//! Every backend and store in the workspace reports failures through
//! [`StoreError`]. Absent records on the grant lookup paths are not errors;
//! they surface as `Ok(None)` from the stores.

use std::fmt;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested record was not found.
    #[error("Record not found: {table}/{id}")]
    NotFound {
        /// Table that was queried.
        table: String,
        /// Primary key that did not match.
        id: String,
    },

    /// A record with the same primary key already exists.
    #[error("Duplicate key: {table}/{id}")]
    DuplicateKey {
        /// Table the insert targeted.
        table: String,
        /// Colliding primary key.
        id: String,
    },

    /// A multi-record write failed and was rolled back as a whole.
    #[error("Transaction aborted: {message}")]
    TransactionAborted {
        /// Description of the failure that aborted the transaction.
        message: String,
    },

    /// The storage engine could not be reached.
    #[error("Storage unavailable: {message}")]
    StorageUnavailable {
        /// Description of the connectivity failure.
        message: String,
    },

    /// A persisted payload could not be decoded.
    #[error("Decode failure: {message}")]
    DecodeFailure {
        /// Description of the decode failure.
        message: String,
    },

    /// The grant was rejected before anything was written.
    #[error("Invalid grant: {message}")]
    InvalidGrant {
        /// Why the grant cannot be stored.
        message: String,
    },

    /// Store configuration is invalid.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration problem.
        message: String,
    },

    /// Any other engine error.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StoreError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(table: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            table: table.into(),
            id: id.into(),
        }
    }

    /// Creates a new `DuplicateKey` error.
    #[must_use]
    pub fn duplicate_key(table: impl Into<String>, id: impl Into<String>) -> Self {
        Self::DuplicateKey {
            table: table.into(),
            id: id.into(),
        }
    }

    /// Creates a new `TransactionAborted` error.
    #[must_use]
    pub fn transaction_aborted(message: impl Into<String>) -> Self {
        Self::TransactionAborted {
            message: message.into(),
        }
    }

    /// Creates a new `StorageUnavailable` error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
        }
    }

    /// Creates a new `DecodeFailure` error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::DecodeFailure {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidGrant` error.
    #[must_use]
    pub fn invalid_grant(message: impl Into<String>) -> Self {
        Self::InvalidGrant {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidConfig` error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is a duplicate key error.
    #[must_use]
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }

    /// Returns `true` if a multi-record write was rolled back.
    #[must_use]
    pub fn is_transaction_aborted(&self) -> bool {
        matches!(self, Self::TransactionAborted { .. })
    }

    /// Returns `true` if the engine could not be reached.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::StorageUnavailable { .. })
    }

    /// Returns `true` if a persisted payload failed to decode.
    #[must_use]
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, Self::DecodeFailure { .. })
    }

    /// Returns `true` if the grant was rejected before writing.
    #[must_use]
    pub fn is_invalid_grant(&self) -> bool {
        matches!(self, Self::InvalidGrant { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::DuplicateKey { .. } => ErrorCategory::Conflict,
            Self::TransactionAborted { .. } => ErrorCategory::Transaction,
            Self::StorageUnavailable { .. } => ErrorCategory::Infrastructure,
            Self::DecodeFailure { .. } => ErrorCategory::Corruption,
            Self::InvalidGrant { .. } | Self::InvalidConfig { .. } => ErrorCategory::Validation,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(err.to_string())
    }
}

/// Categories of store errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Record not found.
    NotFound,
    /// Primary-key collision.
    Conflict,
    /// Multi-record write rolled back.
    Transaction,
    /// Connectivity failure.
    Infrastructure,
    /// Persisted data could not be decoded.
    Corruption,
    /// Rejected input or configuration.
    Validation,
    /// Internal error.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Transaction => write!(f, "transaction"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Corruption => write!(f, "corruption"),
            Self::Validation => write!(f, "validation"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::not_found("oauth2_clients", "abc");
        assert_eq!(err.to_string(), "Record not found: oauth2_clients/abc");

        let err = StoreError::duplicate_key("oauth2_access", "tok");
        assert_eq!(err.to_string(), "Duplicate key: oauth2_access/tok");

        let err = StoreError::transaction_aborted("commit failed");
        assert_eq!(err.to_string(), "Transaction aborted: commit failed");
    }

    #[test]
    fn test_error_predicates() {
        let err = StoreError::not_found("oauth2_basic", "1");
        assert!(err.is_not_found());
        assert!(!err.is_duplicate_key());

        let err = StoreError::unavailable("connection refused");
        assert!(err.is_unavailable());
        assert!(!err.is_transaction_aborted());

        let err = StoreError::invalid_grant("no access token");
        assert!(err.is_invalid_grant());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            StoreError::duplicate_key("t", "1").category(),
            ErrorCategory::Conflict
        );
        assert_eq!(
            StoreError::decode("bad json").category(),
            ErrorCategory::Corruption
        );
        assert_eq!(
            StoreError::invalid_config("bad table").category(),
            ErrorCategory::Validation
        );
        assert_eq!(ErrorCategory::Infrastructure.to_string(), "infrastructure");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = StoreError::from(json_err);
        assert!(err.is_decode_failure());
    }
}
