//! # oauth2-store-core
//!
//! Shared vocabulary for the oauth2-store crates: persisted record shapes,
//! the [`TokenGrant`] payload and its codec, the [`StoreError`] taxonomy,
//! table configuration and the [`StoreBackend`] / [`StoreTransaction`]
//! traits every storage engine implements.
//!
//! It contains no engine. Backends live in `oauth2-store-memory` and
//! `oauth2-store-postgres`; the client and token stores in `oauth2-store`.
//!
//! ## Implementing a backend
//!
//! ```ignore
//! use async_trait::async_trait;
//! use oauth2_store_core::{StoreBackend, StoreResult, ClientRecord};
//!
//! struct MyBackend {
//!     // ...
//! }
//!
//! #[async_trait]
//! impl StoreBackend for MyBackend {
//!     async fn insert_client(&self, table: &str, client: &ClientRecord) -> StoreResult<()> {
//!         // Implementation
//!     }
//!     // ... other methods
//! }
//! ```

pub mod config;
mod error;
pub mod grant;
pub mod id;
mod traits;
pub mod types;

pub use config::{ClientConfig, TokenConfig, validate_table_name};
pub use error::{ErrorCategory, StoreError};
pub use grant::{Issuance, IssuedToken, TokenExpiry, TokenGrant};
#[cfg(any(test, feature = "test-util"))]
pub use id::SequenceIdGenerator;
pub use id::{SurrogateIdGenerator, UuidV7Generator};
pub use traits::{StoreBackend, StoreTransaction, run_in_transaction};
pub use types::{BasicGrantRecord, ClientRecord, IndexRecord, TableKind, TokenKind, token_prefix};

/// Type alias for a store result.
pub type StoreResult<T> = Result<T, StoreError>;

/// Type alias for a shared backend handle.
pub type DynBackend = std::sync::Arc<dyn StoreBackend>;
