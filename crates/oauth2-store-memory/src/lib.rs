//! In-memory storage backend for oauth2-store.
//!
//! This crate provides an in-memory implementation of the `StoreBackend`
//! trait from `oauth2-store-core`. It behaves like a document store with
//! TTL indexes: expired records are invisible to reads and are removed by an
//! explicit [`InMemoryBackend::purge_expired`] sweep.
//!
//! Transactions stage their inserts and apply them under one write lock on
//! commit, so readers observe all of a transaction or none of it.
//! A [`FaultPlan`] lets tests make inserts or commits fail on demand.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use oauth2_store_memory::InMemoryBackend;
//!
//! let backend = Arc::new(InMemoryBackend::new());
//! backend.faults().fail_inserts_into("oauth2_access");
//! ```

mod fault;
mod storage;
mod transaction;

pub use fault::FaultPlan;
pub use storage::InMemoryBackend;
pub use transaction::MemoryTransaction;

// Re-export the backend traits for convenience
pub use oauth2_store_core::{StoreBackend, StoreError, StoreTransaction};
