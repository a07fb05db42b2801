//! Surrogate id generation for basic grant records.

#[cfg(any(test, feature = "test-util"))]
use std::collections::VecDeque;
use std::fmt;
#[cfg(any(test, feature = "test-util"))]
use std::sync::Mutex;

use uuid::Uuid;

/// Source of globally unique ids for basic records that have no
/// authorization code to be keyed by.
pub trait SurrogateIdGenerator: Send + Sync + fmt::Debug {
    /// Returns a fresh id.
    fn next_id(&self) -> String;
}

/// Time-ordered UUIDv7 ids in 32-character lowercase hex.
///
/// The hex form sorts by creation time and never looks like an
/// authorization code or bearer token issued by the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidV7Generator;

impl SurrogateIdGenerator for UuidV7Generator {
    fn next_id(&self) -> String {
        Uuid::now_v7().simple().to_string()
    }
}

/// Hands out a fixed sequence of ids, then falls back to UUIDv7.
///
/// Makes surrogate-id collisions reproducible in tests. Only built with the
/// `test-util` feature.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct SequenceIdGenerator {
    ids: Mutex<VecDeque<String>>,
}

#[cfg(any(test, feature = "test-util"))]
impl SequenceIdGenerator {
    /// Creates a generator that yields `ids` in order.
    #[must_use]
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: Mutex::new(ids.into_iter().map(Into::into).collect()),
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
impl SurrogateIdGenerator for SequenceIdGenerator {
    fn next_id(&self) -> String {
        let next = match self.ids.lock() {
            Ok(mut ids) => ids.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        };
        next.unwrap_or_else(|| UuidV7Generator.next_id())
    }
}
