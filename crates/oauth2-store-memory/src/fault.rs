//! Fault injection for exercising rollback paths.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Failures the in-memory backend injects on request.
///
/// Injected insert failures report `StorageUnavailable`; an injected commit
/// failure reports `Internal` after everything was staged.
#[derive(Debug, Default)]
pub struct FaultPlan {
    failing_tables: Mutex<HashSet<String>>,
    fail_commit: AtomicBool,
}

impl FaultPlan {
    /// Makes every insert into `table` fail.
    pub fn fail_inserts_into(&self, table: impl Into<String>) {
        self.with_tables(|tables| {
            tables.insert(table.into());
        });
    }

    /// Makes every commit fail.
    pub fn fail_commit(&self) {
        self.fail_commit.store(true, Ordering::SeqCst);
    }

    /// Removes all injected faults.
    pub fn clear(&self) {
        self.with_tables(HashSet::clear);
        self.fail_commit.store(false, Ordering::SeqCst);
    }

    pub(crate) fn insert_fails(&self, table: &str) -> bool {
        self.with_tables(|tables| tables.contains(table))
    }

    pub(crate) fn commit_fails(&self) -> bool {
        self.fail_commit.load(Ordering::SeqCst)
    }

    fn with_tables<R>(&self, f: impl FnOnce(&mut HashSet<String>) -> R) -> R {
        match self.failing_tables.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}
