//! In-memory [`ApprovalStore`] implementation for testing.
//!
//! Keeps rows in insertion order behind a `std::sync::RwLock`, with a
//! side index of identity keys for the insert-if-absent check.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::{ApprovalRecord, CachedApproval, IdentityKey};

use super::{dedup_batch, sort_view, ApprovalStore};

#[derive(Default)]
struct Inner {
    rows: Vec<ApprovalRecord>,
    keys: HashSet<IdentityKey>,
}

/// In-memory approval cache. Does not survive the process.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows, including ones `load` would exclude.
    ///
    /// Still counts rows after a writer panicked and poisoned the lock;
    /// `upsert` and `load` report that state as an error instead.
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .rows
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ApprovalStore for InMemoryStore {
    async fn upsert(&self, batch: &[ApprovalRecord]) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }
        let mut inner = self
            .inner
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;

        let mut added = 0u64;
        for record in dedup_batch(batch) {
            if inner.keys.insert(record.identity()) {
                inner.rows.push(record);
                added += 1;
            }
        }
        Ok(added)
    }

    async fn load(&self) -> Result<Vec<CachedApproval>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        let mut rows: Vec<CachedApproval> = inner
            .rows
            .iter()
            .filter_map(|r| CachedApproval::derive(r.clone(), None))
            .collect();
        sort_view(&mut rows);
        Ok(rows)
    }
}
