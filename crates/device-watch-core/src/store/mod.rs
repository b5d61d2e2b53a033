//! Storage abstraction for the approval cache.
//!
//! The [`ApprovalStore`] trait defines the two operations the ingestion
//! pipeline and the export/stats readers need, enabling pluggable backends
//! (SQLite in the app crate, in-memory here for tests).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{ApprovalRecord, CachedApproval, IdentityKey};

/// Abstract, append-only approval cache.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert`](ApprovalStore::upsert) | Insert records whose identity is not cached yet |
/// | [`load`](ApprovalStore::load) | Read every row with a parseable date, plus derived fields |
#[async_trait]
pub trait ApprovalStore: Send + Sync {
    /// Insert every record in `batch` whose identity triple is not already
    /// cached. Returns the number of rows actually added.
    async fn upsert(&self, batch: &[ApprovalRecord]) -> Result<u64>;

    /// Return all cached rows whose `decision_date` parses, ordered by
    /// decision date, then PMA number, then supplement number.
    async fn load(&self) -> Result<Vec<CachedApproval>>;
}

/// Collapse a batch to one record per identity, last seen wins.
///
/// Output keeps the position of each identity's first appearance so the
/// remote ordering survives deduplication.
pub fn dedup_batch(batch: &[ApprovalRecord]) -> Vec<ApprovalRecord> {
    let mut slots: HashMap<IdentityKey, usize> = HashMap::with_capacity(batch.len());
    let mut out: Vec<ApprovalRecord> = Vec::with_capacity(batch.len());

    for record in batch {
        match slots.get(&record.identity()) {
            Some(&i) => out[i] = record.clone(),
            None => {
                slots.insert(record.identity(), out.len());
                out.push(record.clone());
            }
        }
    }

    out
}

/// Canonical ordering for loaded views.
pub(crate) fn sort_view(rows: &mut [CachedApproval]) {
    rows.sort_by(|a, b| {
        (
            &a.record.decision_date,
            &a.record.pma_number,
            &a.record.supplement_number,
        )
            .cmp(&(
                &b.record.decision_date,
                &b.record.pma_number,
                &b.record.supplement_number,
            ))
    });
}
