//! Core data models used throughout Device Watch.
//!
//! These types represent the approval records that flow from the openFDA
//! PMA endpoint through the ingestion pipeline into the cache, and the
//! derived view handed to downstream dashboards.

use anyhow::{bail, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One premarket approval or supplement entry, as cached.
///
/// Every field is a plain string; values the remote service omitted are
/// stored as `""` so that "absent" and "empty" compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub pma_number: String,
    pub supplement_number: String,
    pub supplement_type: String,
    pub applicant: String,
    pub trade_name: String,
    pub generic_name: String,
    pub product_code: String,
    pub decision_code: String,
    /// ISO 8601 date (`YYYY-MM-DD`) when well-formed.
    pub decision_date: String,
}

/// Deduplication key for an [`ApprovalRecord`].
///
/// Components are trimmed before comparison. No other record field takes
/// part in identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    pub pma_number: String,
    pub supplement_number: String,
    pub decision_date: String,
}

impl ApprovalRecord {
    /// The identity triple `(pma_number, supplement_number, decision_date)`.
    pub fn identity(&self) -> IdentityKey {
        IdentityKey {
            pma_number: self.pma_number.trim().to_string(),
            supplement_number: self.supplement_number.trim().to_string(),
            decision_date: self.decision_date.trim().to_string(),
        }
    }

    /// Whether this entry amends an earlier approval.
    pub fn is_supplement(&self) -> bool {
        !self.supplement_number.trim().is_empty()
    }

    /// Parse `decision_date` as an ISO calendar date.
    pub fn decision_day(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.decision_date.trim(), "%Y-%m-%d").ok()
    }
}

/// A cached row together with the fields derived for filtering and charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachedApproval {
    #[serde(flatten)]
    pub record: ApprovalRecord,
    pub year: i32,
    pub is_supplement: bool,
    /// Insert timestamp as recorded by the store (`None` for stores that
    /// do not track it).
    pub ingested_at: Option<String>,
}

impl CachedApproval {
    /// Derive the view row. Returns `None` when `decision_date` does not
    /// parse, which excludes the row from every loaded view.
    pub fn derive(record: ApprovalRecord, ingested_at: Option<String>) -> Option<Self> {
        let year = record.decision_day()?.year();
        let is_supplement = record.is_supplement();
        Some(Self {
            record,
            year,
            is_supplement,
            ingested_at,
        })
    }
}

/// Inclusive calendar-date span `[from, to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            bail!("date range start {} is after end {}", from, to);
        }
        Ok(Self { from, to })
    }

    /// Parse a range from two `YYYY-MM-DD` strings.
    pub fn parse(from: &str, to: &str) -> Result<Self> {
        let from = NaiveDate::parse_from_str(from.trim(), "%Y-%m-%d")
            .map_err(|e| anyhow::anyhow!("invalid start date '{}': {}", from, e))?;
        let to = NaiveDate::parse_from_str(to.trim(), "%Y-%m-%d")
            .map_err(|e| anyhow::anyhow!("invalid end date '{}': {}", to, e))?;
        Self::new(from, to)
    }
}
