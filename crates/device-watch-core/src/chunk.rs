//! Per-year chunk planner.
//!
//! The openFDA API caps how many results a single search may page through,
//! independent of `limit`/`skip`. Splitting a long date range into one
//! query per calendar year keeps every individual result set small.
//!
//! # Algorithm
//!
//! 1. Walk calendar years from `from.year` to `to.year` inclusive.
//! 2. Each year spans Jan 1 – Dec 31.
//! 3. The first year's start is clamped to `from`; the last year's end is
//!    clamped to `to`.
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use device_watch_core::chunk::plan;
//!
//! let from = NaiveDate::from_ymd_opt(2022, 7, 1).unwrap();
//! let to = NaiveDate::from_ymd_opt(2023, 2, 15).unwrap();
//! assert_eq!(
//!     plan(from, to),
//!     vec![
//!         ("2022-07-01".to_string(), "2022-12-31".to_string()),
//!         ("2023-01-01".to_string(), "2023-02-15".to_string()),
//!     ]
//! );
//! ```

use chrono::{Datelike, NaiveDate};

use crate::models::DateRange;

/// Split `[date_from, date_to]` into one ISO-formatted sub-range per
/// calendar year, in ascending order.
///
/// An inverted range (`date_from > date_to`) yields an empty plan.
pub fn plan(date_from: NaiveDate, date_to: NaiveDate) -> Vec<(String, String)> {
    if date_from > date_to {
        return Vec::new();
    }

    (date_from.year()..=date_to.year())
        .filter_map(|year| {
            let start = NaiveDate::from_ymd_opt(year, 1, 1)?.max(date_from);
            let end = NaiveDate::from_ymd_opt(year, 12, 31)?.min(date_to);
            Some((start.to_string(), end.to_string()))
        })
        .collect()
}

impl DateRange {
    /// Per-year chunks for this range. See [`plan`].
    pub fn year_chunks(&self) -> Vec<(String, String)> {
        plan(self.from, self.to)
    }
}
