//! Reader-side filtering and aggregation over loaded approvals.
//!
//! Dashboards never query the store directly: they load the full view,
//! narrow it to a year window and a supplement-inclusion flag, and either
//! render the rows or the per-year counts produced by [`summarize`].

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::CachedApproval;

/// Year window and supplement flag applied to a loaded view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewFilter {
    pub from_year: Option<i32>,
    pub to_year: Option<i32>,
    pub include_supplements: bool,
}

impl Default for ViewFilter {
    fn default() -> Self {
        Self {
            from_year: None,
            to_year: None,
            include_supplements: true,
        }
    }
}

impl ViewFilter {
    pub fn matches(&self, row: &CachedApproval) -> bool {
        if self.from_year.is_some_and(|y| row.year < y) {
            return false;
        }
        if self.to_year.is_some_and(|y| row.year > y) {
            return false;
        }
        self.include_supplements || !row.is_supplement
    }

    /// Keep the rows this filter matches, preserving order.
    pub fn apply(&self, rows: Vec<CachedApproval>) -> Vec<CachedApproval> {
        rows.into_iter().filter(|r| self.matches(r)).collect()
    }
}

/// Approval counts for one calendar year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub originals: u64,
    pub supplements: u64,
}

impl YearCount {
    pub fn total(&self) -> u64 {
        self.originals + self.supplements
    }
}

/// Count originals and supplements per year, ascending by year.
pub fn summarize(rows: &[CachedApproval]) -> Vec<YearCount> {
    let mut by_year: BTreeMap<i32, YearCount> = BTreeMap::new();
    for row in rows {
        let entry = by_year.entry(row.year).or_insert_with(|| YearCount {
            year: row.year,
            ..Default::default()
        });
        if row.is_supplement {
            entry.supplements += 1;
        } else {
            entry.originals += 1;
        }
    }
    by_year.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApprovalRecord;

    fn row(pma: &str, supp: &str, date: &str) -> CachedApproval {
        CachedApproval::derive(
            ApprovalRecord {
                pma_number: pma.to_string(),
                supplement_number: supp.to_string(),
                decision_date: date.to_string(),
                ..Default::default()
            },
            None,
        )
        .unwrap()
    }

    fn sample() -> Vec<CachedApproval> {
        vec![
            row("P1", "", "2021-03-01"),
            row("P1", "S001", "2022-04-01"),
            row("P2", "", "2022-05-01"),
            row("P2", "S003", "2023-06-01"),
        ]
    }

    #[test]
    fn test_default_filter_keeps_everything() {
        assert_eq!(ViewFilter::default().apply(sample()).len(), 4);
    }

    #[test]
    fn test_year_window() {
        let filter = ViewFilter {
            from_year: Some(2022),
            to_year: Some(2022),
            ..Default::default()
        };
        let rows = filter.apply(sample());
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.year == 2022));
    }

    #[test]
    fn test_exclude_supplements() {
        let filter = ViewFilter {
            include_supplements: false,
            ..Default::default()
        };
        let rows = filter.apply(sample());
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| !r.is_supplement));
    }

    #[test]
    fn test_summarize_per_year() {
        let counts = summarize(&sample());
        assert_eq!(
            counts,
            vec![
                YearCount { year: 2021, originals: 1, supplements: 0 },
                YearCount { year: 2022, originals: 1, supplements: 1 },
                YearCount { year: 2023, originals: 0, supplements: 1 },
            ]
        );
        assert_eq!(counts[1].total(), 2);
    }
}
