//! openFDA search expression builder.
//!
//! Produces the `search=` parameter for the device PMA endpoint from a
//! decision-date range and optional brand / product-code filters. Building
//! never fails: terms that are empty after cleanup are dropped, and a filter
//! with no surviving terms is left out of the expression entirely.
//!
//! # Example
//!
//! ```rust
//! use device_watch_core::query::build_search_query;
//!
//! let codes: &[&str] = &[];
//! let q = build_search_query("2023-01-01", "2023-12-31", &["Micra"], codes);
//! assert_eq!(
//!     q.as_str(),
//!     "decision_code:APPR AND decision_date:[2023-01-01+TO+2023-12-31] AND (trade_name:\"Micra\")"
//! );
//! ```

use std::fmt;

/// Decision code for approved applications.
const APPROVED: &str = "APPR";

/// A built openFDA search expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchExpression(String);

impl SearchExpression {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SearchExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the search expression for one date window.
///
/// Clauses are AND-joined in a fixed order: decision code, decision-date
/// range, brand clause, product-code clause. `date_from` and `date_to` are
/// inserted verbatim.
pub fn build_search_query<B, P>(
    date_from: &str,
    date_to: &str,
    brand_terms: &[B],
    product_codes: &[P],
) -> SearchExpression
where
    B: AsRef<str>,
    P: AsRef<str>,
{
    let mut parts = vec![
        format!("decision_code:{}", APPROVED),
        format!("decision_date:[{}+TO+{}]", date_from, date_to),
    ];

    let brands: Vec<String> = brand_terms
        .iter()
        .filter_map(|t| clean_brand(t.as_ref()))
        .map(|t| format!("trade_name:\"{}\"", t))
        .collect();
    if !brands.is_empty() {
        parts.push(format!("({})", brands.join(" OR ")));
    }

    let codes: Vec<String> = product_codes
        .iter()
        .filter_map(|c| clean_product_code(c.as_ref()))
        .map(|c| format!("product_code:{}", c))
        .collect();
    if !codes.is_empty() {
        parts.push(format!("({})", codes.join(" OR ")));
    }

    SearchExpression(parts.join(" AND "))
}

/// Strip embedded double quotes and surrounding whitespace.
fn clean_brand(term: &str) -> Option<String> {
    let cleaned = term.replace('"', "");
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

fn clean_product_code(code: &str) -> Option<String> {
    let cleaned = code.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_uppercase())
}
