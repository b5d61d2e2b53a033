//! Normalization of openFDA result objects into [`ApprovalRecord`]s.
//!
//! Each element of a response's `results` array is flattened into a flat
//! row whose nested keys are joined with dots (`openfda.device_name`), then
//! the fixed approval columns are picked out of that row. Columns the
//! remote object lacks become empty strings.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::models::ApprovalRecord;

/// A flattened result object: dotted column name → scalar value.
pub type FlatRow = BTreeMap<String, Value>;

/// Flatten nested objects into dotted-path columns.
///
/// Arrays and scalars are kept as leaf values. A non-object input yields a
/// single column named `value`.
pub fn flatten(value: &Value) -> FlatRow {
    let mut row = FlatRow::new();
    match value {
        Value::Object(_) => flatten_into(&mut row, "", value),
        other => {
            row.insert("value".to_string(), other.clone());
        }
    }
    row
}

fn flatten_into(row: &mut FlatRow, prefix: &str, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(row, &path, child);
            }
        }
        leaf => {
            row.insert(prefix.to_string(), leaf.clone());
        }
    }
}

/// Render a leaf value as a column string. `null` and missing are `""`.
fn column(row: &FlatRow, name: &str) -> String {
    match row.get(name) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Array(items)) if items.is_empty() => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Rewrite compact `YYYYMMDD` dates into ISO `YYYY-MM-DD`; anything else is
/// returned unchanged.
pub fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();
    if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}-{}-{}", &raw[..4], &raw[4..6], &raw[6..])
    } else {
        raw.to_string()
    }
}

impl ApprovalRecord {
    /// Map a flattened result row onto the fixed approval columns.
    pub fn from_row(row: &FlatRow) -> Self {
        Self {
            pma_number: column(row, "pma_number"),
            supplement_number: column(row, "supplement_number"),
            supplement_type: column(row, "supplement_type"),
            applicant: column(row, "applicant"),
            trade_name: column(row, "trade_name"),
            generic_name: column(row, "generic_name"),
            product_code: column(row, "product_code"),
            decision_code: column(row, "decision_code"),
            decision_date: normalize_date(&column(row, "decision_date")),
        }
    }

    /// Flatten and map one raw result object.
    pub fn from_json(value: &Value) -> Self {
        Self::from_row(&flatten(value))
    }
}
