//! Export the filtered approval view as JSON.
//!
//! This is the hand-off to dashboard front-ends: every cached row with a
//! parseable decision date, narrowed to a year window and a
//! supplement-inclusion flag, with the derived `year` and `is_supplement`
//! columns alongside the stored ones.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use device_watch_core::models::CachedApproval;
use device_watch_core::store::ApprovalStore;
use device_watch_core::view::{summarize, ViewFilter, YearCount};

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::sqlite_store::SqliteStore;

#[derive(Serialize)]
struct ExportData {
    rows: Vec<CachedApproval>,
    by_year: Vec<YearCount>,
}

/// Load the cache through `store` and apply `filter`.
pub async fn filtered_view(
    store: &dyn ApprovalStore,
    filter: &ViewFilter,
) -> Result<Vec<CachedApproval>> {
    Ok(filter.apply(store.load().await?))
}

/// Export the filtered view.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub async fn run_export(config: &Config, filter: &ViewFilter, output: Option<&Path>) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate::ensure_schema(&pool).await?;
    let store = SqliteStore::new(pool);

    let rows = filtered_view(&store, filter).await?;
    let by_year = summarize(&rows);
    let row_count = rows.len();

    let json = serde_json::to_string_pretty(&ExportData { rows, by_year })?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, &json)?;
            eprintln!("Exported {} rows to {}", row_count, path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    store.pool().close().await;
    Ok(())
}
