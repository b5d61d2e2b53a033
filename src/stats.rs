//! Cache statistics.
//!
//! A quick summary of what is cached: total rows, rows hidden from the
//! view for unparseable dates, originals vs supplements, and a per-year
//! breakdown. Used by `dw stats` to confirm that syncs landed.

use anyhow::Result;
use device_watch_core::store::ApprovalStore;
use device_watch_core::view::summarize;

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::sqlite_store::SqliteStore;

pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate::ensure_schema(&pool).await?;
    let store = SqliteStore::new(pool);

    let stored = store.stored_rows().await?;
    let rows = store.load().await?;
    let per_year = summarize(&rows);
    let supplements = rows.iter().filter(|r| r.is_supplement).count();

    let last_ingest: Option<String> = sqlx::query_scalar("SELECT MAX(ingested_at) FROM approvals")
        .fetch_one(store.pool())
        .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Device Watch — Cache Stats");
    println!("==========================");
    println!();
    println!("  Database:     {}", config.db.path.display());
    println!("  Size:         {}", format_bytes(db_size));
    println!("  Last ingest:  {}", last_ingest.as_deref().unwrap_or("never"));
    println!();
    println!("  Rows:         {}", stored);
    println!("  Undated:      {}", stored - rows.len() as i64);
    println!("  Originals:    {}", rows.len() - supplements);
    println!("  Supplements:  {}", supplements);

    if !per_year.is_empty() {
        println!();
        println!("  By year:");
        println!(
            "  {:<6} {:>10} {:>12} {:>8}",
            "YEAR", "ORIGINALS", "SUPPLEMENTS", "TOTAL"
        );
        println!("  {}", "-".repeat(39));
        for y in &per_year {
            println!(
                "  {:<6} {:>10} {:>12} {:>8}",
                y.year,
                y.originals,
                y.supplements,
                y.total()
            );
        }
    }

    println!();

    store.pool().close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
