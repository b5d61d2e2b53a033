//! Approval cache schema.
//!
//! The schema is fixed: `CREATE ... IF NOT EXISTS` on every run, never
//! altered afterwards. The unique index on the identity triple backs the
//! no-duplicate invariant even if two processes race on the same rows.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    ensure_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create the `approvals` table and its indexes if they do not exist.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS approvals (
            pma_number TEXT NOT NULL,
            supplement_number TEXT NOT NULL DEFAULT '',
            supplement_type TEXT NOT NULL DEFAULT '',
            applicant TEXT NOT NULL DEFAULT '',
            trade_name TEXT NOT NULL DEFAULT '',
            generic_name TEXT NOT NULL DEFAULT '',
            product_code TEXT NOT NULL DEFAULT '',
            decision_code TEXT NOT NULL DEFAULT '',
            decision_date TEXT NOT NULL DEFAULT '',
            ingested_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_approvals_identity \
         ON approvals(pma_number, supplement_number, decision_date)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_approvals_decision_date ON approvals(decision_date)")
        .execute(pool)
        .await?;

    Ok(())
}
