//! SQLite-backed [`ApprovalStore`] implementation.
//!
//! `upsert` stages the deduplicated batch in a temporary table and copies
//! across only the identities the cache lacks, in a single
//! `INSERT ... SELECT ... WHERE NOT EXISTS` anti-join, inside one
//! transaction. Writers in this process are serialized through a mutex;
//! the unique identity index covers writers in other processes.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;

use device_watch_core::models::{ApprovalRecord, CachedApproval};
use device_watch_core::store::{dedup_batch, ApprovalStore};

/// SQLite implementation of the [`ApprovalStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
    write_lock: Mutex<()>,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Mutex::new(()),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Total stored rows, including ones `load` excludes for bad dates.
    pub async fn stored_rows(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM approvals")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl ApprovalStore for SqliteStore {
    async fn upsert(&self, batch: &[ApprovalRecord]) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }
        let candidates = dedup_batch(batch);

        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            CREATE TEMP TABLE IF NOT EXISTS approvals_staging (
                pma_number TEXT NOT NULL,
                supplement_number TEXT NOT NULL,
                supplement_type TEXT NOT NULL,
                applicant TEXT NOT NULL,
                trade_name TEXT NOT NULL,
                generic_name TEXT NOT NULL,
                product_code TEXT NOT NULL,
                decision_code TEXT NOT NULL,
                decision_date TEXT NOT NULL
            )
            "#,
        )
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM approvals_staging")
            .execute(&mut *tx)
            .await?;

        for record in &candidates {
            let key = record.identity();
            sqlx::query(
                r#"
                INSERT INTO approvals_staging (pma_number, supplement_number, supplement_type,
                                               applicant, trade_name, generic_name,
                                               product_code, decision_code, decision_date)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&key.pma_number)
            .bind(&key.supplement_number)
            .bind(&record.supplement_type)
            .bind(&record.applicant)
            .bind(&record.trade_name)
            .bind(&record.generic_name)
            .bind(&record.product_code)
            .bind(&record.decision_code)
            .bind(&key.decision_date)
            .execute(&mut *tx)
            .await?;
        }

        let added = sqlx::query(
            r#"
            INSERT INTO approvals (pma_number, supplement_number, supplement_type,
                                   applicant, trade_name, generic_name,
                                   product_code, decision_code, decision_date)
            SELECT s.pma_number, s.supplement_number, s.supplement_type,
                   s.applicant, s.trade_name, s.generic_name,
                   s.product_code, s.decision_code, s.decision_date
            FROM approvals_staging s
            WHERE NOT EXISTS (
                SELECT 1 FROM approvals a
                WHERE a.pma_number = s.pma_number
                  AND a.supplement_number = s.supplement_number
                  AND a.decision_date = s.decision_date
            )
            "#,
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query("DELETE FROM approvals_staging")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(added)
    }

    async fn load(&self) -> Result<Vec<CachedApproval>> {
        let rows = sqlx::query(
            r#"
            SELECT pma_number, supplement_number, supplement_type, applicant, trade_name,
                   generic_name, product_code, decision_code, decision_date, ingested_at
            FROM approvals
            ORDER BY decision_date, pma_number, supplement_number
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let approvals = rows
            .iter()
            .filter_map(|row| {
                let record = ApprovalRecord {
                    pma_number: row.get("pma_number"),
                    supplement_number: row.get("supplement_number"),
                    supplement_type: row.get("supplement_type"),
                    applicant: row.get("applicant"),
                    trade_name: row.get("trade_name"),
                    generic_name: row.get("generic_name"),
                    product_code: row.get("product_code"),
                    decision_code: row.get("decision_code"),
                    decision_date: row.get("decision_date"),
                };
                CachedApproval::derive(record, Some(row.get("ingested_at")))
            })
            .collect();

        Ok(approvals)
    }
}
