//! Ingestion pipeline orchestration.
//!
//! Coordinates one sync run: chunk plan → search expression → paginated
//! fetch → cache upsert, one calendar year at a time in ascending order.
//!
//! Chunks commit independently. If chunk *k* fails, chunks before it stay
//! cached, chunk *k* and everything after it are abandoned, and the error
//! is returned to the caller. Nothing is retried.

use anyhow::{bail, Context, Result};
use std::time::Duration;

use device_watch_core::models::DateRange;
use device_watch_core::query::build_search_query;
use device_watch_core::store::ApprovalStore;

use crate::config::{Config, OPENFDA_MAX_PAGE_SIZE};
use crate::db;
use crate::fetch::{OpenFdaClient, PageFetcher, PageSource};
use crate::migrate;
use crate::sqlite_store::SqliteStore;

/// Everything one sync run needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub range: DateRange,
    pub brands: Vec<String>,
    pub product_codes: Vec<String>,
    /// openFDA credential; empty for unauthenticated requests.
    pub credential: String,
    /// Record budget per chunk.
    pub max_records: usize,
    pub page_size: usize,
}

/// Outcome of one year chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkReport {
    pub from: String,
    pub to: String,
    pub fetched: usize,
    pub added: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub chunks: Vec<ChunkReport>,
}

impl SyncReport {
    pub fn fetched(&self) -> usize {
        self.chunks.iter().map(|c| c.fetched).sum()
    }

    pub fn added(&self) -> u64 {
        self.chunks.iter().map(|c| c.added).sum()
    }
}

/// Run every year chunk of `request.range` through `fetcher` into `store`.
pub async fn ingest_range<S: PageSource>(
    fetcher: &PageFetcher<S>,
    store: &dyn ApprovalStore,
    request: &SyncRequest,
) -> Result<SyncReport> {
    if request.page_size == 0 || request.page_size > OPENFDA_MAX_PAGE_SIZE {
        bail!(
            "page size must be between 1 and {} (got {})",
            OPENFDA_MAX_PAGE_SIZE,
            request.page_size
        );
    }
    if request.max_records == 0 {
        bail!("record budget must be > 0");
    }

    let mut report = SyncReport::default();

    for (from, to) in request.range.year_chunks() {
        let search = build_search_query(&from, &to, &request.brands, &request.product_codes);

        let records = fetcher
            .fetch(
                &search,
                &request.credential,
                request.max_records,
                request.page_size,
            )
            .await
            .with_context(|| format!("fetch failed for chunk {}..{}", from, to))?;

        let added = store
            .upsert(&records)
            .await
            .with_context(|| format!("cache write failed for chunk {}..{}", from, to))?;

        tracing::info!(
            chunk_from = %from,
            chunk_to = %to,
            fetched = records.len(),
            added,
            "chunk ingested"
        );

        report.chunks.push(ChunkReport {
            from,
            to,
            fetched: records.len(),
            added,
        });
    }

    Ok(report)
}

/// Options for `dw sync` that override configuration.
#[derive(Debug, Clone, Default)]
pub struct SyncArgs {
    pub from: String,
    pub to: String,
    pub brands: Vec<String>,
    pub product_codes: Vec<String>,
    pub max_records: Option<usize>,
    pub page_size: Option<usize>,
    pub dry_run: bool,
}

/// Resolve CLI arguments against the configuration.
pub fn build_request(config: &Config, args: &SyncArgs) -> Result<SyncRequest> {
    let range = DateRange::parse(&args.from, &args.to)?;
    let brands = if args.brands.is_empty() {
        config.watchlist.brands.clone()
    } else {
        args.brands.clone()
    };
    let product_codes = if args.product_codes.is_empty() {
        config.watchlist.product_codes.clone()
    } else {
        args.product_codes.clone()
    };

    Ok(SyncRequest {
        range,
        brands,
        product_codes,
        credential: config.openfda.credential(),
        max_records: args.max_records.unwrap_or(config.openfda.max_records),
        page_size: args.page_size.unwrap_or(config.openfda.page_size),
    })
}

pub async fn run_sync(config: &Config, args: &SyncArgs) -> Result<()> {
    let request = build_request(config, args)?;
    let label = format!("{}..{}", request.range.from, request.range.to);

    if args.dry_run {
        println!("sync {} (dry-run)", label);
        for (from, to) in request.range.year_chunks() {
            let search =
                build_search_query(&from, &to, &request.brands, &request.product_codes);
            println!("  chunk {}..{}: {}", from, to, search);
        }
        println!(
            "  page size: {}, record budget per chunk: {}",
            request.page_size, request.max_records
        );
        return Ok(());
    }

    let pool = db::connect(config).await?;
    migrate::ensure_schema(&pool).await?;
    let store = SqliteStore::new(pool);

    let client = OpenFdaClient::from_config(&config.openfda)?;
    let fetcher = PageFetcher::new(client, Duration::from_millis(config.openfda.page_delay_ms));

    let result = ingest_range(&fetcher, &store, &request).await;
    store.pool().close().await;
    let report = result?;

    println!("sync {}", label);
    for chunk in &report.chunks {
        println!(
            "  chunk {}..{}: fetched {}, added {}",
            chunk.from, chunk.to, chunk.fetched, chunk.added
        );
    }
    println!("  fetched: {} records", report.fetched());
    println!("  added: {} rows", report.added());
    println!("ok");

    Ok(())
}
