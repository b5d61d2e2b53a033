//! # Device Watch
//!
//! **A local-first ingestion cache for openFDA device premarket approvals.**
//!
//! Device Watch pulls PMA approval and supplement records for a watch list
//! of brands and product codes from the openFDA API, deduplicates them into
//! a SQLite cache, and serves the cached view to dashboards as JSON.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌─────────────┐   ┌──────────┐
//! │ Chunk planner│──▶│ Query builder│──▶│ Page fetcher│──▶│  SQLite  │
//! │  (per year)  │   │  (search=)   │   │  (openFDA)  │   │  cache   │
//! └──────────────┘   └──────────────┘   └─────────────┘   └────┬─────┘
//!                                                              │
//!                                         ┌────────────────────┤
//!                                         ▼                    ▼
//!                                   ┌──────────┐         ┌──────────┐
//!                                   │ dw stats │         │dw export │
//!                                   └──────────┘         └──────────┘
//! ```
//!
//! ## Data Flow
//!
//! 1. The date range is split into one sub-range per calendar year
//!    ([`chunk`]).
//! 2. Each sub-range becomes an openFDA search expression ([`query`]).
//! 3. The [`fetch`] module pages through the results under a record budget.
//! 4. Results are flattened ([`normalize`]) and upserted into the cache
//!    ([`sqlite_store`]), skipping identities already present.
//! 5. Readers load the cache with derived `year` / `is_supplement` columns
//!    and filter it ([`view`]).
//!
//! ## Quick Start
//!
//! ```bash
//! dw init
//! dw sync --from 2019-01-01 --to 2024-12-31 --brand Micra --product-code PNJ
//! dw stats
//! dw export --from-year 2022 --output data/approvals.json
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Fixed cache schema (idempotent) |
//! | [`fetch`] | Paginated openFDA fetcher and HTTP page source |
//! | [`sqlite_store`] | SQLite approval cache with anti-join upsert |
//! | [`ingest`] | Sync pipeline: plan → query → fetch → upsert |
//! | [`stats`] | Cache statistics |
//! | [`export`] | Filtered JSON export for dashboards |

pub mod config;
pub mod db;
pub mod export;
pub mod fetch;
pub mod ingest;
pub mod migrate;
pub mod sqlite_store;
pub mod stats;

pub use device_watch_core::{chunk, models, normalize, query, store, view};
pub use fetch::{FetchError, OpenFdaClient, PageFetcher, PageSource};
pub use models::{ApprovalRecord, CachedApproval, DateRange};
