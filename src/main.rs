//! # Device Watch CLI (`dw`)
//!
//! ## Usage
//!
//! ```bash
//! dw --config ./config/dw.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dw init` | Create the SQLite cache and its schema |
//! | `dw sync --from <date> --to <date>` | Fetch approvals from openFDA into the cache |
//! | `dw stats` | Summarize what is cached |
//! | `dw export` | Write the filtered cache view as JSON |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use device_watch::config;
use device_watch::export;
use device_watch::ingest::{self, SyncArgs};
use device_watch::migrate;
use device_watch::stats;
use device_watch::view::ViewFilter;

/// Device Watch CLI: a local-first ingestion cache for openFDA device
/// premarket approvals.
#[derive(Parser)]
#[command(
    name = "dw",
    about = "Device Watch: cache openFDA premarket approvals for regulatory dashboards",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/dw.toml`. If the file does not exist, built-in
    /// defaults are used and the cache lives at `./data/dw.sqlite`.
    #[arg(long, global = true, default_value = "./config/dw.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the cache database.
    ///
    /// Creates the SQLite file and the `approvals` table. Idempotent.
    Init,

    /// Fetch approvals for a date range into the cache.
    ///
    /// The range is split into one query per calendar year. Rows already
    /// cached (same PMA number, supplement number and decision date) are
    /// skipped.
    Sync {
        /// First decision date to include (YYYY-MM-DD).
        #[arg(long)]
        from: String,

        /// Last decision date to include (YYYY-MM-DD).
        #[arg(long)]
        to: String,

        /// Trade-name term to match. Repeatable; defaults to `[watchlist].brands`.
        #[arg(long = "brand")]
        brands: Vec<String>,

        /// Product code to match. Repeatable; defaults to `[watchlist].product_codes`.
        #[arg(long = "product-code")]
        product_codes: Vec<String>,

        /// Record budget per year chunk.
        #[arg(long)]
        max_records: Option<usize>,

        /// Records requested per page (1-1000).
        #[arg(long)]
        page_size: Option<usize>,

        /// Print the chunk plan and search expressions without fetching.
        #[arg(long)]
        dry_run: bool,
    },

    /// Show cache statistics.
    Stats,

    /// Export the cached view as JSON.
    Export {
        /// Earliest decision year to include.
        #[arg(long)]
        from_year: Option<i32>,

        /// Latest decision year to include.
        #[arg(long)]
        to_year: Option<i32>,

        /// Include supplements (rows with a supplement number).
        #[arg(long)]
        include_supplements: bool,

        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        config::Config::minimal()
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.log.level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Cache initialized at {}", cfg.db.path.display());
        }
        Commands::Sync {
            from,
            to,
            brands,
            product_codes,
            max_records,
            page_size,
            dry_run,
        } => {
            let args = SyncArgs {
                from,
                to,
                brands,
                product_codes,
                max_records,
                page_size,
                dry_run,
            };
            ingest::run_sync(&cfg, &args).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Export {
            from_year,
            to_year,
            include_supplements,
            output,
        } => {
            let view = ViewFilter {
                from_year,
                to_year,
                include_supplements,
            };
            export::run_export(&cfg, &view, output.as_deref()).await?;
        }
    }

    Ok(())
}
