//! TOML configuration parsing and validation.
//!
//! ```toml
//! [db]
//! path = "./data/dw.sqlite"
//!
//! [openfda]
//! endpoint = "https://api.fda.gov/device/pma.json"
//! page_size = 500
//! max_records = 5000
//! page_delay_ms = 200
//! timeout_secs = 30
//!
//! [watchlist]
//! brands = ["Micra", "Azure"]
//! product_codes = ["QTA"]
//!
//! [log]
//! level = "info"
//! ```
//!
//! The openFDA credential may be given as `openfda.api_key` or through the
//! `OPENFDA_API_KEY` environment variable; the variable wins when set.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Largest `limit` the openFDA API accepts for one page.
pub const OPENFDA_MAX_PAGE_SIZE: usize = 1000;

/// Environment variable consulted for the openFDA credential.
pub const API_KEY_ENV: &str = "OPENFDA_API_KEY";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub openfda: OpenFdaConfig,
    #[serde(default)]
    pub watchlist: WatchlistConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpenFdaConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_max_records")]
    pub max_records: usize,
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenFdaConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            page_size: default_page_size(),
            max_records: default_max_records(),
            page_delay_ms: default_page_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "https://api.fda.gov/device/pma.json".to_string()
}
fn default_page_size() -> usize {
    500
}
fn default_max_records() -> usize {
    5000
}
fn default_page_delay_ms() -> u64 {
    200
}
fn default_timeout_secs() -> u64 {
    30
}

impl OpenFdaConfig {
    /// The credential to send, or `""` for unauthenticated requests.
    pub fn credential(&self) -> String {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone())
            .unwrap_or_default()
    }
}

/// Default brand and product-code filters for `dw sync`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct WatchlistConfig {
    #[serde(default)]
    pub brands: Vec<String>,
    #[serde(default)]
    pub product_codes: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Defaults for running without a config file.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/dw.sqlite"),
            },
            openfda: OpenFdaConfig::default(),
            watchlist: WatchlistConfig::default(),
            log: LogConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let api = &self.openfda;
        if api.page_size == 0 {
            anyhow::bail!("openfda.page_size must be > 0");
        }
        if api.page_size > OPENFDA_MAX_PAGE_SIZE {
            anyhow::bail!(
                "openfda.page_size must be <= {} (got {})",
                OPENFDA_MAX_PAGE_SIZE,
                api.page_size
            );
        }
        if api.max_records == 0 {
            anyhow::bail!("openfda.max_records must be > 0");
        }
        if api.timeout_secs == 0 {
            anyhow::bail!("openfda.timeout_secs must be > 0");
        }
        if !(api.endpoint.starts_with("http://") || api.endpoint.starts_with("https://")) {
            anyhow::bail!(
                "openfda.endpoint must be an http(s) URL, got '{}'",
                api.endpoint
            );
        }
        Ok(())
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}
