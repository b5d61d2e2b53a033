//! Paginated openFDA fetcher.
//!
//! [`PageFetcher`] walks a search expression's result set page by page
//! through a [`PageSource`], the seam between pagination policy and HTTP.
//! [`OpenFdaClient`] is the production source; tests substitute scripted
//! sources.
//!
//! # Pagination
//!
//! - Page *n* requests `limit = page_size` at `skip = n × page_size`.
//! - The loop ends on the first empty page, or once the accumulated record
//!   count reaches `max_records`. The budget is checked after a whole page
//!   is appended, so the result may exceed `max_records` by up to one page.
//! - A fixed delay separates consecutive requests to stay under the
//!   service's rate limits. No delay follows the final request.
//!
//! # Failure
//!
//! Any non-success status aborts the whole fetch with
//! [`FetchError::Status`]; records from earlier pages are discarded rather
//! than returned as a silently short result.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use device_watch_core::models::ApprovalRecord;
use device_watch_core::query::SearchExpression;

use crate::config::OpenFdaConfig;

/// Maximum number of response-body characters kept in a [`FetchError::Status`].
const SNIPPET_CHARS: usize = 300;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("openFDA error: HTTP {status} | {snippet}")]
    Status { status: u16, snippet: String },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("invalid openFDA response: {0}")]
    Decode(String),
}

/// Parameters for one page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest<'a> {
    pub search: &'a str,
    pub limit: usize,
    pub skip: usize,
    /// Present only when a non-empty credential was supplied.
    pub api_key: Option<&'a str>,
}

/// A paged result source. Returns the raw `results` objects of one page.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Vec<Value>, FetchError>;
}

/// Pagination loop over a [`PageSource`].
pub struct PageFetcher<S> {
    source: S,
    page_delay: Duration,
}

impl<S: PageSource> PageFetcher<S> {
    pub fn new(source: S, page_delay: Duration) -> Self {
        Self { source, page_delay }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch every record matching `search`, up to the page on which the
    /// accumulated count reaches `max_records`. Order follows the remote
    /// service.
    ///
    /// A `page_size` of zero requests nothing and returns an empty result
    /// without contacting the source.
    pub async fn fetch(
        &self,
        search: &SearchExpression,
        credential: &str,
        max_records: usize,
        page_size: usize,
    ) -> Result<Vec<ApprovalRecord>, FetchError> {
        if page_size == 0 {
            tracing::warn!("page size is zero, nothing to fetch");
            return Ok(Vec::new());
        }

        let api_key = (!credential.is_empty()).then_some(credential);
        let mut rows: Vec<Value> = Vec::new();
        let mut skip = 0usize;

        loop {
            let request = PageRequest {
                search: search.as_str(),
                limit: page_size,
                skip,
                api_key,
            };
            tracing::debug!(skip, limit = page_size, "requesting openFDA page");

            let page = match self.source.fetch_page(&request).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(skip, error = %e, "openFDA page request failed");
                    return Err(e);
                }
            };
            if page.is_empty() {
                break;
            }

            rows.extend(page);
            skip += page_size;

            if rows.len() >= max_records {
                tracing::debug!(
                    fetched = rows.len(),
                    max_records,
                    "record budget reached"
                );
                break;
            }

            if !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
        }

        Ok(rows.iter().map(ApprovalRecord::from_json).collect())
    }
}

/// HTTP [`PageSource`] for the openFDA device PMA endpoint.
pub struct OpenFdaClient {
    client: reqwest::Client,
    endpoint: String,
}

impl OpenFdaClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &OpenFdaConfig) -> Result<Self, FetchError> {
        Self::new(
            config.endpoint.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PageSource for OpenFdaClient {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Vec<Value>, FetchError> {
        let mut params: Vec<(&str, String)> = vec![
            ("search", request.search.to_string()),
            ("limit", request.limit.to_string()),
            ("skip", request.skip.to_string()),
        ];
        if let Some(key) = request.api_key {
            params.push(("api_key", key.to_string()));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                snippet: body.chars().take(SNIPPET_CHARS).collect(),
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        parse_results(payload)
    }
}

/// Extract the `results` array of a response body. A body without
/// `results` is an empty page.
fn parse_results(payload: Value) -> Result<Vec<Value>, FetchError> {
    let Value::Object(mut body) = payload else {
        return Err(FetchError::Decode("body is not a JSON object".to_string()));
    };
    match body.remove("results") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(results)) => Ok(results),
        Some(_) => Err(FetchError::Decode("`results` is not an array".to_string())),
    }
}
