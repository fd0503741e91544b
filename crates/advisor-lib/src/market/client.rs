//! HTTP client for the data.gov.in mandi price resource
//!
//! Each query is a single GET bounded by a request timeout. Transport
//! failures and 5xx responses are retried with exponential backoff;
//! other failures surface immediately.

use super::PriceSource;
use crate::error::{AdvisorError, Result};
use crate::models::MarketRecord;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Configuration for the price source client
#[derive(Debug, Clone)]
pub struct PriceClientConfig {
    /// Base URL of the open data API (e.g., "https://api.data.gov.in")
    pub base_url: String,
    /// API key sent as the `api-key` query parameter
    pub api_key: String,
    /// Resource identifier of the daily commodity price dataset
    pub resource_id: String,
    /// Maximum records requested per query
    pub record_limit: u32,
    /// Timeout for a single attempt
    pub request_timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Backoff before the first retry
    pub initial_backoff: Duration,
    /// Upper bound for backoff between retries
    pub max_backoff: Duration,
}

impl Default for PriceClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.data.gov.in".to_string(),
            api_key: String::new(),
            resource_id: "9ef84268-d588-465a-a308-a864a43d0070".to_string(),
            record_limit: 100,
            request_timeout: Duration::from_secs(10),
            max_retries: 2,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
        }
    }
}

/// Response body of the open data API
#[derive(Debug, Deserialize)]
struct PriceResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    /// Absent when the body is not a result set at all
    #[serde(default)]
    records: Option<Vec<MarketRecord>>,
}

/// Outcome of one failed attempt
enum AttemptError {
    /// Worth retrying (transport error, 5xx)
    Transient(String),
    /// Final answer for this query
    Fatal(AdvisorError),
}

/// Price source backed by the data.gov.in REST API
pub struct DataGovClient {
    client: Client,
    endpoint: Url,
    config: PriceClientConfig,
}

impl DataGovClient {
    /// Create a new client
    pub fn new(config: PriceClientConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let mut endpoint = Url::parse(&config.base_url).context("Invalid price API URL")?;
        endpoint
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Price API URL cannot be a base: {}", config.base_url))?
            .pop_if_empty()
            .push("resource")
            .push(&config.resource_id);

        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    /// Full query URL for a location
    pub fn query_url(&self, state: &str, district: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("api-key", &self.config.api_key)
            .append_pair("format", "json")
            .append_pair("limit", &self.config.record_limit.to_string())
            .append_pair("filters[state]", state)
            .append_pair("filters[district]", district);
        url
    }

    async fn attempt(
        &self,
        url: &Url,
        state: &str,
        district: &str,
    ) -> std::result::Result<Vec<MarketRecord>, AttemptError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AttemptError::Transient("request timed out".to_string())
                } else {
                    AttemptError::Transient(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        if status.is_server_error() {
            return Err(AttemptError::Transient(format!("upstream returned {}", status)));
        }
        if !status.is_success() {
            return Err(AttemptError::Fatal(AdvisorError::SourceUnavailable(format!(
                "upstream returned {}",
                status
            ))));
        }

        let body: PriceResponse = response.json().await.map_err(|e| {
            AttemptError::Fatal(AdvisorError::SourceUnavailable(format!(
                "malformed response body: {}",
                e
            )))
        })?;

        if body.status.as_deref() == Some("error") {
            let message = body.message.unwrap_or_else(|| "unknown error".to_string());
            return Err(AttemptError::Fatal(AdvisorError::SourceUnavailable(message)));
        }

        let Some(records) = body.records else {
            return Err(AttemptError::Fatal(AdvisorError::SourceUnavailable(
                "response has no records".to_string(),
            )));
        };

        if records.is_empty() {
            return Err(AttemptError::Fatal(AdvisorError::NoData {
                state: state.to_string(),
                district: district.to_string(),
            }));
        }

        Ok(records)
    }
}

#[async_trait]
impl PriceSource for DataGovClient {
    async fn fetch_records(&self, state: &str, district: &str) -> Result<Vec<MarketRecord>> {
        let url = self.query_url(state, district);
        let mut backoff = self.config.initial_backoff;
        let mut attempt = 0;

        loop {
            match self.attempt(&url, state, district).await {
                Ok(records) => {
                    debug!(state, district, records = records.len(), "Fetched market records");
                    return Ok(records);
                }
                Err(AttemptError::Fatal(err)) => return Err(err),
                Err(AttemptError::Transient(reason)) => {
                    if attempt >= self.config.max_retries {
                        return Err(AdvisorError::SourceUnavailable(reason));
                    }
                    attempt += 1;
                    warn!(
                        state,
                        district,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        reason = %reason,
                        "Price source request failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = std::cmp::min(backoff * 2, self.config.max_backoff);
                }
            }
        }
    }
}
