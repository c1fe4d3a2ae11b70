//! HTTP page fetcher
//!
//! This module handles all HTTP requests made during a harvest, including:
//! - Building the HTTP client with the configured identification header
//! - Appending the pagination cursor to a source URL
//! - Retrying transient failures with linear backoff
//! - Classifying failures

use crate::catalog::CatalogPage;
use crate::config::FetcherConfig;
use crate::HarvestError;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Query parameter carrying the pagination cursor
pub const CURSOR_PARAM: &str = "Cursor";

/// Why a single attempt failed
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP {0}")]
    Status(StatusCode),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed body: {0}")]
    Body(String),
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetcher configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.timeout())
        .connect_timeout(Duration::from_secs(10).min(config.timeout()))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Builds the URL of a page: the base URL, plus the cursor when there is one
pub fn page_url(base_url: &str, cursor: Option<&str>) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base_url)?;
    if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
        url.query_pairs_mut().append_pair(CURSOR_PARAM, cursor);
    }
    Ok(url)
}

/// Delay before the attempt following failed attempt number `attempt`
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * attempt
}

/// Fetches catalog pages with bounded retry
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Non-2xx status | Retry |
/// | Timeout | Retry |
/// | Connection / transport error | Retry |
/// | Body is not a catalog page | Retry |
///
/// Attempt `n` failing waits `n * retry_base_delay` before the next one.
/// After `max_attempts` failures the fetch gives up with
/// `HarvestError::Network` carrying the last cause.
pub struct PageFetcher {
    client: Client,
    max_attempts: u32,
    retry_base_delay: Duration,
}

impl PageFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(
            build_http_client(config)?,
            config.max_attempts,
            config.retry_base_delay(),
        ))
    }

    pub fn with_client(client: Client, max_attempts: u32, retry_base_delay: Duration) -> Self {
        Self {
            client,
            max_attempts: max_attempts.max(1),
            retry_base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Fetches and parses one page, retrying transient failures
    pub async fn fetch_page(&self, url: &Url) -> Result<CatalogPage, HarvestError> {
        let mut attempt = 1;

        loop {
            match self.try_fetch(url).await {
                Ok(page) => {
                    tracing::debug!(
                        "Fetched {} ({} entries, attempt {})",
                        url,
                        page.entries().len(),
                        attempt
                    );
                    return Ok(page);
                }
                Err(failure) if attempt < self.max_attempts => {
                    let delay = backoff_delay(self.retry_base_delay, attempt);
                    tracing::warn!(
                        "Fetch of {} failed ({}), retrying in {:?} (attempt {}/{})",
                        url,
                        failure,
                        delay,
                        attempt,
                        self.max_attempts
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(failure) => {
                    return Err(HarvestError::Network {
                        url: url.to_string(),
                        attempts: attempt,
                        cause: failure.to_string(),
                    });
                }
            }
        }
    }

    /// One GET, no retry
    async fn try_fetch(&self, url: &Url) -> Result<CatalogPage, FetchFailure> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status));
        }

        let body = response.bytes().await.map_err(classify_error)?;
        serde_json::from_slice(&body).map_err(|e| FetchFailure::Body(e.to_string()))
    }
}

fn classify_error(e: reqwest::Error) -> FetchFailure {
    if e.is_timeout() {
        FetchFailure::Timeout
    } else if e.is_connect() {
        FetchFailure::Transport("connection refused".to_string())
    } else {
        FetchFailure::Transport(e.to_string())
    }
}
