//! HTTP downloader implementation
//!
//! This module handles all page and resource requests for the crawler, including:
//! - Building HTTP clients with the crawler's user agent and timeout
//! - Robots.txt enforcement before any request is made
//! - Retry logic with linear backoff for transient failures
//! - Error classification (degradable vs fatal)

use crate::config::HttpConfig;
use crate::robots::RobotsPolicy;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors returned by [`Downloader::download`]
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("URL disallowed by robots.txt: {url}")]
    Disallowed { url: String },

    #[error("Giving up on {url} after {attempts} attempts (last failure: {last_failure})")]
    TooManyAttempts {
        url: String,
        attempts: u32,
        last_failure: String,
    },

    #[error("Failed to read response body of {url}: {source}")]
    Body { url: String, source: reqwest::Error },
}

impl DownloadError {
    /// Returns true if the crawl may continue past this failure
    ///
    /// Exhausted retries and robots denials leave a hole in the mirror; everything else
    /// aborts the crawl.
    pub fn is_degradable(&self) -> bool {
        matches!(self, Self::Disallowed { .. } | Self::TooManyAttempts { .. })
    }
}

/// A successfully downloaded resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Downloaded {
    /// Full response body
    pub body: Vec<u8>,

    /// Value of the Content-Type header (empty if absent)
    pub content_type: String,
}

impl Downloaded {
    /// Empty content, saved in place of a resource that could not be downloaded
    pub fn empty() -> Self {
        Self::default()
    }
}

/// How often and how patiently a download is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,

    /// Delay unit; the wait after attempt `n` is `n * backoff_step`
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Builds a retry policy from the HTTP configuration
    pub fn from_config(config: &HttpConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff_step: Duration::from_millis(config.backoff_step_ms),
        }
    }

    /// Delay before the attempt following attempt number `attempt` (1-based)
    ///
    /// Backoff is linear: 1, 2, 3... steps.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP configuration (user agent and per-request timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use site_mirror::config::HttpConfig;
/// use site_mirror::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches single resources, honoring robots.txt and retrying transient failures
pub struct Downloader {
    client: Client,
    robots: Arc<RobotsPolicy>,
    user_agent: String,
    retry: RetryPolicy,
}

impl Downloader {
    /// Creates a new downloader
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client; its timeout bounds every attempt
    /// * `robots` - The crawled domain's robots policy
    /// * `user_agent` - Token looked up in the robots policy
    /// * `retry` - Attempt cap and backoff
    pub fn new(
        client: Client,
        robots: Arc<RobotsPolicy>,
        user_agent: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            robots,
            user_agent: user_agent.into(),
            retry,
        }
    }

    /// Downloads a URL
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Disallowed by robots.txt (when enforced) | Immediate → `Disallowed`, no request |
    /// | HTTP 200 | Return body and Content-Type |
    /// | Any other status | Retry after `attempt × step` |
    /// | Timeout, DNS or connection failure | Retry after `attempt × step` |
    /// | Attempts exhausted | `TooManyAttempts` |
    /// | Body read failure on 200 | `Body` |
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to fetch
    /// * `enforce_robots` - Whether to consult the robots policy first
    pub async fn download(&self, url: &Url, enforce_robots: bool) -> Result<Downloaded, DownloadError> {
        if enforce_robots && !self.robots.is_allowed(&self.user_agent, url) {
            tracing::info!("URL {} disallowed by robots.txt", url);
            return Err(DownloadError::Disallowed {
                url: url.to_string(),
            });
        }

        let max_attempts = self.retry.max_attempts.max(1);
        let mut last_failure = String::new();

        for attempt in 1..=max_attempts {
            tracing::info!("Downloading {}, attempt {}/{}", url, attempt, max_attempts);

            match self.client.get(url.clone()).send().await {
                Ok(response) if response.status() == StatusCode::OK => {
                    let content_type = response
                        .headers()
                        .get(CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();

                    let body = response.bytes().await.map_err(|source| DownloadError::Body {
                        url: url.to_string(),
                        source,
                    })?;

                    return Ok(Downloaded {
                        body: body.to_vec(),
                        content_type,
                    });
                }
                Ok(response) => {
                    // Dropping the response releases the connection
                    last_failure = format!("HTTP {}", response.status().as_u16());
                }
                Err(e) => {
                    last_failure = classify_transport_error(&e);
                }
            }

            tracing::debug!("Attempt {} for {} failed: {}", attempt, url, last_failure);

            if attempt < max_attempts {
                tokio::time::sleep(self.retry.delay_after(attempt)).await;
            }
        }

        tracing::warn!(
            "Can't download {} after {} attempts, last failure: {}",
            url,
            max_attempts,
            last_failure
        );

        Err(DownloadError::TooManyAttempts {
            url: url.to_string(),
            attempts: max_attempts,
            last_failure,
        })
    }
}

fn classify_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection failed".to_string()
    } else {
        e.to_string()
    }
}
