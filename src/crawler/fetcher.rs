//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests with retry and exponential backoff
//! - HEAD-based accessibility pre-checks
//! - Body size capping
//! - Best-effort robots.txt checks

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::robots::RobotsChecker;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Errors raised while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,
    pub status_code: u16,
    /// Content-Type header value, empty if absent
    pub content_type: String,
    /// Body text, truncated at the configured cap
    pub body: String,
}

/// Timeouts, retry and size limits applied by the [`Fetcher`]
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    pub fetch_timeout: Duration,
    pub access_timeout: Duration,
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub max_body_bytes: usize,
}

impl FetchPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
            access_timeout: Duration::from_secs(config.access_check_timeout_secs),
            max_attempts: config.max_attempts.max(1),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            max_body_bytes: config.max_body_bytes,
        }
    }

    /// Delay after failed attempt `attempt` (1-based): `base * 2^(attempt-1)`
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.backoff_base.saturating_mul(1u32 << exponent)
    }
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// Per-request timeouts are applied by the [`Fetcher`], not here.
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));

    Client::builder()
        .user_agent(config.user_agent_string())
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Page fetcher with retry, accessibility and robots checks
pub struct Fetcher {
    client: Client,
    policy: FetchPolicy,
    robots: RobotsChecker,
}

impl Fetcher {
    pub fn new(client: Client, policy: FetchPolicy) -> Self {
        let robots = RobotsChecker::new(client.clone(), policy.access_timeout);
        Self {
            client,
            policy,
            robots,
        }
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Fetches a URL, retrying failed attempts
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Transport error or timeout | retry |
    /// | HTTP 4xx / 5xx | retry |
    /// | Malformed URL | fail immediately |
    ///
    /// Attempt `n` is followed by a `backoff_base * 2^(n-1)` pause. After
    /// the last attempt the last observed error is returned.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let mut attempt = 1;
        loop {
            match self.fetch_once(&parsed).await {
                Ok(page) => return Ok(page),
                Err(e) if attempt >= self.policy.max_attempts => {
                    tracing::warn!("Giving up on {} after {} attempts: {}", url, attempt, e);
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.policy.backoff_for(attempt);
                    tracing::debug!(
                        "Attempt {} for {} failed ({}), retrying in {:?}",
                        attempt,
                        url,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn fetch_once(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let http_err = |source| FetchError::Http {
            url: url.to_string(),
            source,
        };

        let mut response = self
            .client
            .get(url.clone())
            .timeout(self.policy.fetch_timeout)
            .send()
            .await
            .map_err(http_err)?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let cap = self.policy.max_body_bytes;
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(http_err)? {
            let room = cap.saturating_sub(body.len());
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                tracing::debug!("Body of {} truncated at {} bytes", url, cap);
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(FetchedPage {
            url: final_url,
            status_code: status.as_u16(),
            content_type,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }

    /// Quick accessibility pre-check with the short timeout
    ///
    /// Sends a HEAD request, falling back to GET when the server answers
    /// 405. Any status >= 400 or transport error makes the URL inaccessible.
    pub async fn check_accessible(&self, url: &str) -> Result<(), FetchError> {
        let status = match self.probe(reqwest::Method::HEAD, url).await? {
            StatusCode::METHOD_NOT_ALLOWED => {
                tracing::trace!("HEAD not allowed for {}, retrying with GET", url);
                self.probe(reqwest::Method::GET, url).await?
            }
            status => status,
        };

        if status.as_u16() >= 400 {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    async fn probe(&self, method: reqwest::Method, url: &str) -> Result<StatusCode, FetchError> {
        self.client
            .request(method, url)
            .timeout(self.policy.access_timeout)
            .send()
            .await
            .map(|response| response.status())
            .map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })
    }

    /// Best-effort robots.txt check; failures count as "not disallowed"
    pub async fn robots_disallowed(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(parsed) => self.robots.is_disallowed(&parsed).await,
            Err(_) => false,
        }
    }
}
