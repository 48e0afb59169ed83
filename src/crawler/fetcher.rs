//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests under an absolute per-attempt timeout
//! - Error classification
//! - Linear-backoff retries for transient failures

use crate::config::{CrawlerConfig, UserAgentConfig};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Maximum redirect hops followed per request
const MAX_REDIRECTS: usize = 10;

/// Classified fetch failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("TIMEOUT after {timeout_ms}ms for {url}")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("HTTP_CLIENT_ERROR {status} for {url}")]
    ClientError { url: String, status: u16 },

    #[error("HTTP_RATE_LIMITED for {url}")]
    RateLimited { url: String },

    #[error("HTTP_SERVER_ERROR {status} for {url}")]
    ServerError { url: String, status: u16 },

    #[error("NETWORK_ERROR for {url}: {message}")]
    Network { url: String, message: String },
}

/// Failure class of a [`FetchError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    Timeout,
    HttpClientError,
    HttpRateLimited,
    HttpServerError,
    NetworkError,
}

impl FetchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "TIMEOUT",
            Self::HttpClientError => "HTTP_CLIENT_ERROR",
            Self::HttpRateLimited => "HTTP_RATE_LIMITED",
            Self::HttpServerError => "HTTP_SERVER_ERROR",
            Self::NetworkError => "NETWORK_ERROR",
        }
    }
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            Self::Timeout { .. } => FetchErrorKind::Timeout,
            Self::ClientError { .. } => FetchErrorKind::HttpClientError,
            Self::RateLimited { .. } => FetchErrorKind::HttpRateLimited,
            Self::ServerError { .. } => FetchErrorKind::HttpServerError,
            Self::Network { .. } => FetchErrorKind::NetworkError,
        }
    }

    /// Client errors (4xx other than 429) are terminal; everything else may
    /// succeed on a later attempt
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::ClientError { .. })
    }

    /// Maps a non-success status code to its failure class
    pub fn from_status(url: &str, status: StatusCode) -> Self {
        let url = url.to_string();
        if status == StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimited { url }
        } else if status.is_server_error() {
            Self::ServerError {
                url,
                status: status.as_u16(),
            }
        } else if status.is_client_error() {
            Self::ClientError {
                url,
                status: status.as_u16(),
            }
        } else {
            // 1xx or unfollowed 3xx: the response carries no usable body
            Self::Network {
                url,
                message: format!("unexpected status {}", status.as_u16()),
            }
        }
    }
}

/// Per-call fetch parameters
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Absolute timeout for one attempt, including reading the body
    pub timeout: Duration,
    /// Extra attempts after the first failure
    pub max_retries: u32,
    /// Backoff unit; attempt `n` is followed by a wait of `n * retry_base_delay`
    pub retry_base_delay: Duration,
    /// Lower bound on any retry wait: the host's pacing interval
    pub min_retry_delay: Duration,
    /// Extra request headers
    pub headers: BTreeMap<String, String>,
}

impl FetchOptions {
    /// Options derived from crawler settings, without extra headers
    pub fn from_crawler_config(config: &CrawlerConfig) -> Self {
        Self {
            timeout: config.request_timeout(),
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay(),
            min_retry_delay: Duration::ZERO,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_headers(mut self, headers: &BTreeMap<String, String>) -> Self {
        self.headers.extend(headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Retries never come sooner than `delay` after the failed attempt
    pub fn with_min_retry_delay(mut self, delay: Duration) -> Self {
        self.min_retry_delay = delay;
        self
    }

    /// No retries; used for best-effort requests such as robots.txt
    pub fn single_attempt(mut self) -> Self {
        self.max_retries = 0;
        self
    }
}

/// Wait after failed attempt number `attempt` (1-based): linear backoff
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * attempt
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use shoal::config::UserAgentConfig;
/// use shoal::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "Shoal".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Resilient fetcher: one shared client, classified errors, bounded retries
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetches `url` and returns the body text
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx | Return body |
    /// | 4xx except 429 | Fail immediately |
    /// | 429 | Retry |
    /// | 5xx | Retry |
    /// | Timeout | Retry |
    /// | Connection / other network error | Retry |
    ///
    /// At most `max_retries` extra attempts are made, waiting
    /// `retry_base_delay * attempt` (but at least `min_retry_delay`) after
    /// failed attempt `attempt`. When retries run out the last failure is
    /// returned.
    pub async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<String, FetchError> {
        let mut attempt: u32 = 1;
        loop {
            match self.attempt(url, options).await {
                Ok(body) => return Ok(body),
                Err(err) if !err.is_retryable() || attempt > options.max_retries => {
                    tracing::debug!(url = %url, attempt, error = %err, "Fetch failed");
                    return Err(err);
                }
                Err(err) => {
                    let delay = backoff_delay(options.retry_base_delay, attempt)
                        .max(options.min_retry_delay);
                    tracing::debug!(
                        url = %url,
                        attempt,
                        kind = err.kind().as_str(),
                        delay_ms = delay.as_millis() as u64,
                        "Retrying after transient failure"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(&self, url: &str, options: &FetchOptions) -> Result<String, FetchError> {
        let request = self
            .client
            .get(url)
            .headers(build_headers(&options.headers));

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                return Ok(Err(FetchError::from_status(url, status)));
            }
            let body = response.text().await?;
            Ok::<Result<String, FetchError>, reqwest::Error>(Ok(body))
        };

        match tokio::time::timeout(options.timeout, exchange).await {
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout_ms: options.timeout.as_millis() as u64,
            }),
            Ok(Err(e)) => Err(classify_reqwest_error(url, &e, options.timeout)),
            Ok(Ok(result)) => result,
        }
    }
}

fn build_headers(headers: &BTreeMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "Skipping invalid request header"),
        }
    }
    map
}

fn classify_reqwest_error(url: &str, error: &reqwest::Error, timeout: Duration) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }
    } else if let Some(status) = error.status() {
        FetchError::from_status(url, status)
    } else if error.is_connect() {
        FetchError::Network {
            url: url.to_string(),
            message: "connection failed".to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
