use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Main configuration structure for Shoal
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    /// The source registry, in declaration order
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Looks up a configured source by name
    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of sources crawled concurrently in one group
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between two groups of sources (milliseconds)
    #[serde(rename = "batch-delay", default = "default_batch_delay")]
    pub batch_delay: u64,

    /// Maximum number of article links processed per source per run
    #[serde(
        rename = "max-articles-per-source",
        default = "default_max_articles_per_source"
    )]
    pub max_articles_per_source: usize,

    /// Absolute timeout for a single request attempt (milliseconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Additional attempts after the first failed one
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay for linear retry backoff (milliseconds)
    #[serde(rename = "retry-base-delay", default = "default_retry_base_delay")]
    pub retry_base_delay: u64,

    /// Skip fetching links whose canonical URL is already stored
    #[serde(rename = "skip-known-urls", default = "default_true")]
    pub skip_known_urls: bool,

    /// Honor robots.txt for each source host
    #[serde(rename = "respect-robots", default = "default_true")]
    pub respect_robots: bool,

    /// Ceiling applied to a robots.txt Crawl-delay (milliseconds)
    #[serde(rename = "max-crawl-delay", default = "default_max_crawl_delay")]
    pub max_crawl_delay: u64,
}

impl CrawlerConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay)
    }

    pub fn max_crawl_delay(&self) -> Duration {
        Duration::from_millis(self.max_crawl_delay)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay: default_batch_delay(),
            max_articles_per_source: default_max_articles_per_source(),
            request_timeout: default_request_timeout(),
            max_retries: default_max_retries(),
            retry_base_delay: default_retry_base_delay(),
            skip_known_urls: true,
            respect_robots: true,
            max_crawl_delay: default_max_crawl_delay(),
        }
    }
}

fn default_batch_size() -> usize {
    3
}

fn default_batch_delay() -> u64 {
    2000
}

fn default_max_articles_per_source() -> usize {
    20
}

fn default_request_timeout() -> u64 {
    15_000
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_base_delay() -> u64 {
    1000
}

fn default_max_crawl_delay() -> u64 {
    30_000
}

fn default_true() -> bool {
    true
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the header value: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// A single content source
///
/// Behavior is identical for every source; only the listing URL, pacing and
/// selector strings vary.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Unique source name
    pub name: String,

    /// Listing page that links to the source's articles
    #[serde(rename = "listing-url")]
    pub listing_url: String,

    /// Minimum time between two requests to this source's host (milliseconds)
    #[serde(rename = "min-delay", default = "default_min_delay")]
    pub min_delay: u64,

    /// Elements removed from article pages before extraction
    #[serde(default)]
    pub strip: Vec<String>,

    /// Extra request headers sent with every request for this source
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    pub selectors: SelectorConfig,
}

impl SourceConfig {
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay)
    }

    /// Host of the listing URL, lowercased; the rate-limiting key for the source
    pub fn domain(&self) -> Option<String> {
        Url::parse(&self.listing_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
    }
}

fn default_min_delay() -> u64 {
    1000
}

/// Selector rules for a source. The list fields are tried in order.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    #[serde(rename = "article-links")]
    pub article_links: String,

    pub title: Vec<String>,

    pub body: Vec<String>,

    #[serde(default)]
    pub timestamp: Vec<String>,
}
