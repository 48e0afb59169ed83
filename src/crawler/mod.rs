//! Crawler module: fetching, parsing and orchestration
//!
//! This module contains the core crawling logic, including:
//! - Per-domain request pacing
//! - HTTP fetching with classified errors and retries
//! - Listing and article page extraction
//! - Grouped, per-source crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod rate_limiter;
mod summary;
mod timestamp;

pub use coordinator::Coordinator;
pub use fetcher::{
    backoff_delay, build_http_client, FetchError, FetchErrorKind, FetchOptions, Fetcher,
};
pub use parser::{extract_document, extract_links, normalize_whitespace, ParseError, RawDocument};
pub use rate_limiter::DomainRateLimiter;
pub use summary::{CrawlResult, CrawlSummary};
pub use timestamp::{parse_date_text, parse_datetime_attr, parse_localized_date, scan_iso_date};
