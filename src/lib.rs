//! Shoal: a multi-source article harvester
//!
//! This crate crawls declaratively configured content sources, fetches their
//! article pages under per-domain pacing, extracts structured fields from the
//! markup, and filters out content that has already been ingested.

pub mod config;
pub mod crawler;
pub mod dedup;
pub mod output;
pub mod robots;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Shoal operations
#[derive(Debug, Error)]
pub enum ShoalError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("{0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("{0}")]
    Parse(#[from] crawler::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown source: {0}")]
    UnknownSource(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector in source '{source_name}': {selector}")]
    InvalidSelector {
        source_name: String,
        selector: String,
    },
}

/// Result type alias for Shoal operations
pub type Result<T> = std::result::Result<T, ShoalError>;

// Re-export commonly used types
pub use config::{Config, SourceConfig};
pub use crawler::{Coordinator, CrawlResult, CrawlSummary, DomainRateLimiter};
pub use dedup::{fingerprint, ContentFingerprint};
pub use url::canonicalize_url;
