//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::crawler::CrawlSummary;
use crate::dedup::ContentFingerprint;
use crate::storage::{ArticleRecord, InsertOutcome, NewArticle, RunRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Inserts must be idempotent: inserting an article whose fingerprint is
/// already present leaves the store unchanged and reports
/// [`InsertOutcome::AlreadyPresent`].
pub trait Storage {
    // ===== Articles =====

    /// Looks up a stored article by content fingerprint
    fn find_by_fingerprint(
        &self,
        fingerprint: &ContentFingerprint,
    ) -> StorageResult<Option<ArticleRecord>>;

    /// Looks up a stored article by canonical URL
    fn find_by_url(&self, canonical_url: &str) -> StorageResult<Option<ArticleRecord>>;

    /// Persists an article
    fn insert_article(&mut self, article: &NewArticle) -> StorageResult<InsertOutcome>;

    // ===== Runs =====

    /// Records the outcome of a completed crawl run
    fn record_run(&mut self, summary: &CrawlSummary) -> StorageResult<i64>;

    /// Gets the most recent runs, newest first
    fn latest_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>>;

    // ===== Statistics =====

    /// Counts all stored articles
    fn count_articles(&self) -> StorageResult<u64>;

    /// Counts stored articles per source, sorted by source name
    fn count_articles_by_source(&self) -> StorageResult<Vec<(String, u64)>>;
}
