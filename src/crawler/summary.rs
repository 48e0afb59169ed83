//! Per-source and per-run crawl outcomes

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Outcome of crawling one source
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlResult {
    pub source: String,
    /// False when the listing could not be fetched, yielded no links, or
    /// every attempted document fetch failed
    pub success: bool,
    /// Links extracted from the listing, before the per-source cap
    pub links_discovered: usize,
    /// Document pages fetched successfully
    pub documents_fetched: usize,
    /// Documents newly persisted this run
    pub new_documents: usize,
    /// Fetched documents whose fingerprint was already stored
    pub duplicates: usize,
    /// Links not fetched because their canonical URL was already stored
    pub skipped: usize,
    /// Per-document and source-level errors, `"<url>: <error>"`
    pub errors: Vec<String>,
    pub duration: Duration,
}

impl CrawlResult {
    /// A failed result carrying a single source-level error
    pub fn failed(source: &str, error: String, duration: Duration) -> Self {
        Self {
            source: source.to_string(),
            success: false,
            links_discovered: 0,
            documents_fetched: 0,
            new_documents: 0,
            duplicates: 0,
            skipped: 0,
            errors: vec![error],
            duration,
        }
    }
}

/// Aggregate of all per-source results of one run
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration of the whole run
    pub duration: Duration,
    pub results: Vec<CrawlResult>,
    pub total_sources: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub links_discovered: usize,
    pub documents_fetched: usize,
    pub new_documents: usize,
    pub duplicates: usize,
}

impl CrawlSummary {
    pub fn from_results(
        started_at: DateTime<Utc>,
        results: Vec<CrawlResult>,
        duration: Duration,
    ) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();

        Self {
            started_at,
            duration,
            total_sources: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            links_discovered: results.iter().map(|r| r.links_discovered).sum(),
            documents_fetched: results.iter().map(|r| r.documents_fetched).sum(),
            new_documents: results.iter().map(|r| r.new_documents).sum(),
            duplicates: results.iter().map(|r| r.duplicates).sum(),
            results,
        }
    }

    /// Result for a named source, if it was part of the run
    pub fn result(&self, source: &str) -> Option<&CrawlResult> {
        self.results.iter().find(|r| r.source == source)
    }
}
