//! In-memory storage implementation
//!
//! Holds everything in process memory. Used by tests and by runs that should
//! not persist anything.

use crate::crawler::CrawlSummary;
use crate::dedup::ContentFingerprint;
use crate::storage::traits::{Storage, StorageResult};
use crate::storage::{ArticleRecord, InsertOutcome, NewArticle, RunRecord};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};

/// HashMap-backed storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    articles: Vec<ArticleRecord>,
    by_fingerprint: HashMap<ContentFingerprint, usize>,
    runs: Vec<RunRecord>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored articles in insertion order
    pub fn articles(&self) -> &[ArticleRecord] {
        &self.articles
    }
}

impl Storage for MemoryStorage {
    fn find_by_fingerprint(
        &self,
        fingerprint: &ContentFingerprint,
    ) -> StorageResult<Option<ArticleRecord>> {
        Ok(self
            .by_fingerprint
            .get(fingerprint)
            .map(|&idx| self.articles[idx].clone()))
    }

    fn find_by_url(&self, canonical_url: &str) -> StorageResult<Option<ArticleRecord>> {
        Ok(self
            .articles
            .iter()
            .find(|a| a.canonical_url == canonical_url)
            .cloned())
    }

    fn insert_article(&mut self, article: &NewArticle) -> StorageResult<InsertOutcome> {
        if self.by_fingerprint.contains_key(&article.fingerprint) {
            return Ok(InsertOutcome::AlreadyPresent);
        }

        let id = self.articles.len() as i64 + 1;
        self.by_fingerprint
            .insert(article.fingerprint.clone(), self.articles.len());
        self.articles.push(ArticleRecord {
            id,
            url: article.url.clone(),
            canonical_url: article.canonical_url.clone(),
            source: article.source.clone(),
            title: article.title.clone(),
            body: article.body.clone(),
            published_at: article.published_at,
            fingerprint: article.fingerprint.clone(),
            stored_at: Utc::now(),
        });

        Ok(InsertOutcome::Inserted(id))
    }

    fn record_run(&mut self, summary: &CrawlSummary) -> StorageResult<i64> {
        let id = self.runs.len() as i64 + 1;
        self.runs.push(RunRecord {
            id,
            started_at: summary.started_at.to_rfc3339(),
            duration_ms: summary.duration.as_millis() as u64,
            total_sources: summary.total_sources as u32,
            succeeded_sources: summary.succeeded as u32,
            failed_sources: summary.failed as u32,
            links_discovered: summary.links_discovered as u64,
            new_documents: summary.new_documents as u64,
        });
        Ok(id)
    }

    fn latest_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>> {
        Ok(self.runs.iter().rev().take(limit).cloned().collect())
    }

    fn count_articles(&self) -> StorageResult<u64> {
        Ok(self.articles.len() as u64)
    }

    fn count_articles_by_source(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for article in &self.articles {
            *counts.entry(article.source.clone()).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }
}
