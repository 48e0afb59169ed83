//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::crawler::CrawlSummary;
use crate::dedup::ContentFingerprint;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageResult};
use crate::storage::{ArticleRecord, InsertOutcome, NewArticle, RunRecord};
use crate::ShoalError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const ARTICLE_COLUMNS: &str =
    "id, url, canonical_url, source, title, body, published_at, fingerprint, stored_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path` and ensures the schema exists
    pub fn new(path: &Path) -> Result<Self, ShoalError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, ShoalError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn find_article(&self, column: &str, value: &str) -> StorageResult<Option<ArticleRecord>> {
        let sql = format!(
            "SELECT {} FROM articles WHERE {} = ?1 ORDER BY id LIMIT 1",
            ARTICLE_COLUMNS, column
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let article = stmt.query_row(params![value], row_to_article).optional()?;
        Ok(article)
    }
}

fn parse_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn row_to_article(row: &Row<'_>) -> rusqlite::Result<ArticleRecord> {
    Ok(ArticleRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        canonical_url: row.get(2)?,
        source: row.get(3)?,
        title: row.get(4)?,
        body: row.get(5)?,
        published_at: parse_timestamp(row.get(6)?),
        fingerprint: ContentFingerprint::from_hex(row.get::<_, String>(7)?),
        stored_at: parse_timestamp(row.get(8)?).unwrap_or_else(Utc::now),
    })
}

impl Storage for SqliteStorage {
    fn find_by_fingerprint(
        &self,
        fingerprint: &ContentFingerprint,
    ) -> StorageResult<Option<ArticleRecord>> {
        self.find_article("fingerprint", fingerprint.as_str())
    }

    fn find_by_url(&self, canonical_url: &str) -> StorageResult<Option<ArticleRecord>> {
        self.find_article("canonical_url", canonical_url)
    }

    fn insert_article(&mut self, article: &NewArticle) -> StorageResult<InsertOutcome> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO articles
                (url, canonical_url, source, title, body, published_at, fingerprint, stored_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                article.url,
                article.canonical_url,
                article.source,
                article.title,
                article.body,
                article.published_at.map(|dt| dt.to_rfc3339()),
                article.fingerprint.as_str(),
                Utc::now().to_rfc3339(),
            ],
        )?;

        if changed == 0 {
            Ok(InsertOutcome::AlreadyPresent)
        } else {
            Ok(InsertOutcome::Inserted(self.conn.last_insert_rowid()))
        }
    }

    fn record_run(&mut self, summary: &CrawlSummary) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO runs
                (started_at, duration_ms, total_sources, succeeded_sources, failed_sources,
                 links_discovered, new_documents)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                summary.started_at.to_rfc3339(),
                summary.duration.as_millis() as i64,
                summary.total_sources as i64,
                summary.succeeded as i64,
                summary.failed as i64,
                summary.links_discovered as i64,
                summary.new_documents as i64,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn latest_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, duration_ms, total_sources, succeeded_sources, failed_sources,
                    links_discovered, new_documents
             FROM runs ORDER BY id DESC LIMIT ?1",
        )?;

        let runs = stmt
            .query_map(params![limit as i64], |row| {
                Ok(RunRecord {
                    id: row.get(0)?,
                    started_at: row.get(1)?,
                    duration_ms: row.get::<_, i64>(2)? as u64,
                    total_sources: row.get::<_, i64>(3)? as u32,
                    succeeded_sources: row.get::<_, i64>(4)? as u32,
                    failed_sources: row.get::<_, i64>(5)? as u32,
                    links_discovered: row.get::<_, i64>(6)? as u64,
                    new_documents: row.get::<_, i64>(7)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(runs)
    }

    fn count_articles(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_articles_by_source(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT source, COUNT(*) FROM articles GROUP BY source ORDER BY source")?;

        let counts = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }
}
