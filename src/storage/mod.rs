//! Storage module for persisted articles
//!
//! The pipeline treats the store as an opaque collaborator: a fingerprint
//! lookup and an insert, each atomic on its own. This module provides the
//! trait plus a SQLite backend and an in-memory backend.

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::crawler::RawDocument;
use crate::dedup::ContentFingerprint;
use crate::url::canonicalize_url;
use chrono::{DateTime, Utc};

/// An article ready to be persisted
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub url: String,
    pub canonical_url: String,
    pub source: String,
    pub title: String,
    pub body: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub fingerprint: ContentFingerprint,
}

impl NewArticle {
    /// Builds a record from a fully parsed document and its fingerprint
    pub fn from_document(document: RawDocument, fingerprint: ContentFingerprint) -> Self {
        Self {
            canonical_url: canonicalize_url(&document.url),
            url: document.url,
            source: document.source,
            title: document.title,
            body: document.body,
            published_at: document.published_at,
            fingerprint,
        }
    }
}

/// Represents an article in the database
#[derive(Debug, Clone)]
pub struct ArticleRecord {
    pub id: i64,
    pub url: String,
    pub canonical_url: String,
    pub source: String,
    pub title: String,
    pub body: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub fingerprint: ContentFingerprint,
    pub stored_at: DateTime<Utc>,
}

/// Result of an insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written
    Inserted(i64),
    /// A row with the same fingerprint already existed; nothing changed
    AlreadyPresent,
}

/// Represents a recorded crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub duration_ms: u64,
    pub total_sources: u32,
    pub succeeded_sources: u32,
    pub failed_sources: u32,
    pub links_discovered: u64,
    pub new_documents: u64,
}
