//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Shoal database.

use rusqlite::Connection;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Ingested articles; the fingerprint is the dedup authority
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    canonical_url TEXT NOT NULL,
    source TEXT NOT NULL,
    title TEXT NOT NULL,
    body TEXT,
    published_at TEXT,
    fingerprint TEXT NOT NULL UNIQUE,
    stored_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_articles_canonical_url ON articles(canonical_url);
CREATE INDEX IF NOT EXISTS idx_articles_source ON articles(source);

-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    duration_ms INTEGER NOT NULL,
    total_sources INTEGER NOT NULL,
    succeeded_sources INTEGER NOT NULL,
    failed_sources INTEGER NOT NULL,
    links_discovered INTEGER NOT NULL,
    new_documents INTEGER NOT NULL
);
"#;

/// Creates all tables and indexes if they do not exist yet
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
