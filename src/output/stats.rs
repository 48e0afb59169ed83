//! Statistics generation from the article store
//!
//! This module provides functionality for extracting and displaying
//! stored article counts and recent run history.

use crate::storage::{RunRecord, Storage};
use crate::ShoalError;

/// Number of recent runs included in statistics
const RECENT_RUNS: usize = 5;

/// Store statistics summary
#[derive(Debug, Clone)]
pub struct StoreStatistics {
    /// Total number of stored articles
    pub total_articles: u64,

    /// Stored articles per source, sorted by source name
    pub articles_by_source: Vec<(String, u64)>,

    /// Most recent runs, newest first
    pub recent_runs: Vec<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(StoreStatistics)` - Successfully loaded statistics
/// * `Err(ShoalError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<StoreStatistics, ShoalError> {
    Ok(StoreStatistics {
        total_articles: storage.count_articles()?,
        articles_by_source: storage.count_articles_by_source()?,
        recent_runs: storage.latest_runs(RECENT_RUNS)?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Store Statistics ===\n");

    println!("Overview:");
    println!("  Total articles stored: {}", stats.total_articles);
    println!();

    if !stats.articles_by_source.is_empty() {
        println!("Articles by Source:");
        for (source, count) in &stats.articles_by_source {
            let percentage = if stats.total_articles > 0 {
                (*count as f64 / stats.total_articles as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", source, count, percentage);
        }
        println!();
    }

    if stats.recent_runs.is_empty() {
        println!("No crawl runs recorded yet");
        return;
    }

    println!("Recent Runs:");
    for run in &stats.recent_runs {
        println!(
            "  #{} {} - {}/{} sources ok, {} discovered, {} new ({:.1}s)",
            run.id,
            run.started_at,
            run.succeeded_sources,
            run.total_sources,
            run.links_discovered,
            run.new_documents,
            run.duration_ms as f64 / 1000.0
        );
    }
}
