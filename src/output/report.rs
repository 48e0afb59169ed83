//! Run summary rendering
//!
//! Formats a [`CrawlSummary`] as a plain-text report: one block per source
//! followed by run totals.

use crate::crawler::CrawlSummary;

/// Maximum number of errors listed per source
const MAX_ERRORS_SHOWN: usize = 5;

/// Formats a crawl summary as text
///
/// # Arguments
///
/// * `summary` - The crawl summary data
///
/// # Returns
///
/// A formatted report string
pub fn format_summary(summary: &CrawlSummary) -> String {
    let mut out = String::new();

    out.push_str("=== Crawl Summary ===\n\n");
    out.push_str(&format!("Started: {}\n", summary.started_at.to_rfc3339()));
    out.push_str(&format!(
        "Duration: {:.1}s\n\n",
        summary.duration.as_secs_f64()
    ));

    for result in &summary.results {
        let status = if result.success { "ok" } else { "FAILED" };
        out.push_str(&format!("[{}] {}\n", status, result.source));
        out.push_str(&format!(
            "  discovered: {}, fetched: {}, new: {}, duplicates: {}, skipped: {} ({:.1}s)\n",
            result.links_discovered,
            result.documents_fetched,
            result.new_documents,
            result.duplicates,
            result.skipped,
            result.duration.as_secs_f64()
        ));

        for error in result.errors.iter().take(MAX_ERRORS_SHOWN) {
            out.push_str(&format!("  ! {}\n", error));
        }
        if result.errors.len() > MAX_ERRORS_SHOWN {
            out.push_str(&format!(
                "  ... and {} more errors\n",
                result.errors.len() - MAX_ERRORS_SHOWN
            ));
        }
    }

    out.push('\n');
    out.push_str(&format!(
        "Sources: {} total, {} succeeded, {} failed\n",
        summary.total_sources, summary.succeeded, summary.failed
    ));
    out.push_str(&format!(
        "Documents: {} discovered, {} fetched, {} new, {} duplicates\n",
        summary.links_discovered,
        summary.documents_fetched,
        summary.new_documents,
        summary.duplicates
    ));

    out
}

/// Prints a crawl summary to stdout
pub fn print_summary(summary: &CrawlSummary) {
    print!("{}", format_summary(summary));
}
