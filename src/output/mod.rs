//! Output module for crawl reports
//!
//! This module handles:
//! - Rendering the summary of a finished run
//! - Reporting stored article counts and run history

mod report;
pub mod stats;

pub use report::{format_summary, print_summary};
pub use stats::{load_statistics, print_statistics, StoreStatistics};
