//! URL handling module for Shoal
//!
//! This module provides URL canonicalization, host extraction and matching,
//! and classification of links that never lead to an article.

mod domain;
mod matcher;
mod normalize;

pub use domain::{extract_domain, strip_www};
pub use matcher::{host_matches, is_non_document_url, is_non_navigational_href};
pub use normalize::canonicalize_url;
