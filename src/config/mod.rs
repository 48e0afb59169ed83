//! Configuration module for Shoal
//!
//! This module handles loading, parsing, and validating the TOML file that
//! holds crawler settings and the source registry.
//!
//! # Example
//!
//! ```no_run
//! use shoal::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("shoal.toml")).unwrap();
//! println!("{} sources configured", config.sources.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, OutputConfig, SelectorConfig, SourceConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
