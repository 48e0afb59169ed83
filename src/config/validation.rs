use crate::config::types::{Config, CrawlerConfig, SourceConfig, UserAgentConfig};
use crate::ConfigError;
use scraper::Selector;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;

    if config.output.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    validate_sources(&config.sources)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 || config.batch_size > 50 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be between 1 and 50, got {}",
            config.batch_size
        )));
    }

    if config.max_articles_per_source < 1 {
        return Err(ConfigError::Validation(
            "max_articles_per_source must be >= 1".to_string(),
        ));
    }

    if config.request_timeout < 100 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be >= 100ms, got {}ms",
            config.request_timeout
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    if !config.contact_email.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            config.contact_email
        )));
    }

    Ok(())
}

/// Validates the source registry
fn validate_sources(sources: &[SourceConfig]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();

    for source in sources {
        if source.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source name cannot be empty".to_string(),
            ));
        }

        if !names.insert(source.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source name '{}'",
                source.name
            )));
        }

        validate_listing_url(source)?;

        if source.selectors.title.is_empty() {
            return Err(ConfigError::Validation(format!(
                "source '{}' must define at least one title selector",
                source.name
            )));
        }

        if source.selectors.body.is_empty() {
            return Err(ConfigError::Validation(format!(
                "source '{}' must define at least one body selector",
                source.name
            )));
        }

        let all_selectors = std::iter::once(&source.selectors.article_links)
            .chain(&source.selectors.title)
            .chain(&source.selectors.body)
            .chain(&source.selectors.timestamp)
            .chain(&source.strip);

        for selector in all_selectors {
            if Selector::parse(selector).is_err() {
                return Err(ConfigError::InvalidSelector {
                    source_name: source.name.clone(),
                    selector: selector.clone(),
                });
            }
        }
    }

    Ok(())
}

fn validate_listing_url(source: &SourceConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&source.listing_url).map_err(|e| {
        ConfigError::InvalidUrl(format!(
            "Invalid listing URL '{}' for source '{}': {}",
            source.listing_url, source.name, e
        ))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Listing URL '{}' must use http or https",
            source.listing_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Listing URL '{}' has no host",
            source.listing_url
        )));
    }

    Ok(())
}
