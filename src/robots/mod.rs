//! Robots.txt handling module
//!
//! Rules are fetched once per host and cached; entries older than 24 hours
//! are refetched.

mod parser;

pub use parser::RobotsRules;

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use url::Url;

/// Cached robots.txt rules for a host
#[derive(Debug, Clone)]
pub struct CachedRobots {
    pub rules: RobotsRules,
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    pub fn new(rules: RobotsRules) -> Self {
        Self {
            rules,
            fetched_at: Utc::now(),
        }
    }

    /// Checks if the cached robots.txt is older than 24 hours
    pub fn is_stale(&self) -> bool {
        Utc::now() - self.fetched_at > Duration::hours(24)
    }
}

/// Per-host robots.txt cache shared by concurrent source crawls
#[derive(Debug, Default)]
pub struct RobotsCache {
    entries: Mutex<HashMap<String, CachedRobots>>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns fresh cached rules for `host`, if any
    pub async fn get(&self, host: &str) -> Option<RobotsRules> {
        let entries = self.entries.lock().await;
        entries
            .get(host)
            .filter(|cached| !cached.is_stale())
            .map(|cached| cached.rules.clone())
    }

    pub async fn insert(&self, host: &str, rules: RobotsRules) {
        let mut entries = self.entries.lock().await;
        entries.insert(host.to_string(), CachedRobots::new(rules));
    }
}

/// The robots.txt URL for the origin of `url`
pub fn robots_url(url: &Url) -> Option<Url> {
    url.join("/robots.txt").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cache_entry_not_stale() {
        let cached = CachedRobots::new(RobotsRules::allow_all());
        assert!(!cached.is_stale());
    }

    #[test]
    fn test_cache_entry_stale_after_a_day() {
        let mut cached = CachedRobots::new(RobotsRules::allow_all());
        cached.fetched_at = Utc::now() - Duration::hours(25);
        assert!(cached.is_stale());

        cached.fetched_at = Utc::now() - Duration::hours(23);
        assert!(!cached.is_stale());
    }

    #[tokio::test]
    async fn test_cache_get_and_insert() {
        let cache = RobotsCache::new();
        assert!(cache.get("example.com").await.is_none());

        cache
            .insert("example.com", RobotsRules::from_content("User-agent: *\nDisallow: /x"))
            .await;

        let rules = cache.get("example.com").await.unwrap();
        assert!(!rules.is_allowed("https://example.com/x", "TestBot"));
        assert!(cache.get("other.com").await.is_none());
    }

    #[test]
    fn test_robots_url() {
        let url = Url::parse("https://news.example.com/markets/today?x=1").unwrap();
        assert_eq!(
            robots_url(&url).unwrap().as_str(),
            "https://news.example.com/robots.txt"
        );
    }
}
