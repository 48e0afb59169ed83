//! Robots.txt rules
//!
//! Allow/Disallow matching is delegated to the robotstxt crate; Crawl-delay
//! is parsed here since the matcher does not expose it.

use robotstxt::DefaultMatcher;
use std::time::Duration;

/// Rules from one robots.txt file
#[derive(Debug, Clone)]
pub struct RobotsRules {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
}

impl RobotsRules {
    /// Creates rules from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Rules that allow everything; used when robots.txt is missing or
    /// cannot be fetched
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
        }
    }

    /// Checks if an absolute URL may be fetched by `user_agent`
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Crawl-delay for `user_agent`, preferring a group that names the agent
    /// over the `*` group
    ///
    /// Values too large for a `Duration` are ignored. Callers cap the result
    /// at their own ceiling.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        let agent = user_agent.to_lowercase();
        let mut group_agents: Vec<String> = Vec::new();
        let mut in_agent_lines = false;
        let mut specific: Option<Duration> = None;
        let mut wildcard: Option<Duration> = None;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            if key == "user-agent" {
                if !in_agent_lines {
                    group_agents.clear();
                }
                group_agents.push(value.to_lowercase());
                in_agent_lines = true;
                continue;
            }
            in_agent_lines = false;

            if key != "crawl-delay" {
                continue;
            }
            let Some(delay) = value
                .parse::<f64>()
                .ok()
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            else {
                continue;
            };

            if group_agents.iter().any(|ua| ua != "*" && agent.contains(ua.as_str())) {
                specific = Some(delay);
            } else if group_agents.iter().any(|ua| ua == "*") {
                wildcard = Some(delay);
            }
        }

        specific.or(wildcard)
    }
}
