//! Crawler coordinator - main crawl orchestration logic
//!
//! Sources are crawled in fixed-size groups: every source in a group runs
//! concurrently, the group is awaited, and the next group starts after the
//! configured delay. Within one source everything is sequential, one link at
//! a time:
//!
//! listing → links → (rate-limit → fetch → parse → fingerprint → dedup → store)*
//!
//! Document-level failures are recorded in the source's [`CrawlResult`] and
//! never stop the source; source-level failures never stop the run.

use crate::config::{Config, CrawlerConfig, SourceConfig};
use crate::crawler::fetcher::{build_http_client, FetchOptions, Fetcher};
use crate::crawler::parser::{extract_document, extract_links};
use crate::crawler::rate_limiter::DomainRateLimiter;
use crate::crawler::summary::{CrawlResult, CrawlSummary};
use crate::dedup::{fingerprint, is_duplicate};
use crate::robots::{robots_url, RobotsCache, RobotsRules};
use crate::storage::{InsertOutcome, NewArticle, Storage, StorageError, StorageResult};
use crate::url::canonicalize_url;
use crate::ShoalError;
use chrono::Utc;
use futures::future::join_all;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use url::Url;

/// What happened to one fetched document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ingested {
    New,
    Duplicate,
}

/// Main crawler coordinator structure
///
/// The rate limiter is injected so one instance can be shared by several
/// coordinators, or kept alive across runs.
pub struct Coordinator<S: Storage> {
    settings: CrawlerConfig,
    fetcher: Fetcher,
    limiter: Arc<DomainRateLimiter>,
    robots: RobotsCache,
    store: Arc<Mutex<S>>,
    /// Product token matched against robots.txt user-agent lines
    robots_agent: String,
}

impl<S: Storage> Coordinator<S> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The loaded configuration
    /// * `store` - Article store shared with the caller
    /// * `limiter` - Process-wide domain rate limiter
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(ShoalError)` - The HTTP client could not be built
    pub fn new(
        config: &Config,
        store: Arc<Mutex<S>>,
        limiter: Arc<DomainRateLimiter>,
    ) -> Result<Self, ShoalError> {
        let client = build_http_client(&config.user_agent)?;

        Ok(Self {
            settings: config.crawler.clone(),
            fetcher: Fetcher::new(client),
            limiter,
            robots: RobotsCache::new(),
            store,
            robots_agent: config.user_agent.crawler_name.clone(),
        })
    }

    /// Crawls every source and aggregates the results
    ///
    /// Never fails: every source contributes a [`CrawlResult`], successful or
    /// not. The summary is recorded in the store before it is returned; a
    /// failure to record it is logged.
    pub async fn crawl_all(&self, sources: &[SourceConfig]) -> CrawlSummary {
        let started_at = Utc::now();
        let start = Instant::now();

        let batch_size = self.settings.batch_size.max(1);
        let groups: Vec<&[SourceConfig]> = sources.chunks(batch_size).collect();
        let mut results = Vec::with_capacity(sources.len());

        tracing::info!(
            "Starting crawl of {} sources in {} groups",
            sources.len(),
            groups.len()
        );

        for (index, group) in groups.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.settings.batch_delay()).await;
            }

            tracing::debug!(group = index + 1, sources = group.len(), "Crawling group");
            let group_results = join_all(group.iter().map(|source| self.crawl_one(source))).await;
            results.extend(group_results);
        }

        let summary = CrawlSummary::from_results(started_at, results, start.elapsed());

        match self.with_store(|store| store.record_run(&summary)) {
            Ok(run_id) => tracing::debug!(run_id, "Recorded crawl run"),
            Err(e) => tracing::warn!(error = %e, "Failed to record crawl run"),
        }

        tracing::info!(
            "Crawl completed: {}/{} sources succeeded, {} new documents in {:?}",
            summary.succeeded,
            summary.total_sources,
            summary.new_documents,
            summary.duration
        );

        summary
    }

    /// Crawls a single source
    pub async fn crawl_one(&self, source: &SourceConfig) -> CrawlResult {
        let start = Instant::now();
        tracing::info!(source = %source.name, "Crawling source");

        let Some(domain) = source.domain() else {
            return CrawlResult::failed(
                &source.name,
                format!("{}: listing URL has no host", source.listing_url),
                start.elapsed(),
            );
        };

        let options =
            FetchOptions::from_crawler_config(&self.settings).with_headers(&source.headers);

        let robots = if self.settings.respect_robots {
            Some(self.robots_for(source, &domain, &options).await)
        } else {
            None
        };

        let min_delay = robots
            .as_ref()
            .and_then(|rules| rules.crawl_delay(&self.robots_agent))
            .map_or(source.min_delay(), |crawl_delay| {
                crawl_delay
                    .min(self.settings.max_crawl_delay())
                    .max(source.min_delay())
            });
        let options = options.with_min_retry_delay(min_delay);

        // Listing
        self.limiter.wait_for_domain(&domain, min_delay).await;
        let listing = match self.fetcher.fetch(&source.listing_url, &options).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(source = %source.name, error = %e, "Listing fetch failed");
                return CrawlResult::failed(
                    &source.name,
                    format!("{}: {}", source.listing_url, e),
                    start.elapsed(),
                );
            }
        };

        let links = extract_links(&listing, source);
        if links.is_empty() {
            tracing::warn!(source = %source.name, "Listing yielded no article links");
            return CrawlResult::failed(
                &source.name,
                format!("{}: NO_RESULTS: no article links found", source.listing_url),
                start.elapsed(),
            );
        }

        let mut result = CrawlResult {
            source: source.name.clone(),
            success: true,
            links_discovered: links.len(),
            documents_fetched: 0,
            new_documents: 0,
            duplicates: 0,
            skipped: 0,
            errors: Vec::new(),
            duration: Duration::ZERO,
        };
        let mut attempted = 0usize;
        let mut failed_fetches = 0usize;

        for link in links.iter().take(self.settings.max_articles_per_source) {
            if let Some(rules) = &robots {
                if !rules.is_allowed(link, &self.robots_agent) {
                    tracing::debug!(url = %link, "Disallowed by robots.txt");
                    result.errors.push(format!("{}: ROBOTS_DENIED", link));
                    continue;
                }
            }

            if self.settings.skip_known_urls && self.is_known_url(link) {
                tracing::debug!(url = %link, "Already stored, skipping");
                result.skipped += 1;
                continue;
            }

            attempted += 1;
            self.limiter.wait_for_domain(&domain, min_delay).await;

            let markup = match self.fetcher.fetch(link, &options).await {
                Ok(markup) => markup,
                Err(e) => {
                    tracing::debug!(url = %link, error = %e, "Document fetch failed");
                    failed_fetches += 1;
                    result.errors.push(format!("{}: {}", link, e));
                    continue;
                }
            };
            result.documents_fetched += 1;

            match self.ingest(&markup, link, source) {
                Ok(Ingested::New) => result.new_documents += 1,
                Ok(Ingested::Duplicate) => result.duplicates += 1,
                Err(e) => {
                    tracing::debug!(url = %link, error = %e, "Document discarded");
                    result.errors.push(format!("{}: {}", link, e));
                }
            }
        }

        if attempted > 0 && failed_fetches == attempted {
            result.success = false;
        }
        result.duration = start.elapsed();

        tracing::info!(
            source = %source.name,
            discovered = result.links_discovered,
            fetched = result.documents_fetched,
            new = result.new_documents,
            errors = result.errors.len(),
            "Source finished"
        );

        result
    }

    /// Parses, fingerprints and persists one fetched document
    fn ingest(
        &self,
        markup: &str,
        url: &str,
        source: &SourceConfig,
    ) -> Result<Ingested, ShoalError> {
        let document = extract_document(markup, url, source)?;
        let fp = fingerprint(&document.title, document.body.as_deref());
        let article = NewArticle::from_document(document, fp);

        let outcome = self.with_store(|store| {
            if is_duplicate(&*store, &article.fingerprint)? {
                return Ok(Ingested::Duplicate);
            }
            match store.insert_article(&article)? {
                InsertOutcome::Inserted(_) => Ok(Ingested::New),
                InsertOutcome::AlreadyPresent => Ok(Ingested::Duplicate),
            }
        })?;

        Ok(outcome)
    }

    /// A lookup failure counts as unknown so the link is still fetched
    fn is_known_url(&self, url: &str) -> bool {
        let canonical = canonicalize_url(url);
        match self.with_store(|store| store.find_by_url(&canonical)) {
            Ok(found) => found.is_some(),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Known-URL lookup failed");
                false
            }
        }
    }

    /// Gets robots.txt for a source's host, fetching if necessary
    ///
    /// A missing or unreachable robots.txt allows everything.
    async fn robots_for(
        &self,
        source: &SourceConfig,
        domain: &str,
        options: &FetchOptions,
    ) -> RobotsRules {
        if let Some(rules) = self.robots.get(domain).await {
            return rules;
        }

        let Some(url) = Url::parse(&source.listing_url)
            .ok()
            .and_then(|listing| robots_url(&listing))
        else {
            return RobotsRules::allow_all();
        };

        self.limiter.wait_for_domain(domain, source.min_delay()).await;
        let rules = match self
            .fetcher
            .fetch(url.as_str(), &options.clone().single_attempt())
            .await
        {
            Ok(content) => RobotsRules::from_content(&content),
            Err(e) => {
                tracing::debug!(domain = %domain, error = %e, "No usable robots.txt, allowing all");
                RobotsRules::allow_all()
            }
        };

        self.robots.insert(domain, rules.clone()).await;
        rules
    }

    fn with_store<T>(&self, f: impl FnOnce(&mut S) -> StorageResult<T>) -> StorageResult<T> {
        let mut store = self.store.lock().map_err(|_| StorageError::Poisoned)?;
        f(&mut *store)
    }
}
