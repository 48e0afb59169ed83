//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use shoal::config::{
    Config, CrawlerConfig, OutputConfig, SelectorConfig, SourceConfig, UserAgentConfig,
};
use shoal::crawler::{Coordinator, DomainRateLimiter};
use shoal::storage::{MemoryStorage, SqliteStorage, Storage};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Creates a test configuration with short delays and no retries
fn create_test_config() -> Config {
    Config {
        crawler: CrawlerConfig {
            batch_size: 3,
            batch_delay: 10,
            max_articles_per_source: 10,
            request_timeout: 2000,
            max_retries: 0,
            retry_base_delay: 10,
            skip_known_urls: false,
            respect_robots: true,
            max_crawl_delay: 1000,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: "./unused.db".to_string(),
        },
        sources: vec![],
    }
}

fn create_source(name: &str, server: &MockServer) -> SourceConfig {
    SourceConfig {
        name: name.to_string(),
        listing_url: format!("{}/news", server.uri()),
        min_delay: 5,
        strip: vec!["aside".to_string()],
        headers: BTreeMap::new(),
        selectors: SelectorConfig {
            article_links: "a.headline".to_string(),
            title: vec!["h1.title".to_string(), "h1".to_string()],
            body: vec!["article".to_string()],
            timestamp: vec!["time".to_string()],
        },
    }
}

fn listing_page(paths: &[&str]) -> String {
    let links: String = paths
        .iter()
        .map(|p| format!(r#"<li><a class="headline" href="{}">Story</a></li>"#, p))
        .collect();
    format!(
        r#"<html><body>
        <a href="/tag/finance">Finance</a>
        <ul>{}</ul>
        </body></html>"#,
        links
    )
}

fn article_page(title: &str, paragraph: &str) -> String {
    format!(
        r#"<html><body>
        <h1 class="title">{}</h1>
        <time datetime="2024-06-03T10:30:00+07:00">Senin, 03 Jun 2024</time>
        <article>
            <p>{}</p>
            <aside><p>Advertisement: buy something unrelated today</p></aside>
            <p>Analysts had broadly expected the decision after last month's data.</p>
        </article>
        </body></html>"#,
        title, paragraph
    )
}

async fn mount_page(server: &MockServer, route: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

/// Responds with a fixed status and records when each request arrived
struct RecordArrivals {
    status: u16,
    arrivals: Arc<Mutex<Vec<Instant>>>,
}

impl Respond for RecordArrivals {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.arrivals.lock().unwrap().push(Instant::now());
        ResponseTemplate::new(self.status)
    }
}

async fn mount_recorder(server: &MockServer, route: &str, status: u16) -> Arc<Mutex<Vec<Instant>>> {
    let arrivals = Arc::new(Mutex::new(Vec::new()));
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(RecordArrivals {
            status,
            arrivals: Arc::clone(&arrivals),
        })
        .mount(server)
        .await;
    arrivals
}

fn gaps(arrivals: &Arc<Mutex<Vec<Instant>>>) -> Vec<Duration> {
    arrivals
        .lock()
        .unwrap()
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .collect()
}

fn memory_coordinator(config: &Config) -> (Coordinator<MemoryStorage>, Arc<Mutex<MemoryStorage>>) {
    let store = Arc::new(Mutex::new(MemoryStorage::new()));
    let coordinator = Coordinator::new(
        config,
        Arc::clone(&store),
        Arc::new(DomainRateLimiter::new()),
    )
    .expect("Failed to create coordinator");
    (coordinator, store)
}

#[tokio::test]
async fn test_listing_with_one_missing_article() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/news", 200, listing_page(&["/read/1", "/read/2"])).await;
    mount_page(
        &mock_server,
        "/read/1",
        200,
        article_page(
            "Central bank holds rates steady",
            "The central bank kept its benchmark rate unchanged on Thursday.",
        ),
    )
    .await;
    mount_page(&mock_server, "/read/2", 404, "gone".to_string()).await;

    let config = create_test_config();
    let (coordinator, store) = memory_coordinator(&config);
    let result = coordinator
        .crawl_one(&create_source("daily", &mock_server))
        .await;

    assert!(result.success, "listing succeeded: {:?}", result.errors);
    assert_eq!(result.links_discovered, 2);
    assert_eq!(result.documents_fetched, 1);
    assert_eq!(result.new_documents, 1);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("/read/2: HTTP_CLIENT_ERROR 404"));

    let store = store.lock().unwrap();
    let article = &store.articles()[0];
    assert_eq!(article.title, "Central bank holds rates steady");
    assert_eq!(article.source, "daily");
    assert!(article.published_at.is_some());
    let body = article.body.as_deref().unwrap();
    assert!(body.starts_with("The central bank kept"));
    assert!(!body.contains("Advertisement"));
}

#[tokio::test]
async fn test_second_run_stores_nothing_new() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/news", 200, listing_page(&["/read/1", "/read/2"])).await;
    mount_page(
        &mock_server,
        "/read/1",
        200,
        article_page(
            "Central bank holds rates steady",
            "The central bank kept its benchmark rate unchanged on Thursday.",
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/read/2",
        200,
        article_page(
            "Rupiah strengthens against the dollar",
            "The rupiah gained for a third straight session in Jakarta trading.",
        ),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("shoal.db");
    let store = Arc::new(Mutex::new(SqliteStorage::new(&db_path).unwrap()));
    let config = create_test_config();
    let coordinator = Coordinator::new(
        &config,
        Arc::clone(&store),
        Arc::new(DomainRateLimiter::new()),
    )
    .unwrap();
    let sources = vec![create_source("daily", &mock_server)];

    let first = coordinator.crawl_all(&sources).await;
    assert_eq!(first.new_documents, 2);

    let second = coordinator.crawl_all(&sources).await;
    assert_eq!(second.new_documents, 0);
    assert_eq!(second.documents_fetched, 2);
    assert_eq!(second.duplicates, 2);
    assert_eq!(second.succeeded, 1);

    let store = store.lock().unwrap();
    assert_eq!(store.count_articles().unwrap(), 2);
    assert_eq!(store.latest_runs(10).unwrap().len(), 2);
}

#[tokio::test]
async fn test_known_urls_are_not_refetched() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/news", 200, listing_page(&["/read/1"])).await;
    Mock::given(method("GET"))
        .and(path("/read/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_page(
            "Central bank holds rates steady",
            "The central bank kept its benchmark rate unchanged on Thursday.",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.crawler.skip_known_urls = true;
    let (coordinator, _store) = memory_coordinator(&config);
    let source = create_source("daily", &mock_server);

    let first = coordinator.crawl_one(&source).await;
    assert_eq!(first.new_documents, 1);

    let second = coordinator.crawl_one(&source).await;
    assert!(second.success);
    assert_eq!(second.skipped, 1);
    assert_eq!(second.documents_fetched, 0);
    assert_eq!(second.new_documents, 0);

    // Wiremock verifies the single-request expectation when mock_server drops
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/news", 200, listing_page(&["/read/1"])).await;
    Mock::given(method("GET"))
        .and(path("/read/1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.crawler.max_retries = 3;
    let (coordinator, _store) = memory_coordinator(&config);
    let result = coordinator
        .crawl_one(&create_source("daily", &mock_server))
        .await;

    // The only attempted document failed
    assert!(!result.success);
    assert_eq!(result.errors.len(), 1);
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/news", 200, listing_page(&["/read/1"])).await;
    Mock::given(method("GET"))
        .and(path("/read/1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.crawler.max_retries = 2;
    let (coordinator, _store) = memory_coordinator(&config);
    let result = coordinator
        .crawl_one(&create_source("daily", &mock_server))
        .await;

    assert!(!result.success);
    assert_eq!(result.documents_fetched, 0);
    assert!(result.errors[0].contains("HTTP_SERVER_ERROR 503"));
}

#[tokio::test]
async fn test_rate_limited_response_is_retried() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/news", 200, listing_page(&["/read/1"])).await;
    Mock::given(method("GET"))
        .and(path("/read/1"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.crawler.max_retries = 1;
    let (coordinator, _store) = memory_coordinator(&config);
    let result = coordinator
        .crawl_one(&create_source("daily", &mock_server))
        .await;

    assert!(result.errors[0].contains("HTTP_RATE_LIMITED"));
}

#[tokio::test]
async fn test_retry_waits_grow_linearly() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/news", 200, listing_page(&["/read/1"])).await;
    let arrivals = mount_recorder(&mock_server, "/read/1", 503).await;

    let mut config = create_test_config();
    config.crawler.max_retries = 2;
    config.crawler.retry_base_delay = 150;
    let (coordinator, _store) = memory_coordinator(&config);
    let result = coordinator
        .crawl_one(&create_source("daily", &mock_server))
        .await;

    assert!(result.errors[0].contains("HTTP_SERVER_ERROR 503"));
    let gaps = gaps(&arrivals);
    assert_eq!(gaps.len(), 2);
    assert!(gaps[0] >= Duration::from_millis(150), "first wait {:?}", gaps[0]);
    assert!(gaps[1] >= Duration::from_millis(300), "second wait {:?}", gaps[1]);
    assert!(gaps[1] > gaps[0]);
}

#[tokio::test]
async fn test_retry_waits_at_least_the_source_delay() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/news", 200, listing_page(&["/read/1"])).await;
    let arrivals = mount_recorder(&mock_server, "/read/1", 429).await;

    let mut config = create_test_config();
    config.crawler.max_retries = 1;
    config.crawler.retry_base_delay = 10;
    let mut source = create_source("daily", &mock_server);
    source.min_delay = 200;

    let (coordinator, _store) = memory_coordinator(&config);
    let result = coordinator.crawl_one(&source).await;

    assert!(result.errors[0].contains("HTTP_RATE_LIMITED"));
    let gaps = gaps(&arrivals);
    assert_eq!(gaps.len(), 1);
    assert!(gaps[0] >= Duration::from_millis(200), "retry came after {:?}", gaps[0]);
}

#[tokio::test]
async fn test_oversized_crawl_delay_does_not_stall_or_abort() {
    for crawl_delay in ["1e30", "86400"] {
        let mock_server = MockServer::start().await;
        mount_page(
            &mock_server,
            "/robots.txt",
            200,
            format!("User-agent: *\nCrawl-delay: {}", crawl_delay),
        )
        .await;
        mount_page(&mock_server, "/news", 200, listing_page(&["/read/1"])).await;
        mount_page(
            &mock_server,
            "/read/1",
            200,
            article_page(
                "Central bank holds rates steady",
                "The central bank kept its benchmark rate unchanged on Thursday.",
            ),
        )
        .await;

        let mut config = create_test_config();
        config.crawler.max_crawl_delay = 50;
        let (coordinator, _store) = memory_coordinator(&config);
        let sources = [create_source("daily", &mock_server)];

        let summary = tokio::time::timeout(Duration::from_secs(5), coordinator.crawl_all(&sources))
            .await
            .expect("crawl stalled on Crawl-delay");

        assert_eq!(summary.succeeded, 1, "Crawl-delay {}", crawl_delay);
        assert_eq!(summary.new_documents, 1);
    }
}

#[tokio::test]
async fn test_failing_source_does_not_affect_others() {
    let broken_server = MockServer::start().await;
    mount_page(&broken_server, "/news", 500, String::new()).await;

    let healthy_server = MockServer::start().await;
    mount_page(&healthy_server, "/news", 200, listing_page(&["/read/1"])).await;
    mount_page(
        &healthy_server,
        "/read/1",
        200,
        article_page(
            "Central bank holds rates steady",
            "The central bank kept its benchmark rate unchanged on Thursday.",
        ),
    )
    .await;

    let config = create_test_config();
    let (coordinator, _store) = memory_coordinator(&config);
    let summary = coordinator
        .crawl_all(&[
            create_source("broken", &broken_server),
            create_source("healthy", &healthy_server),
        ])
        .await;

    assert_eq!(summary.total_sources, 2);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.new_documents, 1);

    let broken = summary.result("broken").unwrap();
    assert!(!broken.success);
    assert!(broken.errors[0].contains("HTTP_SERVER_ERROR 500"));
    assert!(summary.result("healthy").unwrap().success);
}

#[tokio::test]
async fn test_empty_listing_reports_no_results() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/news", 200, listing_page(&[])).await;

    let config = create_test_config();
    let (coordinator, _store) = memory_coordinator(&config);
    let result = coordinator
        .crawl_one(&create_source("daily", &mock_server))
        .await;

    assert!(!result.success);
    assert_eq!(result.links_discovered, 0);
    assert!(result.errors[0].contains("NO_RESULTS"));
}

#[tokio::test]
async fn test_robots_txt_respect() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/robots.txt",
        200,
        "User-agent: *\nDisallow: /private".to_string(),
    )
    .await;
    mount_page(
        &mock_server,
        "/news",
        200,
        listing_page(&["/read/1", "/private/2"]),
    )
    .await;
    mount_page(
        &mock_server,
        "/read/1",
        200,
        article_page(
            "Central bank holds rates steady",
            "The central bank kept its benchmark rate unchanged on Thursday.",
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/private/2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config();
    let (coordinator, _store) = memory_coordinator(&config);
    let result = coordinator
        .crawl_one(&create_source("daily", &mock_server))
        .await;

    assert!(result.success);
    assert_eq!(result.new_documents, 1);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].ends_with("/private/2: ROBOTS_DENIED"));
}

#[tokio::test]
async fn test_same_content_under_two_urls_is_stored_once() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/news", 200, listing_page(&["/read/1", "/amp/read/1"])).await;
    let page = article_page(
        "Central bank holds rates steady",
        "The central bank kept its benchmark rate unchanged on Thursday.",
    );
    mount_page(&mock_server, "/read/1", 200, page.clone()).await;
    mount_page(&mock_server, "/amp/read/1", 200, page.replace("steady", "steady ")).await;

    let config = create_test_config();
    let (coordinator, store) = memory_coordinator(&config);
    let result = coordinator
        .crawl_one(&create_source("daily", &mock_server))
        .await;

    assert_eq!(result.documents_fetched, 2);
    assert_eq!(result.new_documents, 1);
    assert_eq!(result.duplicates, 1);
    assert_eq!(store.lock().unwrap().count_articles().unwrap(), 1);
}

#[tokio::test]
async fn test_article_cap_limits_fetches() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/news",
        200,
        listing_page(&["/read/1", "/read/2", "/read/3"]),
    )
    .await;
    mount_page(
        &mock_server,
        "/read/1",
        200,
        article_page(
            "Central bank holds rates steady",
            "The central bank kept its benchmark rate unchanged on Thursday.",
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/read/2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.crawler.max_articles_per_source = 1;
    let (coordinator, _store) = memory_coordinator(&config);
    let result = coordinator
        .crawl_one(&create_source("daily", &mock_server))
        .await;

    assert_eq!(result.links_discovered, 3);
    assert_eq!(result.documents_fetched, 1);
    assert_eq!(result.new_documents, 1);
}

#[tokio::test]
async fn test_page_without_title_is_recorded() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/news", 200, listing_page(&["/read/1"])).await;
    mount_page(
        &mock_server,
        "/read/1",
        200,
        "<html><body><h1>Short</h1></body></html>".to_string(),
    )
    .await;

    let config = create_test_config();
    let (coordinator, store) = memory_coordinator(&config);
    let result = coordinator
        .crawl_one(&create_source("daily", &mock_server))
        .await;

    // Fetched but unparseable: counted as fetched, never stored
    assert!(result.success);
    assert_eq!(result.documents_fetched, 1);
    assert_eq!(result.new_documents, 0);
    assert!(result.errors[0].ends_with("/read/1: NO_TITLE"));
    assert_eq!(store.lock().unwrap().count_articles().unwrap(), 0);
}

#[tokio::test]
async fn test_source_headers_are_sent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/news"))
        .and(header("x-edition", "id"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&["/read/1"])))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(
        &mock_server,
        "/read/1",
        200,
        article_page(
            "Central bank holds rates steady",
            "The central bank kept its benchmark rate unchanged on Thursday.",
        ),
    )
    .await;

    let mut source = create_source("daily", &mock_server);
    source
        .headers
        .insert("X-Edition".to_string(), "id".to_string());

    let config = create_test_config();
    let (coordinator, _store) = memory_coordinator(&config);
    let result = coordinator.crawl_one(&source).await;

    assert!(result.success);
    assert_eq!(result.new_documents, 1);
}
