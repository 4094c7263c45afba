//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use async_trait::async_trait;
use crawlscope::config::{Config, CrawlerConfig, IndexConfig, StorageConfig, UserAgentConfig};
use crawlscope::index::{IndexError, SearchHit, SearchIndex};
use crawlscope::storage::{CrawlStateStore, MemoryStore, SqliteStore};
use crawlscope::{CrawlEngine, CrawlRequest, KeyValueStore, StopReason, UrlSearchDoc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with fast retries
fn create_test_config(db_path: &str) -> Config {
    Config {
        crawler: CrawlerConfig {
            workers: 3,
            fetch_timeout_secs: 5,
            access_check_timeout_secs: 2,
            max_attempts: 2,
            backoff_base_ms: 10,
            max_body_bytes: 1 << 20,
            min_content_length: 50,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        index: IndexConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            index_name: "pages".to_string(),
            api_key: String::new(),
            refresh: false,
            submit_workers: 2,
            queue_capacity: 64,
        },
        storage: StorageConfig {
            database_path: db_path.to_string(),
        },
    }
}

/// Search index that remembers every document it receives
#[derive(Default)]
struct RecordingIndex {
    docs: Mutex<Vec<UrlSearchDoc>>,
}

impl RecordingIndex {
    fn urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.docs.lock().unwrap().iter().map(|d| d.url.clone()).collect();
        urls.sort();
        urls
    }
}

#[async_trait]
impl SearchIndex for RecordingIndex {
    async fn index_document(&self, doc: &UrlSearchDoc) -> Result<(), IndexError> {
        self.docs.lock().unwrap().push(doc.clone());
        Ok(())
    }

    async fn query(&self, _body: &serde_json::Value) -> Result<Vec<SearchHit>, IndexError> {
        Ok(Vec::new())
    }
}

fn html_page(title: &str, links: &[String]) -> String {
    let anchors: String = links
        .iter()
        .map(|l| format!(r#"<a href="{}">{}</a>"#, l, l))
        .collect();
    format!(
        r#"<html><head><title>{title}</title></head><body>
           <p>This is the {title} page, with enough text to be worth indexing.</p>
           {anchors}
           </body></html>"#
    )
}

async fn mount_html(server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn mount_head_ok(server: &MockServer) {
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(server)
        .await;
}

/// Seed links to three in-scope pages and one page on another server;
/// each child links one level deeper.
async fn mount_small_site(server: &MockServer, elsewhere: &MockServer) {
    let base = server.uri();
    mount_head_ok(server).await;
    mount_html(
        server,
        "/",
        html_page(
            "Home",
            &[
                format!("{}/page1", base),
                "/page2".to_string(),
                "page3#section".to_string(),
                format!("{}/outside", elsewhere.uri()),
                "mailto:someone@example.com".to_string(),
            ],
        ),
    )
    .await;
    for page in ["/page1", "/page2", "/page3"] {
        mount_html(server, page, html_page(page, &["/deeper".to_string()])).await;
    }
    Mock::given(method("GET"))
        .and(path("/deeper"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

async fn run_to_idle(engine: &CrawlEngine) {
    tokio::time::timeout(Duration::from_secs(20), engine.wait_idle())
        .await
        .expect("crawl did not go idle");
}

#[tokio::test]
async fn test_full_crawl_respects_distance_and_scope() {
    let server = MockServer::start().await;
    let elsewhere = MockServer::start().await;
    mount_small_site(&server, &elsewhere).await;

    let index = Arc::new(RecordingIndex::default());
    let engine = CrawlEngine::with_parts(
        &create_test_config(":memory:"),
        Arc::new(MemoryStore::new()),
        index.clone(),
    )
    .unwrap();

    let (crawl_id, initial) = engine
        .start(&CrawlRequest {
            url: server.uri(),
            max_distance: 1,
            max_seconds: 30,
            max_urls: 10,
        })
        .unwrap();
    assert_eq!(crawl_id.len(), 6);
    assert_eq!(initial.stop_reason, None);

    run_to_idle(&engine).await;
    let status = engine.status(&crawl_id);
    engine.shutdown().await;

    assert_eq!(status.num_pages, 4);
    assert_eq!(status.stop_reason, Some(StopReason::MaxDistance));
    assert_eq!(status.error_message, None);
    assert_eq!(status.distance, 1);

    let base = server.uri();
    assert_eq!(
        index.urls(),
        vec![
            format!("{}/", base),
            format!("{}/page1", base),
            format!("{}/page2", base),
            format!("{}/page3", base),
        ]
    );
    assert!(elsewhere.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_crawl_stops_at_page_budget() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_head_ok(&server).await;

    let children: Vec<String> = (1..=5).map(|i| format!("/leaf{}", i)).collect();
    mount_html(&server, "/", html_page("Home", &children)).await;
    for child in &children {
        mount_html(&server, child, html_page(child, &[])).await;
    }

    let index = Arc::new(RecordingIndex::default());
    let engine = CrawlEngine::with_parts(
        &create_test_config(":memory:"),
        Arc::new(MemoryStore::new()),
        index.clone(),
    )
    .unwrap();

    let (crawl_id, _) = engine
        .start(&CrawlRequest {
            url: base.clone(),
            max_distance: 3,
            max_seconds: 30,
            max_urls: 3,
        })
        .unwrap();

    run_to_idle(&engine).await;
    let status = engine.status(&crawl_id);
    engine.shutdown().await;

    assert_eq!(status.num_pages, 3);
    assert_eq!(status.stop_reason, Some(StopReason::MaxUrls));
    assert_eq!(index.urls().len(), 3);
    assert!(index.urls().contains(&format!("{}/leaf1", base)));
    assert!(index.urls().contains(&format!("{}/leaf2", base)));
}

#[tokio::test]
async fn test_user_stop_prevents_expansion() {
    let server = MockServer::start().await;
    mount_head_ok(&server).await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_page("Slow", &["/next".to_string()]))
                .insert_header("content-type", "text/html")
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let engine = CrawlEngine::with_parts(
        &create_test_config(":memory:"),
        Arc::new(MemoryStore::new()),
        Arc::new(RecordingIndex::default()),
    )
    .unwrap();

    let (crawl_id, _) = engine
        .start(&CrawlRequest {
            url: server.uri(),
            max_distance: 3,
            max_seconds: 30,
            max_urls: 0,
        })
        .unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    let stopped = engine.stop(&crawl_id, "Stopped by test").unwrap();
    assert_eq!(stopped.stop_reason, Some(StopReason::UserInitiated));

    run_to_idle(&engine).await;
    let status = engine.status(&crawl_id);
    engine.shutdown().await;

    assert_eq!(status.stop_reason, Some(StopReason::UserInitiated));
    assert_eq!(status.error_message.as_deref(), Some("Stopped by test"));
}

#[tokio::test]
async fn test_invalid_seed_never_dispatches() {
    let engine = CrawlEngine::with_parts(
        &create_test_config(":memory:"),
        Arc::new(MemoryStore::new()),
        Arc::new(RecordingIndex::default()),
    )
    .unwrap();

    let (crawl_id, status) = engine
        .start(&CrawlRequest {
            url: "http://exa mple.com".to_string(),
            max_distance: 1,
            max_seconds: 30,
            max_urls: 0,
        })
        .unwrap();

    assert_eq!(status.stop_reason, Some(StopReason::UserInitiated));
    assert!(status.error_message.is_some());
    run_to_idle(&engine).await;
    assert_eq!(engine.status(&crawl_id).num_pages, 0);
    engine.shutdown().await;
}

#[tokio::test]
async fn test_sqlite_state_is_shared_across_handles() {
    let server = MockServer::start().await;
    let elsewhere = MockServer::start().await;
    mount_small_site(&server, &elsewhere).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawl.db");
    let kv: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::new(&db_path).unwrap());

    let engine = CrawlEngine::with_parts(
        &create_test_config(db_path.to_str().unwrap()),
        kv,
        Arc::new(RecordingIndex::default()),
    )
    .unwrap();
    let (crawl_id, _) = engine
        .start(&CrawlRequest {
            url: server.uri(),
            max_distance: 1,
            max_seconds: 30,
            max_urls: 0,
        })
        .unwrap();
    run_to_idle(&engine).await;
    engine.shutdown().await;

    // a second handle on the same file, as another worker process would open it
    let other = CrawlStateStore::new(Arc::new(SqliteStore::new(&db_path).unwrap()));
    let status = other.read_status(&crawl_id).unwrap().unwrap();
    assert_eq!(status.num_pages, 4);
    assert_eq!(other.visited_count(&crawl_id).unwrap(), 4);
    assert!(other
        .is_visited(&crawl_id, &format!("{}/page2", server.uri()))
        .unwrap());
}
