//! Per-record crawl state machine
//!
//! Every frontier record goes through the same steps:
//!
//! 1. Decide whether the branch stops here (distance, page budget,
//!    deadline, cancellation, in that priority order)
//! 2. Persist the status before any network I/O
//! 3. Return early if the branch stopped
//! 4. Robots (soft) and accessibility checks
//! 5. Mark the URL visited
//! 6. Fetch with retry
//! 7. Extract content and links; a page with neither is a dead end
//! 8. Hand the document to the indexing pool
//! 9. Reserve and dispatch child records while budget, time and
//!    cancellation allow
//!
//! Failures in steps 4-9 end only the current branch. They are written to
//! the crawl status and never returned to the caller.

use crate::crawler::content::{extract_content, ExtractedContent};
use crate::crawler::fetcher::{FetchedPage, Fetcher};
use crate::crawler::links::extract_links;
use crate::crawler::Document;
use crate::index::IndexSubmitter;
use crate::intake::CrawlRequest;
use crate::model::{now_millis, CrawlStatus, FrontierRecord, StopReason, UrlSearchDoc};
use crate::queue::WorkQueue;
use crate::storage::{CrawlStateStore, Reservation};
use crate::url::normalize_seed_url;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use url::Url;

/// How processing of one record ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Dropped at the stop check; nothing was fetched
    Stopped(StopReason),
    Inaccessible,
    FetchFailed,
    /// Fetched, but no content and no links
    DeadEnd,
    /// Fetched and processed; `dispatched` child records were published
    Processed { indexed: bool, dispatched: usize },
}

/// Picks the first applicable stop reason, in priority order
///
/// `reserved` means the record's URL is already in the visited set, i.e.
/// it was counted against the page budget when it was dispatched. Such a
/// record is not dropped for `MaxUrls`.
pub fn compute_stop_reason(
    record: &FrontierRecord,
    visited: u64,
    reserved: bool,
    now_millis: i64,
    cancelled: bool,
) -> Option<StopReason> {
    let bounds = &record.bounds;
    if record.distance > bounds.max_distance {
        return Some(StopReason::MaxDistance);
    }
    if bounds.is_url_bounded() && !reserved && visited >= bounds.max_urls {
        return Some(StopReason::MaxUrls);
    }
    if record.is_past_deadline(now_millis) {
        return Some(StopReason::Timeout);
    }
    if cancelled {
        return Some(StopReason::UserInitiated);
    }
    None
}

#[derive(Debug, Default)]
struct PageAnalysis {
    content: ExtractedContent,
    links: Vec<String>,
}

/// Parses and mines a fetched page
///
/// Kept synchronous: the parsed document is not `Send`.
fn analyze_page(record: &FrontierRecord, page: &FetchedPage, min_content_length: usize) -> PageAnalysis {
    let Ok(url) = Url::parse(&page.url).or_else(|_| Url::parse(&record.url)) else {
        return PageAnalysis::default();
    };
    let doc = Document::parse(url, &page.body);
    PageAnalysis {
        content: extract_content(&doc, min_content_length),
        links: extract_links(&record.base_url, &doc),
    }
}

/// Drives crawls: initiation, per-record processing, stop and status
pub struct Orchestrator {
    state: CrawlStateStore,
    fetcher: Arc<Fetcher>,
    submitter: Arc<IndexSubmitter>,
    queue: Arc<dyn WorkQueue>,
    min_content_length: usize,
    shutdown: CancellationToken,
    crawl_tokens: Mutex<HashMap<String, CancellationToken>>,
}

impl Orchestrator {
    pub fn new(
        state: CrawlStateStore,
        fetcher: Arc<Fetcher>,
        submitter: Arc<IndexSubmitter>,
        queue: Arc<dyn WorkQueue>,
        min_content_length: usize,
    ) -> Self {
        Self {
            state,
            fetcher,
            submitter,
            queue,
            min_content_length,
            shutdown: CancellationToken::new(),
            crawl_tokens: Mutex::new(HashMap::new()),
        }
    }

    pub fn state(&self) -> &CrawlStateStore {
        &self.state
    }

    /// Validates the request, resets state under `crawl_id` and dispatches the seed
    ///
    /// An invalid seed URL or time budget is not an error: the returned
    /// status carries an error message and `userInitiated`, and no work is
    /// dispatched.
    pub fn start_crawl(&self, crawl_id: &str, request: &CrawlRequest) -> crate::Result<CrawlStatus> {
        let start = now_millis();
        let bounds = request.bounds();

        let seed_url = match normalize_seed_url(&request.url) {
            Ok(url) if bounds.max_seconds > 0 => url.to_string(),
            Ok(_) => {
                return self.reject_crawl(crawl_id, start, "maxSeconds must be greater than zero".to_string());
            }
            Err(e) => {
                return self.reject_crawl(crawl_id, start, format!("Invalid seed URL {:?}: {}", request.url, e));
            }
        };

        self.register_crawl(crawl_id);
        let seed = FrontierRecord::seed(crawl_id, seed_url, bounds, start);
        let status = self.state.init_crawl(crawl_id, start, seed.deadline_millis)?;

        tracing::info!(
            "[{}] Starting crawl of {} (max distance {}, max {}s, max urls {})",
            crawl_id,
            seed.url,
            bounds.max_distance,
            bounds.max_seconds,
            bounds.max_urls
        );
        self.queue.publish(seed)?;
        Ok(status)
    }

    fn reject_crawl(&self, crawl_id: &str, start: i64, message: String) -> crate::Result<CrawlStatus> {
        tracing::warn!("[{}] Rejected crawl: {}", crawl_id, message);
        let mut status = self.state.init_crawl(crawl_id, start, 0)?;
        status.stop(StopReason::UserInitiated);
        status.error_message = Some(message);
        Ok(self.state.write_status(crawl_id, status)?)
    }

    /// Runs one frontier record through the state machine
    pub async fn process_record(&self, record: &FrontierRecord) -> RecordOutcome {
        let crawl_id = record.crawl_id.as_str();

        // 1. stop check
        let visited = self.visited_count(crawl_id);
        let reserved = record.bounds.is_url_bounded()
            && self.state.is_visited(crawl_id, &record.url).unwrap_or(false);
        let stop = compute_stop_reason(
            record,
            visited,
            reserved,
            now_millis(),
            self.is_cancelled(crawl_id),
        );

        // 2. status before any network I/O
        self.update_status(crawl_id, |status| {
            status.distance = record.distance;
            status.num_pages = status.num_pages.max(visited);
            if let Some(reason) = stop {
                status.stop(reason);
            }
        });

        // 3.
        if let Some(reason) = stop {
            tracing::debug!("[{}] Dropping {} ({})", crawl_id, record.url, reason);
            return RecordOutcome::Stopped(reason);
        }

        // 4.
        if self.fetcher.robots_disallowed(&record.url).await {
            tracing::warn!("[{}] robots.txt disallows {}, fetching anyway", crawl_id, record.url);
        }
        if let Err(e) = self.fetcher.check_accessible(&record.url).await {
            self.record_error(crawl_id, format!("URL not accessible: {}", e));
            return RecordOutcome::Inaccessible;
        }

        // 5.
        match self.state.try_mark_visited(crawl_id, &record.url) {
            Ok(true) => tracing::trace!("[{}] First sighting of {}", crawl_id, record.url),
            Ok(false) => {}
            Err(e) => tracing::error!("[{}] Failed to mark {} visited: {}", crawl_id, record.url, e),
        }

        // 6.
        tracing::debug!("[{}] Fetching {} at distance {}", crawl_id, record.url, record.distance);
        let page = match self.fetcher.fetch(&record.url).await {
            Ok(page) => page,
            Err(e) => {
                self.record_error(crawl_id, format!("Failed to fetch {}: {}", record.url, e));
                return RecordOutcome::FetchFailed;
            }
        };

        // 7.
        let analysis = analyze_page(record, &page, self.min_content_length);
        if analysis.content.is_empty() && analysis.links.is_empty() {
            self.record_error(crawl_id, format!("No content or links found at {}", record.url));
            return RecordOutcome::DeadEnd;
        }
        tracing::debug!(
            "[{}] Extracted {} links from {}",
            crawl_id,
            analysis.links.len(),
            record.url
        );

        // 8.
        let indexed = !analysis.content.is_empty();
        if indexed {
            let doc = UrlSearchDoc {
                crawl_id: crawl_id.to_string(),
                url: record.url.clone(),
                base_url: record.base_url.clone(),
                title: analysis.content.title,
                content: analysis.content.text,
                distance: record.distance,
                content_type: page.content_type,
            };
            if let Err(e) = self.submitter.submit(doc) {
                tracing::warn!("[{}] Indexing of {} skipped: {}", crawl_id, record.url, e);
            }
        }

        // 9.
        let dispatched = self.expand(record, &analysis.links);
        RecordOutcome::Processed { indexed, dispatched }
    }

    /// Reserves and publishes child records for `links`
    fn expand(&self, record: &FrontierRecord, links: &[String]) -> usize {
        let crawl_id = record.crawl_id.as_str();
        if links.is_empty() {
            return 0;
        }
        if record.is_at_frontier_edge() {
            tracing::debug!(
                "[{}] {} is at max distance, not expanding {} links",
                crawl_id,
                record.url,
                links.len()
            );
            self.record_stop(crawl_id, StopReason::MaxDistance);
            return 0;
        }

        let budget = record.bounds.url_budget();
        let mut dispatched = 0;
        for link in links {
            if self.is_cancelled(crawl_id) {
                break;
            }
            if record.is_past_deadline(now_millis()) {
                self.record_stop(crawl_id, StopReason::Timeout);
                break;
            }
            match self.state.reserve_url(crawl_id, link, budget) {
                Ok(Reservation::Reserved(_)) => {
                    if let Err(e) = self.queue.publish(record.child(link.clone())) {
                        tracing::error!("[{}] Failed to dispatch {}: {}", crawl_id, link, e);
                        break;
                    }
                    dispatched += 1;
                }
                Ok(Reservation::AlreadyVisited) => {}
                Ok(Reservation::BudgetExhausted) => {
                    self.record_stop(crawl_id, StopReason::MaxUrls);
                    break;
                }
                Err(e) => tracing::error!("[{}] Failed to reserve {}: {}", crawl_id, link, e),
            }
        }

        if dispatched > 0 {
            tracing::debug!(
                "[{}] Dispatched {} records at distance {}",
                crawl_id,
                dispatched,
                record.distance + 1
            );
        }
        dispatched
    }

    /// Stops one crawl on request
    ///
    /// Cancels the crawl's token, records `userInitiated` with `message` and
    /// clears the visited set. Records already in the queue are dropped when
    /// they reach the stop check.
    pub fn stop_crawl(&self, crawl_id: &str, message: &str) -> crate::Result<CrawlStatus> {
        if let Ok(tokens) = self.crawl_tokens.lock() {
            if let Some(token) = tokens.get(crawl_id) {
                token.cancel();
            }
        }

        let status = self.state.update_status(crawl_id, |status| {
            status.stop(StopReason::UserInitiated);
            status.error_message = Some(message.to_string());
        })?;
        self.state.clear_visited(crawl_id)?;
        tracing::info!("[{}] Crawl stopped: {}", crawl_id, message);
        Ok(status)
    }

    /// Stops every crawl this orchestrator started and refuses further work
    pub fn shutdown(&self, message: &str) {
        self.shutdown.cancel();
        let ids: Vec<String> = match self.crawl_tokens.lock() {
            Ok(tokens) => tokens.keys().cloned().collect(),
            Err(_) => Vec::new(),
        };
        for id in ids {
            if let Err(e) = self.stop_crawl(&id, message) {
                tracing::error!("[{}] Failed to stop crawl: {}", id, e);
            }
        }
    }

    /// Forgets the cancellation token of a finished crawl
    pub fn release_crawl(&self, crawl_id: &str) {
        if let Ok(mut tokens) = self.crawl_tokens.lock() {
            tokens.remove(crawl_id);
        }
    }

    /// Current status of a crawl; never fails
    ///
    /// Unknown ids yield a zeroed status. A crawl past its deadline with no
    /// stop reason gets `timeout` recorded.
    pub fn crawl_status(&self, crawl_id: &str) -> CrawlStatus {
        let mut status = match self.state.read_status(crawl_id) {
            Ok(Some(status)) => status,
            Ok(None) => return CrawlStatus::default(),
            Err(e) => {
                tracing::error!("[{}] Failed to read status: {}", crawl_id, e);
                return CrawlStatus::default();
            }
        };
        status.num_pages = status.num_pages.max(self.visited_count(crawl_id));

        if !status.is_stopped() && status.max_time_millis > 0 && now_millis() >= status.max_time_millis {
            match self.state.update_status(crawl_id, |s| s.stop(StopReason::Timeout)) {
                Ok(updated) => status = updated,
                Err(e) => {
                    tracing::error!("[{}] Failed to record timeout: {}", crawl_id, e);
                    status.stop(StopReason::Timeout);
                }
            }
        }
        status
    }

    /// Writes `message` as the crawl's latest error
    pub fn record_error(&self, crawl_id: &str, message: String) {
        tracing::warn!("[{}] {}", crawl_id, message);
        self.update_status(crawl_id, |status| status.error_message = Some(message));
    }

    fn record_stop(&self, crawl_id: &str, reason: StopReason) {
        self.update_status(crawl_id, |status| status.stop(reason));
    }

    fn update_status<F>(&self, crawl_id: &str, update: F)
    where
        F: FnOnce(&mut CrawlStatus),
    {
        if let Err(e) = self.state.update_status(crawl_id, update) {
            tracing::error!("[{}] Failed to write status: {}", crawl_id, e);
        }
    }

    fn visited_count(&self, crawl_id: &str) -> u64 {
        self.state.visited_count(crawl_id).unwrap_or_else(|e| {
            tracing::error!("[{}] Failed to read visited count: {}", crawl_id, e);
            0
        })
    }

    fn register_crawl(&self, crawl_id: &str) {
        if let Ok(mut tokens) = self.crawl_tokens.lock() {
            tokens.insert(crawl_id.to_string(), self.shutdown.child_token());
        }
    }

    fn is_cancelled(&self, crawl_id: &str) -> bool {
        if self.shutdown.is_cancelled() {
            return true;
        }
        self.crawl_tokens
            .lock()
            .ok()
            .and_then(|tokens| tokens.get(crawl_id).map(CancellationToken::is_cancelled))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::FetchPolicy;
    use crate::index::{IndexError, SearchHit, SearchIndex};
    use crate::model::CrawlBounds;
    use crate::queue::LocalWorkQueue;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record(distance: u32, bounds: CrawlBounds) -> FrontierRecord {
        let seed = FrontierRecord::seed("abc123", "https://www.example.com/", bounds, 0);
        FrontierRecord { distance, ..seed }
    }

    #[test]
    fn test_distance_beats_every_other_reason() {
        let rec = record(2, CrawlBounds::new(1, 10, 5));
        let reason = compute_stop_reason(&rec, 50, false, 1_000_000, true);
        assert_eq!(reason, Some(StopReason::MaxDistance));
    }

    #[test]
    fn test_max_urls_beats_timeout() {
        let rec = record(1, CrawlBounds::new(1, 10, 5));
        let reason = compute_stop_reason(&rec, 5, false, 1_000_000, false);
        assert_eq!(reason, Some(StopReason::MaxUrls));
    }

    #[test]
    fn test_reserved_record_is_not_dropped_for_max_urls() {
        let rec = record(1, CrawlBounds::new(2, 10, 5));
        assert_eq!(compute_stop_reason(&rec, 5, true, 0, false), None);
        assert_eq!(
            compute_stop_reason(&rec, 5, true, 10_000, false),
            Some(StopReason::Timeout)
        );
    }

    #[test]
    fn test_unbounded_urls_never_stop() {
        let rec = record(0, CrawlBounds::new(1, 10, 0));
        assert_eq!(compute_stop_reason(&rec, 1_000_000, false, 0, false), None);
    }

    #[test]
    fn test_cancellation_is_lowest_priority() {
        let rec = record(0, CrawlBounds::new(1, 10, 0));
        assert_eq!(
            compute_stop_reason(&rec, 0, false, 0, true),
            Some(StopReason::UserInitiated)
        );
        assert_eq!(
            compute_stop_reason(&rec, 0, false, 10_000, true),
            Some(StopReason::Timeout)
        );
    }

    #[derive(Default)]
    struct RecordingIndex {
        urls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SearchIndex for RecordingIndex {
        async fn index_document(&self, doc: &UrlSearchDoc) -> Result<(), IndexError> {
            self.urls.lock().unwrap().push(doc.url.clone());
            Ok(())
        }

        async fn query(&self, _body: &serde_json::Value) -> Result<Vec<SearchHit>, IndexError> {
            Ok(Vec::new())
        }
    }

    struct Harness {
        orchestrator: Orchestrator,
        queue: Arc<LocalWorkQueue>,
        index: Arc<RecordingIndex>,
        submitter: Arc<IndexSubmitter>,
    }

    fn harness() -> Harness {
        let queue = Arc::new(LocalWorkQueue::new());
        let index = Arc::new(RecordingIndex::default());
        let submitter = Arc::new(IndexSubmitter::start(index.clone(), 1, 16));
        let policy = FetchPolicy {
            fetch_timeout: Duration::from_secs(5),
            access_timeout: Duration::from_secs(2),
            max_attempts: 2,
            backoff_base: Duration::from_millis(5),
            max_body_bytes: 1 << 20,
        };
        let orchestrator = Orchestrator::new(
            CrawlStateStore::new(Arc::new(MemoryStore::new())),
            Arc::new(Fetcher::new(reqwest::Client::new(), policy)),
            submitter.clone(),
            queue.clone(),
            50,
        );
        Harness {
            orchestrator,
            queue,
            index,
            submitter,
        }
    }

    fn request(url: &str) -> CrawlRequest {
        CrawlRequest {
            url: url.to_string(),
            max_distance: 1,
            max_seconds: 30,
            max_urls: 10,
        }
    }

    async fn mount_page(server: &MockServer, page: &str, body: &str) {
        Mock::given(method("HEAD"))
            .and(path(page))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(body),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_invalid_seed_records_error_and_dispatches_nothing() {
        let h = harness();
        let status = h.orchestrator.start_crawl("bad001", &request("ftp://nope")).unwrap();

        assert_eq!(status.stop_reason, Some(StopReason::UserInitiated));
        assert!(status.error_message.unwrap().contains("Invalid seed URL"));
        assert_eq!(h.queue.pending(), 0);
    }

    #[tokio::test]
    async fn test_zero_time_budget_is_rejected() {
        let h = harness();
        let mut req = request("example.com");
        req.max_seconds = 0;
        let status = h.orchestrator.start_crawl("bad002", &req).unwrap();
        assert_eq!(status.stop_reason, Some(StopReason::UserInitiated));
        assert_eq!(h.queue.pending(), 0);
    }

    #[tokio::test]
    async fn test_start_dispatches_normalized_seed() {
        let h = harness();
        let status = h.orchestrator.start_crawl("ok0001", &request("example.com")).unwrap();
        assert_eq!(status.num_pages, 0);
        assert!(status.max_time_millis > status.start_time_millis);

        let seed = h.queue.receive().await.unwrap();
        assert_eq!(seed.url, "https://www.example.com/");
        assert_eq!(seed.base_url, seed.url);
        assert_eq!(seed.distance, 0);
    }

    #[tokio::test]
    async fn test_seed_page_is_indexed_and_expanded() {
        let server = MockServer::start().await;
        mount_page(
            &server,
            "/",
            r#"<html><head><title>Home</title></head><body>
               <p>Welcome to the home page of a small test site.</p>
               <a href="/a">A</a><a href="/b">B</a><a href="https://other.com/x">X</a>
               </body></html>"#,
        )
        .await;

        let h = harness();
        h.orchestrator.start_crawl("seed01", &request(&server.uri())).unwrap();
        let seed = h.queue.receive().await.unwrap();

        let outcome = h.orchestrator.process_record(&seed).await;
        assert_eq!(
            outcome,
            RecordOutcome::Processed {
                indexed: true,
                dispatched: 2
            }
        );

        let status = h.orchestrator.crawl_status("seed01");
        assert_eq!(status.num_pages, 3);
        assert_eq!(status.stop_reason, None);
        assert_eq!(status.error_message, None);

        h.submitter.shutdown().await;
        assert_eq!(h.index.urls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_frontier_edge_records_max_distance() {
        let server = MockServer::start().await;
        mount_page(&server, "/a", r#"<html><body><p>Leaf page with a link onward to more.</p><a href="/deeper">d</a></body></html>"#).await;

        let h = harness();
        let seed = FrontierRecord::seed("edge01", format!("{}/", server.uri()), CrawlBounds::new(1, 30, 10), now_millis());
        let child = seed.child(format!("{}/a", server.uri()));

        let outcome = h.orchestrator.process_record(&child).await;
        assert_eq!(
            outcome,
            RecordOutcome::Processed {
                indexed: true,
                dispatched: 0
            }
        );
        let status = h.orchestrator.crawl_status("edge01");
        assert_eq!(status.stop_reason, Some(StopReason::MaxDistance));
        assert_eq!(status.error_message, None);
        assert_eq!(h.queue.pending(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_expansion_stays_within_page_budget() {
        let server = MockServer::start().await;
        let mut records = Vec::new();
        let seed = FrontierRecord::seed("race01", format!("{}/", server.uri()), CrawlBounds::new(3, 30, 6), now_millis());
        for i in 0..4 {
            let links: String = (0..10)
                .map(|j| format!(r#"<a href="/p{}/l{}">l</a>"#, i, j))
                .collect();
            let body = format!("<html><body><p>Hub page number {} with plenty of outgoing links.</p>{}</body></html>", i, links);
            mount_page(&server, &format!("/p{}", i), &body).await;
            records.push(seed.child(format!("{}/p{}", server.uri(), i)));
        }

        let h = harness();
        let state = h.orchestrator.state();
        state.init_crawl("race01", seed.start_time_millis, seed.deadline_millis).unwrap();
        for rec in &records {
            assert!(state.try_mark_visited("race01", &rec.url).unwrap());
        }

        let o = &h.orchestrator;
        let (a, b, c, d) = tokio::join!(
            o.process_record(&records[0]),
            o.process_record(&records[1]),
            o.process_record(&records[2]),
            o.process_record(&records[3])
        );
        let dispatched: usize = [a, b, c, d]
            .into_iter()
            .map(|outcome| match outcome {
                RecordOutcome::Processed { dispatched, .. } => dispatched,
                other => panic!("unexpected outcome {:?}", other),
            })
            .sum();

        assert_eq!(dispatched, 2);
        assert_eq!(h.queue.pending(), 2);
        assert_eq!(state.visited_count("race01").unwrap(), 6);
        let status = h.orchestrator.crawl_status("race01");
        assert_eq!(status.num_pages, 6);
        assert_eq!(status.stop_reason, Some(StopReason::MaxUrls));
    }

    #[tokio::test]
    async fn test_inaccessible_url_records_error() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let h = harness();
        let rec = FrontierRecord::seed("miss01", format!("{}/missing", server.uri()), CrawlBounds::new(1, 30, 0), now_millis());
        assert_eq!(h.orchestrator.process_record(&rec).await, RecordOutcome::Inaccessible);

        let status = h.orchestrator.crawl_status("miss01");
        assert!(status.error_message.unwrap().contains("not accessible"));
        assert_eq!(status.stop_reason, None);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_recorded() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let h = harness();
        let rec = FrontierRecord::seed("fail01", format!("{}/flaky", server.uri()), CrawlBounds::new(1, 30, 0), now_millis());
        assert_eq!(h.orchestrator.process_record(&rec).await, RecordOutcome::FetchFailed);

        let status = h.orchestrator.crawl_status("fail01");
        assert!(status.error_message.unwrap().contains("Failed to fetch"));
        assert_eq!(status.num_pages, 1);
    }

    #[tokio::test]
    async fn test_empty_page_is_a_dead_end() {
        let server = MockServer::start().await;
        mount_page(&server, "/empty", "<html><body></body></html>").await;

        let h = harness();
        let rec = FrontierRecord::seed("dead01", format!("{}/empty", server.uri()), CrawlBounds::new(1, 30, 0), now_millis());
        assert_eq!(h.orchestrator.process_record(&rec).await, RecordOutcome::DeadEnd);

        h.submitter.shutdown().await;
        assert!(h.index.urls.lock().unwrap().is_empty());
        let status = h.orchestrator.crawl_status("dead01");
        assert!(status.error_message.unwrap().contains("No content or links"));
    }

    #[tokio::test]
    async fn test_stop_drops_queued_records() {
        let h = harness();
        h.orchestrator.start_crawl("stop01", &request("example.com")).unwrap();
        let seed = h.queue.receive().await.unwrap();

        let status = h.orchestrator.stop_crawl("stop01", "stopped by test").unwrap();
        assert_eq!(status.stop_reason, Some(StopReason::UserInitiated));
        assert_eq!(status.error_message.as_deref(), Some("stopped by test"));

        let outcome = h.orchestrator.process_record(&seed).await;
        assert_eq!(outcome, RecordOutcome::Stopped(StopReason::UserInitiated));
    }

    #[tokio::test]
    async fn test_past_deadline_record_times_out() {
        let h = harness();
        let rec = FrontierRecord::seed("late01", "https://www.example.com/", CrawlBounds::new(1, 1, 0), 0);
        assert_eq!(
            h.orchestrator.process_record(&rec).await,
            RecordOutcome::Stopped(StopReason::Timeout)
        );
    }

    #[tokio::test]
    async fn test_status_of_unknown_crawl_is_zeroed() {
        let h = harness();
        assert_eq!(h.orchestrator.crawl_status("nope00"), CrawlStatus::default());
    }

    #[tokio::test]
    async fn test_status_query_derives_timeout() {
        let h = harness();
        h.orchestrator.state().init_crawl("old001", 1_000, 2_000).unwrap();

        let status = h.orchestrator.crawl_status("old001");
        assert_eq!(status.stop_reason, Some(StopReason::Timeout));
        let stored = h.orchestrator.state().read_status("old001").unwrap().unwrap();
        assert_eq!(stored.stop_reason, Some(StopReason::Timeout));
    }
}
