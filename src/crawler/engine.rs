//! Crawl engine wiring
//!
//! Builds the state store, fetcher, work queue, indexing pool and worker
//! pool from a [`Config`] and ties their lifecycles together.

use crate::config::Config;
use crate::crawler::{build_http_client, FetchPolicy, Fetcher, Orchestrator, WorkerPool};
use crate::index::{ElasticsearchIndex, IndexSubmitter, SearchIndex};
use crate::intake::{generate_crawl_id, CrawlRequest};
use crate::model::CrawlStatus;
use crate::queue::LocalWorkQueue;
use crate::search::SearchRanker;
use crate::storage::{open_store, CrawlStateStore, KeyValueStore};
use std::sync::Arc;

/// A running crawler: workers consuming a local queue, feeding an index
pub struct CrawlEngine {
    orchestrator: Arc<Orchestrator>,
    queue: Arc<LocalWorkQueue>,
    submitter: Arc<IndexSubmitter>,
    index: Arc<dyn SearchIndex>,
    workers: WorkerPool,
}

impl CrawlEngine {
    /// Opens the configured store and index and starts the workers
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let kv = open_store(&config.storage)?;
        let index: Arc<dyn SearchIndex> = Arc::new(ElasticsearchIndex::from_config(&config.index)?);
        Self::with_parts(config, kv, index)
    }

    /// Starts an engine over an existing store and index
    pub fn with_parts(
        config: &Config,
        kv: Arc<dyn KeyValueStore>,
        index: Arc<dyn SearchIndex>,
    ) -> crate::Result<Self> {
        let client = build_http_client(&config.user_agent)?;
        let fetcher = Arc::new(Fetcher::new(client, FetchPolicy::from_config(&config.crawler)));

        let queue = Arc::new(LocalWorkQueue::new());
        let submitter = Arc::new(IndexSubmitter::start(
            Arc::clone(&index),
            config.index.submit_workers as usize,
            config.index.queue_capacity,
        ));

        let orchestrator = Arc::new(Orchestrator::new(
            CrawlStateStore::new(kv),
            fetcher,
            Arc::clone(&submitter),
            queue.clone(),
            config.crawler.min_content_length,
        ));
        let workers = WorkerPool::start(
            Arc::clone(&orchestrator),
            Arc::clone(&queue),
            config.crawler.workers as usize,
        );

        tracing::info!(
            "Crawl engine ready: {} workers, {} index submitters",
            workers.size(),
            config.index.submit_workers
        );

        Ok(Self {
            orchestrator,
            queue,
            submitter,
            index,
            workers,
        })
    }

    /// Starts a crawl under a fresh id and returns the id with the initial status
    pub fn start(&self, request: &CrawlRequest) -> crate::Result<(String, CrawlStatus)> {
        let crawl_id = generate_crawl_id();
        let status = self.orchestrator.start_crawl(&crawl_id, request)?;
        Ok((crawl_id, status))
    }

    pub fn status(&self, crawl_id: &str) -> CrawlStatus {
        self.orchestrator.crawl_status(crawl_id)
    }

    pub fn stop(&self, crawl_id: &str, message: &str) -> crate::Result<CrawlStatus> {
        self.orchestrator.stop_crawl(crawl_id, message)
    }

    /// Stops every running crawl
    pub fn stop_all(&self, message: &str) {
        self.orchestrator.shutdown(message);
    }

    /// Resolves once no record is queued or in flight
    pub async fn wait_idle(&self) {
        self.queue.wait_idle().await;
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    pub fn ranker(&self) -> SearchRanker {
        SearchRanker::new(Arc::clone(&self.index))
    }

    /// Stops the workers, then lets queued index submissions drain
    pub async fn shutdown(self) {
        self.workers.stop().await;
        self.submitter.shutdown().await;
        tracing::info!("Crawl engine stopped");
    }
}
