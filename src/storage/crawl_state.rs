//! Per-crawl bookkeeping on top of the shared key-value store
//!
//! Keys are namespaced by crawl id:
//!
//! | Key | Holds |
//! |-----|-------|
//! | `<id>.status` | `CrawlStatus` as JSON |
//! | `<id>.urls.count` | number of distinct visited URLs |
//! | `<id>.visited` | set of visited (or enqueued) URLs |

use crate::model::{now_millis, CrawlStatus};
use crate::storage::traits::{KeyValueStore, StorageError, StorageResult};
use std::sync::Arc;

fn status_key(crawl_id: &str) -> String {
    format!("{}.status", crawl_id)
}

fn count_key(crawl_id: &str) -> String {
    format!("{}.urls.count", crawl_id)
}

fn visited_key(crawl_id: &str) -> String {
    format!("{}.visited", crawl_id)
}

/// Result of trying to claim a page slot for a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// Newly marked; holds the visited count including this URL
    Reserved(u64),
    AlreadyVisited,
    /// The page budget is spent; the URL was not marked
    BudgetExhausted,
}

/// Crawl status, visited set and visited counter for every crawl
///
/// Holds no crawl state itself; every call goes to the backing store, so
/// any number of workers (in any number of processes) can share one.
#[derive(Clone)]
pub struct CrawlStateStore {
    kv: Arc<dyn KeyValueStore>,
}

impl CrawlStateStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Clears anything left under `crawl_id` and writes a fresh status
    pub fn init_crawl(
        &self,
        crawl_id: &str,
        start_time_millis: i64,
        max_time_millis: i64,
    ) -> StorageResult<CrawlStatus> {
        self.kv.del(&status_key(crawl_id))?;
        self.kv.del(&count_key(crawl_id))?;
        self.kv.del(&visited_key(crawl_id))?;

        let status = CrawlStatus::started(start_time_millis, max_time_millis);
        self.kv
            .set(&status_key(crawl_id), &serde_json::to_string(&status)?)?;
        tracing::debug!("Initialized crawl state for {}", crawl_id);
        Ok(status)
    }

    pub fn read_status(&self, crawl_id: &str) -> StorageResult<Option<CrawlStatus>> {
        match self.kv.get(&status_key(crawl_id))? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Persists `status`, merged with whatever is already stored
    ///
    /// Stamps `last_modified_millis`. See [`CrawlStatus::merged_onto`] for
    /// the merge rules. The read, merge and write happen as one store
    /// update, so concurrent writers never overwrite each other.
    pub fn write_status(&self, crawl_id: &str, status: CrawlStatus) -> StorageResult<CrawlStatus> {
        self.merge_status(crawl_id, |_| status)
    }

    /// Applies `update` to the stored status (or a zeroed one) and writes it back
    ///
    /// Runs as a single atomic store update, like [`write_status`](Self::write_status).
    pub fn update_status<F>(&self, crawl_id: &str, update: F) -> StorageResult<CrawlStatus>
    where
        F: FnOnce(&mut CrawlStatus),
    {
        self.merge_status(crawl_id, |prior| {
            let mut status = prior.cloned().unwrap_or_default();
            update(&mut status);
            status
        })
    }

    fn merge_status<F>(&self, crawl_id: &str, next: F) -> StorageResult<CrawlStatus>
    where
        F: FnOnce(Option<&CrawlStatus>) -> CrawlStatus,
    {
        let mut next = Some(next);
        let mut merged = None;
        self.kv.update(&status_key(crawl_id), &mut |current| {
            let prior: Option<CrawlStatus> = current.map(serde_json::from_str).transpose()?;
            let build = next.take().ok_or_else(|| {
                StorageError::Database("status update applied twice".to_string())
            })?;
            let status = build(prior.as_ref());

            let now = now_millis();
            let status = match &prior {
                Some(prior) => status.merged_onto(prior, now),
                None => CrawlStatus {
                    last_modified_millis: now,
                    ..status
                },
            };
            let raw = serde_json::to_string(&status)?;
            merged = Some(status);
            Ok(raw)
        })?;
        merged.ok_or_else(|| StorageError::Database("status update produced no value".to_string()))
    }

    pub fn visited_count(&self, crawl_id: &str) -> StorageResult<u64> {
        match self.kv.get(&count_key(crawl_id))? {
            Some(raw) => Ok(raw.parse::<u64>().unwrap_or(0)),
            None => Ok(0),
        }
    }

    pub fn is_visited(&self, crawl_id: &str, url: &str) -> StorageResult<bool> {
        self.kv.sismember(&visited_key(crawl_id), url)
    }

    /// Atomically adds `url` to the visited set
    ///
    /// Returns true if the URL was newly added; the visited counter is then
    /// incremented and the status page count refreshed. Returns false if
    /// some worker already marked it.
    pub fn try_mark_visited(&self, crawl_id: &str, url: &str) -> StorageResult<bool> {
        Ok(matches!(
            self.reserve_url(crawl_id, url, None)?,
            Reservation::Reserved(_)
        ))
    }

    /// Marks `url` visited only while fewer than `max_urls` pages are counted
    ///
    /// The budget check and the counter increment are one store update, so
    /// concurrent callers can never push the count past `max_urls`. A URL
    /// that loses the budget race is taken back out of the visited set.
    pub fn reserve_url(
        &self,
        crawl_id: &str,
        url: &str,
        max_urls: Option<u64>,
    ) -> StorageResult<Reservation> {
        let visited = visited_key(crawl_id);
        if !self.kv.sadd(&visited, url)? {
            return Ok(Reservation::AlreadyVisited);
        }

        let count = match max_urls {
            None => u64::try_from(self.kv.incr(&count_key(crawl_id), 1)?).unwrap_or(0),
            Some(max_urls) => {
                let mut granted = None;
                self.kv.update(&count_key(crawl_id), &mut |current| {
                    let count = current.and_then(|raw| raw.parse::<u64>().ok()).unwrap_or(0);
                    if count >= max_urls {
                        return Ok(count.to_string());
                    }
                    granted = Some(count + 1);
                    Ok((count + 1).to_string())
                })?;
                match granted {
                    Some(count) => count,
                    None => {
                        self.kv.srem(&visited, url)?;
                        return Ok(Reservation::BudgetExhausted);
                    }
                }
            }
        };

        self.update_status(crawl_id, |status| status.num_pages = count)?;
        Ok(Reservation::Reserved(count))
    }

    /// Drops the visited set; the counter and the status are kept
    pub fn clear_visited(&self, crawl_id: &str) -> StorageResult<()> {
        self.kv.del(&visited_key(crawl_id))
    }
}
