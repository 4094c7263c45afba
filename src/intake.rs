//! Crawl request intake and status wire format

use crate::model::{CrawlBounds, CrawlStatus, StopReason};
use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Length of generated crawl ids
pub const CRAWL_ID_LEN: usize = 6;

/// A request to crawl a site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlRequest {
    pub url: String,
    pub max_distance: u32,
    pub max_seconds: u64,
    #[serde(default)]
    pub max_urls: u64,
}

impl CrawlRequest {
    pub fn bounds(&self) -> CrawlBounds {
        CrawlBounds::new(self.max_distance, self.max_seconds, self.max_urls)
    }
}

/// Random six-character crawl id drawn from `[A-Za-z0-9]`
pub fn generate_crawl_id() -> String {
    uuid::Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(CRAWL_ID_LEN)
        .map(|b| ID_ALPHABET[usize::from(*b) % ID_ALPHABET.len()] as char)
        .collect()
}

/// Crawl status as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlStatusOut {
    pub distance: u32,
    pub stop_reason: Option<StopReason>,
    pub num_pages: u64,
    pub error_message: Option<String>,
    pub start_time_millis: i64,
    pub last_modified_millis: i64,
    pub max_time_millis: i64,
    /// `yyyy-MM-dd HH:mm:ss`, local time
    pub start_time: Option<String>,
    pub last_modified: Option<String>,
}

impl From<&CrawlStatus> for CrawlStatusOut {
    fn from(status: &CrawlStatus) -> Self {
        Self {
            distance: status.distance,
            stop_reason: status.stop_reason,
            num_pages: status.num_pages,
            error_message: status.error_message.clone(),
            start_time_millis: status.start_time_millis,
            last_modified_millis: status.last_modified_millis,
            max_time_millis: status.max_time_millis,
            start_time: format_millis(status.start_time_millis),
            last_modified: format_millis(status.last_modified_millis),
        }
    }
}

fn format_millis(millis: i64) -> Option<String> {
    if millis <= 0 {
        return None;
    }
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
}
