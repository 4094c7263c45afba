//! Crawl status definitions
//!
//! One `CrawlStatus` exists per crawl id in the shared store. Every worker
//! writes it, so merging with the stored value keeps it monotonic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal condition that made a crawl (or one branch of it) stop dispatching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    MaxDistance,
    MaxUrls,
    Timeout,
    UserInitiated,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaxDistance => "maxDistance",
            Self::MaxUrls => "maxUrls",
            Self::Timeout => "timeout",
            Self::UserInitiated => "userInitiated",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live progress of one crawl
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlStatus {
    /// Distance of the most recently processed record
    pub distance: u32,

    pub start_time_millis: i64,

    pub last_modified_millis: i64,

    /// The crawl deadline
    #[serde(default)]
    pub max_time_millis: i64,

    /// Distinct visited URLs
    pub num_pages: u64,

    pub stop_reason: Option<StopReason>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl CrawlStatus {
    /// Fresh status for a crawl starting at `start_time_millis`
    pub fn started(start_time_millis: i64, max_time_millis: i64) -> Self {
        Self {
            distance: 0,
            start_time_millis,
            last_modified_millis: start_time_millis,
            max_time_millis,
            num_pages: 0,
            stop_reason: None,
            error_message: None,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_reason.is_some()
    }

    /// Records `reason` unless a reason is already present
    pub fn stop(&mut self, reason: StopReason) {
        if self.stop_reason.is_none() {
            self.stop_reason = Some(reason);
        }
    }

    /// Combines this (newer) status with the stored one
    ///
    /// `num_pages` and `last_modified_millis` never decrease, the first
    /// stop reason wins, and the newest error message replaces older ones.
    /// `last_modified_millis` is stamped with `now_millis`.
    pub fn merged_onto(mut self, prior: &CrawlStatus, now_millis: i64) -> Self {
        self.num_pages = self.num_pages.max(prior.num_pages);
        self.last_modified_millis = now_millis.max(prior.last_modified_millis);
        if prior.stop_reason.is_some() {
            self.stop_reason = prior.stop_reason;
        }
        if self.error_message.is_none() {
            self.error_message = prior.error_message.clone();
        }
        if self.start_time_millis == 0 {
            self.start_time_millis = prior.start_time_millis;
        }
        if self.max_time_millis == 0 {
            self.max_time_millis = prior.max_time_millis;
        }
        self
    }
}
