//! Crawl data model
//!
//! Values exchanged between the orchestrator, the shared store, the work
//! queue and the search index. Records and documents are built once and
//! never mutated after being handed to another component.

mod document;
mod record;
mod status;

pub use document::{SearchResultDto, UrlSearchDoc};
pub use record::{CrawlBounds, FrontierRecord};
pub use status::{CrawlStatus, StopReason};

/// Current wall-clock time as epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
