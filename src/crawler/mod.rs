//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - HTML parsing, link and content extraction
//! - The per-record crawl state machine
//! - The frontier worker pool and engine wiring

mod content;
mod document;
mod engine;
mod fetcher;
mod links;
mod orchestrator;
mod worker;

pub use content::{extract_content, ExtractedContent};
pub use document::Document;
pub use engine::CrawlEngine;
pub use fetcher::{build_http_client, FetchError, FetchPolicy, FetchedPage, Fetcher};
pub use links::extract_links;
pub use orchestrator::{compute_stop_reason, Orchestrator, RecordOutcome};
pub use worker::WorkerPool;
