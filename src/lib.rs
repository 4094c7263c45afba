//! Crawlscope: a distributed breadth-first crawler feeding a full-text index
//!
//! A crawl starts from a seed URL with bounds (link distance, page count,
//! wall-clock time). Workers pull frontier records from a shared work queue,
//! fetch and extract each page, submit it to the search index and fan its
//! same-site links back out onto the queue. A shared key-value store holds
//! per-crawl status and the visited set; it is the only synchronization point
//! between workers.

pub mod config;
pub mod crawler;
pub mod index;
pub mod intake;
pub mod model;
pub mod queue;
pub mod robots;
pub mod search;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Crawlscope operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Index error: {0}")]
    Index(#[from] index::IndexError),

    #[error("Queue error: {0}")]
    Queue(#[from] queue::QueueError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Crawlscope operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlEngine, Fetcher, Orchestrator, WorkerPool};
pub use intake::{CrawlRequest, CrawlStatusOut};
pub use model::{CrawlBounds, CrawlStatus, FrontierRecord, SearchResultDto, StopReason, UrlSearchDoc};
pub use storage::{CrawlStateStore, KeyValueStore};
