//! Search index access
//!
//! [`SearchIndex`] is the seam between the crawler and the index backend.
//! [`ElasticsearchIndex`] talks to an Elasticsearch-compatible REST API and
//! [`IndexSubmitter`] pushes crawled documents to any [`SearchIndex`] from a
//! bounded pool of background tasks.

mod elasticsearch;
mod submitter;

pub use elasticsearch::ElasticsearchIndex;
pub use submitter::IndexSubmitter;

use crate::model::UrlSearchDoc;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by the search index layer
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Index request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Index returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Indexing queue is full")]
    QueueFull,

    #[error("Indexing submitter is shut down")]
    Closed,
}

/// One raw hit returned by the index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHit {
    pub url: Option<String>,
    /// First highlighted fragment of the title field
    pub title_highlight: Option<String>,
    /// First highlighted fragment of the content field
    pub content_highlight: Option<String>,
}

/// Document store with indexing and query operations
#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn index_document(&self, doc: &UrlSearchDoc) -> Result<(), IndexError>;

    /// Runs a query-DSL request body and returns the hits in index order
    async fn query(&self, body: &serde_json::Value) -> Result<Vec<SearchHit>, IndexError>;
}
