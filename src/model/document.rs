use serde::{Deserialize, Serialize};

/// A fetched page as submitted to the search index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlSearchDoc {
    pub crawl_id: String,
    pub url: String,
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
    pub distance: u32,
    pub content_type: String,
}

/// One ranked search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResultDto {
    pub url: String,
    /// Highlighted excerpt; empty when the index returned none
    pub snippet: String,
}

impl SearchResultDto {
    pub fn new(url: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            snippet: snippet.into(),
        }
    }
}
