//! Search ranking and deduplication
//!
//! A query is sent to the index once, asking for up to 100 candidates. The
//! raw hits are then filtered and reordered by [`rank_hits`]:
//!
//! 1. Drop hits without a URL and repeated URLs (first occurrence wins)
//! 2. Drop homepages (empty or `/` path)
//! 3. Put article-like URLs first, keeping index order within each group
//! 4. Snippet is the title highlight, else the content highlight, else empty
//! 5. Stop at 50 results

use crate::index::{IndexError, SearchHit, SearchIndex};
use crate::model::SearchResultDto;
use crate::url::{is_article_like, is_homepage};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Candidates requested from the index per query
pub const CANDIDATE_HITS: usize = 100;

/// Maximum results returned to the caller
pub const MAX_RESULTS: usize = 50;

pub struct SearchRanker {
    index: Arc<dyn SearchIndex>,
}

impl SearchRanker {
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self { index }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchResultDto>, IndexError> {
        let body = build_query(query);
        let hits = self.index.query(&body).await?;
        let results = rank_hits(hits);
        tracing::debug!("Query {:?} ranked {} results", query, results.len());
        Ok(results)
    }
}

/// Query-DSL body: all terms must match in `title` (boosted) or `content`
pub fn build_query(query: &str) -> Value {
    json!({
        "size": CANDIDATE_HITS,
        "query": {
            "multi_match": {
                "query": query,
                "fields": ["title^2", "content"],
                "operator": "and"
            }
        },
        "highlight": {
            "pre_tags": ["<em>"],
            "post_tags": ["</em>"],
            "fields": {
                "title": {},
                "content": {}
            }
        }
    })
}

pub fn rank_hits(hits: Vec<SearchHit>) -> Vec<SearchResultDto> {
    let mut seen = HashSet::new();
    let mut articles = Vec::new();
    let mut others = Vec::new();

    for hit in hits {
        let Some(url) = hit.url.filter(|u| !u.trim().is_empty()) else {
            continue;
        };
        if !seen.insert(url.clone()) {
            continue;
        }
        if Url::parse(&url).map(|u| is_homepage(&u)).unwrap_or(false) {
            continue;
        }

        let snippet = hit
            .title_highlight
            .or(hit.content_highlight)
            .unwrap_or_default();
        let article = is_article_like(&url);
        let result = SearchResultDto::new(url, snippet);
        if article {
            articles.push(result);
        } else {
            others.push(result);
        }
    }

    articles
        .into_iter()
        .chain(others)
        .take(MAX_RESULTS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UrlSearchDoc;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn hit(url: &str, title: Option<&str>, content: Option<&str>) -> SearchHit {
        SearchHit {
            url: Some(url.to_string()),
            title_highlight: title.map(str::to_string),
            content_highlight: content.map(str::to_string),
        }
    }

    #[test]
    fn test_dedup_and_homepage_removal() {
        let hits = vec![
            hit("https://www.example.com/", Some("home"), None),
            hit("https://www.example.com/news/b", None, None),
            hit("https://www.example.com/news/b", Some("dup"), None),
            hit("https://www.example.com/a/b/c/d", None, Some("<em>c</em>")),
        ];

        let results = rank_hits(hits);
        assert_eq!(
            results,
            vec![
                SearchResultDto::new("https://www.example.com/news/b", ""),
                SearchResultDto::new("https://www.example.com/a/b/c/d", "<em>c</em>"),
            ]
        );
    }

    #[test]
    fn test_articles_come_first() {
        let hits = vec![
            hit("https://www.example.com/about", None, Some("about")),
            hit("https://www.example.com/2024/01/02/story", None, Some("story")),
            hit("https://www.example.com/contact", None, None),
            hit("https://www.example.com/view?id=42", Some("view"), None),
        ];

        let urls: Vec<_> = rank_hits(hits).into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.example.com/2024/01/02/story",
                "https://www.example.com/view?id=42",
                "https://www.example.com/about",
                "https://www.example.com/contact",
            ]
        );
    }

    #[test]
    fn test_snippet_prefers_title() {
        let results = rank_hits(vec![hit(
            "https://www.example.com/p",
            Some("<em>title</em>"),
            Some("<em>content</em>"),
        )]);
        assert_eq!(results[0].snippet, "<em>title</em>");
    }

    #[test]
    fn test_missing_urls_dropped() {
        let hits = vec![
            SearchHit::default(),
            hit("", Some("x"), None),
            hit("https://www.example.com/ok", None, None),
        ];
        let results = rank_hits(hits);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "https://www.example.com/ok");
    }

    #[test]
    fn test_capped_at_fifty() {
        let hits = (0..120)
            .map(|i| hit(&format!("https://www.example.com/page{}", i), None, None))
            .collect();
        assert_eq!(rank_hits(hits).len(), MAX_RESULTS);
    }

    #[test]
    fn test_query_shape() {
        let body = build_query("rust crawler");
        assert_eq!(body["size"], 100);
        assert_eq!(body["query"]["multi_match"]["query"], "rust crawler");
        assert_eq!(body["query"]["multi_match"]["operator"], "and");
        assert_eq!(body["highlight"]["pre_tags"][0], "<em>");
        assert!(body["highlight"]["fields"].get("title").is_some());
        assert!(body["highlight"]["fields"].get("content").is_some());
    }

    struct CannedIndex {
        hits: Vec<SearchHit>,
        queries: Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl SearchIndex for CannedIndex {
        async fn index_document(&self, _doc: &UrlSearchDoc) -> Result<(), IndexError> {
            Ok(())
        }

        async fn query(&self, body: &Value) -> Result<Vec<SearchHit>, IndexError> {
            self.queries.lock().unwrap().push(body.clone());
            Ok(self.hits.clone())
        }
    }

    #[tokio::test]
    async fn test_search_runs_one_query() {
        let index = Arc::new(CannedIndex {
            hits: vec![
                hit("https://www.example.com/", None, None),
                hit("https://www.example.com/article/x", None, Some("x")),
            ],
            queries: Mutex::new(Vec::new()),
        });
        let ranker = SearchRanker::new(index.clone());

        let results = ranker.search("x").await.unwrap();
        assert_eq!(results, vec![SearchResultDto::new("https://www.example.com/article/x", "x")]);
        assert_eq!(index.queries.lock().unwrap().len(), 1);
    }
}
