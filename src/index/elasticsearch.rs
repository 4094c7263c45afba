//! Elasticsearch REST client
//!
//! Documents are added with `POST /{index}/_doc` and queried with
//! `POST /{index}/_search`. Every request carries
//! `Authorization: Basic base64(api-key)`.

use crate::config::IndexConfig;
use crate::index::{IndexError, SearchHit, SearchIndex};
use crate::model::UrlSearchDoc;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub struct ElasticsearchIndex {
    client: Client,
    base_url: String,
    index_name: String,
    auth_header: Option<String>,
    refresh: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_source", default)]
    source: Option<HitSource>,
    #[serde(default)]
    highlight: HashMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct HitSource {
    #[serde(default)]
    url: Option<String>,
}

impl RawHit {
    fn into_hit(mut self) -> SearchHit {
        let mut first_fragment = |field: &str| {
            self.highlight
                .remove(field)
                .and_then(|fragments| fragments.into_iter().next())
                .filter(|f| !f.is_empty())
        };
        let title_highlight = first_fragment("title");
        let content_highlight = first_fragment("content");

        SearchHit {
            url: self.source.and_then(|s| s.url),
            title_highlight,
            content_highlight,
        }
    }
}

impl ElasticsearchIndex {
    pub fn new(client: Client, config: &IndexConfig) -> Self {
        let auth_header = if config.api_key.is_empty() {
            None
        } else {
            Some(format!("Basic {}", STANDARD.encode(config.api_key.as_bytes())))
        };

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            index_name: config.index_name.clone(),
            auth_header,
            refresh: config.refresh,
        }
    }

    /// Builds a client with its own HTTP connection pool
    pub fn from_config(config: &IndexConfig) -> Result<Self, IndexError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self::new(client, config))
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.post(url);
        match &self.auth_header {
            Some(value) => request.header(AUTHORIZATION, value),
            None => request,
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, IndexError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(IndexError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl SearchIndex for ElasticsearchIndex {
    async fn index_document(&self, doc: &UrlSearchDoc) -> Result<(), IndexError> {
        let mut url = format!("{}/{}/_doc", self.base_url, self.index_name);
        if self.refresh {
            url.push_str("?refresh=true");
        }

        let response = self.post(&url).json(doc).send().await?;
        Self::check_status(response).await?;
        tracing::debug!("Indexed {}", doc.url);
        Ok(())
    }

    async fn query(&self, body: &serde_json::Value) -> Result<Vec<SearchHit>, IndexError> {
        let url = format!("{}/{}/_search", self.base_url, self.index_name);
        let response = self.post(&url).json(body).send().await?;
        let response = Self::check_status(response).await?;

        let parsed: SearchResponse = response.json().await?;
        Ok(parsed.hits.hits.into_iter().map(RawHit::into_hit).collect())
    }
}
