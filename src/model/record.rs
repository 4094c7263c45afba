use serde::{Deserialize, Serialize};

/// Limits fixed for the lifetime of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlBounds {
    /// Maximum hop count from the seed
    pub max_distance: u32,

    /// Wall-clock budget in seconds
    pub max_seconds: u64,

    /// Maximum number of distinct URLs; 0 means unbounded
    pub max_urls: u64,
}

impl CrawlBounds {
    pub fn new(max_distance: u32, max_seconds: u64, max_urls: u64) -> Self {
        Self {
            max_distance,
            max_seconds,
            max_urls,
        }
    }

    pub fn is_url_bounded(&self) -> bool {
        self.max_urls > 0
    }

    /// The page budget, or `None` for an unbounded crawl
    pub fn url_budget(&self) -> Option<u64> {
        self.is_url_bounded().then_some(self.max_urls)
    }
}

/// One unit of dispatchable crawl work: one URL at one distance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontierRecord {
    pub crawl_id: String,

    /// The seed's URL; outbound links must start with it to stay in scope
    pub base_url: String,

    /// The page this record fetches
    pub url: String,

    /// Hops from the seed (seed = 0)
    pub distance: u32,

    pub bounds: CrawlBounds,

    pub start_time_millis: i64,

    /// `start_time_millis + max_seconds * 1000`
    pub deadline_millis: i64,
}

impl FrontierRecord {
    /// Builds the distance-0 record for a crawl's seed URL
    pub fn seed(
        crawl_id: impl Into<String>,
        url: impl Into<String>,
        bounds: CrawlBounds,
        start_time_millis: i64,
    ) -> Self {
        let url = url.into();
        let budget_millis = i64::try_from(bounds.max_seconds.saturating_mul(1000)).unwrap_or(i64::MAX);
        Self {
            crawl_id: crawl_id.into(),
            base_url: url.clone(),
            url,
            distance: 0,
            bounds,
            start_time_millis,
            deadline_millis: start_time_millis.saturating_add(budget_millis),
        }
    }

    /// Derives the record for an outbound link of this page
    pub fn child(&self, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            distance: self.distance + 1,
            ..self.clone()
        }
    }

    pub fn is_past_deadline(&self, now_millis: i64) -> bool {
        now_millis >= self.deadline_millis
    }

    /// True when this record's children would exceed the distance bound
    pub fn is_at_frontier_edge(&self) -> bool {
        self.distance >= self.bounds.max_distance
    }
}
