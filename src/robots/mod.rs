//! Robots.txt handling module
//!
//! Fetches `/robots.txt` at a URL's origin, caches the coarse rules per
//! origin and reports whether the site asks crawlers to stay away.
//! Fetch failures of any kind count as "not blocked".

mod cache;
mod parser;

pub use cache::CachedRobots;
pub use parser::RobotsRules;

use reqwest::Client;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

/// Best-effort robots.txt checker with a per-origin cache
pub struct RobotsChecker {
    client: Client,
    timeout: Duration,
    cache: Mutex<HashMap<String, CachedRobots>>,
}

impl RobotsChecker {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true if the origin's robots.txt carries a disallow signal
    pub async fn is_disallowed(&self, url: &Url) -> bool {
        let origin = url.origin().ascii_serialization();

        if let Some(rules) = self.cached(&origin) {
            tracing::trace!("Using cached robots.txt for {}", origin);
            return rules.has_disallow_signal();
        }

        let rules = self.fetch_rules(&origin).await;
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(origin, CachedRobots::new(rules));
        }
        rules.has_disallow_signal()
    }

    fn cached(&self, origin: &str) -> Option<RobotsRules> {
        let cache = self.cache.lock().ok()?;
        cache
            .get(origin)
            .filter(|entry| !entry.is_stale())
            .map(|entry| entry.rules)
    }

    async fn fetch_rules(&self, origin: &str) -> RobotsRules {
        let robots_url = format!("{}/robots.txt", origin);
        tracing::debug!("Fetching {}", robots_url);

        let response = match self
            .client
            .get(&robots_url)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::debug!("{} returned {}", robots_url, response.status());
                return RobotsRules::allow_all();
            }
            Err(e) => {
                tracing::debug!("Failed to fetch {}: {}", robots_url, e);
                return RobotsRules::allow_all();
            }
        };

        match response.text().await {
            Ok(body) => RobotsRules::from_content(&body),
            Err(e) => {
                tracing::debug!("Failed to read {}: {}", robots_url, e);
                RobotsRules::allow_all()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn checker() -> RobotsChecker {
        RobotsChecker::new(Client::new(), Duration::from_secs(2))
    }

    #[tokio::test]
    async fn test_disallow_root_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
            .expect(1)
            .mount(&server)
            .await;

        let checker = checker();
        let url = Url::parse(&format!("{}/some/page", server.uri())).unwrap();
        assert!(checker.is_disallowed(&url).await);
        // second lookup is served from the cache (expect(1) above)
        assert!(checker.is_disallowed(&url).await);
    }

    #[tokio::test]
    async fn test_missing_robots_is_not_blocked() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/", server.uri())).unwrap();
        assert!(!checker().is_disallowed(&url).await);
    }

    #[tokio::test]
    async fn test_unreachable_origin_is_not_blocked() {
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        assert!(!checker().is_disallowed(&url).await);
    }
}
