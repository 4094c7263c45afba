//! URL-shape heuristics used to rank search results
//!
//! Article-like URLs point at individual content pages; the rest are
//! treated as index or listing pages.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

// Constant patterns; `expect` can only fire if a literal here is edited wrong.
static ID_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(docid|articleid|newsid|storyid|id)=\d+").expect("hardcoded regex pattern is valid")
});

static DATE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\d{4}/\d{2}/\d{2}/").expect("hardcoded regex pattern is valid"));

/// Non-empty `/`-separated path segments
pub fn path_depth(url: &Url) -> usize {
    url.path().split('/').filter(|s| !s.is_empty()).count()
}

/// True when the path is empty or `/`
pub fn is_homepage(url: &Url) -> bool {
    let path = url.path();
    path.is_empty() || path == "/"
}

/// Classifies a URL as an article-like content page
///
/// Any one of these is enough:
/// - contains `/article/` or `/news/`
/// - contains `docid=`, `articleid=`, `newsid=`, `storyid=` or `id=`
///   followed by digits, anywhere in the URL (so `pid=12` counts too)
/// - contains a `/YYYY/MM/DD/` date path
/// - has a path segment of six or more digits
/// - has a path depth of three or more
pub fn is_article_like(raw: &str) -> bool {
    let lower = raw.to_lowercase();
    if lower.contains("/article/") || lower.contains("/news/") {
        return true;
    }
    if ID_PARAM.is_match(raw) || DATE_PATH.is_match(raw) {
        return true;
    }

    match Url::parse(raw) {
        Ok(url) => {
            let long_numeric = url
                .path()
                .split('/')
                .any(|seg| seg.len() >= 6 && seg.chars().all(|c| c.is_ascii_digit()));
            long_numeric || path_depth(&url) >= 3
        }
        Err(_) => false,
    }
}
