//! URL handling module for Crawlscope
//!
//! This module provides seed URL normalization, the same-site scope check
//! used during link expansion, and the URL-shape heuristics used by search
//! ranking.

mod classify;
mod normalize;

// Re-export main functions
pub use classify::{is_article_like, is_homepage, path_depth};
pub use normalize::normalize_seed_url;

/// Checks whether `url` belongs to the crawl rooted at `base_url`
///
/// This is a plain string-prefix check: `https://www.example.com.evil.com`
/// is in scope for `https://www.example.com`, and `http://` links are out of
/// scope for an `https://` base.
pub fn is_in_scope(base_url: &str, url: &str) -> bool {
    url.starts_with(base_url)
}

/// Returns true for links that cannot be navigated to
pub fn is_non_navigable(href: &str) -> bool {
    let lower = href.trim_start().to_ascii_lowercase();
    lower.starts_with("mailto:") || lower.starts_with("javascript:")
}
