//! Same-site link extraction
//!
//! Only `<a href>` links are followed. A link is kept when, after resolving
//! and dropping its fragment, the absolute URL starts with the crawl's base
//! URL.

use crate::crawler::Document;
use crate::url::{is_in_scope, is_non_navigable};
use scraper::Selector;
use std::collections::HashSet;

/// Extracts in-scope absolute links from a document
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` resolved against the document base
///
/// **Exclude:**
/// - `javascript:` and `mailto:` links
/// - fragment-only links (same page anchors)
/// - anything that is not http(s) after resolution
/// - URLs that do not start with `base_url`
///
/// Fragments are stripped and duplicates removed, keeping first-seen order.
///
/// # Arguments
///
/// * `base_url` - The crawl's base URL (scope prefix)
/// * `doc` - The parsed page
pub fn extract_links(base_url: &str, doc: &Document) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in doc.html.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if let Some(link) = resolve_link(href, doc) {
            if is_in_scope(base_url, &link) && seen.insert(link.clone()) {
                links.push(link);
            }
        }
    }

    links
}

fn resolve_link(href: &str, doc: &Document) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || is_non_navigable(href) {
        return None;
    }

    let mut absolute = doc.resolve(href)?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }
    absolute.set_fragment(None);
    Some(absolute.to_string())
}
