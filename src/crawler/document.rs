//! Parsed HTML page
//!
//! `scraper::Html` is not `Send`, so a [`Document`] must be created, queried
//! and dropped without crossing an `.await`.

use scraper::{Html, Selector};
use url::Url;

pub struct Document {
    /// The URL the page was fetched from
    pub url: Url,

    /// Base for resolving relative links (`<base href>` if present)
    pub base: Url,

    pub html: Html,
}

impl Document {
    pub fn parse(url: Url, body: &str) -> Self {
        let html = Html::parse_document(body);
        let base = base_href(&html, &url).unwrap_or_else(|| url.clone());
        Self { url, base, html }
    }

    /// Resolves `href` against the document base
    pub fn resolve(&self, href: &str) -> Option<Url> {
        self.base.join(href).ok()
    }
}

fn base_href(html: &Html, url: &Url) -> Option<Url> {
    let selector = Selector::parse("base[href]").ok()?;
    let href = html.select(&selector).next()?.value().attr("href")?;
    url.join(href.trim()).ok()
}
