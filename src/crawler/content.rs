//! Indexable text extraction
//!
//! Text is collected in priority order: Open-Graph title, meta description
//! (or Open-Graph description), article-like elements (or every paragraph
//! when there are none). If that yields fewer than `min_len` characters the
//! visible body text is appended.

use crate::crawler::Document;
use scraper::{ElementRef, Html, Node, Selector};

/// Text pulled out of one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedContent {
    /// Open-Graph title, else `<title>`
    pub title: Option<String>,
    pub text: String,
}

impl ExtractedContent {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

pub fn extract_content(doc: &Document, min_len: usize) -> ExtractedContent {
    let html = &doc.html;
    let og_title = meta_content(html, "meta[property='og:title']");
    let title = og_title.clone().or_else(|| element_text(html, "title"));

    let mut parts: Vec<String> = Vec::new();
    if let Some(t) = og_title {
        parts.push(t);
    }

    let description = meta_content(html, "meta[name='description']")
        .or_else(|| meta_content(html, "meta[property='og:description']"));
    if let Some(d) = description {
        parts.push(d);
    }

    let articles = all_texts(html, "article, .article, [itemprop='articleBody']");
    if articles.is_empty() {
        parts.extend(all_texts(html, "p"));
    } else {
        parts.extend(articles);
    }

    let mut text = parts.join("\n");
    if text.chars().count() < min_len {
        let body = body_text(html);
        if !body.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&body);
        }
    }

    ExtractedContent { title, text }
}

fn meta_content(html: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    html.select(&selector)
        .filter_map(|e| e.value().attr("content"))
        .map(|c| c.trim().to_string())
        .find(|c| !c.is_empty())
}

fn element_text(html: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    html.select(&selector)
        .next()
        .map(|e| collapse_whitespace(&e.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

fn all_texts(html: &Html, selector: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };
    html.select(&selector)
        .map(visible_text)
        .filter(|s| !s.is_empty())
        .collect()
}

fn body_text(html: &Html) -> String {
    let Ok(selector) = Selector::parse("body") else {
        return String::new();
    };
    html.select(&selector)
        .next()
        .map(visible_text)
        .unwrap_or_default()
}

/// Element text with `script`, `style` and `noscript` subtrees skipped
fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        if let Node::Text(text) = node.value() {
            let hidden = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .map(|e| matches!(e.name(), "script" | "style" | "noscript"))
                    .unwrap_or(false)
            });
            if !hidden {
                out.push_str(text);
                out.push(' ');
            }
        }
    }
    collapse_whitespace(&out)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
