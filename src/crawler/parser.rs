//! Markup parser for listing and article pages
//!
//! Both entry points are pure functions of the markup and the source's
//! selector rules:
//! - [`extract_links`] pulls candidate article URLs out of a listing page
//! - [`extract_document`] pulls title, body and publication time out of an
//!   article page

use crate::config::SourceConfig;
use crate::crawler::timestamp::{parse_date_text, parse_datetime_attr};
use crate::url::{
    canonicalize_url, extract_domain, host_matches, is_non_document_url, is_non_navigational_href,
};
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

/// A title must be longer than this many characters
const MIN_TITLE_CHARS: usize = 10;

/// A paragraph must be longer than this many characters to count as body text
const MIN_PARAGRAPH_CHARS: usize = 20;

/// Minimum length of a container's full text when no paragraph qualifies
const MIN_CONTAINER_CHARS: usize = 50;

/// A parsed article page
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub url: String,
    pub title: String,
    pub body: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub source: String,
}

/// Article page parse failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("NO_TITLE")]
    NoTitle,
}

fn compile(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(selector) => Some(selector),
        Err(_) => {
            tracing::warn!(selector = %selector, "Ignoring unparseable selector");
            None
        }
    }
}

/// Normalizes whitespace in extracted text
///
/// Runs of spaces and tabs become a single space, each line is trimmed, and
/// runs of blank lines collapse to one blank line.
pub fn normalize_whitespace(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut previous_blank = true;

    for line in text.lines() {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            if !previous_blank {
                lines.push(String::new());
            }
            previous_blank = true;
        } else {
            lines.push(collapsed);
            previous_blank = false;
        }
    }

    while lines.last().map_or(false, |l| l.is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}

/// Rendered text of an element collapsed onto a single line
fn inline_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Base URL for resolving listing hrefs: the document's `<base href>` when
/// present, otherwise the listing URL itself
fn resolve_base(document: &Html, listing_url: &Url) -> Url {
    Selector::parse("base[href]")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .and_then(|el| el.value().attr("href"))
                .and_then(|href| listing_url.join(href.trim()).ok())
        })
        .unwrap_or_else(|| listing_url.clone())
}

/// Extracts candidate article URLs from a listing page
///
/// # Link Rules
///
/// **Include:** hrefs of elements matching the source's `article-links`
/// selector (or of the first `a[href]` inside a matched element), resolved
/// to absolute URLs.
///
/// **Exclude:**
/// - fragment-only, `javascript:`, `mailto:`, `tel:` and `data:` hrefs
/// - non-HTTP(S) URLs after resolution
/// - tag, category, author, pagination, search and auth pages
/// - hosts other than the listing's host (`www.` and subdomains tolerated)
///
/// Results keep document order and are de-duplicated by canonical URL;
/// fragments are removed.
///
/// # Example
///
/// ```no_run
/// use shoal::crawler::extract_links;
/// # fn example(source: &shoal::SourceConfig) {
/// let html = r#"<a class="headline" href="/read/1">One</a>"#;
/// let links = extract_links(html, source);
/// # }
/// ```
pub fn extract_links(markup: &str, config: &SourceConfig) -> Vec<String> {
    let listing_url = match Url::parse(&config.listing_url) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(source = %config.name, error = %e, "Listing URL does not parse");
            return Vec::new();
        }
    };
    let Some(configured_host) = extract_domain(&listing_url) else {
        return Vec::new();
    };
    let Some(link_selector) = compile(&config.selectors.article_links) else {
        return Vec::new();
    };
    let nested_anchor = Selector::parse("a[href]").ok();

    let document = Html::parse_document(markup);
    let base = resolve_base(&document, &listing_url);

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&link_selector) {
        let href = element.value().attr("href").or_else(|| {
            nested_anchor
                .as_ref()
                .and_then(|anchor| element.select(anchor).next())
                .and_then(|a| a.value().attr("href"))
        });
        let Some(href) = href else {
            continue;
        };

        if is_non_navigational_href(href) {
            continue;
        }

        let Ok(mut resolved) = base.join(href.trim()) else {
            continue;
        };
        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            continue;
        }
        resolved.set_fragment(None);

        let host_ok = extract_domain(&resolved)
            .map(|host| host_matches(&configured_host, &host))
            .unwrap_or(false);
        if !host_ok || is_non_document_url(&resolved) {
            tracing::trace!(url = %resolved, "Rejected listing link");
            continue;
        }

        if seen.insert(canonicalize_url(resolved.as_str())) {
            links.push(resolved.to_string());
        }
    }

    links
}

/// Removes every element matching any of the selectors
///
/// Detached nodes stay in the document's arena, and `Html::select` walks the
/// whole arena. Lookups after stripping therefore go through
/// `root_element()`, which only reaches nodes still attached to the tree.
fn strip_elements(document: &mut Html, selectors: &[String]) {
    for selector in selectors.iter().filter_map(|s| compile(s)) {
        let ids: Vec<_> = document
            .root_element()
            .select(&selector)
            .map(|el| el.id())
            .collect();
        for id in ids {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }
    }
}

fn extract_title(document: &Html, selectors: &[String]) -> Option<String> {
    for selector in selectors.iter().filter_map(|s| compile(s)) {
        let found = document
            .root_element()
            .select(&selector)
            .map(inline_text)
            .find(|text| text.chars().count() > MIN_TITLE_CHARS);
        if found.is_some() {
            return found;
        }
    }
    None
}

fn extract_body(document: &Html, selectors: &[String]) -> Option<String> {
    let paragraph = Selector::parse("p").ok()?;

    for selector in selectors.iter().filter_map(|s| compile(s)) {
        let Some(container) = document.root_element().select(&selector).next() else {
            continue;
        };

        let paragraphs: Vec<String> = container
            .select(&paragraph)
            .map(inline_text)
            .filter(|text| text.chars().count() > MIN_PARAGRAPH_CHARS)
            .collect();

        if !paragraphs.is_empty() {
            return Some(normalize_whitespace(&paragraphs.join("\n\n")));
        }

        let full_text = normalize_whitespace(&container.text().collect::<String>());
        if full_text.chars().count() > MIN_CONTAINER_CHARS {
            return Some(full_text);
        }
    }

    None
}

fn extract_timestamp(document: &Html, selectors: &[String]) -> Option<DateTime<Utc>> {
    for selector in selectors.iter().filter_map(|s| compile(s)) {
        for element in document.root_element().select(&selector) {
            let attr = element
                .value()
                .attr("datetime")
                .or_else(|| element.value().attr("content"));
            if let Some(parsed) = attr.and_then(parse_datetime_attr) {
                return Some(parsed);
            }

            if let Some(parsed) = parse_date_text(&inline_text(element)) {
                return Some(parsed);
            }
        }
    }
    None
}

/// Extracts an article from its page
///
/// Removal selectors are applied first. The title is mandatory; a missing
/// body or timestamp yields `None` for that field rather than an error.
///
/// # Returns
///
/// * `Ok(RawDocument)` - Title found; body and timestamp when available
/// * `Err(ParseError::NoTitle)` - No title selector produced usable text
pub fn extract_document(
    markup: &str,
    url: &str,
    config: &SourceConfig,
) -> Result<RawDocument, ParseError> {
    let mut document = Html::parse_document(markup);
    strip_elements(&mut document, &config.strip);

    let title = extract_title(&document, &config.selectors.title).ok_or(ParseError::NoTitle)?;
    let body = extract_body(&document, &config.selectors.body);
    let published_at = extract_timestamp(&document, &config.selectors.timestamp);

    Ok(RawDocument {
        url: url.to_string(),
        title,
        body,
        published_at,
        source: config.name.clone(),
    })
}
