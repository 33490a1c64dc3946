//! HTML parser for extracting same-domain pages and resources
//!
//! This module handles parsing downloaded HTML to find:
//! - Pages to follow (from `<a href>` tags)
//! - Resources to mirror (images, scripts, media sources and stylesheets)

use crate::url::extract_domain;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

/// Errors that can occur while extracting links
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Base URL has no host: {0}")]
    InvalidBase(String),
}

/// Links found on a page, both in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedLinks {
    /// Same-domain documents linked with `<a href>`
    pub pages: Vec<Url>,

    /// Same-domain resources embedded by the page
    pub resources: Vec<Url>,
}

/// Turns downloaded content into the URLs it references
pub trait LinkExtractor: Send + Sync {
    /// Extracts absolute same-domain page and resource URLs
    ///
    /// # Arguments
    ///
    /// * `content` - The downloaded bytes
    /// * `base_url` - The URL the content was downloaded from
    fn extract(&self, content: &[u8], base_url: &Url) -> Result<ExtractedLinks, ParseError>;
}

/// [`LinkExtractor`] for HTML documents
///
/// # Link Extraction Rules
///
/// **Pages:** `<a href="...">`
///
/// **Resources:** `<img src>`, `<script src>`, `<source src>`,
/// `<link rel="stylesheet" href>`; other `<link>` tags are ignored
///
/// **Excluded:**
/// - Links to another host (or port)
/// - `javascript:`, `mailto:`, `tel:` and `data:` targets
/// - Fragment-only links; fragments are stripped from all other links
/// - Non-HTTP(S) URLs after resolution
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLinkExtractor;

impl LinkExtractor for HtmlLinkExtractor {
    fn extract(&self, content: &[u8], base_url: &Url) -> Result<ExtractedLinks, ParseError> {
        let domain = extract_domain(base_url)
            .ok_or_else(|| ParseError::InvalidBase(base_url.to_string()))?;

        let html = String::from_utf8_lossy(content);
        let document = Html::parse_document(&html);

        Ok(ExtractedLinks {
            pages: extract_pages(&document, base_url, &domain),
            resources: extract_resources(&document, base_url, &domain),
        })
    }
}

/// Extracts followable page links from `<a>` tags
fn extract_pages(document: &Html, base_url: &Url, domain: &str) -> Vec<Url> {
    let mut pages = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(url) = resolve_link(href, base_url, domain) {
                    pages.push(url);
                }
            }
        }
    }

    pages
}

/// Extracts embedded resources in document order
fn extract_resources(document: &Html, base_url: &Url, domain: &str) -> Vec<Url> {
    let mut resources = Vec::new();

    let Ok(selector) = Selector::parse("img[src], script[src], source[src], link[href]") else {
        return resources;
    };

    for element in document.select(&selector) {
        let attr = if element.value().name() == "link" {
            if !is_stylesheet(&element) {
                continue;
            }
            "href"
        } else {
            "src"
        };

        if let Some(value) = element.value().attr(attr) {
            if let Some(url) = resolve_link(value, base_url, domain) {
                resources.push(url);
            }
        }
    }

    resources
}

fn is_stylesheet(element: &ElementRef<'_>) -> bool {
    element
        .value()
        .attr("rel")
        .map(|rel| {
            rel.split_whitespace()
                .any(|token| token.eq_ignore_ascii_case("stylesheet"))
        })
        .unwrap_or(false)
}

/// Resolves a link to an absolute same-domain URL
///
/// Returns None if the link should be excluded:
/// - empty, fragment-only or special-scheme references
/// - references that fail to resolve
/// - non-HTTP(S) URLs or URLs on another domain
fn resolve_link(href: &str, base_url: &Url, domain: &str) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;

    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }

    if extract_domain(&absolute_url).as_deref() != Some(domain) {
        return None;
    }

    absolute_url.set_fragment(None);
    Some(absolute_url)
}
