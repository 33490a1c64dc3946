//! URL handling module for Site-Mirror
//!
//! This module provides start-URL validation and the domain extraction used to scope a
//! crawl to a single site.

mod domain;

use crate::{UrlError, UrlResult};
use url::Url;

// Re-export main functions
pub use domain::extract_domain;

/// Parses and validates the URL a crawl starts from
///
/// The start URL must be absolute, use the `http` or `https` scheme and carry a host;
/// anything else cannot be mirrored.
///
/// # Arguments
///
/// * `raw` - The URL string supplied by the user
///
/// # Returns
///
/// * `Ok(Url)` - The parsed start URL
/// * `Err(UrlError)` - The URL is malformed, has an unsupported scheme or no host
///
/// # Examples
///
/// ```
/// use site_mirror::url::parse_start_url;
///
/// let url = parse_start_url("https://example.com/docs/").unwrap();
/// assert_eq!(url.host_str(), Some("example.com"));
///
/// assert!(parse_start_url("ftp://example.com/").is_err());
/// assert!(parse_start_url("not a url").is_err());
/// ```
pub fn parse_start_url(raw: &str) -> UrlResult<Url> {
    let url = Url::parse(raw.trim())?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}
