//! Robots.txt handling module
//!
//! This module fetches a domain's robots.txt once per crawl and answers allow/deny
//! queries for the downloader.

mod parser;

pub use parser::RobotsPolicy;

use reqwest::{Client, StatusCode};
use thiserror::Error;

/// Errors that prevent building a domain's robots policy
///
/// Without a policy the crawler cannot honor robots enforcement, so these are fatal.
#[derive(Debug, Error)]
pub enum RobotsError {
    #[error("Failed to fetch {url}: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("Unexpected status {status} for {url}")]
    UnexpectedStatus { url: String, status: u16 },
}

/// Fetches and parses robots.txt for a domain
///
/// Issues a single GET to `http://<domain>/robots.txt`.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `domain` - The domain (host with optional port) to fetch robots.txt from
///
/// # Returns
///
/// * `Ok(RobotsPolicy)` - Parsed rules, or a permissive policy on HTTP 404
/// * `Err(RobotsError)` - Transport failure or any other non-200 status
pub async fn fetch_robots(client: &Client, domain: &str) -> Result<RobotsPolicy, RobotsError> {
    let url = format!("http://{}/robots.txt", domain);
    tracing::debug!("Fetching robots.txt from {}", url);

    let request_error = |source| RobotsError::Request {
        url: url.clone(),
        source,
    };

    let response = client.get(&url).send().await.map_err(request_error)?;
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        tracing::info!("No robots.txt for {}, allowing everything", domain);
        return Ok(RobotsPolicy::allow_all());
    }

    if status != StatusCode::OK {
        return Err(RobotsError::UnexpectedStatus {
            url: url.clone(),
            status: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(request_error)?;
    Ok(RobotsPolicy::parse(&body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn domain_of(server: &MockServer) -> String {
        let uri = Url::parse(&server.uri()).unwrap();
        format!("{}:{}", uri.host_str().unwrap(), uri.port().unwrap())
    }

    #[tokio::test]
    async fn test_fetch_parses_rules() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private/"))
            .expect(1)
            .mount(&server)
            .await;

        let robots = fetch_robots(&Client::new(), &domain_of(&server)).await.unwrap();
        let denied = Url::parse(&format!("{}/private/x", server.uri())).unwrap();
        let allowed = Url::parse(&format!("{}/public/x", server.uri())).unwrap();

        assert!(!robots.is_allowed("SiteMirror", &denied));
        assert!(robots.is_allowed("SiteMirror", &allowed));
    }

    #[tokio::test]
    async fn test_fetch_not_found_is_permissive() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let robots = fetch_robots(&Client::new(), &domain_of(&server)).await.unwrap();
        assert_eq!(robots, RobotsPolicy::allow_all());
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = fetch_robots(&Client::new(), &domain_of(&server)).await.unwrap_err();
        assert!(matches!(err, RobotsError::UnexpectedStatus { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_fetch_connection_failure_is_fatal() {
        // Nothing listens on port 1
        let err = fetch_robots(&Client::new(), "127.0.0.1:1").await.unwrap_err();
        assert!(matches!(err, RobotsError::Request { .. }));
    }
}
