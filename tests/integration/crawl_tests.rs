//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full mirror cycle end-to-end, down to the files written to disk.

use site_mirror::config::Config;
use site_mirror::crawler::{run_crawl, Coordinator};
use site_mirror::MirrorError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration mirroring `start_url` into `out`
fn create_test_config(start_url: &str, out: &Path) -> Config {
    let mut config = Config::default();
    config.crawler.start_url = Some(start_url.to_string());
    config.crawler.max_depth = 2;
    config.crawler.concurrency = 4;
    config.http.timeout_secs = 5;
    config.http.max_attempts = 2;
    config.http.backoff_step_ms = 10; // Very short for testing
    config.output.directory = out.to_string_lossy().into_owned();
    config
}

/// Directory the mock server's pages are mirrored to
fn site_dir(out: &Path, server: &MockServer) -> PathBuf {
    out.join(server.address().to_string())
}

fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), "text/html")
}

async fn mount_page(server: &MockServer, page: &str, body: impl Into<String>) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        format!(
            r#"<html><head>
                <title>Home</title>
                <link rel="stylesheet" href="/css/style.css">
            </head><body>
                <a href="{}/page1">Page 1</a>
                <a href="page2">Page 2</a>
                <img src="/img/logo.png">
            </body></html>"#,
            base_url
        ),
    )
    .await;
    mount_page(&mock_server, "/page1", "<html><body>Content 1</body></html>").await;
    mount_page(
        &mock_server,
        "/page2",
        r#"<html><body>Content 2 <a href="/page1">again</a></body></html>"#,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/css/style.css"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("body { margin: 0; }", "text/css"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/logo.png"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(vec![0x89u8, 0x50, 0x4E, 0x47], "image/png"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let out = TempDir::new().unwrap();
    let summary = run_crawl(create_test_config(&base_url, out.path()))
        .await
        .expect("Crawl failed");

    assert_eq!(summary.pages_saved, 3);
    assert_eq!(summary.resources_saved, 2);
    assert_eq!(summary.holes, 0);
    assert_eq!(summary.rejected.already_visited, 1);

    let site = site_dir(out.path(), &mock_server);
    let index = std::fs::read_to_string(site.join("index.html")).unwrap();
    assert!(index.contains("<title>Home</title>"));
    assert_eq!(
        std::fs::read_to_string(site.join("page1.html")).unwrap(),
        "<html><body>Content 1</body></html>"
    );
    assert!(site.join("page2.html").exists());
    assert_eq!(
        std::fs::read_to_string(site.join("css/style.css")).unwrap(),
        "body { margin: 0; }"
    );
    assert_eq!(
        std::fs::read(site.join("img/logo.png")).unwrap(),
        vec![0x89, 0x50, 0x4E, 0x47]
    );
}

#[tokio::test]
async fn test_robots_txt_respect() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "User-agent: *\nDisallow: /private/\n\nUser-agent: OtherBot\nDisallow: /\n",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/public/page">Public</a><a href="/private/secret">Secret</a>"#,
    )
    .await;
    mount_page(&mock_server, "/public/page", "public content").await;

    // Robots.txt forbids this path, so it must never be requested
    Mock::given(method("GET"))
        .and(path("/private/secret"))
        .respond_with(html("secret"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let out = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), out.path());
    config.crawler.respect_robots = true;

    let summary = run_crawl(config).await.expect("Crawl failed");

    assert_eq!(summary.pages_saved, 2);
    assert_eq!(summary.disallowed, 1);

    // Disallowed pages are still recorded, with empty content
    let site = site_dir(out.path(), &mock_server);
    let secret = site.join("private/secret");
    assert!(secret.exists());
    assert_eq!(std::fs::metadata(secret).unwrap().len(), 0);
}

#[tokio::test]
async fn test_robots_txt_ignored_when_not_enforced() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private/\n"))
        .mount(&mock_server)
        .await;

    mount_page(&mock_server, "/", r#"<a href="/private/secret">Secret</a>"#).await;
    mount_page(&mock_server, "/private/secret", "secret").await;

    let out = TempDir::new().unwrap();
    let summary = run_crawl(create_test_config(&mock_server.uri(), out.path()))
        .await
        .expect("Crawl failed");

    assert_eq!(summary.pages_saved, 2);
    assert_eq!(summary.disallowed, 0);
}

#[tokio::test]
async fn test_crawl_with_depth_limit() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", r#"<a href="/level1">Level 1</a>"#).await;
    mount_page(&mock_server, "/level1", r#"<a href="/level2">Level 2</a>"#).await;
    mount_page(
        &mock_server,
        "/level2",
        r#"<a href="/level3">Level 3</a><img src="/deep.png">"#,
    )
    .await;

    // Beyond max_depth = 2: never offered to the queue, never fetched
    Mock::given(method("GET"))
        .and(path("/level3"))
        .respond_with(html("too deep"))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/deep.png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let out = TempDir::new().unwrap();
    let summary = run_crawl(create_test_config(&mock_server.uri(), out.path()))
        .await
        .expect("Crawl failed");

    assert_eq!(summary.pages_saved, 3);
    assert_eq!(summary.resources_saved, 0);
}

#[tokio::test]
async fn test_zero_depth_saves_only_the_seed() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", r#"<a href="/child">Child</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/child"))
        .respond_with(html("child"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let out = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), out.path());
    config.crawler.max_depth = 0;

    let summary = run_crawl(config).await.expect("Crawl failed");
    assert_eq!(summary.pages_saved, 1);
    assert!(site_dir(out.path(), &mock_server).join("index.html").exists());
}

#[tokio::test]
async fn test_external_links_not_followed() {
    let mock_server = MockServer::start().await;
    let other_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html("external"))
        .expect(0)
        .mount(&other_server)
        .await;

    mount_page(
        &mock_server,
        "/",
        format!(
            r#"<a href="{0}/page">External</a><img src="{0}/logo.png"><a href="/local">Local</a>"#,
            other_server.uri()
        ),
    )
    .await;
    mount_page(&mock_server, "/local", "local").await;

    let out = TempDir::new().unwrap();
    let summary = run_crawl(create_test_config(&mock_server.uri(), out.path()))
        .await
        .expect("Crawl failed");

    assert_eq!(summary.pages_saved, 2);
    assert!(!site_dir(out.path(), &other_server).exists());
}

#[tokio::test]
async fn test_depth_one_single_worker_scenario() {
    let mock_server = MockServer::start().await;
    let other_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html("external"))
        .expect(0)
        .mount(&other_server)
        .await;

    mount_page(
        &mock_server,
        "/",
        format!(
            r#"<a href="/child1">1</a><a href="/child2">2</a><a href="{}/x">ext</a>"#,
            other_server.uri()
        ),
    )
    .await;
    mount_page(&mock_server, "/child1", r#"<a href="/grandchild">g</a>"#).await;
    mount_page(&mock_server, "/child2", "leaf").await;
    Mock::given(method("GET"))
        .and(path("/grandchild"))
        .respond_with(html("too deep"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let out = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), out.path());
    config.crawler.max_depth = 1;
    config.crawler.concurrency = 1;

    let summary = run_crawl(config).await.expect("Crawl failed");

    assert_eq!(summary.pages_saved, 3);
    assert_eq!(summary.rejected.external_domain, 0);
    assert_eq!(summary.tasks_processed(), 3);
}

#[tokio::test]
async fn test_missing_page_is_saved_as_hole() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", r#"<a href="/missing">Missing</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2) // max_attempts
        .mount(&mock_server)
        .await;

    let out = TempDir::new().unwrap();
    let summary = run_crawl(create_test_config(&mock_server.uri(), out.path()))
        .await
        .expect("A missing page must not abort the crawl");

    assert_eq!(summary.pages_saved, 1);
    assert_eq!(summary.holes, 1);

    let hole = site_dir(out.path(), &mock_server).join("missing");
    assert_eq!(std::fs::metadata(hole).unwrap().len(), 0);
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", r#"<a href="/flaky">Flaky</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/flaky", "recovered").await;

    let out = TempDir::new().unwrap();
    let summary = run_crawl(create_test_config(&mock_server.uri(), out.path()))
        .await
        .expect("Crawl failed");

    assert_eq!(summary.holes, 0);
    assert_eq!(
        std::fs::read_to_string(site_dir(out.path(), &mock_server).join("flaky.html")).unwrap(),
        "recovered"
    );
}

#[tokio::test]
async fn test_query_string_pages_get_distinct_files() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/list?page=1">1</a><a href="/list?page=2&amp;sort=asc">2</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "1"))
        .respond_with(html("first"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "2"))
        .respond_with(html("second"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let out = TempDir::new().unwrap();
    run_crawl(create_test_config(&mock_server.uri(), out.path()))
        .await
        .expect("Crawl failed");

    let site = site_dir(out.path(), &mock_server);
    assert_eq!(
        std::fs::read_to_string(site.join("list_page=1.html")).unwrap(),
        "first"
    );
    assert_eq!(
        std::fs::read_to_string(site.join("list_page=2_sort=asc.html")).unwrap(),
        "second"
    );
}

#[tokio::test]
async fn test_robots_txt_server_error_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("home"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let out = TempDir::new().unwrap();
    let result = run_crawl(create_test_config(&mock_server.uri(), out.path())).await;

    assert!(matches!(result, Err(MirrorError::Robots(_))));
}

#[tokio::test]
async fn test_output_write_failure_is_fatal() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", "home").await;

    let out = TempDir::new().unwrap();
    // A regular file where the site directory should go
    std::fs::write(site_dir(out.path(), &mock_server), b"").unwrap();

    let result = run_crawl(create_test_config(&mock_server.uri(), out.path())).await;
    assert!(matches!(result, Err(MirrorError::Storage(_))));
}

#[tokio::test]
async fn test_invalid_start_url_is_rejected() {
    let out = TempDir::new().unwrap();
    let config = create_test_config("mailto:someone@example.com", out.path());

    assert!(matches!(Coordinator::new(config), Err(MirrorError::Config(_))));
}
