use serde::Deserialize;

/// Main configuration structure for Site-Mirror
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub http: HttpConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// URL the crawl starts from; its domain scopes the whole run
    pub start_url: Option<String>,

    /// Maximum depth to crawl from the start URL (inclusive)
    pub max_depth: u32,

    /// Number of concurrent workers
    pub concurrency: usize,

    /// Whether robots.txt rules are enforced
    pub respect_robots: bool,

    /// Maximum number of pending tasks held by the queue
    pub queue_capacity: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_url: None,
            max_depth: 5,
            concurrency: 5,
            respect_robots: false,
            queue_capacity: 1000,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpConfig {
    /// User-agent token sent with requests and matched against robots.txt groups
    pub user_agent: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum number of GET attempts per URL
    pub max_attempts: u32,

    /// Linear backoff step between attempts (milliseconds)
    pub backoff_step_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "SiteMirror".to_string(),
            timeout_secs: 30,
            max_attempts: 3,
            backoff_step_ms: 1000,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Root directory the mirror is written under
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "./".to_string(),
        }
    }
}
