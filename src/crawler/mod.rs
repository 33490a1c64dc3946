//! Crawler module for mirroring a single domain
//!
//! This module contains the core crawling logic, including:
//! - The deduplicating, depth- and domain-scoped task queue
//! - HTTP downloading with retry logic and robots.txt enforcement
//! - HTML parsing and link extraction
//! - The worker pool that coordinates a crawl

mod coordinator;
mod downloader;
mod parser;
mod queue;

pub use coordinator::{run_crawl, CancelHandle, Coordinator};
pub use downloader::{build_http_client, DownloadError, Downloaded, Downloader, RetryPolicy};
pub use parser::{ExtractedLinks, HtmlLinkExtractor, LinkExtractor, ParseError};
pub use queue::{CrawlQueue, QueueError, Task, TaskKind, TaskStream};
