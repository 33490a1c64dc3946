//! Output module for crawl statistics and summaries
//!
//! This module handles:
//! - Counting saved content, holes and rejected links while the crawl runs
//! - Producing the final crawl summary
//! - Logging the summary at the end of a run

pub mod stats;

pub use stats::{log_summary, CrawlStats, CrawlSummary, RejectionCounts};
