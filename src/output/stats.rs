//! Statistics collected while a crawl runs
//!
//! Workers record outcomes into a shared [`CrawlStats`]; the coordinator turns it into a
//! [`CrawlSummary`] once the crawl is over.

use crate::crawler::{QueueError, TaskKind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Number of discovered links rejected by the queue, per reason
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RejectionCounts {
    pub external_domain: u64,
    pub depth_exceeded: u64,
    pub already_visited: u64,
    pub queue_full: u64,
    pub closed: u64,
}

impl RejectionCounts {
    /// Total number of rejected links
    pub fn total(&self) -> u64 {
        self.external_domain + self.depth_exceeded + self.already_visited + self.queue_full + self.closed
    }
}

/// Final summary of a crawl run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlSummary {
    /// Pages downloaded and saved
    pub pages_saved: u64,

    /// Resources downloaded and saved
    pub resources_saved: u64,

    /// Tasks saved with empty content after exhausting their attempts
    pub holes: u64,

    /// Tasks saved with empty content because robots.txt denied them
    pub disallowed: u64,

    /// Discovered links the queue refused
    pub rejected: RejectionCounts,

    /// Wall-clock duration of the crawl
    pub elapsed: Duration,
}

impl CrawlSummary {
    /// Total number of tasks processed, holes included
    pub fn tasks_processed(&self) -> u64 {
        self.pages_saved + self.resources_saved + self.holes + self.disallowed
    }
}

/// Concurrent counters shared by all workers of a crawl
#[derive(Debug, Default)]
pub struct CrawlStats {
    pages_saved: AtomicU64,
    resources_saved: AtomicU64,
    holes: AtomicU64,
    disallowed: AtomicU64,
    external_domain: AtomicU64,
    depth_exceeded: AtomicU64,
    already_visited: AtomicU64,
    queue_full: AtomicU64,
    closed: AtomicU64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records content that was downloaded and saved
    pub fn record_saved(&self, kind: TaskKind) {
        let counter = match kind {
            TaskKind::Page => &self.pages_saved,
            TaskKind::Resource => &self.resources_saved,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a task saved with empty content after a failed download
    pub fn record_hole(&self) {
        self.holes.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a task saved with empty content because robots.txt denied it
    pub fn record_disallowed(&self) {
        self.disallowed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a link the queue refused
    pub fn record_rejection(&self, reason: QueueError) {
        let counter = match reason {
            QueueError::ExternalDomain => &self.external_domain,
            QueueError::DepthExceeded => &self.depth_exceeded,
            QueueError::AlreadyVisited => &self.already_visited,
            QueueError::QueueFull => &self.queue_full,
            QueueError::Closed => &self.closed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Builds the summary from the current counter values
    pub fn summary(&self, elapsed: Duration) -> CrawlSummary {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);

        CrawlSummary {
            pages_saved: load(&self.pages_saved),
            resources_saved: load(&self.resources_saved),
            holes: load(&self.holes),
            disallowed: load(&self.disallowed),
            rejected: RejectionCounts {
                external_domain: load(&self.external_domain),
                depth_exceeded: load(&self.depth_exceeded),
                already_visited: load(&self.already_visited),
                queue_full: load(&self.queue_full),
                closed: load(&self.closed),
            },
            elapsed,
        }
    }
}

/// Logs a crawl summary at info level
///
/// # Arguments
///
/// * `summary` - The summary to log
pub fn log_summary(summary: &CrawlSummary) {
    tracing::info!(
        "Crawl finished in {:.1}s: {} pages and {} resources saved",
        summary.elapsed.as_secs_f64(),
        summary.pages_saved,
        summary.resources_saved
    );

    if summary.holes > 0 || summary.disallowed > 0 {
        tracing::info!(
            "Saved empty: {} failed downloads, {} disallowed by robots.txt",
            summary.holes,
            summary.disallowed
        );
    }

    let rejected = &summary.rejected;
    tracing::info!(
        "Links rejected: {} (external: {}, too deep: {}, duplicate: {}, queue full: {}, closed: {})",
        rejected.total(),
        rejected.external_domain,
        rejected.depth_exceeded,
        rejected.already_visited,
        rejected.queue_full,
        rejected.closed
    );

    if rejected.queue_full > 0 {
        tracing::warn!(
            "{} links were dropped because the queue was full; consider raising queue-capacity",
            rejected.queue_full
        );
    }
}
