//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the worker pool that drives a crawl, including:
//! - Fetching the domain's robots.txt once per run
//! - Seeding the queue and spawning the workers
//! - Downloading, saving and parsing each task, then enqueuing its children
//! - Detecting quiescence, fatal errors and cancellation

use crate::config::{validate, Config};
use crate::crawler::downloader::{
    build_http_client, DownloadError, Downloaded, Downloader, RetryPolicy,
};
use crate::crawler::parser::{HtmlLinkExtractor, LinkExtractor};
use crate::crawler::queue::{CrawlQueue, Task, TaskKind};
use crate::output::{CrawlStats, CrawlSummary};
use crate::robots::fetch_robots;
use crate::state::WorkerState;
use crate::storage::{ContentStore, FileStorage};
use crate::url::{extract_domain, parse_start_url};
use crate::{ConfigError, MirrorError, Result, UrlError};
use reqwest::Client;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use url::Url;

/// Requests cancellation of a running crawl
///
/// Cloneable and cheap; every clone controls the same [`Coordinator`]. Once cancelled, a
/// coordinator stays cancelled.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    signal: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    fn new() -> Self {
        let (signal, _) = watch::channel(false);
        Self {
            signal: Arc::new(signal),
        }
    }

    /// Signals every worker to stop; the running crawl returns [`MirrorError::Cancelled`]
    pub fn cancel(&self) {
        if !self.signal.send_replace(true) {
            tracing::info!("Cancellation requested");
        }
    }

    /// Returns whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        *self.signal.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.signal.subscribe()
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    client: Client,
    extractor: Arc<dyn LinkExtractor>,
    store: Arc<dyn ContentStore>,
    cancel: CancelHandle,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// The configuration is validated here; pages are parsed with [`HtmlLinkExtractor`]
    /// and written with [`FileStorage`] below `config.output.directory`.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(MirrorError)` - Invalid configuration or HTTP client setup failure
    pub fn new(config: Config) -> Result<Self> {
        validate(&config)?;

        let client = build_http_client(&config.http)?;
        let store = FileStorage::new(&config.output.directory);

        Ok(Self {
            config,
            client,
            extractor: Arc::new(HtmlLinkExtractor),
            store: Arc::new(store),
            cancel: CancelHandle::new(),
        })
    }

    /// Replaces the link extractor
    pub fn with_extractor(mut self, extractor: Arc<dyn LinkExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Replaces the content store
    pub fn with_store(mut self, store: Arc<dyn ContentStore>) -> Self {
        self.store = store;
        self
    }

    /// Returns a handle that cancels this coordinator's crawl
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the crawl to completion
    ///
    /// 1. Fetch the domain's robots.txt (fatal on failure)
    /// 2. Seed the queue with the start URL at depth 0
    /// 3. Spawn the workers
    /// 4. Wait for quiescence, the first fatal error, or cancellation
    /// 5. Stop and join the workers
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - Every reachable task was processed
    /// * `Err(MirrorError)` - A fatal error or cancellation ended the crawl early
    pub async fn run(&self) -> Result<CrawlSummary> {
        let started = Instant::now();
        let mut cancelled = self.cancel.subscribe();
        if *cancelled.borrow_and_update() {
            return Err(MirrorError::Cancelled);
        }

        let start_url = self.start_url()?;
        let domain = extract_domain(&start_url).ok_or(UrlError::MissingDomain)?;
        let crawler = &self.config.crawler;

        tracing::info!(
            "Mirroring {} (max depth {}, {} workers, robots.txt {})",
            start_url,
            crawler.max_depth,
            crawler.concurrency,
            if crawler.respect_robots { "enforced" } else { "ignored" }
        );

        let robots = tokio::select! {
            robots = fetch_robots(&self.client, &domain) => robots?,
            _ = signalled(&mut cancelled) => return Err(MirrorError::Cancelled),
        };

        let queue = Arc::new(CrawlQueue::new(crawler.queue_capacity, domain));
        queue.enqueue(Task::seed(start_url), crawler.max_depth)?;

        let stats = Arc::new(CrawlStats::new());
        let ctx = Arc::new(WorkerContext {
            queue: Arc::clone(&queue),
            downloader: Downloader::new(
                self.client.clone(),
                Arc::new(robots),
                self.config.http.user_agent.clone(),
                RetryPolicy::from_config(&self.config.http),
            ),
            extractor: Arc::clone(&self.extractor),
            store: Arc::clone(&self.store),
            stats: Arc::clone(&stats),
            max_depth: crawler.max_depth,
            enforce_robots: crawler.respect_robots,
        });

        let worker_count = crawler.concurrency.max(1);
        let (stop_tx, stop_rx) = watch::channel(false);
        let (error_tx, mut error_rx) = mpsc::channel(worker_count);

        let mut workers = JoinSet::new();
        for id in 0..worker_count {
            workers.spawn(run_worker(
                id,
                Arc::clone(&ctx),
                stop_rx.clone(),
                error_tx.clone(),
            ));
        }
        drop(error_tx);

        // Errors are reported before the failing task is marked done, so checking them
        // first never mistakes an aborted crawl for a finished one
        let outcome = tokio::select! {
            biased;
            Some(err) = error_rx.recv() => Err(err),
            _ = signalled(&mut cancelled) => Err(MirrorError::Cancelled),
            _ = queue.wait_and_close() => Ok(()),
        };

        if let Err(e) = &outcome {
            tracing::error!("Stopping crawl: {}", e);
            stop_tx.send_replace(true);
            queue.close();
        }

        let mut join_error = None;
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                join_error.get_or_insert(e);
            }
        }

        outcome?;
        if let Ok(err) = error_rx.try_recv() {
            return Err(err);
        }
        if let Some(e) = join_error {
            return Err(e.into());
        }

        let summary = stats.summary(started.elapsed());
        tracing::info!(
            "Crawl of {} complete: {} tasks processed",
            queue.root_domain(),
            summary.tasks_processed()
        );
        Ok(summary)
    }

    fn start_url(&self) -> Result<Url> {
        let raw = self
            .config
            .crawler
            .start_url
            .as_deref()
            .ok_or_else(|| ConfigError::Validation("start_url is required".to_string()))?;
        Ok(parse_start_url(raw)?)
    }
}

/// Everything a worker needs, shared by the whole pool
struct WorkerContext {
    queue: Arc<CrawlQueue>,
    downloader: Downloader,
    extractor: Arc<dyn LinkExtractor>,
    store: Arc<dyn ContentStore>,
    stats: Arc<CrawlStats>,
    max_depth: u32,
    enforce_robots: bool,
}

impl WorkerContext {
    /// Processes one task: download, save, then parse and enqueue children
    async fn process(&self, id: usize, task: &Task, state: &mut WorkerState) -> Result<()> {
        state.transition_to(WorkerState::Fetching, id);

        let downloaded = match self.downloader.download(task.url(), self.enforce_robots).await {
            Ok(downloaded) => Some(downloaded),
            Err(DownloadError::Disallowed { .. }) => {
                self.stats.record_disallowed();
                None
            }
            Err(e) if e.is_degradable() => {
                tracing::debug!("Saving empty content for {}: {}", task.url(), e);
                self.stats.record_hole();
                None
            }
            Err(e) => return Err(e.into()),
        };

        state.transition_to(WorkerState::Processing, id);

        let Some(downloaded) = downloaded else {
            let hole = Downloaded::empty();
            self.store
                .save(task.url(), &hole.body, &hole.content_type)
                .await?;
            state.transition_to(WorkerState::Done, id);
            return Ok(());
        };

        let path = self
            .store
            .save(task.url(), &downloaded.body, &downloaded.content_type)
            .await?;
        self.stats.record_saved(task.kind());
        tracing::debug!("Worker {} saved {} to {}", id, task.url(), path.display());

        if task.depth() < self.max_depth {
            let links = self.extractor.extract(&downloaded.body, task.url())?;

            state.transition_to(WorkerState::EnqueuingChildren, id);

            let children = links
                .pages
                .into_iter()
                .map(|url| task.child(url, TaskKind::Page))
                .chain(
                    links
                        .resources
                        .into_iter()
                        .map(|url| task.child(url, TaskKind::Resource)),
                );

            for child in children {
                if let Err(reason) = self.queue.enqueue(child.clone(), self.max_depth) {
                    tracing::trace!("Not enqueuing {}: {}", child.url(), reason);
                    self.stats.record_rejection(reason);
                }
            }
        }

        state.transition_to(WorkerState::Done, id);
        Ok(())
    }
}

/// Marks the held task done when dropped, whatever happened to it
struct TaskGuard<'a> {
    queue: &'a CrawlQueue,
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        self.queue.done();
    }
}

/// Worker loop: pulls tasks until the queue closes or the crawl is stopped
async fn run_worker(
    id: usize,
    ctx: Arc<WorkerContext>,
    mut stop: watch::Receiver<bool>,
    errors: mpsc::Sender<MirrorError>,
) {
    tracing::debug!("Worker {} started", id);
    let tasks = ctx.queue.dequeue();
    let mut state = WorkerState::Idle;

    loop {
        let task = tokio::select! {
            _ = signalled(&mut stop) => break,
            next = tasks.next() => match next {
                Some(task) => task,
                None => break,
            },
        };

        let _guard = TaskGuard { queue: &ctx.queue };

        let outcome = tokio::select! {
            _ = signalled(&mut stop) => break,
            outcome = ctx.process(id, &task, &mut state) => outcome,
        };

        if let Err(e) = outcome {
            tracing::error!("Worker {} failed on {}: {}", id, task.url(), e);
            // The driver only stops listening once the crawl is already over
            let _ = errors.send(e).await;
            break;
        }

        state.transition_to(WorkerState::Idle, id);
    }

    tracing::debug!("Worker {} stopped", id);
}

/// Resolves once the watched flag is set; never resolves if the sender is gone
async fn signalled(flag: &mut watch::Receiver<bool>) {
    loop {
        if *flag.borrow_and_update() {
            return;
        }
        if flag.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Runs a complete crawl with the default extractor and file storage
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl completed successfully
/// * `Err(MirrorError)` - Crawl failed
///
/// # Example
///
/// ```no_run
/// use site_mirror::config::load_config;
/// use site_mirror::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut config = load_config(Path::new("mirror.toml"))?;
/// config.crawler.start_url = Some("https://example.com/".to_string());
/// let summary = run_crawl(config).await?;
/// println!("{} pages saved", summary.pages_saved);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlSummary> {
    Coordinator::new(config)?.run().await
}
