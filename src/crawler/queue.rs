//! Crawl queue: the bounded, deduplicating frontier shared by all workers
//!
//! This module handles:
//! - Scoping tasks to the crawl's root domain and maximum depth
//! - Deduplicating URLs for the lifetime of a crawl (first-seen wins)
//! - Bounded buffering with fail-fast backpressure
//! - Active-task accounting, which is what tells the coordinator the crawl is finished
//!
//! Workers both consume and produce tasks, so an empty buffer does not mean the crawl is
//! over. A task counts as active from the moment it is accepted until its worker calls
//! [`CrawlQueue::done`], and a worker only does that after every child it discovered has
//! already gone through [`CrawlQueue::enqueue`]. The counter therefore reaches zero exactly
//! once, when no work is queued and nobody is still discovering.

use crate::url::extract_domain;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use url::Url;

/// Whether a task is an HTML page or a resource embedded by one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// A document reached through an `<a href>` link (or the seed)
    Page,
    /// A stylesheet, script, image or media source
    Resource,
}

/// One unit of crawl work
///
/// Tasks are immutable values: they are created by the coordinator (the seed) or by a
/// worker that discovered a link, and consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    url: Url,
    depth: u32,
    kind: TaskKind,
}

impl Task {
    /// Creates a new task
    pub fn new(url: Url, depth: u32, kind: TaskKind) -> Self {
        Self { url, depth, kind }
    }

    /// Creates the depth-0 page task a crawl starts from
    pub fn seed(url: Url) -> Self {
        Self::new(url, 0, TaskKind::Page)
    }

    /// Creates a task for a URL discovered while processing this one
    pub fn child(&self, url: Url, kind: TaskKind) -> Self {
        Self::new(url, self.depth + 1, kind)
    }

    /// The absolute URL to download
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Number of link hops from the seed
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Page or resource
    pub fn kind(&self) -> TaskKind {
        self.kind
    }
}

/// Reasons a task is not accepted by the queue
///
/// These are steady-state outcomes of crawling a densely linked site, not failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum QueueError {
    #[error("URL belongs to an external domain")]
    ExternalDomain,

    #[error("task depth exceeds the maximum crawl depth")]
    DepthExceeded,

    #[error("URL has already been visited")]
    AlreadyVisited,

    #[error("queue is full")]
    QueueFull,

    #[error("queue is closed")]
    Closed,
}

/// State guarded by the queue's single lock
struct QueueInner {
    /// URLs accepted so far
    visited: HashSet<String>,

    /// Producer side of the buffer; `None` once the queue is closed
    sender: Option<mpsc::Sender<Task>>,
}

/// Bounded, deduplicating, domain- and depth-scoped task queue
///
/// The queue is shared between the coordinator and all workers, typically behind an
/// [`Arc`]. [`enqueue`](Self::enqueue) and [`done`](Self::done) never block;
/// [`TaskStream::next`] and [`wait_and_close`](Self::wait_and_close) are the only
/// suspension points.
pub struct CrawlQueue {
    /// Visited set and producer, behind one mutex so check-and-insert is atomic
    inner: Mutex<QueueInner>,

    /// Consumer side of the buffer, shared by every worker
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<Task>>>,

    /// Number of accepted tasks whose processing has not finished yet
    active: watch::Sender<usize>,

    /// Domain every task must belong to
    domain: String,

    /// Maximum number of buffered, not yet dequeued tasks
    capacity: usize,
}

impl CrawlQueue {
    /// Creates a new queue
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of buffered tasks (at least 1)
    /// * `domain` - The crawl's root domain, as returned by [`extract_domain`]
    pub fn new(capacity: usize, domain: impl Into<String>) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let (active, _) = watch::channel(0);

        Self {
            inner: Mutex::new(QueueInner {
                visited: HashSet::new(),
                sender: Some(sender),
            }),
            receiver: Arc::new(tokio::sync::Mutex::new(receiver)),
            active,
            domain: domain.into(),
            capacity,
        }
    }

    /// Offers a task to the queue
    ///
    /// Checks are applied in order: domain, depth, closed, visited, capacity. On success the
    /// active-task counter is incremented before the task becomes visible to consumers.
    ///
    /// # Arguments
    ///
    /// * `task` - The task to add
    /// * `max_depth` - The crawl's maximum depth (inclusive)
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The task was accepted and will be delivered to exactly one consumer
    /// * `Err(QueueError)` - The reason the task was rejected
    pub fn enqueue(&self, task: Task, max_depth: u32) -> Result<(), QueueError> {
        if extract_domain(task.url()).as_deref() != Some(self.domain.as_str()) {
            return Err(QueueError::ExternalDomain);
        }

        if task.depth() > max_depth {
            return Err(QueueError::DepthExceeded);
        }

        let mut inner = self.lock_inner();
        let QueueInner { visited, sender } = &mut *inner;

        let Some(sender) = sender.as_ref() else {
            return Err(QueueError::Closed);
        };

        let key = task.url().as_str().to_owned();
        if !visited.insert(key.clone()) {
            return Err(QueueError::AlreadyVisited);
        }

        self.active.send_modify(|active| *active += 1);

        match sender.try_send(task) {
            Ok(()) => Ok(()),
            Err(e) => {
                // A dropped URL may be offered again once the buffer drains
                visited.remove(&key);
                self.active.send_modify(|active| *active -= 1);

                match e {
                    TrySendError::Full(_) => Err(QueueError::QueueFull),
                    TrySendError::Closed(_) => Err(QueueError::Closed),
                }
            }
        }
    }

    /// Returns a handle to the shared consumption stream
    ///
    /// Every worker gets its own clone; each buffered task is delivered to exactly one of
    /// them.
    pub fn dequeue(&self) -> TaskStream {
        TaskStream {
            receiver: Arc::clone(&self.receiver),
        }
    }

    /// Marks one previously accepted task as fully processed
    ///
    /// Must be called exactly once per accepted task, after its children were offered to the
    /// queue.
    pub fn done(&self) {
        let decremented = self.active.send_if_modified(|active| {
            if *active == 0 {
                false
            } else {
                *active -= 1;
                true
            }
        });

        if !decremented {
            tracing::warn!("done() called with no active tasks");
        }
    }

    /// Waits until every accepted task is done, then closes the queue
    ///
    /// Once this returns, every [`TaskStream`] yields `None` and workers can exit.
    pub async fn wait_and_close(&self) {
        let mut active = self.active.subscribe();
        if active.wait_for(|count| *count == 0).await.is_err() {
            tracing::warn!("Active task counter dropped while waiting for quiescence");
        }

        tracing::debug!("All tasks done, closing queue");
        self.close();
    }

    /// Closes the queue immediately
    ///
    /// Further enqueues fail with [`QueueError::Closed`]; consumers drain what is still
    /// buffered and then see the end of the stream. Used directly only when a crawl is
    /// aborted.
    pub fn close(&self) {
        self.lock_inner().sender = None;
    }

    /// Returns whether the queue has been closed
    pub fn is_closed(&self) -> bool {
        self.lock_inner().sender.is_none()
    }

    /// Number of accepted tasks not yet marked done
    pub fn active(&self) -> usize {
        *self.active.borrow()
    }

    /// Number of tasks buffered and waiting for a consumer
    pub fn len(&self) -> usize {
        match self.lock_inner().sender.as_ref() {
            Some(sender) => self.capacity - sender.capacity(),
            None => 0,
        }
    }

    /// Returns whether no task is waiting for a consumer
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of buffered tasks
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The domain every accepted task belongs to
    pub fn root_domain(&self) -> &str {
        &self.domain
    }

    fn lock_inner(&self) -> MutexGuard<'_, QueueInner> {
        // The guarded data stays consistent even if a holder panicked
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A consumer handle over the queue's shared buffer
#[derive(Clone)]
pub struct TaskStream {
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<Task>>>,
}

impl TaskStream {
    /// Waits for the next task
    ///
    /// # Returns
    ///
    /// * `Some(Task)` - A task this consumer now owns
    /// * `None` - The queue is closed and drained
    pub async fn next(&self) -> Option<Task> {
        self.receiver.lock().await.recv().await
    }
}
