/// Worker state definitions for tracking crawl progress
///
/// Each worker cycles through these states once per task it processes.
use std::fmt;

/// Represents what a worker is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WorkerState {
    /// Waiting for the next task
    #[default]
    Idle,

    /// Downloading the task's URL
    Fetching,

    /// Saving the content and extracting links
    Processing,

    /// Submitting discovered links to the queue
    EnqueuingChildren,

    /// Task finished; completion is being signalled to the queue
    Done,
}

impl WorkerState {
    /// Returns true if moving to `next` follows the per-task cycle
    ///
    /// `Idle → Fetching → Processing → [EnqueuingChildren →] Done → Idle`
    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Fetching)
                | (Self::Fetching, Self::Processing)
                | (Self::Processing, Self::EnqueuingChildren)
                | (Self::Processing, Self::Done)
                | (Self::EnqueuingChildren, Self::Done)
                | (Self::Done, Self::Idle)
        )
    }

    /// Moves to `next`, logging the change
    ///
    /// Out-of-cycle transitions are logged as warnings but still applied.
    pub fn transition_to(&mut self, next: WorkerState, worker_id: usize) {
        if self.can_transition_to(next) {
            tracing::trace!("Worker {}: {} -> {}", worker_id, self, next);
        } else {
            tracing::warn!("Worker {}: unexpected transition {} -> {}", worker_id, self, next);
        }
        *self = next;
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Processing => "processing",
            Self::EnqueuingChildren => "enqueuing_children",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
