//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `WorkerState`: Tracks what each worker of the pool is doing with its current task

mod worker_state;

// Re-export main types
pub use worker_state::WorkerState;
