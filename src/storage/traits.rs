//! Storage traits and error types
//!
//! This module defines the trait interface for content stores and
//! associated error types.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("URL has no host: {0}")]
    MissingHost(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for content store implementations
///
/// Stores are shared by every worker of a crawl, so implementations must be
/// safe to call concurrently for distinct URLs.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Persists downloaded content for a URL
    ///
    /// # Arguments
    ///
    /// * `url` - The URL the content was downloaded from
    /// * `content` - The raw body; empty for holes
    /// * `content_type` - The response `Content-Type`, possibly empty
    ///
    /// # Returns
    ///
    /// The location the content was written to
    async fn save(&self, url: &Url, content: &[u8], content_type: &str)
        -> StorageResult<PathBuf>;
}
