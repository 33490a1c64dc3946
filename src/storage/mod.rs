//! Storage module for persisting mirrored content
//!
//! This module handles writing downloaded pages and resources to disk:
//! - Mapping URLs to local file paths below the output directory
//! - Choosing file extensions from the response content type
//! - Creating the directory tree on demand

mod files;
mod traits;

pub use files::{extension_for, FileStorage};
pub use traits::{ContentStore, StorageError, StorageResult};
