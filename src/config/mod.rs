//! Configuration module for Site-Mirror
//!
//! This module handles loading and validating the crawl configuration. Settings come from
//! an optional TOML file, are overridden by command-line flags, and are validated once
//! before the crawl starts.
//!
//! # Example
//!
//! ```no_run
//! use site_mirror::config::{load_config, validate};
//! use std::path::Path;
//!
//! let mut config = load_config(Path::new("mirror.toml")).unwrap();
//! config.crawler.max_depth = 2;
//! validate(&config).unwrap();
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, HttpConfig, OutputConfig};

// Re-export parser and validation functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
