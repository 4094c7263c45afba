//! Configuration module for Crawlscope
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use crawlscope::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawlscope.toml")).unwrap();
//! println!("Frontier workers: {}", config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, IndexConfig, StorageConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
