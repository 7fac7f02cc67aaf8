//! Configuration module for gov-scraper
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file, and turns the result into the immutable [`SeedConfig`]
//! a crawl runs with.
//!
//! # Example
//!
//! ```no_run
//! use gov_scraper::config::{load_config, SeedConfig};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! let seed = SeedConfig::new(config.crawler.start_url.as_deref(), &config.crawler).unwrap();
//! println!("Crawler will stay on: {}", seed.allowed_domain);
//! ```

mod parser;
mod seed;
mod types;
mod validation;

// Re-export types
pub use seed::SeedConfig;
pub use types::{
    Config, CrawlerConfig, OutputConfig, UserAgentConfig, DEFAULT_DELAY_SECS, DEFAULT_MAX_DEPTH,
    DEFAULT_MAX_PAGES,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
