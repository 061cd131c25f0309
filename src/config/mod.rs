//! Configuration module for Seo-Ripple
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use seo_ripple::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("seo-ripple.toml")).unwrap();
//! println!("Auditing {} (up to {} pages)", config.site.url, config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AnalysisConfig, AuthMode, Config, CrawlerConfig, OutputConfig, Overrides, PageSpeedConfig,
    SiteConfig, Strategy, UserAgentConfig, DEFAULT_PAGESPEED_ENDPOINT, MAX_PAGE_LIMIT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config, read_config};
pub use validation::validate;
