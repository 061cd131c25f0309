//! URL handling module for Seo-Ripple
//!
//! This module provides URL normalization, site identity, and the admission
//! filter that keeps crawl targets on the audited site.

mod domain;
mod filter;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, page_key, sanitize_for_filename, site_key};
pub use filter::{LinkFilter, Rejection, SiteScope};
pub use normalize::{normalize_parsed, normalize_url, parse_site_root};
