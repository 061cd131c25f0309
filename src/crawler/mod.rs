//! Crawler module for page discovery and fetching
//!
//! This module contains the crawling side of an audit, including:
//! - HTTP fetching with retry logic and failure classification
//! - Password login for protected sites
//! - Sitemap discovery and the breadth-first frontier
//! - Link extraction from HTML
//! - Overall audit coordination

mod auth;
mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod sitemap;

pub use auth::{login, LoginOutcome};
pub use coordinator::{run_audit, Coordinator};
pub use fetcher::{
    build_http_client, is_html_content_type, BasicCredential, FetchFailure, Fetched, FetchedPage,
    Fetcher, RetryPolicy, MAX_REDIRECTS,
};
pub use frontier::Frontier;
pub use parser::{extract_links, find_login_form, LoginForm, DEFAULT_PASSWORD_FIELD};
pub use sitemap::{
    discover_sitemap_urls, parse_sitemap, sitemap_candidates, SitemapDocument,
    MAX_SITEMAP_DOCUMENTS,
};
