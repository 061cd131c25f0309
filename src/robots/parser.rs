//! Robots.txt parser implementation
//!
//! Allow/deny decisions go through the robotstxt crate's matcher. `Sitemap:`
//! directives are collected separately since they are group-independent.

use robotstxt::DefaultMatcher;

/// Parsed robots.txt data
#[derive(Debug, Clone, Default)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    /// Absolute URLs from `Sitemap:` lines, in file order
    sitemaps: Vec<String>,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            sitemaps: extract_sitemaps(content),
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// Used when robots.txt is missing, unreachable, or ignored by configuration.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Sitemap URLs declared by the site
    pub fn sitemaps(&self) -> &[String] {
        &self.sitemaps
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL or path to check
    /// * `user_agent` - Product token of the crawler (e.g. "SeoRipple")
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }
}

/// Collects `Sitemap:` directive values (case-insensitive key)
fn extract_sitemaps(content: &str) -> Vec<String> {
    let mut sitemaps = Vec::new();

    for line in content.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        if key.trim().eq_ignore_ascii_case("sitemap") {
            let value = value.trim();
            if !value.is_empty() && !sitemaps.iter().any(|s| s == value) {
                sitemaps.push(value.to_string());
            }
        }
    }

    sitemaps
}
