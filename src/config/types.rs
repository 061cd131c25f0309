use serde::{Deserialize, Serialize};

/// Default PageSpeed Insights endpoint
pub const DEFAULT_PAGESPEED_ENDPOINT: &str =
    "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";

/// Hard upper bound on pages analysed per session
pub const MAX_PAGE_LIMIT: u32 = 999;

/// Main configuration structure for Seo-Ripple
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub pagespeed: PageSpeedConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
}

/// The site being audited
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Root URL or bare domain; `https://` is assumed when no scheme is given
    pub url: String,

    /// Password for protected sites
    #[serde(default)]
    pub password: Option<String>,

    /// Username, only used with basic auth
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub auth: AuthMode,
}

/// How the site password is presented
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Submit the site's password form once and keep the session cookie
    #[default]
    Form,
    /// Send HTTP basic auth with every request
    Basic,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of pages admitted to the frontier
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Maximum link depth followed in breadth-first mode
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Concurrent workers; 0 selects 75% of available cores
    #[serde(default)]
    pub workers: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Retries for transient failures
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff (milliseconds), doubled on each retry
    #[serde(rename = "retry-backoff", default = "default_retry_backoff")]
    pub retry_backoff: u64,

    #[serde(rename = "respect-robots", default = "default_true")]
    pub respect_robots: bool,

    /// URL path extensions that are never fetched
    #[serde(rename = "ignored-extensions", default = "default_ignored_extensions")]
    pub ignored_extensions: Vec<String>,

    /// Words that keep a URL out of the crawl when found in its path
    #[serde(rename = "excluded-path-words", default = "default_excluded_path_words")]
    pub excluded_path_words: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            max_depth: default_max_depth(),
            workers: 0,
            request_timeout: default_request_timeout(),
            max_retries: default_max_retries(),
            retry_backoff: default_retry_backoff(),
            respect_robots: true,
            ignored_extensions: default_ignored_extensions(),
            excluded_path_words: default_excluded_path_words(),
        }
    }
}

impl CrawlerConfig {
    /// Effective worker count: the configured value, or 75% of the available
    /// cores (at least one) when unset.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers as usize;
        }
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        (cores * 3 / 4).max(1)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn user_agent_string(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// PageSpeed strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Mobile,
    Desktop,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Mobile => "mobile",
            Strategy::Desktop => "desktop",
        }
    }
}

/// PageSpeed Insights configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PageSpeedConfig {
    /// API key; PageSpeed is skipped when absent or empty
    #[serde(rename = "api-key", default)]
    pub api_key: Option<String>,

    #[serde(default = "default_strategies")]
    pub strategies: Vec<Strategy>,

    #[serde(default = "default_pagespeed_endpoint")]
    pub endpoint: String,

    /// Request timeout (seconds)
    #[serde(default = "default_pagespeed_timeout")]
    pub timeout: u64,
}

impl Default for PageSpeedConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            strategies: default_strategies(),
            endpoint: default_pagespeed_endpoint(),
            timeout: default_pagespeed_timeout(),
        }
    }
}

impl PageSpeedConfig {
    /// The API key, if one is configured and non-empty
    pub fn active_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// Keyword analysis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(rename = "top-keywords", default = "default_top_keywords")]
    pub top_keywords: usize,

    #[serde(rename = "sitewide-keywords", default = "default_sitewide_keywords")]
    pub sitewide_keywords: usize,

    #[serde(rename = "extra-stop-words", default)]
    pub extra_stop_words: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_keywords: default_top_keywords(),
            sitewide_keywords: default_sitewide_keywords(),
            extra_stop_words: Vec::new(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving CSV and HTML reports
    pub directory: String,

    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_max_pages() -> u32 {
    50
}

fn default_max_depth() -> u32 {
    2
}

fn default_request_timeout() -> u64 {
    15
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

fn default_ignored_extensions() -> Vec<String> {
    [
        ".jpg", ".jpeg", ".png", ".gif", ".svg", ".bmp", ".pdf", ".zip", ".exe", ".rar", ".gz",
        ".tgz", ".mp4", ".avi",
    ]
    .iter()
    .map(|ext| ext.to_string())
    .collect()
}

fn default_excluded_path_words() -> Vec<String> {
    ["terms", "privacy", "login", "signup"]
        .iter()
        .map(|word| word.to_string())
        .collect()
}

fn default_strategies() -> Vec<Strategy> {
    vec![Strategy::Mobile, Strategy::Desktop]
}

fn default_pagespeed_endpoint() -> String {
    DEFAULT_PAGESPEED_ENDPOINT.to_string()
}

fn default_pagespeed_timeout() -> u64 {
    60
}

fn default_top_keywords() -> usize {
    5
}

fn default_sitewide_keywords() -> usize {
    10
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub max_pages: Option<u32>,
    pub pagespeed_key: Option<String>,
}

impl Config {
    /// Applies overrides in place. The result should be validated again.
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(url) = &overrides.url {
            self.site.url = url.clone();
        }
        if let Some(max_pages) = overrides.max_pages {
            self.crawler.max_pages = max_pages;
        }
        if let Some(key) = &overrides.pagespeed_key {
            self.pagespeed.api_key = Some(key.clone());
        }
    }
}
