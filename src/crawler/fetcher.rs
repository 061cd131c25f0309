//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client (user agent, compression, cookies)
//! - GET requests for pages and sitemap documents
//! - Redirects followed hop by hop, each hop screened by the caller
//! - Retry with exponential backoff for transient failures
//! - Error classification into [`FailureKind`]

use crate::config::{AuthMode, CrawlerConfig, SiteConfig, UserAgentConfig};
use crate::session::FailureKind;
use reqwest::{header, redirect::Policy, Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use url::Url;

/// Redirect hops followed before a fetch fails
pub const MAX_REDIRECTS: usize = 10;

/// A page body fetched successfully
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// A fetch that failed for good
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub kind: FailureKind,
    pub status_code: Option<u16>,
    pub reason: String,
    /// Requests made, including the first
    pub attempts: u32,
}

/// Result of a page fetch whose redirects are screened
#[derive(Debug, Clone)]
pub enum Fetched {
    Page(FetchedPage),
    /// A redirect pointed at `location`, which the caller declined to follow
    Skipped { location: Url },
}

/// Outcome of a single request
enum Attempt {
    Done(FetchedPage),
    Skipped(Url),
    /// Retrying cannot help
    Permanent(FetchFailure),
    /// Retrying may help
    Transient(FetchFailure),
}

/// How many times, and how patiently, transient failures are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_backoff: Duration::from_millis(config.retry_backoff),
        }
    }

    /// Delay before retry number `retry` (0-based): `base * 2^retry`
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_backoff.saturating_mul(2u32.saturating_pow(retry))
    }
}

/// Credentials presented with every request (basic auth only)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredential {
    pub username: String,
    pub password: String,
}

impl BasicCredential {
    pub fn from_site(site: &SiteConfig) -> Option<Self> {
        if site.auth != AuthMode::Basic {
            return None;
        }
        Some(Self {
            username: site.username.clone()?,
            password: site.password.clone()?,
        })
    }
}

/// Builds the crawler's HTTP client
///
/// Format of the user agent: `CrawlerName/Version (+ContactURL; ContactEmail)`.
/// The cookie store keeps the session cookie from form login. Redirects are
/// not followed by the client; [`Fetcher`] follows them itself.
///
/// # Example
///
/// ```no_run
/// use seo_ripple::config::UserAgentConfig;
/// use seo_ripple::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "SeoRipple".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/bot".to_string(),
///     contact_email: "bot@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, 15).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout_secs: u64,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent_string())
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10.min(timeout_secs)))
        .redirect(Policy::none())
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages with retry and failure classification
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | 2xx, HTML or no Content-Type | Success |
/// | 2xx, other Content-Type | Immediate → ContentMismatch |
/// | HTTP 404 / 410 | Immediate → DeadLink |
/// | HTTP 429 | Retry → RateLimited |
/// | Other 4xx | Immediate → HttpError |
/// | HTTP 5xx | Retry → HttpError |
/// | Timeout | Retry → Timeout |
/// | Connection error | Retry → Unreachable |
/// | Body read error | Retry → Failed |
/// | 3xx with Location | Next hop, if the caller allows it |
/// | More than [`MAX_REDIRECTS`] hops / other | Immediate → Failed |
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    retry: RetryPolicy,
    credential: Option<BasicCredential>,
}

impl Fetcher {
    pub fn new(client: Client, retry: RetryPolicy, credential: Option<BasicCredential>) -> Self {
        Self {
            client,
            retry,
            credential,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// A GET request carrying basic auth when configured
    pub fn get(&self, url: &Url) -> RequestBuilder {
        let request = self.client.get(url.clone());
        match &self.credential {
            Some(cred) => request.basic_auth(&cred.username, Some(&cred.password)),
            None => request,
        }
    }

    /// Fetches an HTML page, asking `follow` before each redirect hop
    ///
    /// `follow` sees the absolute hop target and is asked once per target
    /// even across retries. A refused hop ends the fetch with
    /// [`Fetched::Skipped`].
    pub async fn fetch_page<F>(&self, url: &Url, follow: F) -> Result<Fetched, FetchFailure>
    where
        F: Fn(&Url) -> bool,
    {
        self.fetch_with_retry(url, true, &follow).await
    }

    /// Fetches any successful body (robots.txt, sitemaps), following every redirect
    pub async fn fetch_document(&self, url: &Url) -> Result<FetchedPage, FetchFailure> {
        match self.fetch_with_retry(url, false, &|_: &Url| true).await? {
            Fetched::Page(page) => Ok(page),
            Fetched::Skipped { location } => Err(FetchFailure {
                kind: FailureKind::Failed,
                status_code: None,
                reason: format!("Redirect to {} not followed", location),
                attempts: 1,
            }),
        }
    }

    async fn fetch_with_retry<F>(
        &self,
        url: &Url,
        html_only: bool,
        follow: &F,
    ) -> Result<Fetched, FetchFailure>
    where
        F: Fn(&Url) -> bool,
    {
        let mut retry = 0;
        let mut approved: Vec<Url> = Vec::new();

        loop {
            match self.attempt(url, html_only, follow, &mut approved).await {
                Attempt::Done(page) => return Ok(Fetched::Page(page)),
                Attempt::Skipped(location) => return Ok(Fetched::Skipped { location }),
                Attempt::Permanent(mut failure) => {
                    failure.attempts = retry + 1;
                    return Err(failure);
                }
                Attempt::Transient(mut failure) => {
                    if retry >= self.retry.max_retries {
                        failure.attempts = retry + 1;
                        return Err(failure);
                    }
                    let delay = self.retry.delay_for(retry);
                    tracing::debug!(
                        "Transient failure for {} ({}), retry {} in {:?}",
                        url,
                        failure.reason,
                        retry + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
            }
        }
    }

    /// One request chain: the GET plus any redirect hops
    ///
    /// Credentials go only to the host of the original URL.
    async fn attempt<F>(
        &self,
        url: &Url,
        html_only: bool,
        follow: &F,
        approved: &mut Vec<Url>,
    ) -> Attempt
    where
        F: Fn(&Url) -> bool,
    {
        let mut current = url.clone();

        for _ in 0..=MAX_REDIRECTS {
            let request = if current.host_str() == url.host_str() {
                self.get(&current)
            } else {
                self.client.get(current.clone())
            };
            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => return classify_error(&e),
            };

            let next = match redirect_location(&response, &current) {
                Some(next) => next,
                None => return classify_response(response, html_only).await,
            };

            if !approved.contains(&next) {
                if !follow(&next) {
                    return Attempt::Skipped(next);
                }
                approved.push(next.clone());
            }
            tracing::trace!("{} redirects to {}", current, next);
            current = next;
        }

        Attempt::Permanent(FetchFailure {
            kind: FailureKind::Failed,
            status_code: None,
            reason: format!("More than {} redirects", MAX_REDIRECTS),
            attempts: 1,
        })
    }
}

/// Absolute target of a redirect response, resolved against `current`
///
/// `None` for anything but a 3xx carrying a usable Location header.
fn redirect_location(response: &Response, current: &Url) -> Option<Url> {
    if !response.status().is_redirection() {
        return None;
    }
    let location = response.headers().get(header::LOCATION)?.to_str().ok()?;
    current.join(location.trim()).ok()
}

async fn classify_response(response: Response, html_only: bool) -> Attempt {
    let status = response.status();
    let final_url = response.url().clone();

    if !status.is_success() {
        let failure = |kind: FailureKind| FetchFailure {
            kind,
            status_code: Some(status.as_u16()),
            reason: format!("HTTP {}", status),
            attempts: 1,
        };

        return match status {
            StatusCode::NOT_FOUND | StatusCode::GONE => Attempt::Permanent(failure(FailureKind::DeadLink)),
            StatusCode::TOO_MANY_REQUESTS => Attempt::Transient(failure(FailureKind::RateLimited)),
            s if s.is_server_error() => Attempt::Transient(failure(FailureKind::HttpError)),
            _ => Attempt::Permanent(failure(FailureKind::HttpError)),
        };
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if html_only {
        if let Some(ct) = content_type.as_deref() {
            if !is_html_content_type(ct) {
                return Attempt::Permanent(FetchFailure {
                    kind: FailureKind::ContentMismatch,
                    status_code: Some(status.as_u16()),
                    reason: format!("Content-Type {}", ct),
                    attempts: 1,
                });
            }
        }
    }

    match response.text().await {
        Ok(body) => Attempt::Done(FetchedPage {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
        }),
        Err(e) => Attempt::Transient(FetchFailure {
            kind: FailureKind::Failed,
            status_code: Some(status.as_u16()),
            reason: format!("Failed to read body: {}", e),
            attempts: 1,
        }),
    }
}

fn classify_error(error: &reqwest::Error) -> Attempt {
    let failure = |kind: FailureKind, reason: String| FetchFailure {
        kind,
        status_code: None,
        reason,
        attempts: 1,
    };

    if error.is_timeout() {
        Attempt::Transient(failure(FailureKind::Timeout, "Request timeout".to_string()))
    } else if error.is_connect() {
        Attempt::Transient(failure(
            FailureKind::Unreachable,
            format!("Connection failed: {}", error),
        ))
    } else {
        Attempt::Permanent(failure(FailureKind::Failed, error.to_string()))
    }
}

/// Whether a Content-Type header denotes an HTML document
pub fn is_html_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}
