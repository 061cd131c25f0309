//! Crawler coordinator - main audit orchestration logic
//!
//! This module contains the crawl loop that ties the session together:
//! - robots.txt and login before anything else
//! - Sitemap discovery, with breadth-first traversal as fallback
//! - A bounded pool of worker tasks (fetch, analyze, PageSpeed, record)
//! - Frontier updates from the links workers hand back
//!
//! A page is audited at most once however it is reached: workers claim
//! each target and each redirect hop in the [`SessionStore`] first, and
//! redirects leaving the site or landing on a claimed page are dropped.

use crate::analyzer::PageAnalyzer;
use crate::config::Config;
use crate::crawler::auth::{login, LoginOutcome};
use crate::crawler::fetcher::{
    build_http_client, BasicCredential, Fetched, FetchedPage, Fetcher, RetryPolicy,
};
use crate::crawler::frontier::Frontier;
use crate::crawler::sitemap::discover_sitemap_urls;
use crate::pagespeed::{PageSpeedClient, PageSpeedScores};
use crate::robots::{fetch_robots, ParsedRobots};
use crate::session::{
    AnalysisSession, CrawlTarget, PageFailure, PageRecord, SessionStatus, SessionStore,
};
use crate::url::{normalize_parsed, page_key, parse_site_root, LinkFilter, SiteScope};
use crate::{SeoError, UrlError};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use url::Url;

/// Progress is logged every this many finished targets
const PROGRESS_INTERVAL: usize = 10;

/// What a worker hands back to the coordinator
struct Discovered {
    depth: u32,
    links: Vec<Url>,
    /// Normalized final URL when the target redirected elsewhere
    redirected_to: Option<Url>,
}

impl Discovered {
    fn nothing(depth: u32) -> Self {
        Self {
            depth,
            links: Vec::new(),
            redirected_to: None,
        }
    }
}

/// State shared by every worker task
struct Worker {
    fetcher: Fetcher,
    analyzer: PageAnalyzer,
    pagespeed: Option<PageSpeedClient>,
    filter: LinkFilter,
    store: SessionStore,
}

impl Worker {
    /// Fetches, analyzes, scores and records one target
    ///
    /// Never fails: a page that cannot be fetched becomes a PageFailure.
    /// Targets another worker already reached, and redirects off the site or
    /// onto an already claimed page, produce nothing.
    async fn process_target(&self, target: CrawlTarget) -> Discovered {
        if !self.store.claim(&target.url) {
            tracing::debug!("Skipping {}: already reached through a redirect", target.url);
            return Discovered::nothing(target.depth);
        }

        let own_key = page_key(&target.url);
        let follow = |next: &Url| match normalize_parsed(next.clone()) {
            Ok(url) if page_key(&url) == own_key => true,
            Ok(url) => self.filter.admits(&url) && self.store.claim(&url),
            Err(_) => false,
        };

        let page = match self.fetcher.fetch_page(&target.url, follow).await {
            Ok(Fetched::Page(page)) => page,
            Ok(Fetched::Skipped { location }) => {
                tracing::info!(
                    "Dropping {}: redirects to {}, off-site or already audited",
                    target.url,
                    location
                );
                return Discovered::nothing(target.depth);
            }
            Err(failure) => {
                tracing::warn!(
                    "Failed {} ({}): {}",
                    target.url,
                    failure.kind,
                    failure.reason
                );
                let record = PageFailure {
                    url: target.url.to_string(),
                    source: target.source,
                    depth: target.depth,
                    kind: failure.kind,
                    status_code: failure.status_code,
                    reason: failure.reason,
                    attempts: failure.attempts,
                };
                if let Err(e) = self.store.record_failure(record) {
                    tracing::warn!("{}", e);
                }
                return Discovered::nothing(target.depth);
            }
        };

        let redirected_to = normalize_parsed(page.final_url.clone())
            .ok()
            .filter(|url| page_key(url) != own_key);

        let pagespeed = match &self.pagespeed {
            Some(client) => client.score_page(page.final_url.as_str()).await,
            None => PageSpeedScores::default(),
        };

        let (record, links) = self.build_record(&target, page, pagespeed);
        tracing::debug!("Analysed {} (score {})", record.url, record.score);

        if let Err(e) = self.store.record_page(record) {
            tracing::warn!("{}", e);
        }

        Discovered {
            depth: target.depth,
            links,
            redirected_to,
        }
    }

    fn build_record(
        &self,
        target: &CrawlTarget,
        page: FetchedPage,
        pagespeed: PageSpeedScores,
    ) -> (PageRecord, Vec<Url>) {
        let analysis = self.analyzer.analyze(&page.body, &page.final_url);
        let fields = analysis.fields;
        let internal_link_count = analysis
            .links
            .iter()
            .filter(|link| self.filter.scope().contains(link))
            .count();

        let mut record = PageRecord {
            url: target.url.to_string(),
            final_url: page.final_url.to_string(),
            status_code: page.status_code,
            content_type: page.content_type,
            body: page.body,
            source: target.source,
            depth: target.depth,
            h1_count: fields.heading_count(1),
            h2_count: fields.heading_count(2),
            h3_count: fields.heading_count(3),
            title: fields.title,
            meta_description: fields.meta_description,
            headings: fields.headings,
            word_count: analysis.word_count,
            keywords: analysis.keywords,
            canonical: fields.canonical,
            noindex: fields.noindex,
            image_count: fields.image_count,
            images_without_alt: fields.images_without_alt,
            structured_data_count: fields.structured_data_count,
            microdata_count: fields.microdata_count,
            internal_link_count,
            pagespeed,
            score: 0,
            recommendations: Vec::new(),
            fetched_at: Utc::now(),
        };
        self.analyzer.finalize(&mut record);

        (record, analysis.links)
    }
}

/// Main audit coordinator
pub struct Coordinator {
    config: Arc<Config>,
    scope: SiteScope,
    fetcher: Fetcher,
    analyzer: PageAnalyzer,
    pagespeed: Option<PageSpeedClient>,
}

impl Coordinator {
    /// Creates a coordinator from a validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Clients built, ready to run
    /// * `Err(SeoError)` - Bad site URL or HTTP client construction failed
    pub fn new(config: Config) -> Result<Self, SeoError> {
        let root = normalize_parsed(parse_site_root(&config.site.url)?)?;
        let scope = SiteScope::new(root).ok_or(UrlError::MissingDomain)?;

        let client = build_http_client(&config.user_agent, config.crawler.request_timeout)?;
        let fetcher = Fetcher::new(
            client,
            RetryPolicy::from_config(&config.crawler),
            BasicCredential::from_site(&config.site),
        );

        let pagespeed = PageSpeedClient::from_config(&config.pagespeed)?;
        if pagespeed.is_none() {
            tracing::info!("No PageSpeed API key configured, performance scores disabled");
        }

        Ok(Self {
            analyzer: PageAnalyzer::new(&config.analysis),
            config: Arc::new(config),
            scope,
            fetcher,
            pagespeed,
        })
    }

    pub fn root(&self) -> &Url {
        self.scope.root()
    }

    /// Runs the audit to completion and returns the finished session
    ///
    /// Per-page problems never end the run; it stops when the frontier is
    /// drained and every in-flight task has finished.
    pub async fn run(self) -> Result<AnalysisSession, SeoError> {
        let root = self.scope.root().clone();
        let crawler = &self.config.crawler;
        let max_pages = crawler.max_pages as usize;
        let start_time = Instant::now();

        tracing::info!("Starting audit of {}", root);

        let robots = if crawler.respect_robots {
            fetch_robots(&self.fetcher, &root).await
        } else {
            ParsedRobots::allow_all()
        };

        match login(&self.fetcher, &self.config.site, &root).await {
            LoginOutcome::Rejected => {
                tracing::warn!("Password not accepted, continuing without login")
            }
            outcome => tracing::debug!("Login step: {:?}", outcome),
        }

        let filter = LinkFilter::new(
            self.scope.clone(),
            &crawler.ignored_extensions,
            &crawler.excluded_path_words,
            robots,
            &self.config.user_agent.crawler_name,
        );

        let sitemap_urls =
            discover_sitemap_urls(&self.fetcher, &filter, filter.robots().sitemaps(), max_pages)
                .await;

        let mut frontier = if sitemap_urls.is_empty() {
            tracing::info!("No usable sitemap, falling back to link traversal from {}", root);
            Frontier::from_root(root.clone(), max_pages, crawler.max_depth)
        } else {
            Frontier::from_sitemap(sitemap_urls, max_pages)
        };

        let store = SessionStore::new(AnalysisSession::new(self.scope.key(), root.as_str()));
        store.set_discovery(frontier.source());

        let workers = crawler.effective_workers();
        tracing::info!(
            "Discovery: {}, {} targets queued, {} workers",
            frontier.source(),
            frontier.pending(),
            workers
        );

        let worker = Arc::new(Worker {
            fetcher: self.fetcher.clone(),
            analyzer: self.analyzer.clone(),
            pagespeed: self.pagespeed.clone(),
            filter: filter.clone(),
            store: store.clone(),
        });

        let mut tasks: JoinSet<Discovered> = JoinSet::new();
        let mut processed = 0usize;

        loop {
            while tasks.len() < workers {
                let Some(target) = frontier.next_target() else {
                    break;
                };
                let worker = Arc::clone(&worker);
                tasks.spawn(async move { worker.process_target(target).await });
            }

            let Some(joined) = tasks.join_next().await else {
                break;
            };
            processed += 1;

            match joined {
                Ok(discovered) => {
                    if let Some(final_url) = &discovered.redirected_to {
                        frontier.mark_seen(final_url);
                    }
                    if frontier.follows_links() {
                        offer_links(&mut frontier, &filter, discovered);
                    }
                }
                Err(e) => tracing::error!("Worker task failed: {}", e),
            }

            if processed % PROGRESS_INTERVAL == 0 {
                let rate = processed as f64 / start_time.elapsed().as_secs_f64().max(f64::EPSILON);
                tracing::info!(
                    "Progress: {} of {} targets done, {} queued, {:.2} pages/sec",
                    processed,
                    frontier.admitted(),
                    frontier.pending(),
                    rate
                );
            }
        }

        let status = if frontier.cap_reached() {
            SessionStatus::PageCapReached
        } else {
            SessionStatus::FrontierExhausted
        };

        drop(worker);
        let session = store.finish(status);

        tracing::info!(
            "Audit finished ({}): {} pages analysed, {} failed in {:?}",
            status.to_db_string(),
            session.records.len(),
            session.failures.len(),
            start_time.elapsed()
        );

        Ok(session)
    }
}

/// Normalizes, filters and enqueues links found one level below `depth`
fn offer_links(frontier: &mut Frontier, filter: &LinkFilter, discovered: Discovered) {
    let depth = discovered.depth + 1;

    for link in discovered.links {
        let url = match normalize_parsed(link) {
            Ok(url) => url,
            Err(e) => {
                tracing::trace!("Skipping link: {}", e);
                continue;
            }
        };
        if let Err(rejection) = filter.check(&url) {
            tracing::trace!("Link {} rejected: {:?}", url, rejection);
            continue;
        }
        if frontier.offer(url.clone(), depth) {
            tracing::trace!("Queued {} at depth {}", url, depth);
        }
    }
}

/// Runs a complete audit with the given configuration
///
/// # Example
///
/// ```no_run
/// use seo_ripple::config::load_config;
/// use seo_ripple::crawler::run_audit;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let session = run_audit(config).await?;
/// println!("{} pages analysed", session.records.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_audit(config: Config) -> Result<AnalysisSession, SeoError> {
    Coordinator::new(config)?.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    fn config(url: &str) -> Config {
        parse_config(&format!(
            r#"
[site]
url = "{}"

[user-agent]
crawler-name = "TestCrawler"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
directory = "./reports"
database-path = "./test.db"
"#,
            url
        ))
        .unwrap()
    }

    #[test]
    fn test_coordinator_normalizes_root() {
        let coordinator = Coordinator::new(config("Example.com/")).unwrap();
        assert_eq!(coordinator.root().as_str(), "https://example.com/");
        assert!(coordinator.pagespeed.is_none());
    }

    #[test]
    fn test_offer_links_filters_and_dedupes() {
        let root = Url::parse("https://example.com/").unwrap();
        let filter = LinkFilter::new(
            SiteScope::new(root.clone()).unwrap(),
            &[".pdf".to_string()],
            &["privacy".to_string()],
            ParsedRobots::from_content("User-agent: *\nDisallow: /private\n"),
            "TestCrawler",
        );
        let mut frontier = Frontier::from_root(root, 50, 2);
        frontier.next_target();

        let links = [
            "https://example.com/a?utm_source=x",
            "https://example.com/a#top",
            "https://www.example.com/b/",
            "http://www.example.com/a",
            "https://example.com/privacy",
            "https://other.org/c",
            "https://example.com/file.pdf",
            "https://example.com/private/d",
        ]
        .iter()
        .map(|l| Url::parse(l).unwrap())
        .collect();

        offer_links(
            &mut frontier,
            &filter,
            Discovered {
                depth: 0,
                links,
                redirected_to: None,
            },
        );

        let queued: Vec<String> = std::iter::from_fn(|| frontier.next_target())
            .map(|t| t.url.to_string())
            .collect();
        assert_eq!(
            queued,
            vec!["https://example.com/a", "https://www.example.com/b"]
        );
    }
}
