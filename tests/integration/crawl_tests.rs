//! Integration tests for the auditor
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! audit cycle end-to-end: discovery, fetching, analysis, PageSpeed,
//! persistence and report export.

use seo_ripple::config::{parse_config, Config, Strategy};
use seo_ripple::crawler::{run_audit, Coordinator, MAX_SITEMAP_DOCUMENTS};
use seo_ripple::output::{export_session, ReportOptions};
use seo_ripple::session::{AnalysisSession, DiscoverySource, FailureKind, SessionStatus};
use seo_ripple::storage::{open_storage, Storage};
use std::collections::HashSet;
use std::path::Path;
use wiremock::matchers::{body_string_contains, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Creates a test configuration for the site served by `base_url`
fn create_test_config(base_url: &str, dir: &Path) -> Config {
    let mut config = parse_config(&format!(
        r#"
[site]
url = "{}"

[crawler]
max-pages = 50
max-depth = 2
workers = 2
request-timeout = 5
max-retries = 0
retry-backoff = 10

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[output]
directory = "{}"
database-path = "{}"
"#,
        base_url,
        dir.join("reports").display(),
        dir.join("audit.db").display()
    ))
    .expect("test config should parse");
    config.crawler.respect_robots = true;
    config
}

/// An HTML page with a title and the given links
fn page(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body><h1>{}</h1>\
         <p>Blue widgets for every garden and every gardener.</p>{}</body></html>",
        title, title, anchors
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

fn xml(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "application/xml")
}

fn urlset(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("<url><loc>{}</loc></url>", loc))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        entries
    )
}

fn sitemap_index(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("<sitemap><loc>{}</loc></sitemap>", loc))
        .collect();
    format!(
        r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</sitemapindex>"#,
        entries
    )
}

fn redirect(status: u16, location: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).insert_header("location", location)
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

fn record_paths(session: &AnalysisSession, base_url: &str) -> HashSet<String> {
    session
        .records
        .iter()
        .map(|r| r.url.trim_start_matches(base_url).to_string())
        .collect()
}

#[tokio::test]
async fn test_sitemap_crawl_follows_no_links() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(xml(urlset(&[
            format!("{}/", base),
            format!("{}/about", base),
            format!("{}/about#team", base),
        ])))
        .mount(&server)
        .await;
    mount_page(&server, "/", page("Home", &["/hidden"])).await;
    mount_page(&server, "/about", page("About", &["/hidden"])).await;
    Mock::given(method("GET"))
        .and(path("/hidden"))
        .respond_with(html(page("Hidden", &[])))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let session = run_audit(create_test_config(&base, dir.path()))
        .await
        .expect("audit should succeed");

    assert_eq!(session.discovery, Some(DiscoverySource::Sitemap));
    assert_eq!(session.status, SessionStatus::FrontierExhausted);
    assert_eq!(
        record_paths(&session, &base),
        HashSet::from(["/".to_string(), "/about".to_string()])
    );
    assert!(session
        .records
        .iter()
        .all(|r| r.source == DiscoverySource::Sitemap));
    assert!(session.failures.is_empty());
}

#[tokio::test]
async fn test_bfs_fallback_respects_depth_and_site() {
    let server = MockServer::start().await;
    let base = server.uri();

    // No sitemap mounted: wiremock answers 404
    mount_page(
        &server,
        "/",
        page(
            "Home",
            &["/a", "/b", "https://other.example/x", "/brochure.pdf", "/a#top"],
        ),
    )
    .await;
    mount_page(&server, "/a", page("A", &["/", "/b", "/a/deep"])).await;
    mount_page(&server, "/b", page("B", &["/a?utm_source=x"])).await;
    mount_page(&server, "/a/deep", page("Deep", &["/a/deeper"])).await;
    Mock::given(method("GET"))
        .and(path("/a/deeper"))
        .respond_with(html(page("Deeper", &[])))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let session = run_audit(create_test_config(&base, dir.path()))
        .await
        .expect("audit should succeed");

    assert_eq!(session.discovery, Some(DiscoverySource::Bfs));
    assert_eq!(
        record_paths(&session, &base),
        HashSet::from([
            "/".to_string(),
            "/a".to_string(),
            "/b".to_string(),
            "/a/deep".to_string(),
        ])
    );

    // Each URL analysed exactly once
    assert_eq!(session.records.len(), 4);

    let deep = session
        .records
        .iter()
        .find(|r| r.url.ends_with("/a/deep"))
        .unwrap();
    assert_eq!(deep.depth, 2);
    assert_eq!(deep.title.as_deref(), Some("Deep"));
}

#[tokio::test]
async fn test_page_cap_stops_discovery() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", page("Home", &["/one", "/two", "/three"])).await;
    mount_page(&server, "/one", page("One", &[])).await;
    mount_page(&server, "/two", page("Two", &[])).await;
    mount_page(&server, "/three", page("Three", &[])).await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&base, dir.path());
    config.crawler.max_pages = 2;

    let session = run_audit(config).await.expect("audit should succeed");

    assert_eq!(session.status, SessionStatus::PageCapReached);
    assert_eq!(session.records.len() + session.failures.len(), 2);
    assert_eq!(
        record_paths(&session, &base),
        HashSet::from(["/".to_string(), "/one".to_string()])
    );
}

#[tokio::test]
async fn test_failing_pages_do_not_stop_the_audit() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        page("Home", &["/ok", "/broken", "/missing", "/data.json"]),
    )
    .await;
    mount_page(&server, "/ok", page("Ok", &[])).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let session = run_audit(create_test_config(&base, dir.path()))
        .await
        .expect("audit should succeed");

    assert_eq!(
        record_paths(&session, &base),
        HashSet::from(["/".to_string(), "/ok".to_string()])
    );
    assert_eq!(session.failures.len(), 3);

    let kind_of = |suffix: &str| {
        session
            .failures
            .iter()
            .find(|f| f.url.ends_with(suffix))
            .map(|f| (f.kind, f.status_code))
    };
    assert_eq!(kind_of("/broken"), Some((FailureKind::HttpError, Some(500))));
    assert_eq!(kind_of("/missing"), Some((FailureKind::DeadLink, Some(404))));
    assert_eq!(
        kind_of("/data.json"),
        Some((FailureKind::ContentMismatch, Some(200)))
    );
}

#[tokio::test]
async fn test_pagespeed_scores_and_degradation() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", page("Home", &[])).await;
    Mock::given(method("GET"))
        .and(path("/pagespeed"))
        .and(query_param("strategy", "mobile"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"lighthouseResult":{"categories":{"performance":{"score":0.914}}}}"#,
            "application/json",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pagespeed"))
        .and(query_param("strategy", "desktop"))
        .respond_with(ResponseTemplate::new(429).set_body_raw(
            r#"{"error":{"code":429,"message":"Quota exceeded"}}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&base, dir.path());
    config.pagespeed.api_key = Some("test-key".to_string());
    config.pagespeed.endpoint = format!("{}/pagespeed", base);
    config.pagespeed.strategies = vec![Strategy::Mobile, Strategy::Desktop];

    let session = run_audit(config).await.expect("audit should succeed");

    assert_eq!(session.records.len(), 1);
    let record = &session.records[0];
    assert_eq!(record.pagespeed.mobile, Some(91));
    assert_eq!(record.pagespeed.desktop, None);

    // The record is still exported with an empty desktop cell
    let (csv_path, _) = export_session(
        &session,
        &dir.path().join("reports"),
        ReportOptions::default(),
    )
    .unwrap();
    let mut reader = csv::Reader::from_path(csv_path).unwrap();
    let headers = reader.headers().unwrap().clone();
    let mobile = headers
        .iter()
        .position(|h| h == "PerformanceScoreMobile")
        .unwrap();
    let desktop = headers
        .iter()
        .position(|h| h == "PerformanceScoreDesktop")
        .unwrap();
    let row = reader.records().next().unwrap().unwrap();
    assert_eq!(&row[mobile], "91");
    assert_eq!(&row[desktop], "");
}

#[tokio::test]
async fn test_form_login_unlocks_site() {
    let server = MockServer::start().await;
    let base = server.uri();

    let locked = r#"<html><body><form method="post" action="/login">
        <input type="hidden" name="redirect" value="/">
        <input type="password" name="pwd">
        </form></body></html>"#;

    // Mounted first so it wins over the locked page when the cookie is sent
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("cookie", "auth=ok"))
        .respond_with(html(page("Members", &["/inside"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(locked.to_string()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_string_contains("pwd=hunter2"))
        .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "auth=ok; Path=/"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/inside"))
        .and(header("cookie", "auth=ok"))
        .respond_with(html(page("Inside", &[])))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&base, dir.path());
    config.site.password = Some("hunter2".to_string());

    let session = run_audit(config).await.expect("audit should succeed");

    assert_eq!(
        record_paths(&session, &base),
        HashSet::from(["/".to_string(), "/inside".to_string()])
    );
    let home = session.records.iter().find(|r| r.url.ends_with('/')).unwrap();
    assert_eq!(home.title.as_deref(), Some("Members"));
}

#[tokio::test]
async fn test_robots_rules_and_sitemap_directive() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "User-agent: *\nDisallow: /private\nSitemap: {}/maps/pages.xml\n",
            base
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/maps/pages.xml"))
        .respond_with(xml(urlset(&[
            format!("{}/", base),
            format!("{}/private/report", base),
            format!("{}/public", base),
        ])))
        .mount(&server)
        .await;
    mount_page(&server, "/", page("Home", &[])).await;
    mount_page(&server, "/public", page("Public", &[])).await;
    Mock::given(method("GET"))
        .and(path("/private/report"))
        .respond_with(html(page("Private", &[])))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let session = run_audit(create_test_config(&base, dir.path()))
        .await
        .expect("audit should succeed");

    assert_eq!(session.discovery, Some(DiscoverySource::Sitemap));
    assert_eq!(
        record_paths(&session, &base),
        HashSet::from(["/".to_string(), "/public".to_string()])
    );
}

#[tokio::test]
async fn test_persist_reload_and_export() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", page("Home", &["/a", "/gone"])).await;
    mount_page(&server, "/a", page("A", &[])).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&base, dir.path());
    let db_path = dir.path().join("audit.db");
    let report_dir = dir.path().join("reports");

    let coordinator = Coordinator::new(config).expect("coordinator should build");
    assert_eq!(coordinator.root().as_str(), format!("{}/", base));
    let session = coordinator.run().await.expect("audit should succeed");
    assert_eq!(session.records.len(), 2);
    assert_eq!(session.failures.len(), 1);

    let mut storage = open_storage(&db_path).unwrap();
    let run_id = storage.persist_session(&session, "abc123", 10).unwrap();
    drop(storage);

    let storage = open_storage(&db_path).unwrap();
    let latest = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(latest.id, run_id);
    assert_eq!(latest.config_hash, "abc123");
    assert_eq!(storage.count_pages(run_id).unwrap(), 2);
    assert_eq!(storage.count_failures(run_id).unwrap(), 1);

    let loaded = storage.load_session(run_id).unwrap();
    assert_eq!(loaded.domain, session.domain);
    assert_eq!(loaded.status, session.status);
    let scores = |s: &AnalysisSession| -> Vec<(String, u8)> {
        s.sorted_records()
            .iter()
            .map(|r| (r.url.clone(), r.score))
            .collect()
    };
    assert_eq!(scores(&loaded), scores(&session));
    assert_eq!(loaded.sitewide_keywords(10), session.sitewide_keywords(10));
    assert_eq!(
        storage.get_sitewide_keywords(run_id).unwrap(),
        session.sitewide_keywords(10)
    );

    // Reports from the stored run: one CSV data row per record
    let (csv_path, html_path) =
        export_session(&loaded, &report_dir, ReportOptions::default()).unwrap();
    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    assert_eq!(reader.records().count(), loaded.records.len());

    let html = std::fs::read_to_string(&html_path).unwrap();
    assert!(html.contains("<h2>Failures (1)</h2>"));
    assert!(html.contains("dead_link"));
}

#[tokio::test]
async fn test_exact_page_count_is_not_capped() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", page("Home", &["/one"])).await;
    mount_page(&server, "/one", page("One", &["/"])).await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&base, dir.path());
    config.crawler.max_pages = 2;

    let session = run_audit(config).await.expect("audit should succeed");

    assert_eq!(session.records.len(), 2);
    assert_eq!(session.status, SessionStatus::FrontierExhausted);
}

#[tokio::test]
async fn test_redirects_never_audit_a_page_twice() {
    let server = MockServer::start().await;
    let base = server.uri();
    // Same server under another host name, so a different site
    let elsewhere = format!("http://localhost:{}/elsewhere", server.address().port());

    mount_page(&server, "/", page("Home", &["/old", "/new", "/away"])).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(redirect(301, "/new"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html(page("New", &[])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/away"))
        .respond_with(redirect(302, &elsewhere))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/elsewhere"))
        .respond_with(html(page("Elsewhere", &[])))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let session = run_audit(create_test_config(&base, dir.path()))
        .await
        .expect("audit should succeed");

    // Home plus one record for /new, reached either directly or via /old
    assert_eq!(session.records.len(), 2);
    let landed_on_new = session
        .records
        .iter()
        .filter(|r| r.final_url == format!("{}/new", base))
        .count();
    assert_eq!(landed_on_new, 1);
    assert!(session.records.iter().all(|r| !r.url.ends_with("/away")));
    assert!(session.failures.is_empty());
}

#[tokio::test]
async fn test_sitemap_index_children_fetched_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(xml(sitemap_index(&[
            format!("{}/maps/a.xml", base),
            format!("{}/maps/b.xml", base),
            format!("{}/maps/a.xml", base),
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/maps/a.xml"))
        .respond_with(xml(urlset(&[format!("{}/p1", base)])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/maps/b.xml"))
        .respond_with(xml(urlset(&[
            format!("{}/p2", base),
            format!("{}/p1", base),
        ])))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/p1", page("P1", &[])).await;
    mount_page(&server, "/p2", page("P2", &[])).await;

    let dir = tempfile::tempdir().unwrap();
    let session = run_audit(create_test_config(&base, dir.path()))
        .await
        .expect("audit should succeed");

    assert_eq!(session.discovery, Some(DiscoverySource::Sitemap));
    assert_eq!(
        record_paths(&session, &base),
        HashSet::from(["/p1".to_string(), "/p2".to_string()])
    );
}

/// Serves `/chain/N.xml` as an index pointing at `/chain/N+1.xml`
struct EndlessIndex {
    base: String,
}

impl Respond for EndlessIndex {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let n: u32 = request
            .url
            .path()
            .trim_start_matches("/chain/")
            .trim_end_matches(".xml")
            .parse()
            .unwrap_or(0);
        xml(sitemap_index(&[format!("{}/chain/{}.xml", self.base, n + 1)]))
    }
}

#[tokio::test]
async fn test_sitemap_documents_are_capped() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(xml(sitemap_index(&[format!("{}/chain/1.xml", base)])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/chain/\d+\.xml$"))
        .respond_with(EndlessIndex { base: base.clone() })
        .mount(&server)
        .await;
    mount_page(&server, "/", page("Home", &[])).await;

    let dir = tempfile::tempdir().unwrap();
    let session = run_audit(create_test_config(&base, dir.path()))
        .await
        .expect("audit should succeed");

    // Both default locations count toward the cap
    let requests = server.received_requests().await.unwrap();
    let sitemap_fetches = requests
        .iter()
        .filter(|r| r.url.path().ends_with(".xml"))
        .count();
    assert_eq!(sitemap_fetches, MAX_SITEMAP_DOCUMENTS);

    // No page URLs anywhere in the chain: link traversal takes over
    assert_eq!(session.discovery, Some(DiscoverySource::Bfs));
    assert_eq!(record_paths(&session, &base), HashSet::from(["/".to_string()]));
}

#[tokio::test]
async fn test_default_sitemap_locations_after_declared_one_fails() {
    let server = MockServer::start().await;
    let base = server.uri();

    // The declared sitemap and /sitemap.xml are both missing (404)
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "User-agent: *\nSitemap: {}/declared.xml\n",
            base
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap_index.xml"))
        .respond_with(xml(urlset(&[
            format!("{}/", base),
            format!("{}/found", base),
        ])))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/", page("Home", &["/unlisted"])).await;
    mount_page(&server, "/found", page("Found", &[])).await;

    let dir = tempfile::tempdir().unwrap();
    let session = run_audit(create_test_config(&base, dir.path()))
        .await
        .expect("audit should succeed");

    assert_eq!(session.discovery, Some(DiscoverySource::Sitemap));
    assert_eq!(
        record_paths(&session, &base),
        HashSet::from(["/".to_string(), "/found".to_string()])
    );

    let requested: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    assert!(requested.contains(&"/declared.xml".to_string()));
    assert!(requested.contains(&"/sitemap.xml".to_string()));
}
