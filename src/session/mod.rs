//! Analysis session model
//!
//! A session owns every PageRecord and PageFailure produced by one crawl of
//! one site. Workers write into it through a [`SessionStore`].

mod record;
mod store;
mod target;

pub use record::{FailureKind, PageFailure, PageRecord};
pub use store::SessionStore;
pub use target::{CrawlTarget, DiscoverySource};

use crate::analyzer::{rank_sitewide, SitewideKeyword};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    /// Every admitted target was processed and nothing was left to discover
    FrontierExhausted,
    /// The page cap stopped discovery
    PageCapReached,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::FrontierExhausted => "frontier_exhausted",
            Self::PageCapReached => "page_cap_reached",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "frontier_exhausted" => Some(Self::FrontierExhausted),
            "page_cap_reached" => Some(Self::PageCapReached),
            _ => None,
        }
    }
}

/// One audit of one site
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    /// Site identity (host without `www.`)
    pub domain: String,
    pub root_url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    /// Discovery mode used; `None` until discovery has run
    pub discovery: Option<DiscoverySource>,
    pub records: Vec<PageRecord>,
    pub failures: Vec<PageFailure>,
}

impl AnalysisSession {
    pub fn new(domain: &str, root_url: &str) -> Self {
        Self {
            domain: domain.to_string(),
            root_url: root_url.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            status: SessionStatus::Running,
            discovery: None,
            records: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Marks the session terminal
    pub fn finish(&mut self, status: SessionStatus) {
        self.status = status;
        self.finished_at = Some(Utc::now());
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// The `n` highest-weighted keywords over every page (TF-IDF, see
    /// [`rank_sitewide`])
    ///
    /// Pages are summed in URL order, so a reloaded session ranks to the
    /// same weights bit for bit.
    pub fn sitewide_keywords(&self, n: usize) -> Vec<SitewideKeyword> {
        let records = self.sorted_records();
        let mut ranked = rank_sitewide(records.iter().map(|r| &r.keywords));
        ranked.truncate(n);
        ranked
    }

    /// Word tokens over every page
    pub fn total_word_count(&self) -> usize {
        self.records.iter().map(|r| r.word_count).sum()
    }

    pub fn average_score(&self) -> Option<f64> {
        if self.records.is_empty() {
            return None;
        }
        let total: u32 = self.records.iter().map(|r| u32::from(r.score)).sum();
        Some(f64::from(total) / self.records.len() as f64)
    }

    /// Records ordered by URL, for stable report output
    pub fn sorted_records(&self) -> Vec<&PageRecord> {
        let mut records: Vec<&PageRecord> = self.records.iter().collect();
        records.sort_by(|a, b| a.url.cmp(&b.url));
        records
    }

    pub fn sorted_failures(&self) -> Vec<&PageFailure> {
        let mut failures: Vec<&PageFailure> = self.failures.iter().collect();
        failures.sort_by(|a, b| a.url.cmp(&b.url));
        failures
    }

    /// Failure counts per kind, in kind order
    pub fn failure_breakdown(&self) -> BTreeMap<&'static str, usize> {
        let mut breakdown = BTreeMap::new();
        for failure in &self.failures {
            *breakdown.entry(failure.kind.to_db_string()).or_insert(0) += 1;
        }
        breakdown
    }

    pub fn duration_secs(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_seconds())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{blank_record, failure};
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            SessionStatus::Running,
            SessionStatus::FrontierExhausted,
            SessionStatus::PageCapReached,
        ] {
            assert_eq!(SessionStatus::from_db_string(status.to_db_string()), Some(status));
        }
        assert!(!SessionStatus::Running.is_terminal());
        assert!(SessionStatus::PageCapReached.is_terminal());
    }

    #[test]
    fn test_sitewide_keywords_and_totals() {
        let mut session = AnalysisSession::new("example.com", "https://example.com/");

        let mut a = blank_record("https://example.com/a");
        a.keywords.add("widget", 3);
        a.word_count = 100;
        a.score = 80;
        let mut b = blank_record("https://example.com/b");
        b.keywords.add("widget", 1);
        b.keywords.add("gadget", 2);
        b.word_count = 50;
        b.score = 40;
        session.records.push(b);
        session.records.push(a);

        // "widget" is on both pages, "gadget" only on b
        let sitewide = session.sitewide_keywords(5);
        let terms: Vec<&str> = sitewide.iter().map(|k| k.term.as_str()).collect();
        assert_eq!(terms, vec!["widget", "gadget"]);
        assert_eq!(sitewide[0].count, 4);
        assert_eq!(sitewide[1].count, 2);
        assert_eq!(session.sitewide_keywords(1).len(), 1);
        assert_eq!(session.total_word_count(), 150);
        assert_eq!(session.average_score(), Some(60.0));
        assert_eq!(session.sorted_records()[0].url, "https://example.com/a");
    }

    #[test]
    fn test_finish_and_breakdown() {
        let mut session = AnalysisSession::new("example.com", "https://example.com/");
        assert!(session.average_score().is_none());
        session
            .failures
            .push(failure("https://example.com/x", FailureKind::DeadLink));
        session
            .failures
            .push(failure("https://example.com/y", FailureKind::DeadLink));
        session
            .failures
            .push(failure("https://example.com/z", FailureKind::Timeout));

        session.finish(SessionStatus::FrontierExhausted);
        assert!(session.is_finished());
        assert!(session.finished_at.is_some());
        assert_eq!(session.failure_breakdown().get("dead_link"), Some(&2));
        assert_eq!(session.failure_breakdown().get("timeout"), Some(&1));
    }
}
