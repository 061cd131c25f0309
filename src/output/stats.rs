//! Session statistics
//!
//! This module summarizes a session for the terminal, either straight after
//! an audit or from the latest run in the database.

use crate::analyzer::SitewideKeyword;
use crate::output::traits::{OutputError, OutputResult};
use crate::session::{AnalysisSession, FailureKind};
use crate::storage::{RunRecord, Storage};
use std::collections::BTreeMap;

/// Score bands used for the distribution table
const SCORE_BANDS: [(u8, u8); 4] = [(0, 39), (40, 59), (60, 79), (80, 100)];

/// Audit statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatistics {
    pub domain: String,
    pub status: String,
    pub discovery: Option<String>,
    pub duration_secs: Option<i64>,
    pub pages_analysed: usize,
    pub failures: usize,
    pub failures_by_kind: BTreeMap<FailureKind, usize>,
    pub average_score: Option<f64>,
    /// Pages per score band, in [`SCORE_BANDS`] order
    pub score_distribution: Vec<((u8, u8), usize)>,
    /// Pages with at least one PageSpeed score
    pub pagespeed_coverage: usize,
    pub total_words: usize,
    /// Ranked by TF-IDF weight
    pub top_keywords: Vec<SitewideKeyword>,
}

impl SessionStatistics {
    pub fn from_session(session: &AnalysisSession, sitewide_keywords: usize) -> Self {
        let mut failures_by_kind = BTreeMap::new();
        for failure in &session.failures {
            *failures_by_kind.entry(failure.kind).or_insert(0) += 1;
        }

        let score_distribution = SCORE_BANDS
            .iter()
            .map(|&(low, high)| {
                let count = session
                    .records
                    .iter()
                    .filter(|r| (low..=high).contains(&r.score))
                    .count();
                ((low, high), count)
            })
            .collect();

        Self {
            domain: session.domain.clone(),
            status: session.status.to_db_string().to_string(),
            discovery: session.discovery.map(|d| d.to_string()),
            duration_secs: session.duration_secs(),
            pages_analysed: session.records.len(),
            failures: session.failures.len(),
            failures_by_kind,
            average_score: session.average_score(),
            score_distribution,
            pagespeed_coverage: session
                .records
                .iter()
                .filter(|r| r.pagespeed.mobile.is_some() || r.pagespeed.desktop.is_some())
                .count(),
            total_words: session.total_word_count(),
            top_keywords: session.sitewide_keywords(sitewide_keywords),
        }
    }

    /// Share of targets that produced a record, as a percentage
    pub fn success_rate(&self) -> f64 {
        let total = self.pages_analysed + self.failures;
        if total == 0 {
            return 0.0;
        }
        (self.pages_analysed as f64 / total as f64) * 100.0
    }
}

/// Loads the latest run from storage and summarizes it
///
/// # Returns
///
/// * `Ok((RunRecord, SessionStatistics))` - The run and its statistics
/// * `Err(OutputError::NoRuns)` - The database holds no runs
pub fn load_statistics(
    storage: &dyn Storage,
    sitewide_keywords: usize,
) -> OutputResult<(RunRecord, SessionStatistics)> {
    let run = storage.get_latest_run()?.ok_or(OutputError::NoRuns)?;
    let session = storage.load_session(run.id)?;
    let stats = SessionStatistics::from_session(&session, sitewide_keywords);
    Ok((run, stats))
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &SessionStatistics) {
    println!("=== SEO Audit Statistics: {} ===\n", stats.domain);

    println!("Overview:");
    println!("  Status: {}", stats.status);
    if let Some(discovery) = &stats.discovery {
        println!("  Discovery: {}", discovery);
    }
    if let Some(secs) = stats.duration_secs {
        println!("  Duration: {} s", secs);
    }
    println!("  Pages analysed: {}", stats.pages_analysed);
    println!("  Failures: {}", stats.failures);
    match stats.average_score {
        Some(avg) => println!("  Average score: {:.1}", avg),
        None => println!("  Average score: -"),
    }
    println!("  Total words: {}", stats.total_words);
    println!(
        "  PageSpeed coverage: {} / {} pages",
        stats.pagespeed_coverage, stats.pages_analysed
    );
    println!();

    if stats.pages_analysed > 0 {
        println!("Score Distribution:");
        for ((low, high), count) in &stats.score_distribution {
            println!("  {:>3}-{:<3}: {}", low, high, count);
        }
        println!();
    }

    if !stats.failures_by_kind.is_empty() {
        println!("Failure Summary:");
        let mut kinds: Vec<_> = stats.failures_by_kind.iter().collect();
        kinds.sort_by(|a, b| b.1.cmp(a.1));
        for (kind, count) in kinds {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    if !stats.top_keywords.is_empty() {
        println!("Top Keywords:");
        for (rank, keyword) in stats.top_keywords.iter().enumerate() {
            println!(
                "  {:>2}. {} (tf-idf {:.3}, {} uses)",
                rank + 1,
                keyword.term,
                keyword.weight,
                keyword.count
            );
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} targets analysed)",
        stats.success_rate(),
        stats.pages_analysed,
        stats.pages_analysed + stats.failures
    );
}
