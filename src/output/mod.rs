//! Output module for audit reports
//!
//! This module handles:
//! - Writing the per-page CSV report
//! - Writing the HTML summary report
//! - Summarizing sessions on the terminal

mod csv_report;
mod html_report;
pub mod stats;
mod traits;

pub use csv_report::CsvReport;
pub use html_report::{escape_html, HtmlReport};
pub use stats::{load_statistics, print_statistics, SessionStatistics};
pub use traits::{OutputError, OutputResult, ReportOptions, ReportWriter};

use crate::session::AnalysisSession;
use crate::url::sanitize_for_filename;
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Report file path for one format: `seo_report_{domain}_{YYYYmmdd_HHMM}.{ext}`
/// where `ext` is the writer's [`ReportWriter::extension`].
pub fn report_path(
    dir: &Path,
    domain: &str,
    timestamp: DateTime<Utc>,
    writer: &dyn ReportWriter,
) -> PathBuf {
    dir.join(format!(
        "seo_report_{}_{}.{}",
        sanitize_for_filename(domain),
        timestamp.format("%Y%m%d_%H%M"),
        writer.extension()
    ))
}

/// Renders `session` with `writer` into its report file under `dir`
fn write_file(
    writer: &dyn ReportWriter,
    session: &AnalysisSession,
    dir: &Path,
) -> OutputResult<PathBuf> {
    let path = report_path(dir, &session.domain, session.started_at, writer);
    let mut out = BufWriter::new(File::create(&path)?);
    writer.write_report(session, &mut out)?;
    Ok(path)
}

/// Writes the CSV and HTML reports for a session into `dir`
///
/// The directory is created if missing. File names use the session's start
/// time, so re-exporting a stored run overwrites its earlier reports.
///
/// # Returns
///
/// * `Ok((csv_path, html_path))` - Both reports were written
/// * `Err(OutputError)` - Failed to create the directory or write a report
pub fn export_session(
    session: &AnalysisSession,
    dir: &Path,
    options: ReportOptions,
) -> OutputResult<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir)?;

    let csv_path = write_file(&CsvReport::new(options), session, dir)?;
    tracing::info!("CSV report written to {}", csv_path.display());

    let html_path = write_file(&HtmlReport::new(options), session, dir)?;
    tracing::info!("HTML report written to {}", html_path.display());

    Ok((csv_path, html_path))
}
