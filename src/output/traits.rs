//! Report writer traits and error types
//!
//! This module defines the trait interface for report formats and the
//! options they share.

use crate::config::AnalysisConfig;
use crate::session::AnalysisSession;
use crate::storage::StorageError;
use std::io::Write;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("No audit runs found in database")]
    NoRuns,
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// How many keywords reports show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Keywords listed per page
    pub top_keywords: usize,
    /// Keywords listed for the whole site
    pub sitewide_keywords: usize,
}

impl ReportOptions {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            top_keywords: config.top_keywords,
            sitewide_keywords: config.sitewide_keywords,
        }
    }
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            top_keywords: 5,
            sitewide_keywords: 10,
        }
    }
}

/// A report format
///
/// Writers are pure: the same session and options produce the same bytes.
pub trait ReportWriter {
    /// File extension, without the dot
    fn extension(&self) -> &'static str;

    /// Renders the session into `out`
    fn write_report(&self, session: &AnalysisSession, out: &mut dyn Write) -> OutputResult<()>;
}
