//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::analyzer::SitewideKeyword;
use crate::session::{AnalysisSession, FailureKind, PageFailure, PageRecord, SessionStatus};
use crate::storage::RunRecord;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Sessions are built in memory and written once they finish; the
/// incremental operations exist for tools that record pages one by one.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a run for a session that has not been written yet
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, session: &AnalysisSession, config_hash: &str) -> StorageResult<i64>;

    /// Stores the terminal status and finish time of a run
    fn finish_run(&mut self, run_id: i64, session: &AnalysisSession) -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    // ===== Pages and Failures =====

    /// Inserts an analysed page with its keyword counts
    ///
    /// Fails with [`StorageError::Duplicate`] when the run already has the URL.
    fn insert_page_record(&mut self, run_id: i64, record: &PageRecord) -> StorageResult<i64>;

    fn insert_failure(&mut self, run_id: i64, failure: &PageFailure) -> StorageResult<()>;

    /// Replaces the site-wide keyword ranking of a run
    fn save_sitewide_keywords(
        &mut self,
        run_id: i64,
        keywords: &[SitewideKeyword],
    ) -> StorageResult<()>;

    /// Writes a finished session (run, pages, failures, site-wide keywords)
    /// in one transaction and returns the new run ID
    fn persist_session(
        &mut self,
        session: &AnalysisSession,
        config_hash: &str,
        sitewide_keywords: usize,
    ) -> StorageResult<i64>;

    /// Rebuilds a session from a stored run
    ///
    /// Page bodies are not stored, so records come back with an empty body.
    fn load_session(&self, run_id: i64) -> StorageResult<AnalysisSession>;

    // ===== Statistics =====

    fn count_pages(&self, run_id: i64) -> StorageResult<u64>;

    fn count_failures(&self, run_id: i64) -> StorageResult<u64>;

    /// Failure counts per kind
    fn failure_summary(&self, run_id: i64) -> StorageResult<BTreeMap<FailureKind, u64>>;

    /// Site-wide keyword ranking as saved for the run
    fn get_sitewide_keywords(&self, run_id: i64) -> StorageResult<Vec<SitewideKeyword>>;
}

/// Status stored for a run, defaulting to `Running` for unknown values
pub(crate) fn parse_status(s: &str) -> SessionStatus {
    SessionStatus::from_db_string(s).unwrap_or(SessionStatus::Running)
}
