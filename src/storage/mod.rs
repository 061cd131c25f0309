//! Storage module for persisting audit sessions
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Writing finished sessions (pages, keywords, failures) in one transaction
//! - Reloading sessions for statistics and report regeneration

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::session::{DiscoverySource, SessionStatus};
use crate::SeoError;
use std::path::Path;

/// Opens the database at `path`, creating its parent directory if needed
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(SeoError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, SeoError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    SqliteStorage::new(path)
}

/// Represents an audit run in the database
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub domain: String,
    pub root_url: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: SessionStatus,
    pub discovery: Option<DiscoverySource>,
}
