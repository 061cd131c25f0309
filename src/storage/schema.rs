//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Seo-Ripple database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per audit session
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    domain TEXT NOT NULL,
    root_url TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    discovery TEXT
);

-- Analysed pages
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    url TEXT NOT NULL,
    final_url TEXT NOT NULL,
    status_code INTEGER NOT NULL,
    content_type TEXT,
    source TEXT NOT NULL,
    depth INTEGER NOT NULL,
    title TEXT,
    meta_description TEXT,
    headings TEXT NOT NULL,
    h1_count INTEGER NOT NULL,
    h2_count INTEGER NOT NULL,
    h3_count INTEGER NOT NULL,
    word_count INTEGER NOT NULL,
    canonical TEXT,
    noindex INTEGER NOT NULL,
    image_count INTEGER NOT NULL,
    images_without_alt INTEGER NOT NULL,
    structured_data_count INTEGER NOT NULL,
    microdata_count INTEGER NOT NULL,
    internal_link_count INTEGER NOT NULL,
    mobile_score INTEGER,
    desktop_score INTEGER,
    seo_score INTEGER NOT NULL,
    recommendations TEXT NOT NULL,
    fetched_at TEXT NOT NULL,
    UNIQUE(run_id, url)
);

CREATE INDEX IF NOT EXISTS idx_pages_run ON pages(run_id);

-- Stemmed keyword counts per page
CREATE TABLE IF NOT EXISTS page_keywords (
    page_id INTEGER NOT NULL REFERENCES pages(id),
    term TEXT NOT NULL,
    count INTEGER NOT NULL,
    PRIMARY KEY(page_id, term)
);

-- Targets that could not be analysed
CREATE TABLE IF NOT EXISTS failures (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    url TEXT NOT NULL,
    source TEXT NOT NULL,
    depth INTEGER NOT NULL,
    kind TEXT NOT NULL,
    status_code INTEGER,
    reason TEXT NOT NULL,
    attempts INTEGER NOT NULL,
    UNIQUE(run_id, url)
);

CREATE INDEX IF NOT EXISTS idx_failures_run ON failures(run_id);
CREATE INDEX IF NOT EXISTS idx_failures_kind ON failures(kind);

-- Top keywords over the whole site by TF-IDF weight, in rank order
CREATE TABLE IF NOT EXISTS sitewide_keywords (
    run_id INTEGER NOT NULL REFERENCES runs(id),
    rank INTEGER NOT NULL,
    term TEXT NOT NULL,
    weight REAL NOT NULL,
    count INTEGER NOT NULL,
    PRIMARY KEY(run_id, rank)
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
