//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::analyzer::{Heading, KeywordCounts, SitewideKeyword};
use crate::pagespeed::PageSpeedScores;
use crate::session::{AnalysisSession, DiscoverySource, FailureKind, PageFailure, PageRecord};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{parse_status, Storage, StorageError, StorageResult};
use crate::storage::RunRecord;
use crate::SeoError;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;

const RUN_COLUMNS: &str =
    "id, domain, root_url, started_at, finished_at, config_hash, status, discovery";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(SeoError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, SeoError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, SeoError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, session: &AnalysisSession, config_hash: &str) -> StorageResult<i64> {
        insert_run(&self.conn, session, config_hash)
    }

    fn finish_run(&mut self, run_id: i64, session: &AnalysisSession) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, discovery = ?3 WHERE id = ?4",
            params![
                session.status.to_db_string(),
                session.finished_at.map(|t| t.to_rfc3339()),
                session.discovery.map(|d| d.to_db_string()),
                run_id
            ],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    // ===== Pages and Failures =====

    fn insert_page_record(&mut self, run_id: i64, record: &PageRecord) -> StorageResult<i64> {
        insert_page(&self.conn, run_id, record)
    }

    fn insert_failure(&mut self, run_id: i64, failure: &PageFailure) -> StorageResult<()> {
        insert_failure_row(&self.conn, run_id, failure)
    }

    fn save_sitewide_keywords(
        &mut self,
        run_id: i64,
        keywords: &[SitewideKeyword],
    ) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        replace_sitewide(&tx, run_id, keywords)?;
        tx.commit()?;
        Ok(())
    }

    fn persist_session(
        &mut self,
        session: &AnalysisSession,
        config_hash: &str,
        sitewide_keywords: usize,
    ) -> StorageResult<i64> {
        let tx = self.conn.transaction()?;

        let run_id = insert_run(&tx, session, config_hash)?;
        for record in &session.records {
            insert_page(&tx, run_id, record)?;
        }
        for failure in &session.failures {
            insert_failure_row(&tx, run_id, failure)?;
        }
        replace_sitewide(&tx, run_id, &session.sitewide_keywords(sitewide_keywords))?;

        tx.commit()?;

        tracing::debug!(
            "Persisted run {} ({} pages, {} failures)",
            run_id,
            session.records.len(),
            session.failures.len()
        );
        Ok(run_id)
    }

    fn load_session(&self, run_id: i64) -> StorageResult<AnalysisSession> {
        let run = self.get_run(run_id)?;

        let mut session = AnalysisSession::new(&run.domain, &run.root_url);
        session.started_at = parse_time(&run.started_at)?;
        session.finished_at = run.finished_at.as_deref().map(parse_time).transpose()?;
        session.status = run.status;
        session.discovery = run.discovery;

        let mut stmt = self.conn.prepare(
            "SELECT id, url, final_url, status_code, content_type, source, depth, title,
             meta_description, headings, h1_count, h2_count, h3_count, word_count, canonical,
             noindex, image_count, images_without_alt, structured_data_count, microdata_count,
             internal_link_count, mobile_score, desktop_score, seo_score, recommendations,
             fetched_at
             FROM pages WHERE run_id = ?1 ORDER BY id",
        )?;
        let pages = stmt
            .query_map(params![run_id], |row| Ok((row.get::<_, i64>(0)?, page_from_row(row)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut keyword_stmt = self
            .conn
            .prepare("SELECT term, count FROM page_keywords WHERE page_id = ?1")?;
        for (page_id, mut record) in pages {
            record.keywords = keyword_stmt
                .query_map(params![page_id], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
                })?
                .collect::<Result<KeywordCounts, _>>()?;
            session.records.push(record);
        }

        let mut stmt = self.conn.prepare(
            "SELECT url, source, depth, kind, status_code, reason, attempts
             FROM failures WHERE run_id = ?1 ORDER BY id",
        )?;
        session.failures = stmt
            .query_map(params![run_id], failure_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(session)
    }

    // ===== Statistics =====

    fn count_pages(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_failures(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM failures WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn failure_summary(&self, run_id: i64) -> StorageResult<BTreeMap<FailureKind, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT kind, COUNT(*) FROM failures WHERE run_id = ?1 GROUP BY kind")?;

        let rows = stmt.query_map(params![run_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut summary = BTreeMap::new();
        for row in rows {
            let (kind, count) = row?;
            if let Some(kind) = FailureKind::from_db_string(&kind) {
                summary.insert(kind, count as u64);
            }
        }

        Ok(summary)
    }

    fn get_sitewide_keywords(&self, run_id: i64) -> StorageResult<Vec<SitewideKeyword>> {
        let mut stmt = self.conn.prepare(
            "SELECT term, weight, count FROM sitewide_keywords WHERE run_id = ?1 ORDER BY rank",
        )?;
        let keywords = stmt
            .query_map(params![run_id], |row| {
                Ok(SitewideKeyword {
                    term: row.get(0)?,
                    weight: row.get(1)?,
                    count: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keywords)
    }
}

fn insert_run(conn: &Connection, session: &AnalysisSession, config_hash: &str) -> StorageResult<i64> {
    conn.execute(
        "INSERT INTO runs (domain, root_url, started_at, finished_at, config_hash, status, discovery)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            session.domain,
            session.root_url,
            session.started_at.to_rfc3339(),
            session.finished_at.map(|t| t.to_rfc3339()),
            config_hash,
            session.status.to_db_string(),
            session.discovery.map(|d| d.to_db_string()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn insert_page(conn: &Connection, run_id: i64, record: &PageRecord) -> StorageResult<i64> {
    let headings = serde_json::to_string(&record.headings)?;
    let recommendations = serde_json::to_string(&record.recommendations)?;

    conn.execute(
        "INSERT INTO pages (run_id, url, final_url, status_code, content_type, source, depth,
         title, meta_description, headings, h1_count, h2_count, h3_count, word_count, canonical,
         noindex, image_count, images_without_alt, structured_data_count, microdata_count,
         internal_link_count, mobile_score, desktop_score, seo_score, recommendations, fetched_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18,
         ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26)",
        params![
            run_id,
            record.url,
            record.final_url,
            record.status_code,
            record.content_type,
            record.source.to_db_string(),
            record.depth,
            record.title,
            record.meta_description,
            headings,
            record.h1_count,
            record.h2_count,
            record.h3_count,
            record.word_count,
            record.canonical,
            record.noindex,
            record.image_count,
            record.images_without_alt,
            record.structured_data_count,
            record.microdata_count,
            record.internal_link_count,
            record.pagespeed.mobile,
            record.pagespeed.desktop,
            record.score,
            recommendations,
            record.fetched_at.to_rfc3339(),
        ],
    )
    .map_err(|e| duplicate_or(e, &record.url))?;

    let page_id = conn.last_insert_rowid();

    let mut stmt =
        conn.prepare_cached("INSERT INTO page_keywords (page_id, term, count) VALUES (?1, ?2, ?3)")?;
    for (term, count) in record.keywords.iter() {
        stmt.execute(params![page_id, term, count])?;
    }

    Ok(page_id)
}

fn insert_failure_row(conn: &Connection, run_id: i64, failure: &PageFailure) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO failures (run_id, url, source, depth, kind, status_code, reason, attempts)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            run_id,
            failure.url,
            failure.source.to_db_string(),
            failure.depth,
            failure.kind.to_db_string(),
            failure.status_code,
            failure.reason,
            failure.attempts,
        ],
    )
    .map_err(|e| duplicate_or(e, &failure.url))?;
    Ok(())
}

fn replace_sitewide(
    conn: &Connection,
    run_id: i64,
    keywords: &[SitewideKeyword],
) -> StorageResult<()> {
    conn.execute(
        "DELETE FROM sitewide_keywords WHERE run_id = ?1",
        params![run_id],
    )?;

    let mut stmt = conn.prepare_cached(
        "INSERT INTO sitewide_keywords (run_id, rank, term, weight, count)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (rank, keyword) in keywords.iter().enumerate() {
        stmt.execute(params![
            run_id,
            rank + 1,
            keyword.term,
            keyword.weight,
            keyword.count
        ])?;
    }
    Ok(())
}

/// Maps a UNIQUE violation to [`StorageError::Duplicate`]
fn duplicate_or(error: rusqlite::Error, url: &str) -> StorageError {
    match &error {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            StorageError::Duplicate(url.to_string())
        }
        _ => StorageError::Sqlite(error),
    }
}

fn parse_time(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::Serialization(format!("bad timestamp '{}': {}", value, e)))
}

fn conversion_error(
    idx: usize,
    error: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(error))
}

fn source_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DiscoverySource> {
    let value: String = row.get(idx)?;
    DiscoverySource::from_db_string(&value)
        .ok_or_else(|| conversion_error(idx, StorageError::Serialization(format!("unknown source '{}'", value))))
}

fn time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let value: String = row.get(idx)?;
    parse_time(&value).map_err(|e| conversion_error(idx, e))
}

fn json_column<T: serde::de::DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let value: String = row.get(idx)?;
    serde_json::from_str(&value).map_err(|e| conversion_error(idx, e))
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        domain: row.get(1)?,
        root_url: row.get(2)?,
        started_at: row.get(3)?,
        finished_at: row.get(4)?,
        config_hash: row.get(5)?,
        status: parse_status(&row.get::<_, String>(6)?),
        discovery: row
            .get::<_, Option<String>>(7)?
            .as_deref()
            .and_then(DiscoverySource::from_db_string),
    })
}

/// Builds a record from a `pages` row (column 0 is the page id)
fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    let headings: Vec<Heading> = json_column(row, 9)?;

    Ok(PageRecord {
        url: row.get(1)?,
        final_url: row.get(2)?,
        status_code: row.get(3)?,
        content_type: row.get(4)?,
        body: String::new(),
        source: source_column(row, 5)?,
        depth: row.get(6)?,
        title: row.get(7)?,
        meta_description: row.get(8)?,
        headings,
        h1_count: row.get(10)?,
        h2_count: row.get(11)?,
        h3_count: row.get(12)?,
        word_count: row.get(13)?,
        keywords: KeywordCounts::new(),
        canonical: row.get(14)?,
        noindex: row.get(15)?,
        image_count: row.get(16)?,
        images_without_alt: row.get(17)?,
        structured_data_count: row.get(18)?,
        microdata_count: row.get(19)?,
        internal_link_count: row.get(20)?,
        pagespeed: PageSpeedScores {
            mobile: row.get(21)?,
            desktop: row.get(22)?,
        },
        score: row.get(23)?,
        recommendations: json_column(row, 24)?,
        fetched_at: time_column(row, 25)?,
    })
}

fn failure_from_row(row: &Row<'_>) -> rusqlite::Result<PageFailure> {
    let kind: String = row.get(3)?;
    Ok(PageFailure {
        url: row.get(0)?,
        source: source_column(row, 1)?,
        depth: row.get(2)?,
        kind: FailureKind::from_db_string(&kind).unwrap_or(FailureKind::Failed),
        status_code: row.get(4)?,
        reason: row.get(5)?,
        attempts: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Heading;
    use crate::session::test_support::{blank_record, failure};
    use crate::session::SessionStatus;

    fn finished_session() -> AnalysisSession {
        let mut session = AnalysisSession::new("example.com", "https://example.com/");

        let mut home = blank_record("https://example.com/");
        home.title = Some("Home".to_string());
        home.headings = vec![Heading {
            level: 1,
            text: "Welcome".to_string(),
        }];
        home.h1_count = 1;
        home.keywords = [("widget".to_string(), 3), ("blue".to_string(), 1)]
            .into_iter()
            .collect();
        home.pagespeed = PageSpeedScores {
            mobile: Some(81),
            desktop: None,
        };
        home.score = 62;
        home.recommendations = vec!["Add H2 tags for subtopics.".to_string()];

        let mut about = blank_record("https://example.com/about");
        about.keywords = [("widget".to_string(), 2)].into_iter().collect();

        session.records = vec![home, about];
        session.failures = vec![
            failure("https://example.com/gone", FailureKind::DeadLink),
            failure("https://example.com/slow", FailureKind::Timeout),
            failure("https://example.com/dead", FailureKind::DeadLink),
        ];
        session.discovery = Some(DiscoverySource::Bfs);
        session.finish(SessionStatus::FrontierExhausted);
        session
    }

    #[test]
    fn test_persist_and_load_session() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let session = finished_session();

        let run_id = storage.persist_session(&session, "hash", 10).unwrap();
        let loaded = storage.load_session(run_id).unwrap();

        assert_eq!(loaded.domain, "example.com");
        assert_eq!(loaded.status, SessionStatus::FrontierExhausted);
        assert_eq!(loaded.discovery, Some(DiscoverySource::Bfs));
        assert_eq!(loaded.started_at, session.started_at);
        assert_eq!(loaded.finished_at, session.finished_at);
        assert_eq!(loaded.records, session.records);
        assert_eq!(loaded.failures, session.failures);
    }

    #[test]
    fn test_run_lookup() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        assert!(storage.get_latest_run().unwrap().is_none());
        assert!(matches!(storage.get_run(7), Err(StorageError::RunNotFound(7))));

        let first = storage.persist_session(&finished_session(), "a", 5).unwrap();
        let second = storage.persist_session(&finished_session(), "b", 5).unwrap();
        assert!(second > first);

        let latest = storage.get_latest_run().unwrap().unwrap();
        assert_eq!(latest.id, second);
        assert_eq!(latest.config_hash, "b");
        assert!(latest.finished_at.is_some());
    }

    #[test]
    fn test_incremental_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let mut session = AnalysisSession::new("example.com", "https://example.com/");

        let run_id = storage.create_run(&session, "hash").unwrap();
        assert_eq!(storage.get_run(run_id).unwrap().status, SessionStatus::Running);

        storage
            .insert_page_record(run_id, &blank_record("https://example.com/"))
            .unwrap();
        storage
            .insert_failure(run_id, &failure("https://example.com/x", FailureKind::HttpError))
            .unwrap();

        session.finish(SessionStatus::PageCapReached);
        storage.finish_run(run_id, &session).unwrap();

        let run = storage.get_run(run_id).unwrap();
        assert_eq!(run.status, SessionStatus::PageCapReached);
        assert_eq!(storage.count_pages(run_id).unwrap(), 1);
        assert_eq!(storage.count_failures(run_id).unwrap(), 1);
        assert!(storage.finish_run(run_id + 1, &session).is_err());
    }

    #[test]
    fn test_duplicate_page_rejected() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let session = AnalysisSession::new("example.com", "https://example.com/");
        let run_id = storage.create_run(&session, "hash").unwrap();

        let record = blank_record("https://example.com/");
        storage.insert_page_record(run_id, &record).unwrap();
        let err = storage.insert_page_record(run_id, &record).unwrap_err();
        assert!(matches!(err, StorageError::Duplicate(url) if url == "https://example.com/"));
    }

    #[test]
    fn test_failure_summary_and_sitewide_keywords() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.persist_session(&finished_session(), "hash", 1).unwrap();

        let summary = storage.failure_summary(run_id).unwrap();
        assert_eq!(summary.get(&FailureKind::DeadLink), Some(&2));
        assert_eq!(summary.get(&FailureKind::Timeout), Some(&1));
        assert_eq!(summary.len(), 2);

        // "widget" is on both pages, so it outweighs "blue" despite its idf
        let keywords = storage.get_sitewide_keywords(run_id).unwrap();
        assert_eq!(keywords.len(), 1);
        assert_eq!(keywords[0].term, "widget");
        assert_eq!(keywords[0].count, 5);
        assert_eq!(keywords, finished_session().sitewide_keywords(1));

        storage.save_sitewide_keywords(run_id, &[]).unwrap();
        assert!(storage.get_sitewide_keywords(run_id).unwrap().is_empty());
    }
}
