use crate::session::{AnalysisSession, DiscoverySource, PageFailure, PageRecord, SessionStatus};
use crate::url::page_key;
use crate::SeoError;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use url::Url;

struct StoreInner {
    session: AnalysisSession,
    /// URLs that already have a record or a failure
    seen: HashSet<String>,
    /// Page keys some worker has taken on, directly or through a redirect
    claimed: HashSet<String>,
}

/// Shared, lock-guarded handle to the session being built
///
/// Cloned into every worker task. Each URL can be recorded once, as either
/// a page or a failure, and each page can be claimed by one worker.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl SessionStore {
    pub fn new(session: AnalysisSession) -> Self {
        let seen = session
            .records
            .iter()
            .map(|r| r.url.clone())
            .chain(session.failures.iter().map(|f| f.url.clone()))
            .collect();

        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                session,
                seen,
                claimed: HashSet::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims a page for the calling worker; `false` when it was claimed before
    ///
    /// Keyed by [`page_key`], so scheme and `www.` variants of one page are
    /// one claim. Workers claim their target before fetching it and every
    /// redirect hop before following it.
    pub fn claim(&self, url: &Url) -> bool {
        self.lock().claimed.insert(page_key(url))
    }

    /// Adds an analysed page; rejects a URL that is already recorded
    pub fn record_page(&self, record: PageRecord) -> Result<(), SeoError> {
        let mut inner = self.lock();
        if !inner.seen.insert(record.url.clone()) {
            return Err(SeoError::Session(format!(
                "{} was already recorded",
                record.url
            )));
        }
        inner.session.records.push(record);
        Ok(())
    }

    /// Adds a failed page; rejects a URL that is already recorded
    pub fn record_failure(&self, failure: PageFailure) -> Result<(), SeoError> {
        let mut inner = self.lock();
        if !inner.seen.insert(failure.url.clone()) {
            return Err(SeoError::Session(format!(
                "{} was already recorded",
                failure.url
            )));
        }
        inner.session.failures.push(failure);
        Ok(())
    }

    pub fn set_discovery(&self, source: DiscoverySource) {
        self.lock().session.discovery = Some(source);
    }

    pub fn page_count(&self) -> usize {
        self.lock().session.records.len()
    }

    pub fn failure_count(&self) -> usize {
        self.lock().session.failures.len()
    }

    /// Closes the session with a terminal status and returns it
    ///
    /// If worker handles are still alive the session is cloned out.
    pub fn finish(self, status: SessionStatus) -> AnalysisSession {
        let mut session = match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(PoisonError::into_inner).session,
            Err(shared) => {
                let inner = shared.lock().unwrap_or_else(PoisonError::into_inner);
                inner.session.clone()
            }
        };
        session.finish(status);
        session
    }
}
