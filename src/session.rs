// src/session.rs
//! # Session
//! One browsing session: owns the aggregation store, the active criteria and
//! the incremental loader. Created at session start, dropped at teardown.
//!
//! State lives behind a `std::sync::Mutex` that is never held across an
//! `.await`; the remote fetch runs unlocked and a drop guard returns the
//! loader to `Idle` on every exit path, including cancellation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use metrics::counter;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::CatalogResult;
use crate::filter::{self, FilterCriteria, SourceFilter};
use crate::ingest::types::{CatalogPage, RemoteCatalog};
use crate::loader::{IncrementalLoader, LoadStep, Pagination};
use crate::record::NormalizedRecord;
use crate::store::AggregationStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadOutcome {
    LocalWindowGrown,
    RemoteAppended { fetched: usize },
    RemoteExhausted,
    RemoteFailed,
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsView {
    pub criteria: FilterCriteria,
    pub records: Vec<NormalizedRecord>,
    pub total_filtered: usize,
    pub window_size: usize,
    pub has_more: bool,
    pub remote_fetched: usize,
    pub remote_total: Option<usize>,
    pub remote_exhausted: bool,
    pub loading: bool,
}

#[derive(Debug)]
struct SessionState {
    store: AggregationStore,
    criteria: FilterCriteria,
    loader: IncrementalLoader,
    remote_total: Option<usize>,
    remote_exhausted: bool,
}

impl SessionState {
    fn apply_page(&mut self, page: CatalogPage) -> usize {
        let fetched = page.records.len();
        if page.total.is_some() {
            self.remote_total = page.total;
        }
        self.store.append_all(page.records);
        self.remote_exhausted = fetched == 0
            || self
                .remote_total
                .is_some_and(|t| self.store.remote_count() >= t);
        fetched
    }
}

pub struct Session {
    state: Mutex<SessionState>,
    remote: Arc<dyn RemoteCatalog>,
}

/// Puts the loader back to `Idle` when the remote load scope ends.
struct LoadingGuard<'a> {
    state: &'a Mutex<SessionState>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        lock(self.state).loader.end_remote();
    }
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    match state.lock() {
        Ok(g) => g,
        Err(poison) => poison.into_inner(),
    }
}

impl Session {
    /// Session over an already-loaded corpus with default criteria.
    pub fn new(
        corpus: Vec<NormalizedRecord>,
        remote: Arc<dyn RemoteCatalog>,
        page_increment: usize,
    ) -> CatalogResult<Self> {
        let loader = IncrementalLoader::new(page_increment)?;
        Ok(Self {
            state: Mutex::new(SessionState {
                store: AggregationStore::new(corpus),
                criteria: FilterCriteria::default(),
                loader,
                remote_total: None,
                remote_exhausted: false,
            }),
            remote,
        })
    }

    /// Like `new`, then optionally merge the first remote page after the corpus.
    /// A failed prefetch leaves the session usable with the corpus alone.
    pub async fn bootstrap(
        corpus: Vec<NormalizedRecord>,
        remote: Arc<dyn RemoteCatalog>,
        page_increment: usize,
        prefetch_remote: bool,
    ) -> CatalogResult<Self> {
        let session = Self::new(corpus, remote, page_increment)?;
        if prefetch_remote {
            match session.remote.fetch_page(0, page_increment).await {
                Ok(page) => {
                    let mut st = lock(&session.state);
                    let fetched = st.apply_page(page);
                    st.loader.note_prefetched(fetched);
                    info!(target: "session", fetched, "initial remote page merged");
                }
                Err(e) => {
                    warn!(target: "session", error = %e, source = session.remote.name(), "initial remote fetch failed");
                }
            }
        }
        Ok(session)
    }

    pub fn criteria(&self) -> FilterCriteria {
        lock(&self.state).criteria.clone()
    }

    pub fn set_criteria(&self, criteria: FilterCriteria) {
        let mut st = lock(&self.state);
        st.criteria = criteria;
        st.loader.criteria_changed();
    }

    pub fn set_source(&self, source: SourceFilter) {
        let mut st = lock(&self.state);
        st.criteria.source = source;
        st.loader.criteria_changed();
    }

    pub fn set_search_term(&self, term: impl Into<String>) {
        let mut st = lock(&self.state);
        st.criteria.search_term = term.into();
        st.loader.criteria_changed();
    }

    /// One "load more" action. Never fails: remote errors are logged and
    /// reported as [`LoadOutcome::RemoteFailed`].
    pub async fn load_more(&self) -> LoadOutcome {
        let (step, source) = {
            let mut st = lock(&self.state);
            let source = st.criteria.source;
            let remote_in_store = st.store.remote_count();
            (st.loader.begin_load_more(source, remote_in_store), source)
        };

        let (offset, limit) = match step {
            LoadStep::Discarded => {
                counter!("session_load_more_discarded_total").increment(1);
                debug!(target: "session", "load more discarded, remote fetch in flight");
                return LoadOutcome::Discarded;
            }
            LoadStep::Grown => {
                counter!("session_load_more_total", "mode" => Pagination::LocalSlice.label())
                    .increment(1);
                return LoadOutcome::LocalWindowGrown;
            }
            LoadStep::FetchRemote { offset, limit } => (offset, limit),
        };

        counter!("session_load_more_total", "mode" => Pagination::for_source(source).label())
            .increment(1);
        let _loading = LoadingGuard { state: &self.state };
        let result = self.remote.fetch_page(offset, limit).await;

        let mut st = lock(&self.state);
        let outcome = match result {
            Ok(page) => {
                let fetched = st.apply_page(page);
                st.loader.finish_remote(fetched);
                if fetched == 0 {
                    info!(target: "session", offset, "remote catalog exhausted");
                    LoadOutcome::RemoteExhausted
                } else {
                    debug!(target: "session", offset, fetched, window = st.loader.window_size(), "remote page appended");
                    LoadOutcome::RemoteAppended { fetched }
                }
            }
            Err(e) => {
                st.loader.finish_remote(0);
                warn!(target: "session", offset, limit, error = %e, "remote page fetch failed");
                LoadOutcome::RemoteFailed
            }
        };
        // release before the guard re-locks to flip the phase
        drop(st);
        outcome
    }

    pub fn view(&self) -> ResultsView {
        let st = lock(&self.state);
        let filtered = filter::apply(st.store.all(), &st.criteria);
        let total_filtered = filtered.len();
        let window_size = st.loader.window_size();
        let records: Vec<_> = filtered.into_iter().take(window_size).collect();
        ResultsView {
            criteria: st.criteria.clone(),
            has_more: records.len() < total_filtered,
            records,
            total_filtered,
            window_size,
            remote_fetched: st.loader.remote_fetched_count(),
            remote_total: st.remote_total,
            remote_exhausted: st.remote_exhausted,
            loading: st.loader.is_loading(),
        }
    }

    /// Snapshot of every aggregated record, in store order.
    pub fn all_records(&self) -> Vec<NormalizedRecord> {
        lock(&self.state).store.all().to_vec()
    }
}

/// Live sessions keyed by a monotonically increasing id. Beyond `cap`
/// entries the oldest session is torn down.
#[derive(Debug)]
pub struct SessionRegistry {
    inner: Mutex<BTreeMap<u64, Arc<Session>>>,
    next_id: AtomicU64,
    cap: usize,
}

impl SessionRegistry {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            inner: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            cap: cap.max(1),
        }
    }

    pub fn insert(&self, session: Session) -> (u64, Arc<Session>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let session = Arc::new(session);
        let mut map = lock_map(&self.inner);
        map.insert(id, session.clone());
        while map.len() > self.cap {
            if let Some((evicted, _)) = map.pop_first() {
                info!(target: "session", id = evicted, "session evicted");
            }
        }
        (id, session)
    }

    pub fn get(&self, id: u64) -> Option<Arc<Session>> {
        lock_map(&self.inner).get(&id).cloned()
    }

    pub fn remove(&self, id: u64) -> bool {
        lock_map(&self.inner).remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        lock_map(&self.inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock_map(m: &Mutex<BTreeMap<u64, Arc<Session>>>) -> MutexGuard<'_, BTreeMap<u64, Arc<Session>>> {
    match m.lock() {
        Ok(g) => g,
        Err(poison) => poison.into_inner(),
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("remote", &self.remote.name())
            .finish_non_exhaustive()
    }
}
