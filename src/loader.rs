// src/loader.rs
//! # Incremental Loader
//! Window bookkeeping for "load more". Locally buffered sources grow the
//! window in place; the remote source needs a page fetch first, and only one
//! such fetch may be outstanding.
//!
//! The loader never touches the network itself. `begin_load_more` returns a
//! [`LoadStep`] and the caller performs the fetch, then reports back through
//! [`IncrementalLoader::finish_remote`] and [`IncrementalLoader::end_remote`].

use serde::Serialize;

use crate::error::{CatalogError, CatalogResult};
use crate::filter::SourceFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoaderPhase {
    Idle,
    LoadingRemote,
}

/// How "load more" paginates for a given source filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    LocalSlice,
    RemoteFetch,
}

impl Pagination {
    pub fn for_source(source: SourceFilter) -> Self {
        match source {
            SourceFilter::Osdr => Pagination::RemoteFetch,
            SourceFilter::All | SourceFilter::Journal => Pagination::LocalSlice,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Pagination::LocalSlice => "local",
            Pagination::RemoteFetch => "remote",
        }
    }
}

/// What the caller must do after a load-more request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStep {
    /// Window already grew; nothing else to do.
    Grown,
    /// Fetch `limit` remote records starting at `offset`, then call `finish_remote`.
    FetchRemote { offset: usize, limit: usize },
    /// A remote fetch is already in flight.
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementalLoader {
    page_increment: usize,
    window_size: usize,
    remote_fetched_count: usize,
    phase: LoaderPhase,
}

impl IncrementalLoader {
    pub fn new(page_increment: usize) -> CatalogResult<Self> {
        if page_increment == 0 {
            return Err(CatalogError::Config(
                "page increment must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            page_increment,
            window_size: page_increment,
            remote_fetched_count: 0,
            phase: LoaderPhase::Idle,
        })
    }

    pub fn page_increment(&self) -> usize {
        self.page_increment
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn remote_fetched_count(&self) -> usize {
        self.remote_fetched_count
    }

    pub fn phase(&self) -> LoaderPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == LoaderPhase::LoadingRemote
    }

    /// Reset the window. An in-flight fetch is left alone.
    pub fn criteria_changed(&mut self) {
        self.window_size = self.page_increment;
    }

    /// `remote_in_store` is the number of remote records already aggregated;
    /// it becomes the offset of the next page.
    pub fn begin_load_more(&mut self, source: SourceFilter, remote_in_store: usize) -> LoadStep {
        if self.is_loading() {
            return LoadStep::Discarded;
        }
        match Pagination::for_source(source) {
            Pagination::LocalSlice => {
                self.grow();
                LoadStep::Grown
            }
            Pagination::RemoteFetch => {
                self.phase = LoaderPhase::LoadingRemote;
                LoadStep::FetchRemote {
                    offset: remote_in_store,
                    limit: self.page_increment,
                }
            }
        }
    }

    /// Record a completed remote fetch. The window grows only if records arrived.
    pub fn finish_remote(&mut self, fetched: usize) {
        if fetched > 0 {
            self.remote_fetched_count += fetched;
            self.grow();
        }
    }

    /// Count records appended outside of a load-more (startup prefetch).
    pub fn note_prefetched(&mut self, fetched: usize) {
        self.remote_fetched_count += fetched;
    }

    /// Back to `Idle`; called on every exit path of a remote load.
    pub fn end_remote(&mut self) {
        self.phase = LoaderPhase::Idle;
    }

    fn grow(&mut self) {
        self.window_size = self.window_size.saturating_add(self.page_increment);
    }
}
