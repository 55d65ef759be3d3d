// src/proxy/mod.rs
//! Server-side catalog proxy: pages through the upstream dataset index,
//! fans out one metadata request per item and normalizes the results.

pub mod transform;
pub mod upstream;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use metrics::counter;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::CatalogResult;
use crate::ingest::types::{CatalogPage, RemoteCatalog};
use crate::record::NormalizedRecord;
use transform::{degraded_record, index_entries, record_from_metadata, IndexEntry, SearchResponse};
use upstream::{Passthrough, UpstreamCatalog};

/// A normalized listing page plus the size of the upstream index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetListing {
    pub records: Vec<NormalizedRecord>,
    pub total: usize,
}

#[derive(Clone)]
pub struct ProxyService {
    upstream: Arc<dyn UpstreamCatalog>,
}

impl ProxyService {
    pub fn new(upstream: Arc<dyn UpstreamCatalog>) -> Self {
        Self { upstream }
    }

    /// Slice `[offset, offset + limit)` of the index and resolve each item.
    /// Only an index failure fails the page; item failures degrade that item.
    pub async fn list_datasets(&self, offset: usize, limit: usize) -> CatalogResult<DatasetListing> {
        let index = self.upstream.dataset_index().await?;
        let entries = index_entries(&index)?;
        let total = entries.len();

        let page: Vec<IndexEntry> = entries.into_iter().skip(offset).take(limit).collect();
        let records = join_all(page.iter().map(|entry| self.resolve(entry))).await;

        counter!("catalog_page_fetches_total").increment(1);
        debug!(target: "proxy", offset, limit, total, returned = records.len(), "dataset listing");
        Ok(DatasetListing { records, total })
    }

    async fn resolve(&self, entry: &IndexEntry) -> NormalizedRecord {
        let res = self
            .upstream
            .dataset_metadata(&entry.id)
            .await
            .and_then(|body| record_from_metadata(entry, &body));
        match res {
            Ok(rec) => rec,
            Err(e) => {
                warn!(target: "proxy", dataset_id = %entry.id, error = %e, "metadata fetch failed, degrading item");
                counter!("catalog_metadata_failures_total").increment(1);
                degraded_record(entry)
            }
        }
    }

    /// Forward a search query and reshape the hits. Transport and status
    /// errors are returned to the caller.
    pub async fn search(&self, query: Option<&str>) -> CatalogResult<SearchResponse> {
        let raw = self.upstream.search(query).await?;
        Ok(transform::transform_search(&raw))
    }

    /// Raw JSON from a details endpoint, unmodified.
    pub async fn details(
        &self,
        target: Passthrough,
        path: &str,
        query: Option<&str>,
    ) -> CatalogResult<Value> {
        self.upstream.passthrough(target, path, query).await
    }
}

/// In-process sessions page through the proxy directly.
#[async_trait]
impl RemoteCatalog for ProxyService {
    async fn fetch_page(&self, offset: usize, limit: usize) -> CatalogResult<CatalogPage> {
        let listing = self.list_datasets(offset, limit).await?;
        Ok(CatalogPage::new(listing.records, Some(listing.total)))
    }

    fn name(&self) -> &'static str {
        "osdr-proxy"
    }
}
