// src/ingest/types.rs
use crate::error::CatalogResult;
use crate::record::NormalizedRecord;

/// One page of remote records plus the upstream total when it was reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogPage {
    pub records: Vec<NormalizedRecord>, // sourceType always OSDR
    pub total: Option<usize>,           // X-Total-Count, if sent
}

impl CatalogPage {
    pub fn new(records: Vec<NormalizedRecord>, total: Option<usize>) -> Self {
        Self { records, total }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Stateless page fetch against the remote catalog. Offset bookkeeping
/// belongs to the caller.
#[async_trait::async_trait]
pub trait RemoteCatalog: Send + Sync {
    async fn fetch_page(&self, offset: usize, limit: usize) -> CatalogResult<CatalogPage>;
    fn name(&self) -> &'static str;
}
