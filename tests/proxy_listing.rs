// tests/proxy_listing.rs
//
// Listing aggregation over a mock upstream: index slicing, per-item
// degradation, concurrent metadata fan-out, and use as a session's remote.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bio_knowledge_engine::error::{CatalogError, CatalogResult};
use bio_knowledge_engine::proxy::upstream::{Passthrough, UpstreamCatalog};
use bio_knowledge_engine::proxy::ProxyService;
use bio_knowledge_engine::{LoadOutcome, RemoteCatalog, Session, SourceFilter, SourceType};
use common::MockUpstream;
use serde_json::{json, Value};
use tokio::sync::Notify;

#[tokio::test]
async fn listing_slices_index_in_upstream_order() {
    let proxy = ProxyService::new(Arc::new(MockUpstream::with_studies(25, &[])));

    let page = proxy.list_datasets(10, 10).await.unwrap();
    assert_eq!(page.total, 25);
    let ids: Vec<_> = page.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, (10..20).map(|i| format!("OSD-{i}")).collect::<Vec<_>>());
    let first = &page.records[0];
    assert_eq!(first.title, "Study 10 on spaceflight");
    assert_eq!(first.publication_date.as_deref(), Some("2020-09-13"));
    assert_eq!(first.start_date.as_deref(), Some("2020-01-01"));
    assert!(page.records.iter().all(|r| r.source_type == SourceType::Osdr));

    let tail = proxy.list_datasets(20, 10).await.unwrap();
    assert_eq!(tail.records.len(), 5);
    let past_end = proxy.list_datasets(40, 10).await.unwrap();
    assert!(past_end.records.is_empty());
    assert_eq!(past_end.total, 25);
}

#[tokio::test]
async fn failed_item_degrades_without_failing_page() {
    let upstream = Arc::new(MockUpstream::with_studies(5, &[2]));
    let proxy = ProxyService::new(upstream.clone());

    let page = proxy.list_datasets(0, 5).await.unwrap();
    assert_eq!(page.records.len(), 5);
    assert_eq!(upstream.metadata_calls(), 5);

    let degraded = &page.records[2];
    assert_eq!(degraded.title, "OSDR Study: OSD-2 (Metadata Fetch Failed)");
    assert_eq!(
        degraded.document_link.as_deref(),
        Some("https://api.example/dataset/OSD-2/")
    );
    assert_eq!(page.records[3].title, "Study 3 on spaceflight");
}

#[tokio::test]
async fn index_failure_fails_the_page() {
    let mut upstream = MockUpstream::with_studies(3, &[]);
    upstream.index_error = Some(CatalogError::Status {
        status: 503,
        message: "maintenance".into(),
    });
    let proxy = ProxyService::new(Arc::new(upstream));
    let err = proxy.list_datasets(0, 10).await.unwrap_err();
    assert_eq!(err.upstream_status(), Some(503));

    // through the RemoteCatalog seam the same failure is an Err, not an empty page
    assert!(proxy.fetch_page(0, 10).await.is_err());
}

/// Item A's metadata only resolves after item B's request has been issued.
struct CrossGated {
    inner: MockUpstream,
    b_requested: Notify,
}

#[async_trait]
impl UpstreamCatalog for CrossGated {
    async fn dataset_index(&self) -> CatalogResult<Value> {
        self.inner.dataset_index().await
    }

    async fn dataset_metadata(&self, id: &str) -> CatalogResult<Value> {
        match id {
            "OSD-0" => self.b_requested.notified().await,
            "OSD-1" => self.b_requested.notify_one(),
            _ => {}
        }
        self.inner.dataset_metadata(id).await
    }

    async fn search(&self, query: Option<&str>) -> CatalogResult<Value> {
        self.inner.search(query).await
    }

    async fn passthrough(
        &self,
        target: Passthrough,
        path: &str,
        query: Option<&str>,
    ) -> CatalogResult<Value> {
        self.inner.passthrough(target, path, query).await
    }
}

#[tokio::test]
async fn metadata_requests_are_issued_concurrently() {
    let upstream = CrossGated {
        inner: MockUpstream::with_studies(2, &[]),
        b_requested: Notify::new(),
    };
    let proxy = ProxyService::new(Arc::new(upstream));

    let page = tokio::time::timeout(Duration::from_secs(5), proxy.list_datasets(0, 2))
        .await
        .expect("sequential fan-out would never resolve OSD-0")
        .unwrap();
    assert_eq!(page.records.len(), 2);
    assert_eq!(page.records[0].id, "OSD-0");
}

#[tokio::test]
async fn proxy_backs_a_session_with_totals() {
    let proxy = ProxyService::new(Arc::new(MockUpstream::with_studies(15, &[])));
    let session = Session::bootstrap(Vec::new(), Arc::new(proxy), 10, true)
        .await
        .unwrap();
    session.set_source(SourceFilter::Osdr);

    let v = session.view();
    assert_eq!(v.remote_total, Some(15));
    assert_eq!(v.records.len(), 10);
    assert!(!v.remote_exhausted);

    assert_eq!(session.load_more().await, LoadOutcome::RemoteAppended { fetched: 5 });
    let v = session.view();
    assert_eq!(v.records.len(), 15);
    assert!(v.remote_exhausted);
    assert!(!v.has_more);
}

#[tokio::test]
async fn search_passes_query_through_and_maps_hits() {
    let mut upstream = MockUpstream::with_studies(0, &[]);
    upstream.search_body = json!({"hits": {"total": 1, "hits": [
        {"_source": {"Accession": "OSD-48", "Study Title": "Bone loss"}}
    ]}});
    let upstream = Arc::new(upstream);
    let proxy = ProxyService::new(upstream.clone());

    let out = proxy
        .search(Some("term=bone&type=cgene&ffield[]=organism"))
        .await
        .unwrap();
    assert_eq!(out.total, 1);
    assert_eq!(out.results[0].accession.as_deref(), Some("OSD-48"));
    assert_eq!(
        upstream.seen_queries.lock().unwrap().as_slice(),
        &[Some("term=bone&type=cgene&ffield[]=organism".to_string())]
    );
}
