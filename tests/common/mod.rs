// tests/common/mod.rs
//
// In-memory stand-in for the OSDR upstream, shared by proxy and API tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bio_knowledge_engine::error::{CatalogError, CatalogResult};
use bio_knowledge_engine::proxy::upstream::{Passthrough, UpstreamCatalog};
use serde_json::{json, Map, Value};

#[derive(Default)]
pub struct MockUpstream {
    pub index: Value,
    pub metadata: HashMap<String, Value>,
    pub index_error: Option<CatalogError>,
    pub search_body: Value,
    pub search_status: Option<u16>,
    pub seen_queries: Mutex<Vec<Option<String>>>,
    pub seen_paths: Mutex<Vec<(Passthrough, String)>>,
    pub metadata_calls: AtomicUsize,
}

impl MockUpstream {
    /// Index of `OSD-0..OSD-n` with metadata for each id except those in `missing`.
    pub fn with_studies(n: usize, missing: &[usize]) -> Self {
        let mut index = Map::new();
        let mut metadata = HashMap::new();
        for i in 0..n {
            let id = format!("OSD-{i}");
            index.insert(
                id.clone(),
                json!({ "REST_URL": format!("https://api.example/dataset/{id}/") }),
            );
            if !missing.contains(&i) {
                metadata.insert(
                    id.clone(),
                    json!({ id.clone(): { "metadata": {
                        "study title": format!("Study {i} on spaceflight"),
                        "study_public_release_date": 1_600_000_000,
                        "mission": { "start date": "2020-01-01" }
                    }}}),
                );
            }
        }
        Self {
            index: Value::Object(index),
            metadata,
            ..Default::default()
        }
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamCatalog for MockUpstream {
    async fn dataset_index(&self) -> CatalogResult<Value> {
        match &self.index_error {
            Some(CatalogError::Status { status, message }) => Err(CatalogError::Status {
                status: *status,
                message: message.clone(),
            }),
            Some(other) => Err(CatalogError::Http(other.to_string())),
            None => Ok(self.index.clone()),
        }
    }

    async fn dataset_metadata(&self, id: &str) -> CatalogResult<Value> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.metadata.get(id).cloned().ok_or(CatalogError::Status {
            status: 404,
            message: format!("{id} not found"),
        })
    }

    async fn search(&self, query: Option<&str>) -> CatalogResult<Value> {
        self.seen_queries
            .lock()
            .unwrap()
            .push(query.map(str::to_string));
        match self.search_status {
            Some(status) => Err(CatalogError::Status {
                status,
                message: "search backend down".into(),
            }),
            None => Ok(self.search_body.clone()),
        }
    }

    async fn passthrough(
        &self,
        target: Passthrough,
        path: &str,
        query: Option<&str>,
    ) -> CatalogResult<Value> {
        self.seen_paths
            .lock()
            .unwrap()
            .push((target, path.to_string()));
        Ok(json!({ "path": path, "query": query }))
    }
}
