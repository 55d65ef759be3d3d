// src/proxy/upstream.rs
//! Raw access to the OSDR endpoints. Bodies come back as untyped JSON; the
//! reshaping happens in `proxy::transform`.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::config::UpstreamConfig;
use crate::error::{CatalogError, CatalogResult};
use crate::net::{build_client, send_with_retries};

/// Which upstream root a details passthrough targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Passthrough {
    /// `<api>/dataset/<path>`
    Dataset,
    /// `<site>/osdr/data/osd/<path>`
    StudyFiles,
}

#[async_trait]
pub trait UpstreamCatalog: Send + Sync {
    /// `GET <api>/datasets`: object keyed by dataset id.
    async fn dataset_index(&self) -> CatalogResult<Value>;
    /// `GET <api>/dataset/<id>/metadata/`
    async fn dataset_metadata(&self, id: &str) -> CatalogResult<Value>;
    /// `GET <search>?<query>` with the caller's query string forwarded as-is.
    async fn search(&self, query: Option<&str>) -> CatalogResult<Value>;
    async fn passthrough(
        &self,
        target: Passthrough,
        path: &str,
        query: Option<&str>,
    ) -> CatalogResult<Value>;
}

pub struct OsdrHttpClient {
    cfg: UpstreamConfig,
    client: reqwest::Client,
}

impl OsdrHttpClient {
    pub fn new(cfg: UpstreamConfig) -> CatalogResult<Self> {
        let client = build_client(Duration::from_secs(cfg.timeout_secs.max(1)))?;
        Ok(Self { cfg, client })
    }

    async fn get_json(&self, url: String) -> CatalogResult<Value> {
        debug!(target: "proxy", %url, "upstream GET");
        let rsp = send_with_retries(|| self.client.get(&url), self.cfg.max_retries).await?;
        rsp.json::<Value>().await.map_err(CatalogError::from)
    }
}

fn with_query(url: String, query: Option<&str>) -> String {
    match query.map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => format!("{url}?{q}"),
        None => url,
    }
}

#[async_trait]
impl UpstreamCatalog for OsdrHttpClient {
    async fn dataset_index(&self) -> CatalogResult<Value> {
        self.get_json(format!("{}/datasets", self.cfg.api_base_url))
            .await
    }

    async fn dataset_metadata(&self, id: &str) -> CatalogResult<Value> {
        self.get_json(format!("{}/dataset/{id}/metadata/", self.cfg.api_base_url))
            .await
    }

    async fn search(&self, query: Option<&str>) -> CatalogResult<Value> {
        self.get_json(with_query(self.cfg.search_url.clone(), query))
            .await
    }

    async fn passthrough(
        &self,
        target: Passthrough,
        path: &str,
        query: Option<&str>,
    ) -> CatalogResult<Value> {
        let path = path.trim_start_matches('/');
        let url = match target {
            Passthrough::Dataset => format!("{}/dataset/{path}", self.cfg.api_base_url),
            Passthrough::StudyFiles => format!("{}/osdr/data/osd/{path}", self.cfg.site_base_url),
        };
        self.get_json(with_query(url, query)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_is_appended_verbatim() {
        assert_eq!(
            with_query("https://s.example/search".into(), Some("term=bone&ffield[]=a")),
            "https://s.example/search?term=bone&ffield[]=a"
        );
        assert_eq!(with_query("https://s.example".into(), Some("  ")), "https://s.example");
        assert_eq!(with_query("https://s.example".into(), None), "https://s.example");
    }
}
