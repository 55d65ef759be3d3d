// src/ingest/providers/osdr_http.rs
//! Remote catalog client for the proxy's `GET /datasets?offset&limit` listing.

use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{CatalogError, CatalogResult};
use crate::ingest::types::{CatalogPage, RemoteCatalog};
use crate::net::{build_client, preview, send_with_retries};
use crate::record::{authors_from_value, osdr_placeholder_title, NormalizedRecord, SourceType};

pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Lenient wire shape: every field optional, ids may arrive as numbers.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingItem {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    document_link: Option<String>,
    #[serde(default)]
    authors: Option<Value>,
    #[serde(default)]
    publication_date: Option<String>,
    #[serde(default, alias = "startdate")]
    start_date: Option<String>,
    #[serde(default, alias = "enddate")]
    end_date: Option<String>,
}

impl ListingItem {
    fn usable_id(&self) -> Option<String> {
        match &self.id {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    /// `position` is the item's absolute index in the upstream listing.
    fn into_record(self, position: usize) -> NormalizedRecord {
        let id = self.usable_id().unwrap_or_else(|| synthetic_id(position));
        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| osdr_placeholder_title(&id));
        NormalizedRecord {
            title,
            document_link: self.document_link,
            source_type: SourceType::Osdr,
            authors: authors_from_value(self.authors.as_ref()),
            publication_date: non_empty(self.publication_date),
            start_date: non_empty(self.start_date),
            end_date: non_empty(self.end_date),
            id,
        }
    }
}

/// Id for a listing item that arrived without one. Positions are consumed
/// once each, so the id stays unique across pages.
fn synthetic_id(position: usize) -> String {
    format!("osdr-item-{position}")
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

/// Normalize a listing body fetched at `offset`. Every item yields a record,
/// so the caller's next offset tracks what the upstream actually returned.
pub fn parse_listing(body: &str, offset: usize) -> CatalogResult<Vec<NormalizedRecord>> {
    let items: Vec<ListingItem> = serde_json::from_str(body)?;
    let missing = items.iter().filter(|i| i.usable_id().is_none()).count();
    if missing > 0 {
        debug!(target: "catalog", offset, missing, "listing items without id");
    }
    Ok(items
        .into_iter()
        .enumerate()
        .map(|(i, item)| item.into_record(offset + i))
        .collect())
}

pub struct HttpCatalogClient {
    base_url: String,
    client: reqwest::Client,
    max_retries: u8,
}

impl HttpCatalogClient {
    /// `base_url` is the proxy root serving `/datasets`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> CatalogResult<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: build_client(timeout)?,
            max_retries: 2,
        })
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }
}

#[async_trait]
impl RemoteCatalog for HttpCatalogClient {
    async fn fetch_page(&self, offset: usize, limit: usize) -> CatalogResult<CatalogPage> {
        if limit == 0 {
            return Ok(CatalogPage::default());
        }
        let url = format!("{}/datasets", self.base_url);
        let rsp = send_with_retries(
            || {
                self.client
                    .get(&url)
                    .query(&[("offset", offset), ("limit", limit)])
            },
            self.max_retries,
        )
        .await
        .inspect_err(|e| warn!(target: "catalog", offset, limit, error = %e, "listing fetch failed"))?;

        let total = rsp
            .headers()
            .get(TOTAL_COUNT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<usize>().ok());
        let body = rsp.text().await.map_err(CatalogError::from)?;
        let records = parse_listing(&body, offset).inspect_err(|e| {
            warn!(target: "catalog", offset, error = %e, body = %preview(&body), "listing shape mismatch")
        })?;

        counter!("catalog_page_fetches_total").increment(1);
        debug!(target: "catalog", offset, limit, fetched = records.len(), ?total, "listing page");
        Ok(CatalogPage::new(records, total))
    }

    fn name(&self) -> &'static str {
        "osdr-http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_items_are_forced_to_osdr() {
        let body = r#"[
            {"id":"OSD-1","title":"Bone loss","documentLink":"https://x/1","sourceType":"Journal","startdate":"2020-01-01","enddate":""},
            {"id":42,"authors":["A","B"]},
            {"title":"no id"}
        ]"#;
        let out = parse_listing(body, 0).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].source_type, SourceType::Osdr);
        assert_eq!(out[0].start_date.as_deref(), Some("2020-01-01"));
        assert_eq!(out[0].end_date, None);
        assert_eq!(out[1].id, "42");
        assert_eq!(out[1].title, "OSDR Study: 42");
        assert_eq!(out[1].authors, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(out[2].id, "osdr-item-2");
        assert_eq!(out[2].title, "no id");
    }

    #[test]
    fn id_less_items_get_position_based_ids() {
        let body = r#"[{"id":"OSD-20"},{"id":""},{"id":null}]"#;
        let out = parse_listing(body, 20).unwrap();
        let ids: Vec<_> = out.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["OSD-20", "osdr-item-21", "osdr-item-22"]);
    }

    #[test]
    fn odd_author_values_do_not_fail_the_page() {
        let body = r#"[
            {"id":"OSD-1","authors":["A",7,null,"B"]},
            {"id":"OSD-2","authors":{"name":"x"}},
            {"id":"OSD-3","authors":"Solo Author"}
        ]"#;
        let out = parse_listing(body, 0).unwrap();
        assert_eq!(out[0].authors, vec!["A".to_string(), "B".to_string()]);
        assert!(out[1].authors.is_empty());
        assert_eq!(out[2].authors, vec!["Solo Author".to_string()]);
    }

    #[test]
    fn non_array_body_is_a_shape_error() {
        let err = parse_listing(r#"{"error":"boom"}"#, 0).unwrap_err();
        assert!(matches!(err, CatalogError::Shape(_)));
    }
}
