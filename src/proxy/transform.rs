// src/proxy/transform.rs
//! Reshape raw OSDR payloads into [`NormalizedRecord`]s and search results.
//! Pure functions; all I/O lives in `proxy::upstream`.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{CatalogError, CatalogResult};
use crate::record::{authors_from_value, osdr_placeholder_title, NormalizedRecord, SourceType};

const TITLE_KEYS: [&str; 2] = ["study publication title", "study title"];
const SEARCH_TITLE_KEYS: [&str; 2] = ["Study Title", "Study Publication Title"];
const STUDY_REPO_URL: &str = "https://osdr.nasa.gov/bio/repo/study";
const NOT_AVAILABLE: &str = "N/A";

/// One row of the upstream dataset index, in index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub id: String,
    pub rest_url: Option<String>,
}

/// The index is an object keyed by dataset id; key order is kept.
pub fn index_entries(index: &Value) -> CatalogResult<Vec<IndexEntry>> {
    let obj = index
        .as_object()
        .ok_or_else(|| CatalogError::Shape("dataset index is not an object".to_string()))?;
    Ok(obj
        .iter()
        .map(|(id, details)| IndexEntry {
            id: id.clone(),
            rest_url: details
                .get("REST_URL")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
        .collect())
}

fn non_empty_str<'a>(v: Option<&'a Value>) -> Option<&'a str> {
    v.and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}

/// Listing record from a `/dataset/{id}/metadata/` body (`{ <id>: { metadata: {...} } }`).
pub fn record_from_metadata(entry: &IndexEntry, body: &Value) -> CatalogResult<NormalizedRecord> {
    let meta = body
        .get(&entry.id)
        .and_then(|d| d.get("metadata"))
        .filter(|m| m.is_object())
        .ok_or_else(|| CatalogError::Shape(format!("no metadata object for {}", entry.id)))?;

    let title = TITLE_KEYS
        .iter()
        .find_map(|k| non_empty_str(meta.get(*k)))
        .map(str::to_string)
        .unwrap_or_else(|| osdr_placeholder_title(&entry.id));

    let document_link = non_empty_str(meta.get("project link"))
        .map(str::to_string)
        .or_else(|| entry.rest_url.clone())
        .unwrap_or_else(|| format!("#{}", entry.id));

    let mission = meta.get("mission");
    let mission_date = |key: &str| non_empty_str(mission.and_then(|m| m.get(key))).map(str::to_string);

    Ok(NormalizedRecord {
        id: entry.id.clone(),
        title,
        document_link: Some(document_link),
        source_type: SourceType::Osdr,
        authors: authors_from_value(meta.get("study publication author list")),
        publication_date: meta.get("study_public_release_date").and_then(unix_to_iso_date),
        start_date: mission_date("start date"),
        end_date: mission_date("end date"),
    })
}

/// Stand-in for an item whose metadata could not be fetched or read.
pub fn degraded_record(entry: &IndexEntry) -> NormalizedRecord {
    NormalizedRecord {
        title: format!("{} (Metadata Fetch Failed)", osdr_placeholder_title(&entry.id)),
        ..NormalizedRecord::osdr_placeholder(&entry.id, entry.rest_url.clone())
    }
}

/// Unix seconds (number or numeric string) to `YYYY-MM-DD`, UTC.
pub fn unix_to_iso_date(v: &Value) -> Option<String> {
    let secs = match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64))?,
        Value::String(s) => s.trim().parse::<f64>().ok()?.trunc() as i64,
        _ => return None,
    };
    if secs == 0 {
        return None;
    }
    DateTime::from_timestamp(secs, 0).map(|dt| dt.format("%Y-%m-%d").to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub accession: Option<String>,
    pub title: String,
    pub organism: String,
    pub factor: String,
    pub assay: String,
    pub source_url: String,
    pub raw_data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub total: u64,
    pub message: String,
}

/// Scalar or list field as display text; lists are joined with ", ".
fn text_field(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(|i| text_field(Some(i))).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    }
}

fn search_result(source: &Value) -> SearchResult {
    let accession = text_field(source.get("Accession"));
    let title = SEARCH_TITLE_KEYS
        .iter()
        .find_map(|k| text_field(source.get(*k)))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let or_na = |key: &str| text_field(source.get(key)).unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let source_url = text_field(source.get("Authoritative Source URL")).unwrap_or_else(|| {
        format!("{STUDY_REPO_URL}/{}", accession.as_deref().unwrap_or_default())
    });
    SearchResult {
        title,
        organism: or_na("organism"),
        factor: or_na("Study Factor Name"),
        assay: or_na("Study Assay Technology Type"),
        source_url,
        raw_data: source.clone(),
        accession,
    }
}

/// Map an OSDR search body (`hits.hits[*]._source`). A body without that
/// structure is logged and yields zero results.
pub fn transform_search(raw: &Value) -> SearchResponse {
    let hits = raw.get("hits");
    let (results, total) = match hits.and_then(|h| h.get("hits")).and_then(Value::as_array) {
        Some(list) => {
            let results: Vec<_> = list
                .iter()
                .map(|hit| search_result(hit.get("_source").unwrap_or(&Value::Null)))
                .collect();
            let total = hits
                .and_then(|h| h.get("total"))
                .and_then(|t| t.as_u64().or_else(|| t.get("value").and_then(Value::as_u64)))
                .unwrap_or(results.len() as u64);
            (results, total)
        }
        None => {
            let keys: Vec<&str> = raw
                .as_object()
                .map(|o| o.keys().map(String::as_str).collect())
                .unwrap_or_default();
            warn!(target: "proxy", ?keys, "search response without hits.hits");
            (Vec::new(), 0)
        }
    };
    SearchResponse {
        message: format!("Found {total} total results."),
        results,
        total,
    }
}
