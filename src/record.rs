// src/record.rs
//! # Normalized Record
//! The common shape every journal row and OSDR study is coerced into.
//!
//! `source_type` drives routing and filtering downstream, so parsing it is
//! strict: an unrecognized tag is an error, never a silent default.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CatalogError;

/// Prefix applied to bulk corpus ids so they never collide with OSDR ids.
pub const JOURNAL_ID_PREFIX: &str = "journal-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    Journal,
    #[serde(rename = "OSDR")]
    Osdr,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Journal => "Journal",
            SourceType::Osdr => "OSDR",
        }
    }

    /// Remote-backed sources page through the network; the rest are buffered locally.
    pub fn is_remote(&self) -> bool {
        matches!(self, SourceType::Osdr)
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "journal" => Ok(SourceType::Journal),
            "osdr" => Ok(SourceType::Osdr),
            _ => Err(CatalogError::UnknownSourceType(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub document_link: Option<String>,
    pub source_type: SourceType,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub publication_date: Option<String>,
    #[serde(default, alias = "startdate")]
    pub start_date: Option<String>,
    #[serde(default, alias = "enddate")]
    pub end_date: Option<String>,
}

impl NormalizedRecord {
    /// Journal row as produced by the bulk loader: dates and authors empty.
    pub fn journal(row_index: usize, title: Option<&str>, link: Option<&str>) -> Self {
        let id = format!("{JOURNAL_ID_PREFIX}{row_index}");
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("N/A Title ({id})"));
        let link = link
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or("#")
            .to_string();
        Self {
            id,
            title,
            document_link: Some(link),
            source_type: SourceType::Journal,
            authors: Vec::new(),
            publication_date: None,
            start_date: None,
            end_date: None,
        }
    }

    /// Minimal OSDR record: id, placeholder title, optional link.
    pub fn osdr_placeholder(id: &str, document_link: Option<String>) -> Self {
        Self {
            id: id.to_string(),
            title: osdr_placeholder_title(id),
            document_link,
            source_type: SourceType::Osdr,
            authors: Vec::new(),
            publication_date: None,
            start_date: None,
            end_date: None,
        }
    }

    pub fn is_remote(&self) -> bool {
        self.source_type.is_remote()
    }
}

pub fn osdr_placeholder_title(id: &str) -> String {
    format!("OSDR Study: {id}")
}

/// Author list from a loosely typed value: string elements of an array, or a
/// single non-blank string. Anything else yields no authors.
pub fn authors_from_value(v: Option<&Value>) -> Vec<String> {
    match v {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_type_parses_case_insensitively_and_rejects_unknown() {
        assert_eq!("osdr".parse::<SourceType>().unwrap(), SourceType::Osdr);
        assert_eq!(" Journal ".parse::<SourceType>().unwrap(), SourceType::Journal);
        let err = "preprint".parse::<SourceType>().unwrap_err();
        assert!(matches!(err, CatalogError::UnknownSourceType(_)));
    }

    #[test]
    fn wire_shape_uses_camel_case_and_osdr_tag() {
        let rec = NormalizedRecord::osdr_placeholder("OSD-1", Some("#OSD-1".into()));
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["sourceType"], "OSDR");
        assert_eq!(v["documentLink"], "#OSD-1");
        assert_eq!(v["title"], "OSDR Study: OSD-1");
        assert!(v["authors"].as_array().unwrap().is_empty());
    }

    #[test]
    fn journal_dates_serialize_as_null() {
        let rec = NormalizedRecord::journal(2, Some("Bone density"), None);
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["id"], "journal-2");
        for key in ["publicationDate", "startDate", "endDate"] {
            assert!(v[key].is_null(), "{key} should be null");
        }
    }

    #[test]
    fn lowercase_date_aliases_are_accepted() {
        let raw = r#"{"id":"OSD-9","title":"T","sourceType":"OSDR","startdate":"2020-01-01","enddate":null}"#;
        let rec: NormalizedRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(rec.start_date.as_deref(), Some("2020-01-01"));
        assert_eq!(rec.end_date, None);
    }

    #[test]
    fn unknown_source_tag_fails_deserialization() {
        let raw = r#"{"id":"x","title":"T","sourceType":"Preprint"}"#;
        assert!(serde_json::from_str::<NormalizedRecord>(raw).is_err());
    }

    #[test]
    fn journal_rows_get_prefixed_ids_and_fallbacks() {
        let rec = NormalizedRecord::journal(7, Some("  "), None);
        assert_eq!(rec.id, "journal-7");
        assert_eq!(rec.title, "N/A Title (journal-7)");
        assert_eq!(rec.document_link.as_deref(), Some("#"));
        assert_eq!(rec.source_type, SourceType::Journal);
    }
}
