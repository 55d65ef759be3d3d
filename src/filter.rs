// src/filter.rs
//! Pure filter/search engine: source filter first, then a case-insensitive
//! title substring match. Order of the input is preserved.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::record::{NormalizedRecord, SourceType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFilter {
    All,
    #[default]
    Journal,
    Osdr,
}

impl SourceFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFilter::All => "all",
            SourceFilter::Journal => "journal",
            SourceFilter::Osdr => "osdr",
        }
    }

    pub fn admits(&self, source: SourceType) -> bool {
        match self {
            SourceFilter::All => true,
            SourceFilter::Journal => source == SourceType::Journal,
            SourceFilter::Osdr => source == SourceType::Osdr,
        }
    }
}

impl fmt::Display for SourceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceFilter {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(SourceFilter::All),
            "journal" => Ok(SourceFilter::Journal),
            "osdr" => Ok(SourceFilter::Osdr),
            _ => Err(CatalogError::UnknownSourceFilter(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(default)]
    pub source: SourceFilter,
    #[serde(default)]
    pub search_term: String,
}

impl FilterCriteria {
    pub fn new(source: SourceFilter, search_term: impl Into<String>) -> Self {
        Self {
            source,
            search_term: search_term.into(),
        }
    }

    /// Only the empty term means "no term"; whitespace is matched as typed.
    fn needle(&self) -> Option<String> {
        (!self.search_term.is_empty()).then(|| self.search_term.to_lowercase())
    }

    pub fn matches(&self, record: &NormalizedRecord) -> bool {
        if !self.source.admits(record.source_type) {
            return false;
        }
        match self.needle() {
            Some(n) => record.title.to_lowercase().contains(&n),
            None => true,
        }
    }
}

/// Filtered view of `records`; neither input is modified.
pub fn apply(records: &[NormalizedRecord], criteria: &FilterCriteria) -> Vec<NormalizedRecord> {
    let needle = criteria.needle();
    records
        .iter()
        .filter(|r| criteria.source.admits(r.source_type))
        .filter(|r| match &needle {
            Some(n) => r.title.to_lowercase().contains(n),
            None => true,
        })
        .cloned()
        .collect()
}
