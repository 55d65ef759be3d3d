// src/ingest/providers/journal_csv.rs
//! Bulk journal corpus: a CSV with at least `Title` and `Link` headers, parsed
//! once. Any read or header failure degrades to an empty corpus.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use metrics::gauge;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{CatalogError, CatalogResult};
use crate::record::NormalizedRecord;

#[derive(Debug, Deserialize)]
struct JournalRow {
    #[serde(rename = "Title", default)]
    title: Option<String>,
    #[serde(rename = "Link", default)]
    link: Option<String>,
}

pub struct BulkCorpusLoader;

impl BulkCorpusLoader {
    /// Load the corpus at `path`; an unreadable file yields an empty corpus.
    pub fn load_path(path: &Path) -> Vec<NormalizedRecord> {
        match File::open(path) {
            Ok(file) => Self::from_reader(file),
            Err(e) => {
                warn!(target: "corpus", error = ?e, path = %path.display(), "journal corpus unavailable");
                Self::publish(0);
                Vec::new()
            }
        }
    }

    /// Parse from any reader; a parse failure is logged and yields an empty corpus.
    pub fn from_reader<R: Read>(reader: R) -> Vec<NormalizedRecord> {
        match Self::try_parse(reader) {
            Ok(records) => {
                info!(target: "corpus", rows = records.len(), "journal corpus loaded");
                Self::publish(records.len());
                records
            }
            Err(e) => {
                warn!(target: "corpus", error = %e, "journal corpus parse failed");
                Self::publish(0);
                Vec::new()
            }
        }
    }

    /// Strict parse: the first malformed row fails the whole corpus.
    pub fn try_parse<R: Read>(reader: R) -> CatalogResult<Vec<NormalizedRecord>> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| CatalogError::Corpus(e.to_string()))?
            .clone();
        if !headers.iter().any(|h| h == "Title") || !headers.iter().any(|h| h == "Link") {
            return Err(CatalogError::Corpus(
                "missing Title/Link columns".to_string(),
            ));
        }

        let mut out = Vec::new();
        for (row_index, row) in rdr.deserialize::<JournalRow>().enumerate() {
            let row = row.map_err(|e| CatalogError::Corpus(e.to_string()))?;
            out.push(NormalizedRecord::journal(
                row_index,
                row.title.as_deref(),
                row.link.as_deref(),
            ));
        }
        Ok(out)
    }

    fn publish(rows: usize) {
        gauge!("corpus_records_loaded").set(rows as f64);
    }
}
