// src/ingest/mod.rs
//! Record sources feeding a session: the bulk journal corpus and the remote
//! OSDR catalog.

pub mod providers;
pub mod types;

pub use providers::{BulkCorpusLoader, HttpCatalogClient};
pub use types::{CatalogPage, RemoteCatalog};

use crate::config::CorpusConfig;
use crate::record::NormalizedRecord;

/// Load the configured corpus; never fails, an unreadable corpus is empty.
pub fn load_corpus(cfg: &CorpusConfig) -> Vec<NormalizedRecord> {
    BulkCorpusLoader::load_path(&cfg.path)
}
