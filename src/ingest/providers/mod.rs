// src/ingest/providers/mod.rs
pub mod journal_csv;
pub mod osdr_http;

pub use journal_csv::BulkCorpusLoader;
pub use osdr_http::HttpCatalogClient;
