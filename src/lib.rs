// src/lib.rs
// Public library surface for integration tests, the demo binary and the server.

pub mod api;
pub mod config;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod loader;
pub mod metrics;
pub mod proxy;
pub mod record;
pub mod session;
pub mod store;

mod net;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, router};
pub use crate::error::{CatalogError, CatalogResult};
pub use crate::filter::{FilterCriteria, SourceFilter};
pub use crate::ingest::types::{CatalogPage, RemoteCatalog};
pub use crate::record::{NormalizedRecord, SourceType};
pub use crate::session::{LoadOutcome, ResultsView, Session};

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::AppConfig;
use crate::proxy::upstream::OsdrHttpClient;
use crate::proxy::ProxyService;

/// Compact tracing to stdout. Safe to call more than once; a subscriber that
/// is already installed (e.g. by the host runtime) is left in place.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bio_knowledge_engine=info,warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

/// Build the full application from config: live OSDR upstream plus the
/// configured journal corpus.
pub async fn app(cfg: AppConfig) -> anyhow::Result<Router> {
    cfg.validate()?;
    let upstream = OsdrHttpClient::new(cfg.upstream.clone()).context("building upstream client")?;
    let proxy = ProxyService::new(Arc::new(upstream));
    let corpus = ingest::load_corpus(&cfg.corpus);
    info!(
        corpus_rows = corpus.len(),
        upstream = %cfg.upstream.api_base_url,
        "application assembled"
    );
    Ok(api::router(&cfg, proxy, corpus))
}
