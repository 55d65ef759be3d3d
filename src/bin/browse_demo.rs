//! Demo that browses the aggregated catalog through a running proxy: loads the
//! journal corpus, pages journals locally, then pages OSDR studies remotely.
//!
//! Proxy root comes from `BKE_PROXY_URL` (default `http://localhost:8000`).

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use bio_knowledge_engine::config;
use bio_knowledge_engine::ingest::{self, HttpCatalogClient};
use bio_knowledge_engine::{ResultsView, Session, SourceFilter};

fn print_view(label: &str, view: &ResultsView) -> Result<()> {
    println!(
        "== {label}: {}/{} visible (window {}, more: {}, remote fetched: {})",
        view.records.len(),
        view.total_filtered,
        view.window_size,
        view.has_more,
        view.remote_fetched
    );
    for r in view.records.iter().take(3) {
        println!("   {}", serde_json::to_string(r)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = config::load_default()?;
    let proxy_url =
        std::env::var("BKE_PROXY_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());
    let remote = HttpCatalogClient::new(proxy_url, Duration::from_secs(cfg.upstream.timeout_secs))?
        .with_retries(cfg.upstream.max_retries);

    let corpus = ingest::load_corpus(&cfg.corpus);
    let session = Session::bootstrap(
        corpus,
        Arc::new(remote),
        cfg.session.page_increment,
        cfg.session.prefetch_remote,
    )
    .await?;
    print_view("journals", &session.view())?;

    session.load_more().await;
    print_view("journals +1 page", &session.view())?;

    session.set_source(SourceFilter::Osdr);
    print_view("osdr", &session.view())?;
    for _ in 0..2 {
        let outcome = session.load_more().await;
        print_view(&format!("osdr after {outcome:?}"), &session.view())?;
    }

    session.set_search_term("mouse");
    session.set_source(SourceFilter::All);
    print_view("all matching 'mouse'", &session.view())?;

    println!("browse-demo done");
    Ok(())
}
