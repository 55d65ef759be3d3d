// src/metrics.rs
use anyhow::Result;
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and describe the crate's series.
    /// Later calls reuse the first handle.
    pub fn init() -> Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| {
                let handle = PrometheusBuilder::new().install_recorder()?;
                describe_series();
                Ok::<_, anyhow::Error>(handle)
            })?
            .clone();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

// Descriptions go to the installed recorder, so this runs after install.
fn describe_series() {
    describe_counter!(
        "catalog_page_fetches_total",
        "Remote listing pages fetched."
    );
    describe_counter!(
        "catalog_metadata_failures_total",
        "Listing items degraded after a metadata fetch/shape failure."
    );
    describe_histogram!("catalog_upstream_ms", "Upstream call latency in milliseconds.");
    describe_counter!(
        "session_load_more_total",
        "Load-more actions by pagination mode."
    );
    describe_counter!(
        "session_load_more_discarded_total",
        "Load-more actions dropped while a remote fetch was in flight."
    );
    describe_gauge!("corpus_records_loaded", "Rows in the bulk journal corpus.");
}
