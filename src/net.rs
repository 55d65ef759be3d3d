// src/net.rs
//! Outbound HTTP helpers shared by the catalog client and the upstream proxy.

use std::time::{Duration, Instant};

use metrics::histogram;
use tracing::warn;

use crate::error::{CatalogError, CatalogResult};

const BACKOFF_STEP_MS: u64 = 500;

pub(crate) fn build_client(timeout: Duration) -> CatalogResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("bio-knowledge-engine/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| CatalogError::Http(e.to_string()))
}

/// Send the request built by `make`, retrying transport errors and retryable
/// statuses with linear backoff. Non-success statuses are returned as
/// `CatalogError::Status` once retries run out.
pub(crate) async fn send_with_retries<F>(
    make: F,
    max_retries: u8,
) -> CatalogResult<reqwest::Response>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt: u8 = 0;
    loop {
        attempt += 1;
        let t0 = Instant::now();
        let res = make().send().await;
        histogram!("catalog_upstream_ms").record(t0.elapsed().as_secs_f64() * 1000.0);

        let err = match res {
            Ok(rsp) if rsp.status().is_success() => return Ok(rsp),
            Ok(rsp) => {
                let status = rsp.status().as_u16();
                let message = rsp.text().await.unwrap_or_default();
                CatalogError::Status {
                    status,
                    message: preview(&message),
                }
            }
            Err(e) => CatalogError::from(e),
        };

        if err.is_retryable() && attempt <= max_retries {
            warn!(target: "catalog", attempt, error = %err, "upstream call failed, retrying");
            tokio::time::sleep(Duration::from_millis(BACKOFF_STEP_MS * attempt as u64)).await;
            continue;
        }
        return Err(err);
    }
}

/// First 200 chars of an upstream body, for logs and error details.
pub(crate) fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}
