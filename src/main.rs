//! Bio Knowledge Engine: binary entrypoint.
//! Boots the Axum HTTP server: catalog proxy routes plus browsing sessions.

use bio_knowledge_engine::config;
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    bio_knowledge_engine::init_tracing();

    let cfg = config::load_default()?;
    let router = bio_knowledge_engine::app(cfg).await?;

    Ok(router.into())
}
