// src/api.rs
//! HTTP surface: the catalog proxy routes plus server-hosted browsing sessions.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, RawQuery, State},
    http::{header::HeaderName, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, info, warn};

use crate::config::{AppConfig, ServerConfig, SessionConfig};
use crate::error::CatalogError;
use crate::filter::{FilterCriteria, SourceFilter};
use crate::ingest::types::RemoteCatalog;
use crate::metrics::Metrics;
use crate::proxy::upstream::Passthrough;
use crate::proxy::ProxyService;
use crate::record::NormalizedRecord;
use crate::session::{LoadOutcome, ResultsView, Session, SessionRegistry};

pub use crate::ingest::providers::osdr_http::TOTAL_COUNT_HEADER;

const DEFAULT_LIST_LIMIT: usize = 10;
/// Upper bound on per-request metadata fan-out.
const MAX_LIST_LIMIT: usize = 100;

#[derive(Clone)]
pub struct AppState {
    proxy: ProxyService,
    corpus: Arc<Vec<NormalizedRecord>>,
    sessions: Arc<SessionRegistry>,
    session_cfg: SessionConfig,
}

impl AppState {
    pub fn new(proxy: ProxyService, corpus: Vec<NormalizedRecord>, session_cfg: SessionConfig) -> Self {
        Self {
            proxy,
            corpus: Arc::new(corpus),
            sessions: Arc::new(SessionRegistry::with_capacity(session_cfg.max_sessions)),
            session_cfg,
        }
    }
}

pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let mut router = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/datasets", get(list_datasets))
        .route("/datasets/search", get(search_datasets))
        .route("/dataset/{*path}", get(dataset_details))
        .route("/osdr/data/osd/{*path}", get(study_details))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/criteria", put(update_criteria))
        .route("/sessions/{id}/more", post(load_more));

    if server.expose_metrics {
        match Metrics::init() {
            Ok(m) => router = router.merge(m.router::<AppState>()),
            Err(e) => warn!(error = ?e, "metrics recorder unavailable, /metrics not mounted"),
        }
    }

    router.layer(cors_layer(&server.allowed_origins)).with_state(state)
}

/// Build the router from config with a caller-supplied upstream and corpus.
pub fn router(cfg: &AppConfig, proxy: ProxyService, corpus: Vec<NormalizedRecord>) -> Router {
    let state = AppState::new(proxy, corpus, cfg.session.clone());
    create_router(state, &cfg.server)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::very_permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(TOTAL_COUNT_HEADER)])
}

// ---------- errors ----------

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: &'static str,
    details: String,
}

impl ApiError {
    fn upstream(summary: &'static str, e: CatalogError) -> Self {
        let status = match &e {
            CatalogError::Http(_) => StatusCode::BAD_GATEWAY,
            CatalogError::UnknownSourceFilter(_) | CatalogError::UnknownSourceType(_) => {
                StatusCode::BAD_REQUEST
            }
            other => other
                .upstream_status()
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        };
        Self {
            status,
            error: summary,
            details: e.to_string(),
        }
    }

    fn not_found(id: u64) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: "Session not found",
            details: format!("no session with id {id}"),
        }
    }

    fn bad_request(details: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "Invalid request",
            details,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, details = %self.details, "{}", self.error);
        }
        (
            self.status,
            Json(json!({ "error": self.error, "details": self.details })),
        )
            .into_response()
    }
}

// ---------- proxy routes ----------

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    offset: Option<String>,
    #[serde(default)]
    limit: Option<String>,
}

impl ListQuery {
    fn offset(&self) -> usize {
        self.offset
            .as_deref()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Missing, unparsable or zero falls back to the default page size.
    fn limit(&self) -> usize {
        self.limit
            .as_deref()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .min(MAX_LIST_LIMIT)
    }
}

async fn list_datasets(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<(HeaderMap, Json<Vec<NormalizedRecord>>), ApiError> {
    let listing = state
        .proxy
        .list_datasets(q.offset(), q.limit())
        .await
        .map_err(|e| {
            ApiError::upstream("Failed to aggregate datasets and metadata from external API.", e)
        })?;
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(TOTAL_COUNT_HEADER),
        HeaderValue::from(listing.total),
    );
    Ok((headers, Json(listing.records)))
}

async fn search_datasets(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    let out = state
        .proxy
        .search(query.as_deref())
        .await
        .map_err(|e| ApiError::upstream("Failed to execute search on OSDR Search API.", e))?;
    Ok(Json(out))
}

async fn dataset_details(
    State(state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    passthrough(&state, Passthrough::Dataset, &path, query.as_deref()).await
}

async fn study_details(
    State(state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    passthrough(&state, Passthrough::StudyFiles, &path, query.as_deref()).await
}

async fn passthrough(
    state: &AppState,
    target: Passthrough,
    path: &str,
    query: Option<&str>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .proxy
        .details(target, path, query)
        .await
        .map(Json)
        .map_err(|e| ApiError::upstream("Proxy request failed", e))
}

// ---------- sessions ----------

/// Field-wise criteria update; absent fields keep their current value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CriteriaPatch {
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    search_term: Option<String>,
}

impl CriteriaPatch {
    fn parse(body: &Bytes) -> Result<Self, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| ApiError::bad_request(e.to_string()))
    }

    fn apply_to(self, mut current: FilterCriteria) -> Result<FilterCriteria, ApiError> {
        if let Some(src) = self.source {
            current.source = src
                .parse::<SourceFilter>()
                .map_err(|e| ApiError::upstream("Invalid criteria", e))?;
        }
        if let Some(term) = self.search_term {
            current.search_term = term;
        }
        Ok(current)
    }
}

#[derive(Serialize)]
struct SessionOut {
    id: u64,
    view: ResultsView,
}

#[derive(Serialize)]
struct MoreOut {
    #[serde(flatten)]
    outcome: LoadOutcome,
    view: ResultsView,
}

async fn create_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<SessionOut>), ApiError> {
    let criteria = CriteriaPatch::parse(&body)?.apply_to(FilterCriteria::default())?;
    let remote: Arc<dyn RemoteCatalog> = Arc::new(state.proxy.clone());
    let session = Session::bootstrap(
        state.corpus.as_ref().clone(),
        remote,
        state.session_cfg.page_increment,
        state.session_cfg.prefetch_remote,
    )
    .await
    .map_err(|e| ApiError::upstream("Failed to start session", e))?;
    if criteria != FilterCriteria::default() {
        session.set_criteria(criteria);
    }

    let (id, session) = state.sessions.insert(session);
    info!(target: "session", id, live = state.sessions.len(), "session created");
    Ok((
        StatusCode::CREATED,
        Json(SessionOut {
            id,
            view: session.view(),
        }),
    ))
}

fn find(state: &AppState, id: u64) -> Result<Arc<Session>, ApiError> {
    state.sessions.get(id).ok_or_else(|| ApiError::not_found(id))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ResultsView>, ApiError> {
    Ok(Json(find(&state, id)?.view()))
}

async fn update_criteria(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    body: Bytes,
) -> Result<Json<ResultsView>, ApiError> {
    let session = find(&state, id)?;
    let criteria = CriteriaPatch::parse(&body)?.apply_to(session.criteria())?;
    session.set_criteria(criteria);
    Ok(Json(session.view()))
}

async fn load_more(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<MoreOut>, ApiError> {
    let session = find(&state, id)?;
    let outcome = session.load_more().await;
    Ok(Json(MoreOut {
        outcome,
        view: session.view(),
    }))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(id) {
        info!(target: "session", id, "session closed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(id))
    }
}
