// src/config/mod.rs
//! Application configuration: upstream endpoints, CORS, corpus location and
//! session paging. Every field has a default so an empty file is valid.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CatalogError;

pub const ENV_CONFIG_PATH: &str = "BKE_CONFIG_PATH";
pub const ENV_UPSTREAM_API: &str = "BKE_UPSTREAM_API";
pub const ENV_CORPUS_PATH: &str = "BKE_CORPUS_PATH";
pub const ENV_EXPOSE_METRICS: &str = "BKE_EXPOSE_METRICS";

pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";

/// Page increment used when nothing else is configured.
pub const RESULTS_PER_PAGE: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// OSDR biodata REST API root (`/datasets`, `/dataset/{id}/metadata/`).
    pub api_base_url: String,
    /// OSDR search endpoint.
    pub search_url: String,
    /// OSDR site root used by the `/osdr/data/osd` details proxy.
    pub site_base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u8,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://visualization.osdr.nasa.gov/biodata/api/v2".to_string(),
            search_url: "https://osdr.nasa.gov/osdr/data/search".to_string(),
            site_base_url: "https://osdr.nasa.gov".to_string(),
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Empty list means permissive CORS.
    pub allowed_origins: Vec<String>,
    pub expose_metrics: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["https://space-biology.web.app".to_string()],
            expose_metrics: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub path: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/journals.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub page_increment: usize,
    /// Fetch the first remote page right after the corpus at session start.
    pub prefetch_remote: bool,
    /// Live sessions kept by the server; the oldest is dropped beyond this.
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            page_increment: RESULTS_PER_PAGE,
            prefetch_remote: true,
            max_sessions: 1024,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.session.page_increment == 0 {
            return Err(CatalogError::Config(
                "session.page_increment must be greater than zero".to_string(),
            ));
        }
        if self.upstream.api_base_url.trim().is_empty() {
            return Err(CatalogError::Config(
                "upstream.api_base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply single-value env overrides on top of whatever was loaded.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var(ENV_UPSTREAM_API) {
            if !v.trim().is_empty() {
                self.upstream.api_base_url = v.trim().trim_end_matches('/').to_string();
            }
        }
        if let Ok(v) = std::env::var(ENV_CORPUS_PATH) {
            if !v.trim().is_empty() {
                self.corpus.path = PathBuf::from(v.trim());
            }
        }
        if let Ok(v) = std::env::var(ENV_EXPOSE_METRICS) {
            self.server.expose_metrics = matches!(v.trim(), "1" | "true" | "yes");
        }
    }
}

/// Load configuration from an explicit TOML path.
pub fn load_from(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    parse_config(&content).with_context(|| format!("parsing config {}", path.display()))
}

/// Load configuration using env var + fallbacks:
/// 1) $BKE_CONFIG_PATH (must exist)
/// 2) config/app.toml
/// 3) built-in defaults
///
/// Env overrides are applied last, then the result is validated.
pub fn load_default() -> Result<AppConfig> {
    let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        load_from(&pb)?
    } else {
        let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            load_from(&default_path)?
        } else {
            AppConfig::default()
        }
    };
    cfg.apply_env_overrides();
    cfg.validate()?;
    Ok(cfg)
}

fn parse_config(s: &str) -> Result<AppConfig> {
    let mut cfg: AppConfig = toml::from_str(s)?;
    cfg.upstream.api_base_url = cfg.upstream.api_base_url.trim_end_matches('/').to_string();
    cfg.upstream.site_base_url = cfg.upstream.site_base_url.trim_end_matches('/').to_string();
    cfg.server.allowed_origins = cfg
        .server
        .allowed_origins
        .into_iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect();
    Ok(cfg)
}
