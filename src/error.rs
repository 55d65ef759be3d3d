// src/error.rs
//! Error taxonomy for catalog, corpus and session plumbing.
//!
//! Source-unavailable (`Http`, `Status`) and shape-mismatch (`Shape`) errors are
//! recovered at the aggregation boundary; they only reach HTTP callers on the
//! search route and the raw details proxies.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("upstream request failed: {0}")]
    Http(String),

    #[error("upstream returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected upstream shape: {0}")]
    Shape(String),

    #[error("corpus could not be read: {0}")]
    Corpus(String),

    #[error("unknown source type: {0}")]
    UnknownSourceType(String),

    #[error("unknown source filter: {0}")]
    UnknownSourceFilter(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CatalogError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Http(_) => "UPSTREAM_UNAVAILABLE",
            Self::Status { .. } => "UPSTREAM_STATUS",
            Self::Shape(_) => "UPSTREAM_SHAPE",
            Self::Corpus(_) => "CORPUS_ERROR",
            Self::UnknownSourceType(_) => "UNKNOWN_SOURCE_TYPE",
            Self::UnknownSourceFilter(_) => "UNKNOWN_SOURCE_FILTER",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Upstream status to mirror back to proxy callers, if there was one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Status { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(value: reqwest::Error) -> Self {
        if let Some(status) = value.status() {
            return Self::Status {
                status: status.as_u16(),
                message: value.to_string(),
            };
        }
        if value.is_decode() {
            return Self::Shape(value.to_string());
        }
        Self::Http(value.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(value: serde_json::Error) -> Self {
        Self::Shape(value.to_string())
    }
}

pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses_match_gateway_family() {
        assert!(CatalogError::Status {
            status: 503,
            message: "busy".into()
        }
        .is_retryable());
        assert!(!CatalogError::Status {
            status: 404,
            message: "gone".into()
        }
        .is_retryable());
        assert!(CatalogError::Http("reset".into()).is_retryable());
        assert!(!CatalogError::Shape("no hits".into()).is_retryable());
    }

    #[test]
    fn upstream_status_only_for_status_variant() {
        let e = CatalogError::Status {
            status: 418,
            message: "teapot".into(),
        };
        assert_eq!(e.upstream_status(), Some(418));
        assert_eq!(e.code(), "UPSTREAM_STATUS");
        assert_eq!(CatalogError::Http("x".into()).upstream_status(), None);
    }
}
