//! Error taxonomy and the JSON error envelope returned by every endpoint.
//!
//! Every failure surfaces as `{ "error": { "code", "message" }, "meta": { ... } }`
//! with the status code chosen by [`AtlasError::status`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, warn};

/// Errors raised while building, executing or serving a map layer.
#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    #[error("unknown layer '{0}'")]
    UnknownLayer(String),
    #[error("invalid {field}: {reason}")]
    MalformedInput { field: &'static str, reason: String },
    #[error("database unavailable: {0}")]
    Connection(#[source] sqlx::Error),
    #[error("query failed: {0}")]
    QueryExecution(#[source] sqlx::Error),
    #[error("cannot read {path}: {source}")]
    StaticFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed data in {path}: {reason}")]
    MalformedData { path: String, reason: String },
}

impl AtlasError {
    pub fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            field,
            reason: reason.into(),
        }
    }

    /// Sort a sqlx failure into the connection or execution bucket.
    ///
    /// Anything the engine itself answered with is an execution error; pool,
    /// socket and TLS failures mean we never reached a working session.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Configuration(_) => Self::Connection(err),
            _ => Self::QueryExecution(err),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnknownLayer(_) => StatusCode::NOT_FOUND,
            Self::MalformedInput { .. } => StatusCode::BAD_REQUEST,
            Self::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::QueryExecution(_) | Self::StaticFile { .. } | Self::MalformedData { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownLayer(_) => "UNKNOWN_LAYER",
            Self::MalformedInput { .. } => "BAD_REQUEST",
            Self::Connection(_) => "SERVICE_UNAVAILABLE",
            Self::QueryExecution(_) => "QUERY_FAILED",
            Self::StaticFile { .. } | Self::MalformedData { .. } => "INTERNAL_ERROR",
        }
    }
}

/// Metadata included in every error response.
#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub timestamp: String,
}

impl Default for ResponseMeta {
    fn default() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: ErrorDetail,
    pub meta: ResponseMeta,
}

impl IntoResponse for AtlasError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.code(), error = %self, "request failed");
        } else {
            warn!(code = self.code(), error = %self, "request rejected");
        }

        let body = ApiErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
            },
            meta: ResponseMeta::default(),
        };
        (status, axum::Json(body)).into_response()
    }
}
