use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

/// Typed application error hierarchy for all request handlers.
///
/// Store and reconciliation code propagates these with `?`; the
/// `IntoResponse` impl maps each variant onto the wire taxonomy, so
/// handlers never build error bodies by hand.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Database(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    /// The override write committed but the processor could not be
    /// re-triggered; retry resumption, not the whole request.
    #[error("{0}")]
    Resume(String),

    #[error("{0}")]
    Io(String),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn post_not_found() -> Self {
        AppError::NotFound("Post not found".to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Resume(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to resume processing", "message": msg }),
            ),
            AppError::Database(msg) | AppError::Io(msg) | AppError::Other(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg }))
            }
        };
        (status, Json(body)).into_response()
    }
}

// ── From impls ─────────────────────────────────────────────────────────────

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Other(e.to_string())
    }
}

/// reqwest is only used to reach the processor service, so transport
/// failures are resumption failures.
impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Resume(e.to_string())
    }
}

/// Allows `.map_err(|e| format!("…", e))?` and `ok_or_else(|| format!(…))?`
/// to coerce into AppError without changing the call sites.
impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::Other(s)
    }
}

/// Allows `.ok_or("literal string")?` to coerce into AppError.
impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        AppError::Other(s.to_string())
    }
}
