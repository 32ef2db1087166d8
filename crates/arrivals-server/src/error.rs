//! Error types for the HTTP layer.
//!
//! [`ApiError`] unifies all request failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use arrivals_core::retrieval::RetrievalError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur while handling a request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested snapshot was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The renderer could not encode the snapshot.
    #[error("render error: {0}")]
    Render(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RetrievalError> for ApiError {
    fn from(err: RetrievalError) -> Self {
        match err {
            RetrievalError::NotFound(id) => Self::NotFound(format!("no snapshot with id {id}")),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Render(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to render snapshot: {msg}"),
            ),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
