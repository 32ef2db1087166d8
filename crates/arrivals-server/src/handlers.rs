//! REST endpoint handlers.
//!
//! All handlers read through [`SnapshotRetrieval`]; none of them touch
//! the arrival queue.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/qr/{id}` | PNG QR code of a stored snapshot |
//! | `GET` | `/api/snapshots/latest` | Newest stored record as JSON |
//! | `GET` | `/api/snapshots/{id}` | One stored record as JSON |
//!
//! [`SnapshotRetrieval`]: arrivals_core::retrieval::SnapshotRetrieval

use std::sync::Arc;

use arrivals_types::SnapshotRecord;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// `Cache-Control` value for rendered snapshots.
///
/// Every id names a different snapshot, but clients poll the same page,
/// so nothing rendered here may be reused from a cache.
pub const NO_CACHE: &str = "no-cache, no-store, must-revalidate";

// ---------------------------------------------------------------------------
// GET /qr/{id}
// ---------------------------------------------------------------------------

/// Render a stored snapshot as a QR code image.
///
/// Returns 404 for unknown or malformed ids and 500 if the renderer
/// fails. Rendering runs on the blocking pool.
pub async fn get_qr(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let record = state.retrieval().resolve_raw(&raw_id).await.map_err(|e| {
        debug!(id = %raw_id, "QR requested for unknown snapshot");
        ApiError::from(e)
    })?;

    let renderer = Arc::clone(&state.renderer);
    let payload = Arc::clone(&record.payload);
    let body = tokio::task::spawn_blocking(move || renderer.render(&payload))
        .await
        .map_err(|e| ApiError::Internal(format!("render task failed: {e}")))?
        .map_err(|e| {
            warn!(id = %record.id, error = %e, "Failed to render snapshot");
            ApiError::Render(e.to_string())
        })?;

    Ok((
        [
            (header::CACHE_CONTROL, NO_CACHE),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "0"),
            (header::CONTENT_TYPE, state.renderer.content_type()),
        ],
        body,
    )
        .into_response())
}

// ---------------------------------------------------------------------------
// GET /api/snapshots/...
// ---------------------------------------------------------------------------

/// Return the newest stored snapshot record.
pub async fn get_latest_snapshot(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SnapshotRecord>, ApiError> {
    let record = state.retrieval().latest().await?;
    Ok(Json(record))
}

/// Return one stored snapshot record by id.
pub async fn get_snapshot(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<SnapshotRecord>, ApiError> {
    let record = state.retrieval().resolve_raw(&raw_id).await?;
    Ok(Json(record))
}
