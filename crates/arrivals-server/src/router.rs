//! Axum router construction.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS and request tracing.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /ws` -- `WebSocket` snapshot stream
/// - `GET /qr/{id}` -- QR code of a stored snapshot
/// - `GET /api/snapshots/latest` -- newest stored record
/// - `GET /api/snapshots/{id}` -- one stored record
///
/// CORS allows any origin so a page served elsewhere can embed the QR
/// images and open the stream.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws::ws_snapshots))
        .route("/qr/{id}", get(handlers::get_qr))
        .route("/api/snapshots/latest", get(handlers::get_latest_snapshot))
        .route("/api/snapshots/{id}", get(handlers::get_snapshot))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
