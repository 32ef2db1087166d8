//! `WebSocket` handler for per-tick snapshot streaming.
//!
//! Clients connect to `GET /ws` and receive a JSON-encoded
//! [`SnapshotMessage`] each time the broadcast loop completes a tick.
//! The handler uses a [`broadcast::Receiver`] so all connected clients
//! see the same stream.
//!
//! Each message gets exactly one send attempt. A failed send ends this
//! session and nothing else; a client that falls behind skips ahead to
//! the newest snapshot. Frames sent by the client are ignored.
//!
//! [`SnapshotMessage`]: arrivals_types::SnapshotMessage

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming snapshots.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_snapshots(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Forward every published snapshot to one client until it goes away.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!(subscribers = state.hub.subscriber_count(), "WebSocket client connected");

    let mut rx = state.subscribe();

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(message) => {
                        let json = match serde_json::to_string(&message) {
                            Ok(j) => j,
                            Err(e) => {
                                warn!(id = %message.id, "Failed to serialize snapshot message: {e}");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            debug!(id = %message.id, "WebSocket client disconnected (send failed)");
                            return;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        debug!(skipped = n, "WebSocket client lagged, skipping ahead");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Broadcast channel closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    // Pings are answered by the protocol layer; client data
                    // frames carry nothing the server acts on.
                    _ => {}
                }
            }
        }
    }
}
