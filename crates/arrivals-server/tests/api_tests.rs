//! Integration tests for the HTTP endpoints.
//!
//! Most tests use Axum's `Router` directly via `tower::ServiceExt`
//! without starting a TCP server. The `WebSocket` session and shutdown
//! tests bind a loopback listener on an ephemeral port.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use arrivals_core::hub::SubscriberHub;
use arrivals_core::shutdown::ShutdownSignal;
use arrivals_core::store::SnapshotStore;
use arrivals_server::render::{QrPngRenderer, RenderError, SnapshotRenderer};
use arrivals_server::router::build_router;
use arrivals_server::server::{self, ServerConfig};
use arrivals_server::spawn_server;
use arrivals_server::state::AppState;
use arrivals_types::{SnapshotId, SnapshotMessage};
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;
use tower::ServiceExt;

const PAYLOAD: &str = r#"{"s":4242,"b":[{"l":"17","m":3},{"l":"42","m":11}]}"#;

/// Echoes the payload back so tests can check exactly what was rendered.
struct EchoRenderer;

impl SnapshotRenderer for EchoRenderer {
    fn content_type(&self) -> &'static str {
        "text/plain"
    }

    fn render(&self, payload: &str) -> Result<Vec<u8>, RenderError> {
        Ok(payload.as_bytes().to_vec())
    }
}

struct FailingRenderer;

impl SnapshotRenderer for FailingRenderer {
    fn content_type(&self) -> &'static str {
        "image/png"
    }

    fn render(&self, _payload: &str) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::Encode(String::from("data too long")))
    }
}

async fn make_test_state(renderer: Arc<dyn SnapshotRenderer>) -> Arc<AppState> {
    let store = Arc::new(SnapshotStore::unbounded());
    store.put(SnapshotId::new(41), Arc::from(r#"{"s":4242,"b":[]}"#)).await;
    store.put(SnapshotId::new(42), Arc::from(PAYLOAD)).await;
    Arc::new(AppState::new(store, SubscriberHub::default(), renderer))
}

async fn body_bytes(body: Body) -> Vec<u8> {
    axum::body::to_bytes(body, usize::MAX).await.unwrap().to_vec()
}

async fn body_to_json(body: Body) -> Value {
    serde_json::from_slice(&body_bytes(body).await).unwrap()
}

/// Wait until the hub has exactly `expected` live sessions.
async fn wait_for_subscribers(hub: &SubscriberHub, expected: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while hub.subscriber_count() != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_qr_returns_rendered_payload() {
    let state = make_test_state(Arc::new(EchoRenderer)).await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/qr/42").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
    assert_eq!(body_bytes(response.into_body()).await, PAYLOAD.as_bytes());
}

#[tokio::test]
async fn test_qr_disables_caching() {
    let state = make_test_state(Arc::new(EchoRenderer)).await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/qr/42").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(
        headers[header::CACHE_CONTROL],
        "no-cache, no-store, must-revalidate"
    );
    assert_eq!(headers[header::PRAGMA], "no-cache");
    assert_eq!(headers[header::EXPIRES], "0");
}

#[tokio::test]
async fn test_qr_renders_png() {
    let state = make_test_state(Arc::new(QrPngRenderer::default())).await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/qr/42").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let body = body_bytes(response.into_body()).await;
    assert_eq!(&body[..8], b"\x89PNG\r\n\x1a\n");
}

#[tokio::test]
async fn test_qr_unknown_id_is_not_found() {
    let state = make_test_state(Arc::new(EchoRenderer)).await;

    for path in ["/qr/7", "/qr/18446744073709551615", "/qr/abc", "/qr/-1"] {
        let response = build_router(Arc::clone(&state))
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        let json = body_to_json(response.into_body()).await;
        assert_eq!(json["status"], 404);
    }
}

#[tokio::test]
async fn test_qr_render_failure_is_server_error() {
    let state = make_test_state(Arc::new(FailingRenderer)).await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/qr/42").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 500);
    assert!(json["error"].as_str().unwrap().contains("data too long"));
}

#[tokio::test]
async fn test_render_failure_leaves_store_untouched() {
    let state = make_test_state(Arc::new(FailingRenderer)).await;

    let _ = build_router(Arc::clone(&state))
        .oneshot(Request::get("/qr/42").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(state.store.len().await, 2);
    let record = state.store.get(SnapshotId::new(42)).await.unwrap();
    assert_eq!(&*record.payload, PAYLOAD);
}

#[tokio::test]
async fn test_get_latest_snapshot() {
    let state = make_test_state(Arc::new(EchoRenderer)).await;
    let router = build_router(state);

    let response = router
        .oneshot(
            Request::get("/api/snapshots/latest")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["id"], 42);
    assert_eq!(json["data"], PAYLOAD);
    assert!(json["created_at"].is_string());
}

#[tokio::test]
async fn test_get_latest_before_first_tick() {
    let state = Arc::new(AppState::new(
        Arc::new(SnapshotStore::unbounded()),
        SubscriberHub::default(),
        Arc::new(EchoRenderer),
    ));
    let router = build_router(state);

    let response = router
        .oneshot(
            Request::get("/api/snapshots/latest")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_snapshot_by_id() {
    let state = make_test_state(Arc::new(EchoRenderer)).await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/api/snapshots/41").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["id"], 41);

    // The stored payload is itself canonical JSON.
    let inner: Value = serde_json::from_str(json["data"].as_str().unwrap()).unwrap();
    assert_eq!(inner["s"], 4242);
}

#[tokio::test]
async fn test_get_snapshot_not_found() {
    let state = make_test_state(Arc::new(EchoRenderer)).await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/api/snapshots/999").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_snapshot_id_with_leading_zeros_is_not_found() {
    let state = make_test_state(Arc::new(EchoRenderer)).await;

    for path in ["/api/snapshots/042", "/api/snapshots/0000042", "/qr/042"] {
        let response = build_router(Arc::clone(&state))
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
    }
}

#[tokio::test]
async fn test_ws_requires_upgrade() {
    let state = make_test_state(Arc::new(EchoRenderer)).await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/ws").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let state = make_test_state(Arc::new(EchoRenderer)).await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/index").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_spawned_server_stops_on_shutdown() {
    let state = make_test_state(Arc::new(EchoRenderer)).await;
    let shutdown = Arc::new(ShutdownSignal::new());
    let config = ServerConfig {
        host: String::from("127.0.0.1"),
        port: 0,
    };

    let handle = spawn_server(&config, state, Arc::clone(&shutdown))
        .await
        .unwrap();
    shutdown.request();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_ws_session_outlives_a_dropped_peer() {
    let state = make_test_state(Arc::new(EchoRenderer)).await;
    let hub = state.hub.clone();
    let shutdown = Arc::new(ShutdownSignal::new());
    let config = ServerConfig {
        host: String::from("127.0.0.1"),
        port: 0,
    };

    let listener = server::bind(&config).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_handle = tokio::spawn(server::serve(listener, state, Arc::clone(&shutdown)));

    let url = format!("ws://{addr}/ws");
    let (mut kept, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();
    let (dropped, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();
    wait_for_subscribers(&hub, 2).await;

    // Client data frames are ignored and leave the session open.
    kept.send(Message::Text("hello".into())).await.unwrap();

    drop(dropped);
    wait_for_subscribers(&hub, 1).await;

    for raw in 1..=3u64 {
        let delivered = hub.publish(SnapshotMessage {
            id: SnapshotId::new(raw),
            data: Arc::from("{}"),
        });
        assert_eq!(delivered, 1);
    }

    for expected in 1..=3u64 {
        let frame = tokio::time::timeout(Duration::from_secs(5), kept.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let json: Value = serde_json::from_str(frame.to_text().unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({ "id": expected, "data": "{}" }));
    }
    assert_eq!(hub.subscriber_count(), 1);

    drop(kept);
    shutdown.request();
    let _ = tokio::time::timeout(Duration::from_secs(5), server_handle).await;
}
