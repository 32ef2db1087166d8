//! Shared application state for the HTTP server.
//!
//! [`AppState`] is built once at startup and injected into every handler
//! through Axum's `State` extractor. It holds the same store and hub the
//! broadcast loop writes to, plus the renderer used by `/qr/{id}`.

use std::sync::Arc;

use arrivals_core::hub::SubscriberHub;
use arrivals_core::retrieval::SnapshotRetrieval;
use arrivals_core::store::SnapshotStore;
use arrivals_types::SnapshotMessage;
use tokio::sync::broadcast;

use crate::render::SnapshotRenderer;

/// Shared state for the Axum application.
#[derive(Clone)]
pub struct AppState {
    /// Snapshot store written by the broadcast loop.
    pub store: Arc<SnapshotStore>,
    /// Publisher of per-tick messages.
    pub hub: SubscriberHub,
    /// Encoder for the retrieval endpoint.
    pub renderer: Arc<dyn SnapshotRenderer>,
}

impl AppState {
    /// Create application state over an existing store and hub.
    pub fn new(
        store: Arc<SnapshotStore>,
        hub: SubscriberHub,
        renderer: Arc<dyn SnapshotRenderer>,
    ) -> Self {
        Self {
            store,
            hub,
            renderer,
        }
    }

    /// Register a new subscriber for per-tick messages.
    pub fn subscribe(&self) -> broadcast::Receiver<SnapshotMessage> {
        self.hub.subscribe()
    }

    /// Read access to stored snapshots.
    pub fn retrieval(&self) -> SnapshotRetrieval<'_> {
        SnapshotRetrieval::new(&self.store)
    }
}
