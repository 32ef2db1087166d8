//! HTTP and `WebSocket` surface for the arrivals board.
//!
//! This crate provides an Axum server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws`) pushing `{"id", "data"}` once per
//!   tick via the core [`SubscriberHub`]
//! - **QR endpoint** (`/qr/{id}`) rendering a stored snapshot as a PNG
//!   QR code with caching disabled
//! - **JSON endpoints** (`/api/snapshots/latest`, `/api/snapshots/{id}`)
//!   returning stored records as-is
//!
//! # Architecture
//!
//! Handlers only read: the core broadcast loop is the single writer of
//! the snapshot store. Each connection runs on its own task, and a failed
//! send ends only that connection's session.
//!
//! [`SubscriberHub`]: arrivals_core::hub::SubscriberHub

pub mod error;
pub mod handlers;
pub mod render;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use render::{QrPngRenderer, RenderError, SnapshotRenderer};
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::spawn_server;
pub use state::AppState;
