//! Server startup helper for embedding in the engine binary.
//!
//! Provides [`spawn_server`] which binds the listener eagerly, so a port
//! conflict fails startup, and then serves on a background Tokio task.
//!
//! # Usage
//!
//! ```rust,ignore
//! use arrivals_server::{spawn_server, AppState, ServerConfig};
//!
//! let handle = spawn_server(&ServerConfig::default(), state, shutdown).await?;
//! // ... later, after shutdown.request():
//! handle.await?;
//! ```

use std::sync::Arc;

use arrivals_core::shutdown::ShutdownSignal;
use tokio::task::JoinHandle;

use crate::server::{self, ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the HTTP server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Bind the listener and serve on a background Tokio task.
///
/// The task runs until `shutdown` is raised and in-flight requests have
/// drained. Serve errors are logged on the task.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address is invalid or cannot
/// be bound.
pub async fn spawn_server(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: Arc<ShutdownSignal>,
) -> Result<JoinHandle<()>, StartupError> {
    let listener = server::bind(config).await?;

    let handle = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, state, shutdown).await {
            tracing::error!(error = %e, "HTTP server exited with error");
        }
    });

    tracing::info!(host = config.host, port = config.port, "HTTP server spawned on background task");

    Ok(handle)
}
