//! Arrivals board engine binary.
//!
//! This is the main entry point that wires together the broadcast loop,
//! the snapshot store, and the HTTP/WebSocket server. It loads
//! configuration, initializes all subsystems, and runs until Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `arrivals-config.yaml` (or `ARRIVALS_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Create the snapshot store and subscriber hub
//! 4. Build the broadcast loop, seeding ids from the startup time
//! 5. Bind and spawn the HTTP server
//! 6. Run the broadcast loop until the shutdown signal is raised
//! 7. Drain the server and log the result

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use arrivals_core::broadcast::{self, BroadcastLoop, SnapshotIds};
use arrivals_core::clock::IntervalClock;
use arrivals_core::config::{ArrivalsConfig, LoggingConfig};
use arrivals_core::hub::SubscriberHub;
use arrivals_core::shutdown::ShutdownSignal;
use arrivals_core::store::SnapshotStore;
use arrivals_server::{AppState, QrPngRenderer, ServerConfig};
use arrivals_types::SnapshotId;
use chrono::Utc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Config file looked up in the working directory.
const DEFAULT_CONFIG_PATH: &str = "arrivals-config.yaml";

/// Environment variable naming an alternative config file.
const CONFIG_PATH_ENV: &str = "ARRIVALS_CONFIG";

/// Application entry point for the arrivals engine.
///
/// # Errors
///
/// Returns an error if any initialization step fails or a background
/// task dies.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration. Logging is not up yet, so remember where it
    //    came from and report it below.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!("arrivals-engine starting");
    info!(
        source = %source,
        stop_id = config.simulation.stop_id,
        max_entries = config.simulation.max_entries,
        tick_interval_ms = config.broadcast.tick_interval_ms,
        max_records = config.store.max_records,
        "Configuration loaded"
    );

    // 3. Create the store and the hub.
    let store = Arc::new(SnapshotStore::new(config.store.max_records));
    let hub = SubscriberHub::new(config.broadcast.channel_capacity);

    // 4. Build the broadcast loop.
    let first_id = first_snapshot_id(Utc::now().timestamp_millis());
    let broadcast_loop =
        BroadcastLoop::from_config(&config.simulation, Arc::clone(&store), hub.clone())?
            .with_ids(SnapshotIds::starting_at(first_id));
    info!(first_id = %first_id, "Broadcast loop initialized");

    // 5. Start the HTTP server.
    let shutdown = Arc::new(ShutdownSignal::new());
    let renderer = Arc::new(QrPngRenderer::new(config.server.qr_size));
    let app_state = Arc::new(AppState::new(store, hub, renderer));
    let server_config = ServerConfig::from(&config.server);
    let server_handle =
        arrivals_server::spawn_server(&server_config, app_state, Arc::clone(&shutdown)).await?;

    // 6. Run the broadcast loop on its own task.
    let clock = IntervalClock::new(config.broadcast.tick_interval());
    let loop_handle = tokio::spawn(broadcast_loop.run(clock, Arc::clone(&shutdown)));

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    shutdown.request();

    // 7. Drain and log.
    let report = loop_handle.await?;
    server_handle.await?;
    broadcast::log_loop_end(&report);

    info!(
        end_reason = ?report.end_reason,
        ticks_published = report.ticks_published,
        "arrivals-engine shutdown complete"
    );

    Ok(())
}

/// Load the configuration file.
///
/// Uses `ARRIVALS_CONFIG` when set, otherwise `arrivals-config.yaml` in
/// the working directory. A missing default file falls back to defaults
/// (plus `HOST`/`PORT` overrides); a missing explicit file is an error.
fn load_config() -> Result<(ArrivalsConfig, String), EngineError> {
    if let Ok(explicit) = std::env::var(CONFIG_PATH_ENV) {
        let config = ArrivalsConfig::from_file(&PathBuf::from(&explicit))?;
        return Ok((config, explicit));
    }

    let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        let config = ArrivalsConfig::from_file(&default_path)?;
        Ok((config, String::from(DEFAULT_CONFIG_PATH)))
    } else {
        let mut config = ArrivalsConfig::default();
        config.server.apply_env_overrides()?;
        Ok((config, String::from("defaults")))
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// First snapshot id of this process: the startup time in Unix
/// milliseconds, so ids keep increasing across restarts.
fn first_snapshot_id(unix_millis: i64) -> SnapshotId {
    SnapshotId::new(u64::try_from(unix_millis).unwrap_or(0).max(1))
}
