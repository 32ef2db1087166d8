//! Error types for the arrivals engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and shutdown.

/// Top-level error for the arrivals engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: arrivals_core::config::ConfigError,
    },

    /// The simulation parameters describe an impossible simulator.
    #[error("simulator error: {source}")]
    Simulator {
        /// The underlying parameter error.
        #[from]
        source: arrivals_core::simulator::SimulatorError,
    },

    /// The HTTP server failed to start.
    #[error("server error: {source}")]
    Startup {
        /// The underlying startup error.
        #[from]
        source: arrivals_server::startup::StartupError,
    },

    /// Waiting for the termination signal failed.
    #[error("signal error: {source}")]
    Signal {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A background task panicked or was cancelled.
    #[error("task error: {source}")]
    Join {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },
}
