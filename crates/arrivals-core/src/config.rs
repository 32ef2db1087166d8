//! Configuration loading and typed config structures for the arrivals board.
//!
//! The configuration lives in `arrivals-config.yaml` in the working
//! directory. Every field has a default describing the standard board,
//! so a missing file or a partial file is valid.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::simulator::{SimulatorError, SimulatorParams};

/// Shortest accepted tick interval.
pub const MIN_TICK_INTERVAL_MS: u64 = 100;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The simulation section describes an impossible simulator.
    #[error("invalid simulation config: {source}")]
    Simulation {
        /// The underlying parameter error.
        #[from]
        source: SimulatorError,
    },

    /// Any other out-of-range value.
    #[error("invalid config: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ArrivalsConfig {
    /// Arrival simulation parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Broadcast loop timing and fan-out.
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// Snapshot retention.
    #[serde(default)]
    pub store: StoreConfig,

    /// HTTP listener and QR rendering.
    #[serde(default)]
    pub server: HttpConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ArrivalsConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the listener:
    /// - `HOST` overrides `server.host`
    /// - `PORT` overrides `server.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or a
    /// validation error from [`validate`](Self::validate).
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.server.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or a
    /// validation error from [`validate`](Self::validate).
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section for out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Simulation`] for impossible simulator
    /// parameters and [`ConfigError::Invalid`] for anything else.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.params()?;

        if self.broadcast.tick_interval_ms < MIN_TICK_INTERVAL_MS {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "broadcast.tick_interval_ms must be at least {MIN_TICK_INTERVAL_MS}, got {}",
                    self.broadcast.tick_interval_ms
                ),
            });
        }
        if self.broadcast.channel_capacity == 0 {
            return Err(ConfigError::Invalid {
                reason: "broadcast.channel_capacity must be at least 1".to_owned(),
            });
        }
        if self.server.qr_size == 0 {
            return Err(ConfigError::Invalid {
                reason: "server.qr_size must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

/// Arrival simulation parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Stop identifier carried in every snapshot.
    #[serde(default = "default_stop_id")]
    pub stop_id: u32,

    /// Maximum number of pending arrivals.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Inclusive lower bound on minutes for a newly admitted arrival.
    #[serde(default = "default_min_new_minutes")]
    pub min_new_minutes: u32,

    /// Exclusive upper bound on minutes for a newly admitted arrival.
    #[serde(default = "default_max_new_minutes")]
    pub max_new_minutes: u32,

    /// Chance per tick of admitting one new arrival, in `[0, 1]`.
    #[serde(default = "default_admission_probability")]
    pub admission_probability: f64,

    /// Line identifiers are drawn from `1..=line_count`.
    #[serde(default = "default_line_count")]
    pub line_count: u32,

    /// Seed for the simulation RNG. Unset means seed from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SimulationConfig {
    /// Build validated simulator parameters from this section.
    ///
    /// # Errors
    ///
    /// Returns [`SimulatorError`] if the parameters are out of range.
    pub fn params(&self) -> Result<SimulatorParams, SimulatorError> {
        SimulatorParams::new(
            self.max_entries,
            self.admission_probability,
            self.min_new_minutes,
            self.max_new_minutes,
            self.line_count,
        )
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            stop_id: default_stop_id(),
            max_entries: default_max_entries(),
            min_new_minutes: default_min_new_minutes(),
            max_new_minutes: default_max_new_minutes(),
            admission_probability: default_admission_probability(),
            line_count: default_line_count(),
            seed: None,
        }
    }
}

/// Broadcast loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BroadcastConfig {
    /// Real-time milliseconds between ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Messages buffered per subscriber before it starts skipping ahead.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl BroadcastConfig {
    /// The tick interval as a [`Duration`].
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Snapshot store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Records kept before the oldest is evicted (0 = unlimited).
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_records: default_max_records(),
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Minimum edge length of rendered QR images, in pixels.
    #[serde(default = "default_qr_size")]
    pub qr_size: u32,
}

impl HttpConfig {
    /// Override the listener address with environment variables when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `PORT` is not a valid port number.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("HOST") {
            self.host = val;
        }
        if let Ok(val) = std::env::var("PORT") {
            self.port = val.parse().map_err(|e| ConfigError::Invalid {
                reason: format!("PORT={val:?} is not a port number: {e}"),
            })?;
        }
        Ok(())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            qr_size: default_qr_size(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_stop_id() -> u32 {
    4242
}

const fn default_max_entries() -> usize {
    8
}

const fn default_min_new_minutes() -> u32 {
    5
}

const fn default_max_new_minutes() -> u32 {
    30
}

const fn default_admission_probability() -> f64 {
    0.3
}

const fn default_line_count() -> u32 {
    100
}

const fn default_tick_interval_ms() -> u64 {
    2_000
}

const fn default_channel_capacity() -> usize {
    256
}

const fn default_max_records() -> usize {
    3_600
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

const fn default_qr_size() -> u32 {
    256
}

fn default_log_level() -> String {
    "info".to_owned()
}
