//! Shared type definitions for the arrivals board.
//!
//! This crate is the single source of truth for the data that flows
//! between the simulator, the snapshot store, and the HTTP surface.
//!
//! # Modules
//!
//! - [`ids`] -- The monotonic [`SnapshotId`] identifier
//! - [`arrival`] -- Arrival entries, the bounded queue, and the stop snapshot
//! - [`record`] -- Stored snapshot records and the per-tick push message

pub mod arrival;
pub mod ids;
pub mod record;

// Re-export all public types at crate root for convenience.
pub use arrival::{ArrivalEntry, ArrivalQueue, StopSnapshot};
pub use ids::{ParseSnapshotIdError, SnapshotId};
pub use record::{Payload, SnapshotMessage, SnapshotRecord};
