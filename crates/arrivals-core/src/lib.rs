//! Arrival simulator, snapshot store, and broadcast loop.
//!
//! This crate owns everything between the clock and the network: it
//! advances the simulated arrival queue, stores each tick's snapshot under
//! a fresh identifier, and fans it out to subscribers.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `arrivals-config.yaml` into
//!   strongly-typed structs.
//! - [`simulator`] -- The pure queue transition [`advance`](simulator::advance).
//! - [`store`] -- [`SnapshotStore`], the locked identifier-to-snapshot map.
//! - [`retrieval`] -- [`SnapshotRetrieval`], the read path used by renderers.
//! - [`hub`] -- [`SubscriberHub`], the broadcast channel to live sessions.
//! - [`clock`] -- [`TickClock`] and the wall-clock [`IntervalClock`].
//! - [`shutdown`] -- [`ShutdownSignal`], the process-wide stop latch.
//! - [`broadcast`] -- [`BroadcastLoop`], the single writer tying it together.
//!
//! [`SnapshotStore`]: store::SnapshotStore
//! [`SnapshotRetrieval`]: retrieval::SnapshotRetrieval
//! [`SubscriberHub`]: hub::SubscriberHub
//! [`TickClock`]: clock::TickClock
//! [`IntervalClock`]: clock::IntervalClock
//! [`ShutdownSignal`]: shutdown::ShutdownSignal
//! [`BroadcastLoop`]: broadcast::BroadcastLoop

pub mod broadcast;
pub mod clock;
pub mod config;
pub mod hub;
pub mod retrieval;
pub mod shutdown;
pub mod simulator;
pub mod store;
