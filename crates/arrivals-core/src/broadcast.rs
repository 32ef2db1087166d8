//! The timer-driven simulate, store, and broadcast loop.
//!
//! [`BroadcastLoop`] owns the arrival queue and the random source; it is
//! the only writer of either, and the only writer of the
//! [`SnapshotStore`]. Each tick it:
//!
//! 1. advances the queue with [`simulator::advance`],
//! 2. encodes the [`StopSnapshot`] in canonical JSON,
//! 3. allocates a fresh [`SnapshotId`] and stores the payload,
//! 4. publishes `{id, data}` on the [`SubscriberHub`].
//!
//! A tick that fails at step 2 or 3 is logged and skipped; the queue has
//! still advanced, and the next clock fire runs the next tick as usual.
//!
//! [`BroadcastLoop::step`] runs exactly one tick and is what tests drive.
//! [`BroadcastLoop::run`] repeats it on every [`TickClock`] fire until
//! the [`ShutdownSignal`] is raised or the clock stops.

use std::sync::Arc;

use arrivals_types::{ArrivalQueue, Payload, SnapshotId, SnapshotMessage, StopSnapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::clock::TickClock;
use crate::config::SimulationConfig;
use crate::hub::SubscriberHub;
use crate::shutdown::ShutdownSignal;
use crate::simulator::{self, SimulatorError, SimulatorParams};
use crate::store::SnapshotStore;

/// Errors that cause a single tick to be skipped.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The snapshot could not be encoded.
    #[error("failed to serialize snapshot: {source}")]
    Serialization {
        /// The underlying encoding error.
        #[from]
        source: serde_json::Error,
    },

    /// Every identifier has been handed out.
    #[error("snapshot id space exhausted")]
    IdOverflow,
}

/// Monotonic allocator of snapshot identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotIds {
    next: Option<SnapshotId>,
}

impl SnapshotIds {
    /// Allocate identifiers starting from `first`.
    pub const fn starting_at(first: SnapshotId) -> Self {
        Self { next: Some(first) }
    }

    /// Hand out the next identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::IdOverflow`] once `u64::MAX` has been used.
    pub fn allocate(&mut self) -> Result<SnapshotId, TickError> {
        let id = self.next.ok_or(TickError::IdOverflow)?;
        self.next = id.checked_next();
        Ok(id)
    }
}

impl Default for SnapshotIds {
    fn default() -> Self {
        Self::starting_at(SnapshotId::new(1))
    }
}

/// Result of one successful tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Identifier the snapshot was stored under.
    pub id: SnapshotId,
    /// Pending arrivals after the tick.
    pub entries: usize,
    /// Subscribers the snapshot was queued for.
    pub delivered: usize,
    /// Record evicted by the store's retention bound, if any.
    pub evicted: Option<SnapshotId>,
}

/// Why [`BroadcastLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEndReason {
    /// The shutdown signal was raised.
    Shutdown,
    /// The tick clock will not fire again.
    ClockStopped,
}

/// Summary returned by [`BroadcastLoop::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopReport {
    /// Why the loop stopped.
    pub end_reason: LoopEndReason,
    /// Ticks that stored and published a snapshot.
    pub ticks_published: u64,
    /// Ticks that were skipped after an error.
    pub ticks_skipped: u64,
    /// Identifier of the last published snapshot.
    pub last_id: Option<SnapshotId>,
}

/// The single writer of the arrival queue and the snapshot store.
pub struct BroadcastLoop<R = StdRng> {
    queue: ArrivalQueue,
    params: SimulatorParams,
    stop_id: u32,
    rng: R,
    ids: SnapshotIds,
    store: Arc<SnapshotStore>,
    hub: SubscriberHub,
    tick: u64,
}

impl BroadcastLoop<StdRng> {
    /// Build a loop from the `simulation` config section.
    ///
    /// Uses the configured seed when present, OS entropy otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`SimulatorError`] if the simulation parameters are invalid.
    pub fn from_config(
        config: &SimulationConfig,
        store: Arc<SnapshotStore>,
        hub: SubscriberHub,
    ) -> Result<Self, SimulatorError> {
        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Ok(Self::new(config.params()?, config.stop_id, rng, store, hub))
    }
}

impl<R: Rng + Send> BroadcastLoop<R> {
    /// Create a loop with an empty queue and identifiers starting at 1.
    pub fn new(
        params: SimulatorParams,
        stop_id: u32,
        rng: R,
        store: Arc<SnapshotStore>,
        hub: SubscriberHub,
    ) -> Self {
        Self {
            queue: ArrivalQueue::new(),
            params,
            stop_id,
            rng,
            ids: SnapshotIds::default(),
            store,
            hub,
            tick: 0,
        }
    }

    /// Replace the identifier allocator.
    #[must_use]
    pub fn with_ids(mut self, ids: SnapshotIds) -> Self {
        self.ids = ids;
        self
    }

    /// Replace the starting queue.
    #[must_use]
    pub fn with_queue(mut self, queue: ArrivalQueue) -> Self {
        self.queue = queue;
        self
    }

    /// The queue as of the last tick.
    pub const fn queue(&self) -> &ArrivalQueue {
        &self.queue
    }

    /// Number of ticks run so far, including skipped ones.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Run exactly one tick.
    ///
    /// # Errors
    ///
    /// Returns [`TickError`] if the snapshot could not be encoded or no
    /// identifier is left. The queue has advanced either way.
    pub async fn step(&mut self) -> Result<TickOutcome, TickError> {
        self.queue = simulator::advance(&self.queue, &self.params, &mut self.rng);
        self.tick = self.tick.saturating_add(1);

        let snapshot = StopSnapshot {
            stop: self.stop_id,
            entries: self.queue.clone(),
        };
        let payload: Payload = Arc::from(snapshot.to_canonical_json()?);
        let id = self.ids.allocate()?;

        let evicted = self.store.put(id, Arc::clone(&payload)).await;
        let delivered = self.hub.publish(SnapshotMessage { id, data: payload });

        Ok(TickOutcome {
            tick: self.tick,
            id,
            entries: self.queue.len(),
            delivered,
            evicted,
        })
    }

    /// Tick on every clock fire until shutdown or until the clock stops.
    pub async fn run<C: TickClock>(
        mut self,
        mut clock: C,
        shutdown: Arc<ShutdownSignal>,
    ) -> LoopReport {
        let mut ticks_published: u64 = 0;
        let mut ticks_skipped: u64 = 0;
        let mut last_id = None;

        info!(
            stop_id = self.stop_id,
            max_entries = self.params.max_entries(),
            admission_probability = self.params.admission_probability(),
            retention = self.store.max_records(),
            "Broadcast loop starting"
        );

        let end_reason = loop {
            tokio::select! {
                biased;
                () = shutdown.wait() => break LoopEndReason::Shutdown,
                fired = clock.wait_next() => {
                    if !fired {
                        break LoopEndReason::ClockStopped;
                    }
                }
            }

            match self.step().await {
                Ok(outcome) => {
                    ticks_published = ticks_published.saturating_add(1);
                    last_id = Some(outcome.id);
                    debug!(
                        tick = outcome.tick,
                        id = %outcome.id,
                        entries = outcome.entries,
                        delivered = outcome.delivered,
                        evicted = ?outcome.evicted,
                        "Snapshot published"
                    );
                }
                Err(e) => {
                    ticks_skipped = ticks_skipped.saturating_add(1);
                    warn!(tick = self.tick, error = %e, "Tick skipped");
                }
            }
        };

        LoopReport {
            end_reason,
            ticks_published,
            ticks_skipped,
            last_id,
        }
    }
}

/// Log the end of a broadcast loop run.
pub fn log_loop_end(report: &LoopReport) {
    info!(
        reason = ?report.end_reason,
        ticks_published = report.ticks_published,
        ticks_skipped = report.ticks_skipped,
        last_id = report.last_id.map(SnapshotId::into_inner),
        "Broadcast loop stopped"
    );
    if report.ticks_published == 0 {
        warn!("Broadcast loop stopped before publishing any snapshot");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::time::Duration;

    use arrivals_types::ArrivalEntry;
    use tokio::sync::mpsc;

    use super::*;

    /// Clock that fires once per message and stops when the sender drops.
    struct ManualClock {
        rx: mpsc::UnboundedReceiver<()>,
    }

    impl TickClock for ManualClock {
        fn wait_next(&mut self) -> impl Future<Output = bool> + Send {
            async move { self.rx.recv().await.is_some() }
        }
    }

    fn manual_clock() -> (mpsc::UnboundedSender<()>, ManualClock) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, ManualClock { rx })
    }

    fn make_loop(probability: f64, seed: u64) -> (BroadcastLoop, Arc<SnapshotStore>, SubscriberHub) {
        let store = Arc::new(SnapshotStore::unbounded());
        let hub = SubscriberHub::new(64);
        let params = SimulatorParams::new(8, probability, 5, 30, 100).unwrap();
        let broadcast = BroadcastLoop::new(
            params,
            4242,
            StdRng::seed_from_u64(seed),
            Arc::clone(&store),
            hub.clone(),
        );
        (broadcast, store, hub)
    }

    fn decode(payload: &str) -> StopSnapshot {
        serde_json::from_str(payload).unwrap()
    }

    #[tokio::test]
    async fn step_stores_and_publishes_the_same_payload() {
        let (mut broadcast, store, hub) = make_loop(1.0, 42);
        let mut rx = hub.subscribe();

        let outcome = broadcast.step().await.unwrap();
        assert_eq!(outcome.tick, 1);
        assert_eq!(outcome.id, SnapshotId::new(1));
        assert_eq!(outcome.entries, 1);
        assert_eq!(outcome.delivered, 1);
        assert_eq!(outcome.evicted, None);

        let pushed = rx.recv().await.unwrap();
        let stored = store.get(outcome.id).await.unwrap();
        assert_eq!(pushed.id, outcome.id);
        assert_eq!(pushed.data, stored.payload);

        let snapshot = decode(&stored.payload);
        assert_eq!(snapshot.stop, 4242);
        assert_eq!(&snapshot.entries, broadcast.queue());
    }

    #[tokio::test]
    async fn ids_strictly_increase() {
        let (broadcast, _store, _hub) = make_loop(0.3, 1);
        let mut broadcast = broadcast.with_ids(SnapshotIds::starting_at(SnapshotId::new(1_000)));

        let mut previous = None;
        for expected in 1_000..1_020 {
            let outcome = broadcast.step().await.unwrap();
            assert_eq!(outcome.id, SnapshotId::new(expected));
            assert!(previous < Some(outcome.id));
            previous = Some(outcome.id);
        }
    }

    #[tokio::test]
    async fn each_tick_observes_the_previous_one() {
        let (broadcast, store, _hub) = make_loop(0.0, 9);
        let mut broadcast =
            broadcast.with_queue(ArrivalQueue::from_entries(vec![ArrivalEntry::new("7", 2)]));

        let mut minutes = Vec::new();
        for _ in 0..4 {
            let outcome = broadcast.step().await.unwrap();
            let stored = store.get(outcome.id).await.unwrap();
            minutes.push(decode(&stored.payload).entries.iter().map(|e| e.minutes).collect::<Vec<_>>());
        }
        assert_eq!(minutes, vec![vec![1], vec![0], vec![], vec![]]);
    }

    #[tokio::test]
    async fn full_queue_stays_at_capacity() {
        let (broadcast, _store, _hub) = make_loop(1.0, 3);
        let full: Vec<ArrivalEntry> = (0..8u32)
            .map(|i| ArrivalEntry::new(i.to_string(), 20))
            .collect();
        let mut broadcast = broadcast.with_queue(ArrivalQueue::from_entries(full));

        let outcome = broadcast.step().await.unwrap();
        assert_eq!(outcome.entries, 8);
        assert!(broadcast.queue().iter().all(|e| e.minutes == 19));
    }

    #[tokio::test]
    async fn id_exhaustion_skips_the_tick() {
        let (broadcast, store, _hub) = make_loop(0.3, 4);
        let mut broadcast =
            broadcast.with_ids(SnapshotIds::starting_at(SnapshotId::new(u64::MAX)));

        assert_eq!(broadcast.step().await.unwrap().id, SnapshotId::new(u64::MAX));
        assert!(matches!(broadcast.step().await, Err(TickError::IdOverflow)));
        assert_eq!(broadcast.tick(), 2);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn run_ticks_once_per_clock_fire() {
        let (broadcast, store, hub) = make_loop(0.5, 5);
        let mut rx = hub.subscribe();
        let (fire, clock) = manual_clock();
        for _ in 0..3 {
            fire.send(()).unwrap();
        }
        drop(fire);

        let report = broadcast.run(clock, Arc::new(ShutdownSignal::new())).await;

        assert_eq!(report.end_reason, LoopEndReason::ClockStopped);
        assert_eq!(report.ticks_published, 3);
        assert_eq!(report.ticks_skipped, 0);
        assert_eq!(report.last_id, Some(SnapshotId::new(3)));
        assert_eq!(store.len().await, 3);
        for expected in 1..=3 {
            assert_eq!(rx.recv().await.unwrap().id, SnapshotId::new(expected));
        }
    }

    #[tokio::test]
    async fn run_counts_skipped_ticks_and_continues() {
        let (broadcast, _store, _hub) = make_loop(0.5, 6);
        let broadcast = broadcast.with_ids(SnapshotIds::starting_at(SnapshotId::new(u64::MAX)));
        let (fire, clock) = manual_clock();
        for _ in 0..3 {
            fire.send(()).unwrap();
        }
        drop(fire);

        let report = broadcast.run(clock, Arc::new(ShutdownSignal::new())).await;
        assert_eq!(report.ticks_published, 1);
        assert_eq!(report.ticks_skipped, 2);
        assert_eq!(report.last_id, Some(SnapshotId::new(u64::MAX)));
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let (broadcast, store, _hub) = make_loop(0.5, 7);
        let (_fire, clock) = manual_clock();
        let shutdown = Arc::new(ShutdownSignal::new());

        let handle = tokio::spawn(broadcast.run(clock, Arc::clone(&shutdown)));
        tokio::task::yield_now().await;
        shutdown.request();

        let report = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.end_reason, LoopEndReason::Shutdown);
        assert_eq!(report.ticks_published, 0);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn shutdown_wins_over_pending_tick() {
        let (broadcast, _store, _hub) = make_loop(0.5, 8);
        let (fire, clock) = manual_clock();
        fire.send(()).unwrap();
        let shutdown = Arc::new(ShutdownSignal::new());
        shutdown.request();

        let report = broadcast.run(clock, shutdown).await;
        assert_eq!(report.end_reason, LoopEndReason::Shutdown);
        assert_eq!(report.ticks_published, 0);
    }

    #[test]
    fn from_config_rejects_bad_params() {
        let config = SimulationConfig {
            max_entries: 0,
            ..SimulationConfig::default()
        };
        let result = BroadcastLoop::from_config(
            &config,
            Arc::new(SnapshotStore::unbounded()),
            SubscriberHub::default(),
        );
        assert!(matches!(result, Err(SimulatorError::ZeroCapacity)));
    }

    #[tokio::test]
    async fn seeded_config_is_reproducible() {
        let config = SimulationConfig {
            seed: Some(1234),
            admission_probability: 0.7,
            ..SimulationConfig::default()
        };
        let mut payloads = Vec::new();
        for _ in 0..2 {
            let store = Arc::new(SnapshotStore::unbounded());
            let mut broadcast =
                BroadcastLoop::from_config(&config, Arc::clone(&store), SubscriberHub::default())
                    .unwrap();
            for _ in 0..25 {
                broadcast.step().await.unwrap();
            }
            payloads.push(store.latest().await.unwrap().payload);
        }
        assert_eq!(payloads[0], payloads[1]);
    }
}
