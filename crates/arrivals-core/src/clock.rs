//! Tick sources for the broadcast loop.
//!
//! The loop never sleeps directly; it awaits a [`TickClock`]. Production
//! uses [`IntervalClock`], tests substitute a clock they fire by hand.

use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};

/// Something that says when the next tick is due.
pub trait TickClock: Send {
    /// Resolve when the next tick is due.
    ///
    /// Resolves to `false` once the clock will never fire again.
    fn wait_next(&mut self) -> impl Future<Output = bool> + Send;
}

/// Fixed-period wall-clock ticks.
///
/// The first tick fires immediately. If a tick runs late, the following
/// ones are pushed back rather than bunched up.
#[derive(Debug)]
pub struct IntervalClock {
    interval: Interval,
}

impl IntervalClock {
    /// Create a clock firing every `period`.
    ///
    /// A zero period is raised to one millisecond.
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    /// The configured period.
    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}

impl TickClock for IntervalClock {
    fn wait_next(&mut self) -> impl Future<Output = bool> + Send {
        async move {
            self.interval.tick().await;
            true
        }
    }
}
