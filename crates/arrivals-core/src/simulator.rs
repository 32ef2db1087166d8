//! The arrival queue state transition.
//!
//! [`advance`] is a pure function of the previous queue, the parameters,
//! and the random stream. It touches no clock and no shared state, so a
//! seeded RNG reproduces any run exactly.
//!
//! # Tick
//!
//! 1. Every pending arrival moves one minute closer; arrivals already at
//!    zero minutes leave the queue.
//! 2. If the queue has room, one new arrival is admitted with the
//!    configured probability, on a random line, between
//!    `min_new_minutes` (inclusive) and `max_new_minutes` (exclusive).
//! 3. The queue is stable-sorted by minutes remaining.

use arrivals_types::{ArrivalEntry, ArrivalQueue};
use rand::Rng;

/// Invalid simulator parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulatorError {
    /// The queue must hold at least one arrival.
    #[error("max_entries must be at least 1")]
    ZeroCapacity,

    /// The admission probability is outside `[0, 1]` (or NaN).
    #[error("admission_probability must be within [0, 1], got {value}")]
    ProbabilityOutOfRange {
        /// The rejected probability.
        value: f64,
    },

    /// `min_new_minutes..max_new_minutes` contains no value.
    #[error("min_new_minutes ({min}) must be below max_new_minutes ({max})")]
    EmptyMinutesRange {
        /// Configured lower bound.
        min: u32,
        /// Configured upper bound.
        max: u32,
    },

    /// There must be at least one line to draw from.
    #[error("line_count must be at least 1")]
    NoLines,
}

/// Validated parameters for [`advance`].
///
/// The only constructor is [`SimulatorParams::new`], so every value of
/// this type describes a simulator whose random draws cannot fail.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorParams {
    max_entries: usize,
    admission_probability: f64,
    min_new_minutes: u32,
    max_new_minutes: u32,
    line_count: u32,
}

impl SimulatorParams {
    /// Validate and build simulator parameters.
    ///
    /// # Errors
    ///
    /// Returns a [`SimulatorError`] describing the first invalid value.
    pub fn new(
        max_entries: usize,
        admission_probability: f64,
        min_new_minutes: u32,
        max_new_minutes: u32,
        line_count: u32,
    ) -> Result<Self, SimulatorError> {
        if max_entries == 0 {
            return Err(SimulatorError::ZeroCapacity);
        }
        if !(0.0..=1.0).contains(&admission_probability) {
            return Err(SimulatorError::ProbabilityOutOfRange {
                value: admission_probability,
            });
        }
        if min_new_minutes >= max_new_minutes {
            return Err(SimulatorError::EmptyMinutesRange {
                min: min_new_minutes,
                max: max_new_minutes,
            });
        }
        if line_count == 0 {
            return Err(SimulatorError::NoLines);
        }
        Ok(Self {
            max_entries,
            admission_probability,
            min_new_minutes,
            max_new_minutes,
            line_count,
        })
    }

    /// Queue capacity.
    pub const fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Per-tick admission probability.
    pub const fn admission_probability(&self) -> f64 {
        self.admission_probability
    }

    /// Return a copy with a different admission probability.
    ///
    /// # Errors
    ///
    /// Returns [`SimulatorError::ProbabilityOutOfRange`] if `probability`
    /// is outside `[0, 1]`.
    pub fn with_admission_probability(&self, probability: f64) -> Result<Self, SimulatorError> {
        Self::new(
            self.max_entries,
            probability,
            self.min_new_minutes,
            self.max_new_minutes,
            self.line_count,
        )
    }
}

/// Advance the queue by one tick.
pub fn advance<R: Rng>(
    previous: &ArrivalQueue,
    params: &SimulatorParams,
    rng: &mut R,
) -> ArrivalQueue {
    let mut entries: Vec<ArrivalEntry> = previous
        .iter()
        .filter_map(|entry| {
            entry
                .minutes
                .checked_sub(1)
                .map(|minutes| ArrivalEntry::new(entry.line.clone(), minutes))
        })
        .collect();

    // Capacity is checked first so a full queue consumes no randomness.
    if entries.len() < params.max_entries && rng.random::<f64>() < params.admission_probability {
        entries.push(admit(params, rng));
    }

    let mut queue = ArrivalQueue::from_entries(entries);
    queue.truncate(params.max_entries);
    queue
}

fn admit<R: Rng>(params: &SimulatorParams, rng: &mut R) -> ArrivalEntry {
    let line = rng.random_range(1..=params.line_count);
    let minutes = rng.random_range(params.min_new_minutes..params.max_new_minutes);
    ArrivalEntry::new(line.to_string(), minutes)
}
