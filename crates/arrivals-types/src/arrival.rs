//! Arrival entries, the arrival queue, and the per-tick stop snapshot.
//!
//! The serialized field names are deliberately compact (`s`, `b`, `l`,
//! `m`): the payload is what gets encoded into the QR code, and every
//! byte saved there makes the code easier to scan.

use serde::{Deserialize, Deserializer, Serialize};

/// One simulated pending arrival at the stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrivalEntry {
    /// Line identifier shown to riders (decimal string, e.g. `"42"`).
    #[serde(rename = "l")]
    pub line: String,
    /// Whole minutes until the arrival. Zero means "arriving now".
    #[serde(rename = "m")]
    pub minutes: u32,
}

impl ArrivalEntry {
    /// Create an entry for `line` arriving in `minutes`.
    pub fn new(line: impl Into<String>, minutes: u32) -> Self {
        Self {
            line: line.into(),
            minutes,
        }
    }
}

/// Ordered queue of pending arrivals, soonest first.
///
/// The queue is always sorted ascending by [`ArrivalEntry::minutes`];
/// entries with equal minutes keep their relative order. The capacity
/// bound is a simulator parameter and is enforced by the simulator,
/// not by this type. Deserialized queues go through
/// [`from_entries`](Self::from_entries), so unsorted input is sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ArrivalQueue(Vec<ArrivalEntry>);

impl ArrivalQueue {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Build a queue from arbitrary entries, stable-sorting them by
    /// minutes remaining.
    pub fn from_entries(mut entries: Vec<ArrivalEntry>) -> Self {
        entries.sort_by_key(|entry| entry.minutes);
        Self(entries)
    }

    /// The entries, soonest first.
    pub fn entries(&self) -> &[ArrivalEntry] {
        &self.0
    }

    /// Iterate over the entries, soonest first.
    pub fn iter(&self) -> core::slice::Iter<'_, ArrivalEntry> {
        self.0.iter()
    }

    /// Number of pending arrivals.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no arrivals are pending.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keep only the `len` soonest arrivals.
    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    /// Consume the queue, returning its entries.
    pub fn into_entries(self) -> Vec<ArrivalEntry> {
        self.0
    }
}

impl<'a> IntoIterator for &'a ArrivalQueue {
    type Item = &'a ArrivalEntry;
    type IntoIter = core::slice::Iter<'a, ArrivalEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'de> Deserialize<'de> for ArrivalQueue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<ArrivalEntry>::deserialize(deserializer).map(Self::from_entries)
    }
}

/// The externally visible state of one stop at one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopSnapshot {
    /// Stop identifier.
    #[serde(rename = "s")]
    pub stop: u32,
    /// Pending arrivals, soonest first.
    #[serde(rename = "b")]
    pub entries: ArrivalQueue,
}

impl StopSnapshot {
    /// Encode the snapshot in its canonical compact JSON form.
    ///
    /// Field order follows the struct declaration, so equal snapshots
    /// always encode to identical bytes.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if encoding fails.
    pub fn to_canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
