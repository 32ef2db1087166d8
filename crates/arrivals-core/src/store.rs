//! In-memory snapshot store.
//!
//! [`SnapshotStore`] maps a [`SnapshotId`] to the [`SnapshotRecord`]
//! stored under it. Every operation takes the same exclusive lock, and
//! only for the duration of the map access: payloads are reference
//! counted, so reads clone a pointer rather than the snapshot bytes.
//!
//! # Retention
//!
//! The store keeps at most `max_records` records. Identifiers are
//! allocated monotonically, so the smallest identifier is the oldest
//! record and is the one evicted. A bound of zero keeps everything.

use std::collections::BTreeMap;

use arrivals_types::{Payload, SnapshotId, SnapshotRecord};
use chrono::Utc;
use tokio::sync::Mutex;

/// Concurrency-safe keyed cache of serialized snapshots.
#[derive(Debug)]
pub struct SnapshotStore {
    records: Mutex<BTreeMap<SnapshotId, SnapshotRecord>>,
    max_records: usize,
}

impl SnapshotStore {
    /// Create a store that keeps at most `max_records` records
    /// (0 = unlimited).
    pub fn new(max_records: usize) -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            max_records,
        }
    }

    /// Create a store that never evicts.
    pub fn unbounded() -> Self {
        Self::new(0)
    }

    /// The configured retention bound (0 = unlimited).
    pub const fn max_records(&self) -> usize {
        self.max_records
    }

    /// Store `payload` under `id`, replacing any record already there.
    ///
    /// Returns the identifier of the record evicted to stay within the
    /// retention bound, if any.
    pub async fn put(&self, id: SnapshotId, payload: Payload) -> Option<SnapshotId> {
        let record = SnapshotRecord {
            id,
            payload,
            created_at: Utc::now(),
        };

        let mut records = self.records.lock().await;
        records.insert(id, record);
        if self.max_records > 0 && records.len() > self.max_records {
            records.pop_first().map(|(evicted, _)| evicted)
        } else {
            None
        }
    }

    /// Look up the record stored under `id`.
    ///
    /// Returns `None` for identifiers that were never stored or have
    /// been evicted.
    pub async fn get(&self, id: SnapshotId) -> Option<SnapshotRecord> {
        self.records.lock().await.get(&id).cloned()
    }

    /// The most recently allocated record, if any.
    pub async fn latest(&self) -> Option<SnapshotRecord> {
        self.records
            .lock()
            .await
            .last_key_value()
            .map(|(_, record)| record.clone())
    }

    /// Number of records currently held.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::unbounded()
    }
}
