//! Stored snapshot records and the message pushed to subscribers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::SnapshotId;

/// Canonical serialized snapshot.
///
/// Shared rather than copied: the same allocation is held by the store
/// and by every in-flight push of that tick.
pub type Payload = Arc<str>;

/// One entry of the snapshot store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Identifier the record is stored under.
    pub id: SnapshotId,
    /// The canonical snapshot bytes, exactly as stored.
    #[serde(rename = "data")]
    pub payload: Payload,
    /// When the record was stored.
    pub created_at: DateTime<Utc>,
}

/// JSON message pushed to every subscriber once per tick.
///
/// Wire form: `{"id": <number>, "data": <string>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMessage {
    /// Identifier under which `data` can be retrieved.
    pub id: SnapshotId,
    /// The canonical snapshot, as a JSON string.
    pub data: Payload,
}

impl From<&SnapshotRecord> for SnapshotMessage {
    fn from(record: &SnapshotRecord) -> Self {
        Self {
            id: record.id,
            data: Arc::clone(&record.payload),
        }
    }
}
