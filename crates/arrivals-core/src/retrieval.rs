//! Read path from an identifier to a stored snapshot.
//!
//! Rendering the payload (QR image, JSON view) and choosing response
//! headers belong to the caller. This module only guarantees that what
//! comes back is byte-for-byte what the broadcast loop stored.

use arrivals_types::{SnapshotId, SnapshotRecord};

use crate::store::SnapshotStore;

/// Errors returned by [`SnapshotRetrieval`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetrievalError {
    /// No record is stored under the requested identifier.
    #[error("snapshot not found: {0}")]
    NotFound(String),
}

/// Lookups against a [`SnapshotStore`].
pub struct SnapshotRetrieval<'a> {
    store: &'a SnapshotStore,
}

impl<'a> SnapshotRetrieval<'a> {
    /// Create a retrieval view over `store`.
    pub const fn new(store: &'a SnapshotStore) -> Self {
        Self { store }
    }

    /// Resolve an identifier to its stored record.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::NotFound`] if nothing is stored under `id`.
    pub async fn resolve(&self, id: SnapshotId) -> Result<SnapshotRecord, RetrievalError> {
        self.store
            .get(id)
            .await
            .ok_or_else(|| RetrievalError::NotFound(id.to_string()))
    }

    /// Resolve a raw path segment.
    ///
    /// A segment that is not a decimal identifier cannot name a stored
    /// record, so it is reported as not found rather than as bad input.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::NotFound`] if `raw` does not parse or
    /// nothing is stored under it.
    pub async fn resolve_raw(&self, raw: &str) -> Result<SnapshotRecord, RetrievalError> {
        let id: SnapshotId = raw
            .parse()
            .map_err(|_err| RetrievalError::NotFound(raw.to_owned()))?;
        self.resolve(id).await
    }

    /// The newest stored record.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::NotFound`] before the first tick.
    pub async fn latest(&self) -> Result<SnapshotRecord, RetrievalError> {
        self.store
            .latest()
            .await
            .ok_or_else(|| RetrievalError::NotFound("latest".to_owned()))
    }
}
