//! Snapshot identifiers.
//!
//! A [`SnapshotId`] is an opaque `u64` token allocated from a monotonic
//! counter. It serializes as a bare JSON number and renders in URLs as
//! plain decimal, so the browser client can build `/qr/{id}` directly
//! from a pushed message.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unique identifier for one stored snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(u64);

impl SnapshotId {
    /// Wrap a raw counter value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Return the inner counter value.
    pub const fn into_inner(self) -> u64 {
        self.0
    }

    /// The identifier that follows this one, or `None` on overflow.
    pub const fn checked_next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(next) => Some(Self(next)),
            None => None,
        }
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SnapshotId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<SnapshotId> for u64 {
    fn from(id: SnapshotId) -> Self {
        id.0
    }
}

/// A path segment that is not a decimal snapshot identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid snapshot id: {raw:?}")]
pub struct ParseSnapshotIdError {
    /// The rejected input.
    pub raw: String,
}

impl FromStr for SnapshotId {
    type Err = ParseSnapshotIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // One spelling per id: no sign and no leading zeros, both of which
        // u64::from_str would accept.
        let canonical = s == "0" || !s.starts_with('0');
        if s.is_empty() || !canonical || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseSnapshotIdError { raw: s.to_owned() });
        }
        s.parse::<u64>()
            .map(Self)
            .map_err(|_err| ParseSnapshotIdError { raw: s.to_owned() })
    }
}
