//! Identity and ordering types for PageSync.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The stable unique identifier of an item in the remote collection.
///
/// Assigned by the remote source; the engine never interprets it beyond
/// equality and tie-break ordering. An `ItemId` uniquely determines an
/// item in the cache store at any instant.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(String);

impl ItemId {
    /// Create an ItemId from a remote-assigned identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// An item's ordering key, monotonic within the remote collection.
///
/// Sort keys order the cached window; ties are broken by [`ItemId`] so
/// that read order is total and stable across calls.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct SortKey(i64);

impl SortKey {
    /// Create a new SortKey with the given value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the numeric value of this SortKey.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SortKey({})", self.0)
    }
}

/// An opaque token representing a position in the remote collection.
///
/// Produced and consumed only by the remote source and the sync
/// mediator; the page source never inspects one. `Option<PageCursor>`
/// with `None` is the "no further data in this direction" sentinel.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageCursor(String);

impl PageCursor {
    /// Create a PageCursor from a remote-issued token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageCursor({})", self.0)
    }
}

impl From<&str> for PageCursor {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A monotonically increasing counter distinguishing successive refresh
/// generations.
///
/// Bumped on every refresh. A prepend/append result computed under
/// epoch N whose result arrives after epoch N+1 has begun is discarded;
/// the epoch is the sole cancellation primitive in the engine.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct SyncEpoch(u64);

impl SyncEpoch {
    /// Create a new SyncEpoch with the given value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the numeric value of this SyncEpoch.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Create a SyncEpoch representing "no refresh has happened yet".
    pub fn zero() -> Self {
        Self(0)
    }

    /// Increment the epoch by one.
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for SyncEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for SyncEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SyncEpoch({})", self.0)
    }
}
