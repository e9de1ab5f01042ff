//! Consumer-visible paging state.

use crate::{Item, LoadDirection, SyncEpoch};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The failure class of a load annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadErrorKind {
    /// Transport, timeout or server failure from the remote source.
    Network,
    /// Cache store transaction failure.
    Storage,
}

impl LoadErrorKind {
    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadErrorKind::Network => "network",
            LoadErrorKind::Storage => "storage",
        }
    }
}

impl fmt::Display for LoadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A failed load, annotated on [`PagingState`] for the consumer.
///
/// Errors are additive: already-loaded data is never collapsed by a
/// failing direction.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{direction} load failed ({kind}): {message}")]
pub struct LoadError {
    /// The direction whose load failed.
    pub direction: LoadDirection,
    /// Whether the failure came from the remote or the store.
    pub kind: LoadErrorKind,
    /// Human-readable failure reason.
    pub message: String,
}

impl LoadError {
    /// Create a network load error.
    pub fn network(direction: LoadDirection, message: impl Into<String>) -> Self {
        Self {
            direction,
            kind: LoadErrorKind::Network,
            message: message.into(),
        }
    }

    /// Create a storage load error.
    pub fn storage(direction: LoadDirection, message: impl Into<String>) -> Self {
        Self {
            direction,
            kind: LoadErrorKind::Storage,
            message: message.into(),
        }
    }
}

/// The immutable consumer-visible snapshot of the paged view.
///
/// A new snapshot is built on every relevant cache store change;
/// snapshots are never mutated in place. Items are ordered by
/// `(sort_key, id)` and deduplicated by id. Snapshots observed by a
/// consumer are monotonically non-decreasing in [`SyncEpoch`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PagingState {
    /// The currently loaded items, in collection order.
    pub items: Vec<Item>,
    /// The refresh generation this snapshot belongs to.
    pub epoch: SyncEpoch,
    /// Whether the start of the remote collection has been reached.
    pub end_reached_start: bool,
    /// Whether the end of the remote collection has been reached.
    pub end_reached_end: bool,
    /// Whether a refresh is currently in flight.
    pub is_refreshing: bool,
    /// Failed loads, at most one entry per direction.
    pub load_errors: Vec<LoadError>,
}

impl PagingState {
    /// Number of loaded items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check whether no items are loaded.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The load error for a direction, if that direction is failed.
    pub fn error_for(&self, direction: LoadDirection) -> Option<&LoadError> {
        self.load_errors.iter().find(|e| e.direction == direction)
    }
}
