//! Snapshot freshness gate.
//!
//! Consumers must observe paging snapshots monotonically non-decreasing
//! in epoch: once data from epoch N has been published, nothing older
//! than N may follow. The mediator is single-writer so regressions
//! should not arise, but the gate encodes the guarantee explicitly and
//! keeps it testable.

use pager_types::{PagingState, SyncEpoch};

/// Admits snapshots in non-decreasing epoch order.
#[derive(Debug, Clone, Default)]
pub struct SnapshotGate {
    last_epoch: SyncEpoch,
}

impl SnapshotGate {
    /// Create a gate that has published nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a snapshot against the last admitted epoch.
    ///
    /// Returns `true` and advances the gate if the snapshot is at least
    /// as fresh as everything admitted before it; returns `false` for a
    /// regression, which the caller must suppress.
    pub fn admit(&mut self, snapshot: &PagingState) -> bool {
        if snapshot.epoch < self.last_epoch {
            return false;
        }
        self.last_epoch = snapshot.epoch;
        true
    }

    /// The epoch of the freshest admitted snapshot.
    pub fn last_epoch(&self) -> SyncEpoch {
        self.last_epoch
    }
}
