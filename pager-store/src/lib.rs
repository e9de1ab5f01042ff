//! # pager-store
//!
//! Cache store backends for PageSync.
//!
//! The cache store is the single durable home of paged items and their
//! boundary cursors: pure storage, no policy. All writes come from the
//! sync mediator; page sources only read. Two backends are provided:
//!
//! - [`MemoryStore`] - lock-protected in-memory store
//! - [`SqliteStore`] - SQLite-backed store (WAL mode, transactional writes)

#![warn(missing_docs)]
#![warn(clippy::all)]

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use pager_types::{BoundaryCursors, Item, LoadDirection, Page, SyncEpoch};
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Payload (de)serialization failed.
    #[error("payload encoding error: {0}")]
    Payload(#[from] serde_json::Error),

    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

/// The result of a page write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The write was applied.
    Applied {
        /// Number of items inserted or replaced.
        items: usize,
    },
    /// The write belonged to an older refresh generation and was
    /// discarded without mutating the store. Bookkeeping, not an error.
    StaleDiscarded,
}

/// Trait for cache store backends.
///
/// Writers are serialized by the mediator; readers may call
/// [`read_window`](CacheStore::read_window) concurrently without
/// synchronization. Every write must be observed atomically: a reader
/// sees either the full pre-state or the full post-state, never a
/// cleared-but-unpopulated store.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Insert or replace a page of items, deduplicated by id
    /// (last-seen wins: a replaced item's old sort position is removed).
    ///
    /// For [`LoadDirection::Refresh`] this clears the store, inserts
    /// the page and sets both boundary cursors in one transaction,
    /// adopting `epoch` as the store's generation. For prepend/append
    /// it merges the items and updates only that direction's boundary
    /// cursor.
    ///
    /// A write carrying an epoch older than the store's generation is
    /// discarded ([`WriteOutcome::StaleDiscarded`]).
    async fn upsert_page(
        &self,
        direction: LoadDirection,
        page: Page,
        epoch: SyncEpoch,
    ) -> Result<WriteOutcome, StoreError>;

    /// Remove all items and boundary cursors, adopting `epoch`.
    async fn clear(&self, epoch: SyncEpoch) -> Result<(), StoreError>;

    /// Read a window of items in `(sort_key, id)` order. Pure read.
    async fn read_window(&self, offset: usize, limit: usize) -> Result<Vec<Item>, StoreError>;

    /// The cursors marking the next unfetched position per direction.
    async fn boundary_cursors(&self) -> Result<BoundaryCursors, StoreError>;

    /// Number of items currently cached.
    async fn item_count(&self) -> Result<usize, StoreError>;
}
