//! In-memory cache store.
//!
//! The reference backend: a single `RwLock` guards all state, so every
//! trait method is one critical section and readers observe full pre-
//! or post-state only.

use crate::{CacheStore, StoreError, WriteOutcome};
use async_trait::async_trait;
use pager_types::{BoundaryCursors, Item, ItemId, LoadDirection, Page, SortKey, SyncEpoch};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

/// In-memory cache store.
///
/// Clones share the same underlying storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    epoch: SyncEpoch,
    /// Items keyed by `(sort_key, id)` so iteration is read order.
    items: BTreeMap<(SortKey, ItemId), Item>,
    /// Id → sort key, for last-seen-wins replacement.
    index: HashMap<ItemId, SortKey>,
    cursors: BoundaryCursors,
}

impl MemoryInner {
    /// Insert an item, removing any previous sort position for its id.
    fn insert(&mut self, item: Item) {
        if let Some(old_key) = self.index.remove(&item.id) {
            self.items.remove(&(old_key, item.id.clone()));
        }
        self.index.insert(item.id.clone(), item.sort_key);
        self.items.insert((item.sort_key, item.id.clone()), item);
    }

    fn reset(&mut self, epoch: SyncEpoch) {
        self.items.clear();
        self.index.clear();
        self.cursors = BoundaryCursors::default();
        self.epoch = epoch;
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn upsert_page(
        &self,
        direction: LoadDirection,
        page: Page,
        epoch: SyncEpoch,
    ) -> Result<WriteOutcome, StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;

        match direction {
            LoadDirection::Refresh => {
                if epoch < inner.epoch {
                    tracing::debug!("discarding stale refresh write (epoch {epoch})");
                    return Ok(WriteOutcome::StaleDiscarded);
                }
                inner.reset(epoch);
                inner.cursors =
                    BoundaryCursors::new(page.previous_cursor.clone(), page.next_cursor.clone());
            }
            LoadDirection::Prepend => {
                // A merge for a different generation is not ours to apply.
                if epoch != inner.epoch {
                    tracing::debug!("discarding stale prepend write (epoch {epoch})");
                    return Ok(WriteOutcome::StaleDiscarded);
                }
                inner.cursors.previous = page.previous_cursor.clone();
            }
            LoadDirection::Append => {
                if epoch != inner.epoch {
                    tracing::debug!("discarding stale append write (epoch {epoch})");
                    return Ok(WriteOutcome::StaleDiscarded);
                }
                inner.cursors.next = page.next_cursor.clone();
            }
        }

        let count = page.items.len();
        for item in page.items {
            inner.insert(item);
        }
        Ok(WriteOutcome::Applied { items: count })
    }

    async fn clear(&self, epoch: SyncEpoch) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        inner.reset(epoch);
        Ok(())
    }

    async fn read_window(&self, offset: usize, limit: usize) -> Result<Vec<Item>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner
            .items
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn boundary_cursors(&self) -> Result<BoundaryCursors, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.cursors.clone())
    }

    async fn item_count(&self) -> Result<usize, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.items.len())
    }
}
