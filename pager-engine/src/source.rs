//! Page source: the consumer-facing read path.
//!
//! A page source serves windowed reads from the cache store and, when
//! a window comes close to an unexhausted boundary, signals the sync
//! mediator to extend the window. The read path only ever touches
//! local storage: boundary loads are fire-and-forget commands, and the
//! caller gets the best-effort current snapshot immediately.

use crate::mediator::Command;
use pager_core::window::plan_window;
use pager_store::{CacheStore, StoreError};
use pager_types::{LoadDirection, PagingState};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Identifies a window of the paged view, in item offsets over the
/// cached collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadKey {
    /// First item offset of the window.
    pub offset: usize,
    /// Window length in items.
    pub limit: usize,
}

impl LoadKey {
    /// Create a load key.
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }
}

/// Serves paged reads from the cache store.
///
/// Created via [`crate::Pager::page_source`]. Any number of page
/// sources may read concurrently; none of them writes.
#[derive(Clone)]
pub struct PageSource {
    store: Arc<dyn CacheStore>,
    commands: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<PagingState>,
    prefetch_distance: usize,
    enable_placeholders: bool,
}

impl PageSource {
    pub(crate) fn new(
        store: Arc<dyn CacheStore>,
        commands: mpsc::UnboundedSender<Command>,
        state_rx: watch::Receiver<PagingState>,
        prefetch_distance: usize,
        enable_placeholders: bool,
    ) -> Self {
        Self {
            store,
            commands,
            state_rx,
            prefetch_distance,
            enable_placeholders,
        }
    }

    /// Load a window of the paged view.
    ///
    /// Reads the cache store first, always. If the window is within
    /// prefetch distance of an unexhausted boundary, the matching
    /// prepend/append is triggered on the mediator; the returned
    /// snapshot is the current best effort and is never delayed by
    /// network I/O.
    ///
    /// With placeholders enabled, offsets beyond the cached range are
    /// legal (the consumer is scrolling into not-yet-loaded rows) and
    /// drive an append themselves; with placeholders disabled the
    /// window is clamped to the cached range first.
    pub async fn load(&self, key: LoadKey) -> Result<PagingState, StoreError> {
        let cached = self.store.item_count().await?;

        let (offset, limit) = if self.enable_placeholders {
            (key.offset, key.limit)
        } else {
            let offset = key.offset.min(cached);
            let limit = key.limit.min(cached - offset);
            (offset, limit)
        };

        let state = self.state_rx.borrow().clone();
        let plan = plan_window(
            offset,
            limit,
            cached,
            self.prefetch_distance,
            state.end_reached_start,
            state.end_reached_end,
        );
        if plan.need_prepend {
            let _ = self.commands.send(Command::Load(LoadDirection::Prepend));
        }
        if plan.need_append {
            let _ = self.commands.send(Command::Load(LoadDirection::Append));
        }

        let items = self.store.read_window(offset, limit).await?;
        Ok(PagingState { items, ..state })
    }
}
