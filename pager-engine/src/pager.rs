//! Pager: the top-level orchestrator.
//!
//! A [`Pager`] owns the paging configuration, wires the page source
//! and sync mediator together, and produces a live, invalidatable
//! paged view over the cache store.

use crate::mediator::{Command, SyncMediator};
use crate::remote::RemoteSource;
use crate::source::PageSource;
use pager_store::CacheStore;
use pager_types::{LoadDirection, PagingState};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

/// Pager configuration.
///
/// An explicit immutable struct passed to [`Pager::new`]; there is no
/// ambient configuration.
#[derive(Debug, Clone)]
pub struct PagerConfig {
    /// Number of items requested per remote fetch. Must be positive.
    pub page_size: usize,
    /// How many items short of a boundary a window read may come
    /// before the next page is requested.
    pub prefetch_distance: usize,
    /// Whether page sources may address not-yet-loaded offsets.
    pub enable_placeholders: bool,
}

impl PagerConfig {
    /// Create a configuration with the given page size.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            prefetch_distance: 0,
            enable_placeholders: false,
        }
    }

    /// Set the prefetch distance.
    pub fn with_prefetch_distance(mut self, distance: usize) -> Self {
        self.prefetch_distance = distance;
        self
    }

    /// Enable or disable placeholder addressing.
    pub fn with_placeholders(mut self, enabled: bool) -> Self {
        self.enable_placeholders = enabled;
        self
    }
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PagerConfigError {
    /// The page size was zero.
    #[error("page size must be greater than zero")]
    InvalidPageSize,
}

/// The top-level paged view.
///
/// Construction spawns the mediator task and triggers an initial
/// refresh; dropping the pager closes the command channel and winds
/// the mediator down (in-flight fetch results are abandoned).
///
/// Must be created inside a tokio runtime.
pub struct Pager {
    config: PagerConfig,
    store: Arc<dyn CacheStore>,
    commands: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<PagingState>,
}

impl Pager {
    /// Create a pager over the given store and remote source.
    ///
    /// Triggers an initial refresh immediately.
    pub fn new(
        config: PagerConfig,
        store: Arc<dyn CacheStore>,
        remote: Arc<dyn RemoteSource>,
    ) -> Result<Self, PagerConfigError> {
        if config.page_size == 0 {
            return Err(PagerConfigError::InvalidPageSize);
        }

        let (state_tx, state_rx) = watch::channel(PagingState::default());
        let (commands, commands_rx) = mpsc::unbounded_channel();

        let mediator =
            SyncMediator::new(Arc::clone(&store), remote, config.page_size, state_tx);
        tokio::spawn(mediator.run(commands_rx));

        let _ = commands.send(Command::Load(LoadDirection::Refresh));

        Ok(Self {
            config,
            store,
            commands,
            state_rx,
        })
    }

    /// Subscribe to paging snapshots.
    ///
    /// The stream is infinite and restartable: every new subscription
    /// starts from the latest snapshot. Intermediate snapshots may be
    /// conflated; epochs never go backwards.
    pub fn observe(&self) -> watch::Receiver<PagingState> {
        self.state_rx.clone()
    }

    /// The latest published snapshot.
    pub fn current_state(&self) -> PagingState {
        self.state_rx.borrow().clone()
    }

    /// Trigger a load in the given direction.
    ///
    /// A direction already in flight is joined, not duplicated.
    pub fn load_more(&self, direction: LoadDirection) {
        let _ = self.commands.send(Command::Load(direction));
    }

    /// Re-trigger a refresh, superseding any in-flight boundary loads.
    pub fn invalidate(&self) {
        let _ = self.commands.send(Command::Invalidate);
    }

    /// Create a page source serving windowed reads over this view.
    pub fn page_source(&self) -> PageSource {
        PageSource::new(
            Arc::clone(&self.store),
            self.commands.clone(),
            self.state_rx.clone(),
            self.config.prefetch_distance,
            self.config.enable_placeholders,
        )
    }

    /// The pager's configuration.
    pub fn config(&self) -> &PagerConfig {
        &self.config
    }
}
