//! Sync mediator driver.
//!
//! The mediator is the single mutation path into the cache store. It
//! owns the pure load state machine from pager-core and interprets the
//! actions it produces: spawning remote fetches, applying page writes,
//! and publishing fresh [`PagingState`] snapshots on the watch channel.
//!
//! Fetches run on spawned tasks and report back over a completion
//! channel, so the driver loop itself never blocks on the network. It
//! never returns data to a caller directly; page sources observe its
//! effects through the store and the published snapshots.

use crate::remote::{FetchRequest, RemoteError, RemoteSource};
use pager_core::{LoadAction, LoadEvent, MediatorState, SnapshotGate};
use pager_store::{CacheStore, StoreError, WriteOutcome};
use pager_types::{Item, LoadDirection, LoadError, Page, PageCursor, PagingState, SyncEpoch};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Commands accepted by the mediator loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    /// Trigger a load in the given direction.
    Load(LoadDirection),
    /// Re-trigger a refresh, superseding in-flight boundary loads.
    Invalidate,
}

/// A finished remote fetch, reported back to the mediator loop.
struct Completion {
    direction: LoadDirection,
    epoch: SyncEpoch,
    result: Result<Page, RemoteError>,
}

/// The mediator driver task state.
pub(crate) struct SyncMediator {
    machine: MediatorState,
    gate: SnapshotGate,
    store: Arc<dyn CacheStore>,
    remote: Arc<dyn RemoteSource>,
    page_size: usize,
    state_tx: watch::Sender<PagingState>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl SyncMediator {
    pub(crate) fn new(
        store: Arc<dyn CacheStore>,
        remote: Arc<dyn RemoteSource>,
        page_size: usize,
        state_tx: watch::Sender<PagingState>,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            machine: MediatorState::new(),
            gate: SnapshotGate::new(),
            store,
            remote,
            page_size,
            state_tx,
            completions_tx,
            completions_rx,
        }
    }

    /// Run the mediator loop until the command channel closes.
    ///
    /// In-flight fetches are abandoned on shutdown; their results are
    /// never written.
    pub(crate) async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Load(direction)) => self.handle_trigger(direction).await,
                    Some(Command::Invalidate) => {
                        self.handle_trigger(LoadDirection::Refresh).await
                    }
                    None => {
                        tracing::debug!("pager dropped, stopping mediator");
                        break;
                    }
                },
                Some(done) = self.completions_rx.recv() => {
                    self.handle_completion(done).await
                }
            }
        }
    }

    async fn handle_trigger(&mut self, direction: LoadDirection) {
        // Join semantics are checked by the machine too, but checking
        // here skips the boundary-cursor read for in-flight directions.
        if self.machine.slot(direction).is_loading() {
            return;
        }

        let cursor = match direction {
            LoadDirection::Refresh => None,
            LoadDirection::Prepend | LoadDirection::Append => {
                match self.store.boundary_cursors().await {
                    Ok(bounds) => bounds.cursor_for(direction).cloned(),
                    Err(e) => {
                        tracing::warn!("boundary cursor read failed: {}", e);
                        let epoch = self.machine.epoch();
                        self.dispatch(LoadEvent::LoadFailed {
                            direction,
                            epoch,
                            error: LoadError::storage(direction, e.to_string()),
                        })
                        .await;
                        return;
                    }
                }
            }
        };

        self.dispatch(LoadEvent::Requested { direction, cursor }).await;
    }

    async fn handle_completion(&mut self, done: Completion) {
        let event = match done.result {
            Ok(page) => LoadEvent::FetchSucceeded {
                direction: done.direction,
                epoch: done.epoch,
                page,
            },
            Err(e) => {
                tracing::debug!("{} fetch failed: {}", done.direction, e);
                LoadEvent::LoadFailed {
                    direction: done.direction,
                    epoch: done.epoch,
                    error: LoadError::network(done.direction, e.to_string()),
                }
            }
        };
        self.dispatch(event).await;
    }

    /// Feed one event to the state machine and execute its actions.
    async fn dispatch(&mut self, event: LoadEvent) {
        let (machine, actions) = self.machine.clone().on_event(event);
        self.machine = machine;
        self.execute(actions).await;
    }

    /// Execute actions, including any follow-up actions produced by
    /// store write confirmations.
    async fn execute(&mut self, actions: Vec<LoadAction>) {
        let mut queue: VecDeque<LoadAction> = actions.into();
        while let Some(action) = queue.pop_front() {
            match action {
                LoadAction::Fetch {
                    direction,
                    cursor,
                    epoch,
                } => self.spawn_fetch(direction, cursor, epoch),
                LoadAction::Write {
                    direction,
                    page,
                    epoch,
                } => {
                    let follow_up = self.apply_write(direction, page, epoch).await;
                    let (machine, more) = self.machine.clone().on_event(follow_up);
                    self.machine = machine;
                    queue.extend(more);
                }
                LoadAction::DiscardStale { direction } => {
                    tracing::debug!("discarded stale {} result", direction);
                }
                LoadAction::EmitSnapshot => self.publish().await,
            }
        }
    }

    /// Spawn a fetch task; its result comes back as a [`Completion`].
    fn spawn_fetch(&self, direction: LoadDirection, cursor: Option<PageCursor>, epoch: SyncEpoch) {
        let remote = Arc::clone(&self.remote);
        let completions = self.completions_tx.clone();
        let request = FetchRequest {
            direction,
            cursor,
            page_size: self.page_size,
        };
        tracing::debug!("fetching {} page (epoch {})", direction, epoch);
        tokio::spawn(async move {
            let result = remote.fetch(request).await;
            let _ = completions.send(Completion {
                direction,
                epoch,
                result,
            });
        });
    }

    /// Apply a page write and report the outcome as a machine event.
    async fn apply_write(
        &self,
        direction: LoadDirection,
        page: Page,
        epoch: SyncEpoch,
    ) -> LoadEvent {
        let previous_cursor = page.previous_cursor.clone();
        let next_cursor = page.next_cursor.clone();
        match self.store.upsert_page(direction, page, epoch).await {
            Ok(WriteOutcome::Applied { items }) => {
                tracing::debug!("applied {} write of {} items (epoch {})", direction, items, epoch);
                LoadEvent::WriteApplied {
                    direction,
                    epoch,
                    previous_cursor,
                    next_cursor,
                }
            }
            Ok(WriteOutcome::StaleDiscarded) => LoadEvent::WriteDiscarded { direction },
            Err(e) => {
                tracing::warn!("{} write failed: {}", direction, e);
                LoadEvent::LoadFailed {
                    direction,
                    epoch,
                    error: LoadError::storage(direction, e.to_string()),
                }
            }
        }
    }

    /// Rebuild the snapshot from the store and publish it.
    async fn publish(&mut self) {
        let items = match self.read_all().await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("snapshot read failed: {}", e);
                return;
            }
        };
        let snapshot = self.machine.snapshot(items);
        if self.gate.admit(&snapshot) {
            self.state_tx.send_replace(snapshot);
        } else {
            tracing::warn!("suppressed snapshot regression (epoch {})", snapshot.epoch);
        }
    }

    async fn read_all(&self) -> Result<Vec<Item>, StoreError> {
        let count = self.store.item_count().await?;
        self.store.read_window(0, count).await
    }
}
