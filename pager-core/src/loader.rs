//! Load state machine for the sync mediator.
//!
//! This module provides a pure, side-effect-free state machine for
//! coordinating refresh/prepend/append loads against a remote source.
//! The machine takes events as input and produces a new state plus a
//! list of actions to execute.
//!
//! The actual I/O (fetching pages, writing the cache store) is
//! performed by pager-engine, not by this module. This enables instant
//! unit testing without network or storage mocks.
//!
//! Each direction has its own state slot, so the three directions load
//! concurrently with respect to each other but serially within a
//! direction: a request for a direction that is already loading joins
//! the in-flight result instead of issuing a duplicate fetch.

use pager_types::{Item, LoadDirection, LoadError, Page, PageCursor, PagingState, SyncEpoch};

/// The state of one load direction.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    /// No load has run, or the last result was discarded as stale.
    Idle,
    /// A fetch (and its store write) is in flight.
    Loading,
    /// The last load completed and its result was applied.
    Success,
    /// The last load failed; a new request is accepted as a retry.
    Error(LoadError),
}

impl LoadState {
    /// Check if a load is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Check if the last load failed.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Events consumed by the mediator state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    /// A load was requested for a direction.
    ///
    /// For prepend/append the caller supplies the current boundary
    /// cursor read from the cache store; refresh requests carry `None`.
    Requested {
        /// The requested direction.
        direction: LoadDirection,
        /// Boundary cursor for prepend/append, `None` for refresh or
        /// an exhausted boundary.
        cursor: Option<PageCursor>,
    },
    /// A remote fetch completed with a page.
    FetchSucceeded {
        /// The direction that was fetched.
        direction: LoadDirection,
        /// The epoch the fetch was started under.
        epoch: SyncEpoch,
        /// The fetched page.
        page: Page,
    },
    /// A fetch or store write failed.
    LoadFailed {
        /// The direction that failed.
        direction: LoadDirection,
        /// The epoch the load was started under.
        epoch: SyncEpoch,
        /// The failure, network or storage.
        error: LoadError,
    },
    /// The cache store applied a page write.
    WriteApplied {
        /// The direction that was written.
        direction: LoadDirection,
        /// The epoch the load was started under.
        epoch: SyncEpoch,
        /// The written page's previous cursor (`None` = start reached).
        previous_cursor: Option<PageCursor>,
        /// The written page's next cursor (`None` = end reached).
        next_cursor: Option<PageCursor>,
    },
    /// The cache store discarded a page write as stale.
    WriteDiscarded {
        /// The direction whose write was discarded.
        direction: LoadDirection,
    },
}

/// Actions to be executed by pager-engine.
///
/// These are instructions, not side effects. The mediator driver
/// interprets these and performs the actual I/O.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadAction {
    /// Fetch a page from the remote source.
    Fetch {
        /// The direction to fetch.
        direction: LoadDirection,
        /// The cursor to fetch from (`None` for refresh).
        cursor: Option<PageCursor>,
        /// The epoch this fetch belongs to.
        epoch: SyncEpoch,
    },
    /// Write a page into the cache store.
    ///
    /// For refresh this is the store's atomic clear-and-insert; for
    /// prepend/append it is a merge plus boundary-cursor update.
    Write {
        /// The direction being written.
        direction: LoadDirection,
        /// The page to write.
        page: Page,
        /// The epoch this write belongs to.
        epoch: SyncEpoch,
    },
    /// A stale result was discarded; nothing was written.
    DiscardStale {
        /// The direction whose result was discarded.
        direction: LoadDirection,
    },
    /// Rebuild the paging snapshot from the store and publish it.
    EmitSnapshot,
}

/// Mediator state machine - NO I/O, just state transitions.
///
/// One state slot per direction plus the current [`SyncEpoch`] and the
/// end-of-data flags. Refresh always wins: bumping the epoch makes any
/// in-flight boundary result inert.
#[derive(Debug, Clone, PartialEq)]
pub struct MediatorState {
    epoch: SyncEpoch,
    initialized: bool,
    refresh: LoadState,
    prepend: LoadState,
    append: LoadState,
    end_reached_start: bool,
    end_reached_end: bool,
}

impl MediatorState {
    /// Create a new state machine with all directions idle.
    pub fn new() -> Self {
        Self {
            epoch: SyncEpoch::zero(),
            initialized: false,
            refresh: LoadState::Idle,
            prepend: LoadState::Idle,
            append: LoadState::Idle,
            end_reached_start: false,
            end_reached_end: false,
        }
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// This is a pure function - no side effects. The caller
    /// (pager-engine) is responsible for executing the returned actions.
    pub fn on_event(mut self, event: LoadEvent) -> (Self, Vec<LoadAction>) {
        match event {
            LoadEvent::Requested { direction, cursor } => self.on_requested(direction, cursor),

            LoadEvent::FetchSucceeded {
                direction,
                epoch,
                page,
            } => {
                if epoch != self.epoch {
                    return self.discard(direction);
                }
                match direction {
                    LoadDirection::Refresh => (
                        self,
                        vec![LoadAction::Write {
                            direction,
                            page,
                            epoch,
                        }],
                    ),
                    LoadDirection::Prepend | LoadDirection::Append => {
                        if page.is_empty() {
                            // Empty boundary page means end-of-data.
                            self.set_end_reached(direction);
                            *self.slot_mut(direction) = LoadState::Success;
                            (self, vec![LoadAction::EmitSnapshot])
                        } else {
                            (
                                self,
                                vec![LoadAction::Write {
                                    direction,
                                    page,
                                    epoch,
                                }],
                            )
                        }
                    }
                }
            }

            LoadEvent::LoadFailed {
                direction,
                epoch,
                error,
            } => {
                if epoch != self.epoch {
                    return self.discard(direction);
                }
                *self.slot_mut(direction) = LoadState::Error(error);
                (self, vec![LoadAction::EmitSnapshot])
            }

            LoadEvent::WriteApplied {
                direction,
                epoch,
                previous_cursor,
                next_cursor,
            } => {
                if epoch != self.epoch {
                    return self.discard(direction);
                }
                match direction {
                    LoadDirection::Refresh => {
                        self.initialized = true;
                        self.end_reached_start = previous_cursor.is_none();
                        self.end_reached_end = next_cursor.is_none();
                        self.refresh = LoadState::Success;
                        // A new generation starts clean: failed boundary
                        // slots no longer describe the cached window.
                        if self.prepend.is_error() {
                            self.prepend = LoadState::Idle;
                        }
                        if self.append.is_error() {
                            self.append = LoadState::Idle;
                        }
                    }
                    LoadDirection::Prepend => {
                        self.end_reached_start = previous_cursor.is_none();
                        self.prepend = LoadState::Success;
                    }
                    LoadDirection::Append => {
                        self.end_reached_end = next_cursor.is_none();
                        self.append = LoadState::Success;
                    }
                }
                (self, vec![LoadAction::EmitSnapshot])
            }

            LoadEvent::WriteDiscarded { direction } => self.discard(direction),
        }
    }

    fn on_requested(
        mut self,
        direction: LoadDirection,
        cursor: Option<PageCursor>,
    ) -> (Self, Vec<LoadAction>) {
        // Join semantics: a direction already loading attaches to the
        // in-flight result rather than issuing a duplicate fetch.
        if self.slot(direction).is_loading() {
            return (self, vec![]);
        }

        match direction {
            LoadDirection::Refresh => {
                self.epoch = self.epoch.next();
                self.refresh = LoadState::Loading;
                let epoch = self.epoch;
                (
                    self,
                    vec![
                        LoadAction::Fetch {
                            direction,
                            cursor: None,
                            epoch,
                        },
                        LoadAction::EmitSnapshot,
                    ],
                )
            }
            LoadDirection::Prepend | LoadDirection::Append => {
                // There is no window to extend before the first refresh.
                if !self.initialized {
                    return (self, vec![]);
                }
                if self.end_reached(direction) || cursor.is_none() {
                    // End-of-data short-circuit: no fetch.
                    self.set_end_reached(direction);
                    *self.slot_mut(direction) = LoadState::Success;
                    return (self, vec![LoadAction::EmitSnapshot]);
                }
                *self.slot_mut(direction) = LoadState::Loading;
                let epoch = self.epoch;
                (
                    self,
                    vec![
                        LoadAction::Fetch {
                            direction,
                            cursor,
                            epoch,
                        },
                        LoadAction::EmitSnapshot,
                    ],
                )
            }
        }
    }

    fn discard(mut self, direction: LoadDirection) -> (Self, Vec<LoadAction>) {
        *self.slot_mut(direction) = LoadState::Idle;
        (
            self,
            vec![
                LoadAction::DiscardStale { direction },
                LoadAction::EmitSnapshot,
            ],
        )
    }

    /// The current refresh generation.
    pub fn epoch(&self) -> SyncEpoch {
        self.epoch
    }

    /// Whether the first refresh has been applied.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether a refresh is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_loading()
    }

    /// Whether the start of the collection has been reached.
    pub fn end_reached_start(&self) -> bool {
        self.end_reached_start
    }

    /// Whether the end of the collection has been reached.
    pub fn end_reached_end(&self) -> bool {
        self.end_reached_end
    }

    /// The state slot for a direction.
    pub fn slot(&self, direction: LoadDirection) -> &LoadState {
        match direction {
            LoadDirection::Refresh => &self.refresh,
            LoadDirection::Prepend => &self.prepend,
            LoadDirection::Append => &self.append,
        }
    }

    /// The load errors currently annotated, at most one per direction.
    pub fn load_errors(&self) -> Vec<LoadError> {
        [&self.refresh, &self.prepend, &self.append]
            .into_iter()
            .filter_map(|slot| match slot {
                LoadState::Error(e) => Some(e.clone()),
                _ => None,
            })
            .collect()
    }

    /// Assemble a consumer-visible snapshot from this state and the
    /// items currently in the cache store.
    pub fn snapshot(&self, items: Vec<Item>) -> PagingState {
        PagingState {
            items,
            epoch: self.epoch,
            end_reached_start: self.end_reached_start,
            end_reached_end: self.end_reached_end,
            is_refreshing: self.is_refreshing(),
            load_errors: self.load_errors(),
        }
    }

    fn slot_mut(&mut self, direction: LoadDirection) -> &mut LoadState {
        match direction {
            LoadDirection::Refresh => &mut self.refresh,
            LoadDirection::Prepend => &mut self.prepend,
            LoadDirection::Append => &mut self.append,
        }
    }

    fn end_reached(&self, direction: LoadDirection) -> bool {
        match direction {
            LoadDirection::Refresh => false,
            LoadDirection::Prepend => self.end_reached_start,
            LoadDirection::Append => self.end_reached_end,
        }
    }

    fn set_end_reached(&mut self, direction: LoadDirection) {
        match direction {
            LoadDirection::Refresh => {}
            LoadDirection::Prepend => self.end_reached_start = true,
            LoadDirection::Append => self.end_reached_end = true,
        }
    }
}

impl Default for MediatorState {
    fn default() -> Self {
        Self::new()
    }
}
