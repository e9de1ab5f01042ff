//! # pager-engine
//!
//! Paged-cache synchronization engine for PageSync.
//!
//! This is the main library that applications embed to keep a locally
//! cached, cursor-paginated view of a remote collection consistent
//! while forward/backward paging and background refresh run
//! concurrently.
//!
//! # Architecture
//!
//! The engine uses a pure state machine (from pager-core) for load
//! coordination and interprets its actions to perform actual I/O
//! against the [`RemoteSource`] and [`pager_store::CacheStore`] traits.
//!
//! ```text
//! Consumer → Pager → SyncMediator → RemoteSource → network
//!              ↓           ↓
//!         PageSource → CacheStore → disk/memory
//! ```
//!
//! The mediator never returns data to the caller directly; it only
//! mutates the cache store and publishes a fresh [`pager_types::PagingState`]
//! snapshot, which page sources and subscribers then observe.
//!
//! # Example
//!
//! ```ignore
//! use pager_engine::{Pager, PagerConfig, MockRemoteSource};
//! use pager_store::MemoryStore;
//! use std::sync::Arc;
//!
//! let config = PagerConfig::new(20).with_prefetch_distance(5);
//! let pager = Pager::new(config, Arc::new(MemoryStore::new()), Arc::new(remote))?;
//!
//! let mut states = pager.observe();
//! while states.changed().await.is_ok() {
//!     let state = states.borrow().clone();
//!     render(state);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod mediator;
pub mod pager;
pub mod remote;
pub mod source;

pub use pager::{Pager, PagerConfig, PagerConfigError};
pub use remote::{FetchRequest, MockRemoteSource, RemoteError, RemoteSource};
pub use source::{LoadKey, PageSource};
