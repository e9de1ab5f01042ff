//! # pager-types
//!
//! Foundational types for the PageSync paged-cache synchronization engine.
//!
//! This crate provides the types shared by all PageSync crates:
//! - [`ItemId`], [`SortKey`], [`PageCursor`], [`SyncEpoch`] - Identity and ordering types
//! - [`Item`], [`Page`], [`LoadDirection`], [`BoundaryCursors`] - Paging data model
//! - [`PagingState`], [`LoadError`] - Consumer-visible snapshot and load annotations

#![warn(missing_docs)]
#![warn(clippy::all)]

mod ids;
mod page;
mod paging;

pub use ids::{ItemId, PageCursor, SortKey, SyncEpoch};
pub use page::{BoundaryCursors, Item, LoadDirection, Page};
pub use paging::{LoadError, LoadErrorKind, PagingState};
