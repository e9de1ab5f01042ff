//! Paging data model: items, pages, load directions, boundary cursors.

use crate::{ItemId, PageCursor, SortKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A domain record in the paged collection.
///
/// The payload is opaque to the engine: it is carried between the
/// remote source and the cache store without interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Stable unique identifier.
    pub id: ItemId,
    /// Ordering key, monotonic within the collection.
    pub sort_key: SortKey,
    /// Opaque payload fields.
    pub payload: serde_json::Value,
}

impl Item {
    /// Create a new item.
    pub fn new(id: ItemId, sort_key: SortKey, payload: serde_json::Value) -> Self {
        Self {
            id,
            sort_key,
            payload,
        }
    }
}

/// An ordered sequence of items plus the cursors bounding it.
///
/// `None` for a cursor means the remote has no further data in that
/// direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// The items of this page, in collection order.
    pub items: Vec<Item>,
    /// Cursor for fetching the page before this one, if any.
    pub previous_cursor: Option<PageCursor>,
    /// Cursor for fetching the page after this one, if any.
    pub next_cursor: Option<PageCursor>,
}

impl Page {
    /// Create a new page.
    pub fn new(
        items: Vec<Item>,
        previous_cursor: Option<PageCursor>,
        next_cursor: Option<PageCursor>,
    ) -> Self {
        Self {
            items,
            previous_cursor,
            next_cursor,
        }
    }

    /// Create an empty page with no further data in either direction.
    pub fn end() -> Self {
        Self::new(Vec::new(), None, None)
    }

    /// Number of items in this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if this page carries no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The direction of a load operation against the remote source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadDirection {
    /// Replace the cached window with a fresh first page.
    Refresh,
    /// Extend the cached window towards the start of the collection.
    Prepend,
    /// Extend the cached window towards the end of the collection.
    Append,
}

impl LoadDirection {
    /// Stable lowercase name, used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadDirection::Refresh => "refresh",
            LoadDirection::Prepend => "prepend",
            LoadDirection::Append => "append",
        }
    }
}

impl fmt::Display for LoadDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The cursors marking the next unfetched position in each direction.
///
/// `None` on a side means either "remote reported no further data" or
/// "nothing loaded yet"; the mediator distinguishes the two by whether
/// a refresh has completed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundaryCursors {
    /// Cursor for the next prepend fetch, if any.
    pub previous: Option<PageCursor>,
    /// Cursor for the next append fetch, if any.
    pub next: Option<PageCursor>,
}

impl BoundaryCursors {
    /// Create boundary cursors from a page's bounds.
    pub fn new(previous: Option<PageCursor>, next: Option<PageCursor>) -> Self {
        Self { previous, next }
    }

    /// The cursor relevant to a boundary load in `direction`.
    ///
    /// Refresh loads never carry a cursor.
    pub fn cursor_for(&self, direction: LoadDirection) -> Option<&PageCursor> {
        match direction {
            LoadDirection::Refresh => None,
            LoadDirection::Prepend => self.previous.as_ref(),
            LoadDirection::Append => self.next.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, key: i64) -> Item {
        Item::new(
            ItemId::new(id),
            SortKey::new(key),
            serde_json::json!({ "name": id }),
        )
    }

    #[test]
    fn page_len_and_empty() {
        let page = Page::new(vec![item("a", 1), item("b", 2)], None, Some("c1".into()));
        assert_eq!(page.len(), 2);
        assert!(!page.is_empty());

        assert!(Page::end().is_empty());
        assert_eq!(Page::end().len(), 0);
    }

    #[test]
    fn end_page_has_no_cursors() {
        let page = Page::end();
        assert!(page.previous_cursor.is_none());
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn direction_names() {
        assert_eq!(LoadDirection::Refresh.as_str(), "refresh");
        assert_eq!(LoadDirection::Prepend.to_string(), "prepend");
        assert_eq!(LoadDirection::Append.to_string(), "append");
    }

    #[test]
    fn boundary_cursor_for_direction() {
        let bounds = BoundaryCursors::new(Some("p1".into()), Some("n1".into()));
        assert_eq!(
            bounds.cursor_for(LoadDirection::Prepend),
            Some(&PageCursor::new("p1"))
        );
        assert_eq!(
            bounds.cursor_for(LoadDirection::Append),
            Some(&PageCursor::new("n1"))
        );
        assert_eq!(bounds.cursor_for(LoadDirection::Refresh), None);
    }

    #[test]
    fn boundary_default_is_unloaded() {
        let bounds = BoundaryCursors::default();
        assert!(bounds.previous.is_none());
        assert!(bounds.next.is_none());
    }

    #[test]
    fn item_serde_roundtrip() {
        let original = item("row-7", 7);
        let json = serde_json::to_string(&original).unwrap();
        let restored: Item = serde_json::from_str(&json).unwrap();
        assert_eq!(original, restored);
    }
}
