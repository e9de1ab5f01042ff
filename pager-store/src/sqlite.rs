//! SQLite cache store backend.
//!
//! Uses WAL mode for concurrent reads during writes; every write runs
//! in a transaction so readers observe full pre- or post-state only.

use crate::{CacheStore, StoreError, WriteOutcome};
use async_trait::async_trait;
use pager_types::{BoundaryCursors, Item, ItemId, LoadDirection, Page, PageCursor, SortKey, SyncEpoch};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// SQLite-backed cache store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new SQLite store from a database path.
    ///
    /// Creates the database file if it doesn't exist.
    pub async fn new(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path.to_str().unwrap_or("pager.db"))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing).
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(":memory:")?
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run database migrations.
    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                id TEXT PRIMARY KEY,
                sort_key INTEGER NOT NULL,
                payload TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_items_sort ON items(sort_key, id)")
            .execute(&self.pool)
            .await?;

        // Single-row table holding the boundary cursors and the epoch
        // of the last adopted refresh generation.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS meta (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                epoch INTEGER NOT NULL,
                previous_cursor TEXT,
                next_cursor TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "INSERT OR IGNORE INTO meta (id, epoch, previous_cursor, next_cursor) VALUES (1, 0, NULL, NULL)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl CacheStore for SqliteStore {
    async fn upsert_page(
        &self,
        direction: LoadDirection,
        page: Page,
        epoch: SyncEpoch,
    ) -> Result<WriteOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let stored_epoch: i64 = sqlx::query_scalar("SELECT epoch FROM meta WHERE id = 1")
            .fetch_one(&mut *tx)
            .await?;
        let write_epoch = epoch.value() as i64;

        let stale = match direction {
            LoadDirection::Refresh => write_epoch < stored_epoch,
            LoadDirection::Prepend | LoadDirection::Append => write_epoch != stored_epoch,
        };
        if stale {
            tx.rollback().await?;
            tracing::debug!(
                "discarding stale {} write (epoch {} behind store epoch {})",
                direction,
                write_epoch,
                stored_epoch
            );
            return Ok(WriteOutcome::StaleDiscarded);
        }

        match direction {
            LoadDirection::Refresh => {
                sqlx::query("DELETE FROM items").execute(&mut *tx).await?;
                sqlx::query(
                    "UPDATE meta SET epoch = ?1, previous_cursor = ?2, next_cursor = ?3 WHERE id = 1",
                )
                .bind(write_epoch)
                .bind(page.previous_cursor.as_ref().map(|c| c.as_str()))
                .bind(page.next_cursor.as_ref().map(|c| c.as_str()))
                .execute(&mut *tx)
                .await?;
            }
            LoadDirection::Prepend => {
                sqlx::query("UPDATE meta SET previous_cursor = ?1 WHERE id = 1")
                    .bind(page.previous_cursor.as_ref().map(|c| c.as_str()))
                    .execute(&mut *tx)
                    .await?;
            }
            LoadDirection::Append => {
                sqlx::query("UPDATE meta SET next_cursor = ?1 WHERE id = 1")
                    .bind(page.next_cursor.as_ref().map(|c| c.as_str()))
                    .execute(&mut *tx)
                    .await?;
            }
        }

        let count = page.items.len();
        for item in &page.items {
            sqlx::query(
                r#"
                INSERT INTO items (id, sort_key, payload)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(id) DO UPDATE SET sort_key = excluded.sort_key, payload = excluded.payload
                "#,
            )
            .bind(item.id.as_str())
            .bind(item.sort_key.value())
            .bind(serde_json::to_string(&item.payload)?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(WriteOutcome::Applied { items: count })
    }

    async fn clear(&self, epoch: SyncEpoch) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM items").execute(&mut *tx).await?;
        sqlx::query(
            "UPDATE meta SET epoch = ?1, previous_cursor = NULL, next_cursor = NULL WHERE id = 1",
        )
        .bind(epoch.value() as i64)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn read_window(&self, offset: usize, limit: usize) -> Result<Vec<Item>, StoreError> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, sort_key, payload
            FROM items
            ORDER BY sort_key ASC, id ASC
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(limit.min(i64::MAX as usize) as i64)
        .bind(offset.min(i64::MAX as usize) as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|row| row.try_into()).collect()
    }

    async fn boundary_cursors(&self) -> Result<BoundaryCursors, StoreError> {
        let (previous, next) = sqlx::query_as::<_, (Option<String>, Option<String>)>(
            "SELECT previous_cursor, next_cursor FROM meta WHERE id = 1",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(BoundaryCursors::new(
            previous.map(PageCursor::new),
            next.map(PageCursor::new),
        ))
    }

    async fn item_count(&self) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}

/// Internal row type for SQLite queries.
#[derive(sqlx::FromRow)]
struct ItemRow {
    id: String,
    sort_key: i64,
    payload: String,
}

impl TryFrom<ItemRow> for Item {
    type Error = StoreError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(Item {
            id: ItemId::new(row.id),
            sort_key: SortKey::new(row.sort_key),
            payload: serde_json::from_str(&row.payload)?,
        })
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

    fn ids(items: &[Item]) -> Vec<String> {
        items.iter().map(|i| i.id.to_string()).collect()
    }

    async fn refreshed(store: &SqliteStore, items: Vec<Item>, next: Option<&str>) {
        let page = Page::new(items, None, next.map(PageCursor::new));
        store
            .upsert_page(LoadDirection::Refresh, page, SyncEpoch::new(1))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn starts_empty() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert_eq!(store.item_count().await.unwrap(), 0);
        assert_eq!(
            store.boundary_cursors().await.unwrap(),
            BoundaryCursors::default()
        );
    }

    #[tokio::test]
    async fn refresh_replaces_everything() {
        let store = SqliteStore::in_memory().await.unwrap();
        refreshed(&store, vec![item("a", 1), item("b", 2)], Some("c1")).await;

        let page = Page::new(vec![item("x", 10)], None, Some(PageCursor::new("c2")));
        store
            .upsert_page(LoadDirection::Refresh, page, SyncEpoch::new(2))
            .await
            .unwrap();

        let items = store.read_window(0, 10).await.unwrap();
        assert_eq!(ids(&items), vec!["x"]);
        let cursors = store.boundary_cursors().await.unwrap();
        assert_eq!(cursors.next, Some(PageCursor::new("c2")));
    }

    #[tokio::test]
    async fn no_two_items_share_an_id() {
        let store = SqliteStore::in_memory().await.unwrap();
        refreshed(&store, vec![item("a", 1), item("b", 2)], Some("c1")).await;

        let page = Page::new(vec![item("a", 5)], Some(PageCursor::new("c1")), None);
        store
            .upsert_page(LoadDirection::Append, page, SyncEpoch::new(1))
            .await
            .unwrap();

        let items = store.read_window(0, 10).await.unwrap();
        assert_eq!(items.len(), 2);
        // Last-seen wins: "a" moved to its new sort position.
        assert_eq!(ids(&items), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn read_window_is_ordered_and_windowed() {
        let store = SqliteStore::in_memory().await.unwrap();
        refreshed(
            &store,
            vec![item("b", 2), item("a", 2), item("c", 1)],
            None,
        )
        .await;

        // Sort key first, id as tie-break.
        let items = store.read_window(0, 10).await.unwrap();
        assert_eq!(ids(&items), vec!["c", "a", "b"]);

        let items = store.read_window(1, 1).await.unwrap();
        assert_eq!(ids(&items), vec!["a"]);
    }

    #[tokio::test]
    async fn stale_writes_are_discarded() {
        let store = SqliteStore::in_memory().await.unwrap();
        let page = Page::new(vec![item("new", 1)], None, Some(PageCursor::new("c1")));
        store
            .upsert_page(LoadDirection::Refresh, page, SyncEpoch::new(5))
            .await
            .unwrap();

        let stale_refresh = Page::new(vec![item("old", 1)], None, None);
        let outcome = store
            .upsert_page(LoadDirection::Refresh, stale_refresh, SyncEpoch::new(4))
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::StaleDiscarded);

        let stale_merge = Page::new(vec![item("z", 0)], None, Some(PageCursor::new("zz")));
        let outcome = store
            .upsert_page(LoadDirection::Append, stale_merge, SyncEpoch::new(4))
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::StaleDiscarded);

        let items = store.read_window(0, 10).await.unwrap();
        assert_eq!(ids(&items), vec!["new"]);
        assert_eq!(
            store.boundary_cursors().await.unwrap().next,
            Some(PageCursor::new("c1"))
        );
    }

    #[tokio::test]
    async fn boundary_cursor_updates_are_per_direction() {
        let store = SqliteStore::in_memory().await.unwrap();
        let page = Page::new(
            vec![item("b", 2)],
            Some(PageCursor::new("p1")),
            Some(PageCursor::new("n1")),
        );
        store
            .upsert_page(LoadDirection::Refresh, page, SyncEpoch::new(1))
            .await
            .unwrap();

        let page = Page::new(vec![item("a", 1)], None, Some(PageCursor::new("p1")));
        store
            .upsert_page(LoadDirection::Prepend, page, SyncEpoch::new(1))
            .await
            .unwrap();

        let cursors = store.boundary_cursors().await.unwrap();
        assert_eq!(cursors.previous, None);
        assert_eq!(cursors.next, Some(PageCursor::new("n1")));
    }

    #[tokio::test]
    async fn clear_removes_items_and_cursors() {
        let store = SqliteStore::in_memory().await.unwrap();
        refreshed(&store, vec![item("a", 1)], Some("c1")).await;

        store.clear(SyncEpoch::new(2)).await.unwrap();

        assert_eq!(store.item_count().await.unwrap(), 0);
        assert_eq!(
            store.boundary_cursors().await.unwrap(),
            BoundaryCursors::default()
        );
    }

    #[tokio::test]
    async fn payload_roundtrips_through_storage() {
        let store = SqliteStore::in_memory().await.unwrap();
        let original = Item::new(
            ItemId::new("rich"),
            SortKey::new(1),
            serde_json::json!({ "title": "hello", "tags": ["a", "b"], "rank": 3 }),
        );
        refreshed(&store, vec![original.clone()], None).await;

        let items = store.read_window(0, 1).await.unwrap();
        assert_eq!(items[0], original);
    }

    #[tokio::test]
    async fn file_backed_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pager.db");

        {
            let store = SqliteStore::new(&path).await.unwrap();
            refreshed(&store, vec![item("a", 1), item("b", 2)], Some("c1")).await;
        }

        let store = SqliteStore::new(&path).await.unwrap();
        assert_eq!(store.item_count().await.unwrap(), 2);
        assert_eq!(
            store.boundary_cursors().await.unwrap().next,
            Some(PageCursor::new("c1"))
        );
    }
}
