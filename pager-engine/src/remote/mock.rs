//! Mock remote source for testing.
//!
//! Allows queueing per-direction responses and capturing issued
//! requests for verification. A direction can additionally be held
//! behind a gate so a test can keep a fetch deterministically in
//! flight (for at-most-one-in-flight and stale-epoch scenarios).

use super::{FetchRequest, RemoteError, RemoteSource};
use async_trait::async_trait;
use pager_types::{LoadDirection, Page};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Mock remote source for testing.
///
/// Clones share the same scripted state.
#[derive(Debug, Clone, Default)]
pub struct MockRemoteSource {
    inner: Arc<Mutex<MockRemoteInner>>,
}

#[derive(Debug, Default)]
struct MockRemoteInner {
    responses: HashMap<LoadDirection, VecDeque<Result<Page, RemoteError>>>,
    held: HashSet<LoadDirection>,
    gates: HashMap<LoadDirection, Arc<Notify>>,
    requests: Vec<FetchRequest>,
}

impl MockRemoteInner {
    fn gate(&mut self, direction: LoadDirection) -> Arc<Notify> {
        Arc::clone(self.gates.entry(direction).or_default())
    }
}

impl MockRemoteSource {
    /// Create a new mock with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a page to be returned by the next fetch in `direction`.
    pub fn queue_page(&self, direction: LoadDirection, page: Page) {
        let mut inner = self.inner.lock().unwrap();
        inner.responses.entry(direction).or_default().push_back(Ok(page));
    }

    /// Queue an error to be returned by the next fetch in `direction`.
    pub fn queue_error(&self, direction: LoadDirection, error: RemoteError) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .responses
            .entry(direction)
            .or_default()
            .push_back(Err(error));
    }

    /// Hold fetches in `direction` behind a gate until released.
    ///
    /// The request is still recorded immediately; only the response is
    /// delayed.
    pub fn hold(&self, direction: LoadDirection) {
        let mut inner = self.inner.lock().unwrap();
        inner.held.insert(direction);
    }

    /// Let one held fetch in `direction` proceed.
    ///
    /// If no fetch is waiting yet, the permit is stored and the next
    /// held fetch passes straight through.
    pub fn release(&self, direction: LoadDirection) {
        let gate = {
            let mut inner = self.inner.lock().unwrap();
            inner.gate(direction)
        };
        gate.notify_one();
    }

    /// All requests issued so far, in order.
    pub fn requests(&self) -> Vec<FetchRequest> {
        let inner = self.inner.lock().unwrap();
        inner.requests.clone()
    }

    /// Total number of fetches issued.
    pub fn fetch_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.requests.len()
    }

    /// Number of fetches issued for a direction.
    pub fn fetches_for(&self, direction: LoadDirection) -> usize {
        let inner = self.inner.lock().unwrap();
        inner
            .requests
            .iter()
            .filter(|r| r.direction == direction)
            .count()
    }

    /// Clear all scripted state (responses, gates, recorded requests).
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockRemoteInner::default();
    }
}

#[async_trait]
impl RemoteSource for MockRemoteSource {
    async fn fetch(&self, request: FetchRequest) -> Result<Page, RemoteError> {
        let gate = {
            let mut inner = self.inner.lock().unwrap();
            inner.requests.push(request.clone());
            if inner.held.contains(&request.direction) {
                Some(inner.gate(request.direction))
            } else {
                None
            }
        };

        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut inner = self.inner.lock().unwrap();
        inner
            .responses
            .get_mut(&request.direction)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| {
                Err(RemoteError::Unreachable(format!(
                    "no scripted response for {}",
                    request.direction
                )))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pager_types::PageCursor;
    use std::time::Duration;

    fn request(direction: LoadDirection) -> FetchRequest {
        FetchRequest {
            direction,
            cursor: None,
            page_size: 20,
        }
    }

    #[tokio::test]
    async fn returns_queued_pages_in_order() {
        let mock = MockRemoteSource::new();
        mock.queue_page(
            LoadDirection::Refresh,
            Page::new(vec![], None, Some(PageCursor::new("c1"))),
        );
        mock.queue_page(LoadDirection::Refresh, Page::end());

        let first = mock.fetch(request(LoadDirection::Refresh)).await.unwrap();
        assert_eq!(first.next_cursor, Some(PageCursor::new("c1")));

        let second = mock.fetch(request(LoadDirection::Refresh)).await.unwrap();
        assert_eq!(second.next_cursor, None);
    }

    #[tokio::test]
    async fn queues_are_per_direction() {
        let mock = MockRemoteSource::new();
        mock.queue_page(LoadDirection::Append, Page::end());
        mock.queue_error(LoadDirection::Prepend, RemoteError::Timeout);

        assert!(mock.fetch(request(LoadDirection::Append)).await.is_ok());
        assert_eq!(
            mock.fetch(request(LoadDirection::Prepend)).await,
            Err(RemoteError::Timeout)
        );
    }

    #[tokio::test]
    async fn unscripted_fetch_fails_loudly() {
        let mock = MockRemoteSource::new();
        let result = mock.fetch(request(LoadDirection::Refresh)).await;
        assert!(matches!(result, Err(RemoteError::Unreachable(_))));
    }

    #[tokio::test]
    async fn records_requests() {
        let mock = MockRemoteSource::new();
        mock.queue_page(LoadDirection::Refresh, Page::end());
        mock.queue_page(LoadDirection::Append, Page::end());

        let _ = mock.fetch(request(LoadDirection::Refresh)).await;
        let _ = mock.fetch(request(LoadDirection::Append)).await;

        assert_eq!(mock.fetch_count(), 2);
        assert_eq!(mock.fetches_for(LoadDirection::Append), 1);
        assert_eq!(mock.requests()[0].direction, LoadDirection::Refresh);
    }

    #[tokio::test]
    async fn held_fetch_waits_until_released() {
        let mock = MockRemoteSource::new();
        mock.hold(LoadDirection::Append);
        mock.queue_page(LoadDirection::Append, Page::end());

        let fetcher = mock.clone();
        let handle = tokio::spawn(async move { fetcher.fetch(request(LoadDirection::Append)).await });

        // The request is recorded but the response is gated.
        tokio::time::timeout(Duration::from_millis(200), async {
            while mock.fetch_count() == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert!(!handle.is_finished());

        mock.release(LoadDirection::Append);
        let result = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn release_before_fetch_stores_permit() {
        let mock = MockRemoteSource::new();
        mock.hold(LoadDirection::Refresh);
        mock.queue_page(LoadDirection::Refresh, Page::end());
        mock.release(LoadDirection::Refresh);

        let result = tokio::time::timeout(
            Duration::from_secs(1),
            mock.fetch(request(LoadDirection::Refresh)),
        )
        .await
        .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn clones_share_state() {
        let mock = MockRemoteSource::new();
        let other = mock.clone();
        other.queue_page(LoadDirection::Refresh, Page::end());

        assert!(mock.fetch(request(LoadDirection::Refresh)).await.is_ok());
        assert_eq!(other.fetch_count(), 1);
    }

    #[tokio::test]
    async fn reset_clears_all() {
        let mock = MockRemoteSource::new();
        mock.queue_page(LoadDirection::Refresh, Page::end());
        let _ = mock.fetch(request(LoadDirection::Refresh)).await;
        mock.hold(LoadDirection::Append);

        mock.reset();

        assert_eq!(mock.fetch_count(), 0);
        // Held directions are forgotten too.
        mock.queue_page(LoadDirection::Append, Page::end());
        let result = tokio::time::timeout(
            Duration::from_secs(1),
            mock.fetch(request(LoadDirection::Append)),
        )
        .await
        .unwrap();
        assert!(result.is_ok());
    }
}
