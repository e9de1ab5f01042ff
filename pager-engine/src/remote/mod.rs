//! Remote source abstraction for PageSync.
//!
//! This module provides the seam between the engine and whatever
//! transport the embedding application uses (HTTP, RPC, mock for
//! testing). The engine only ever asks for one page at a time and
//! treats the returned page as opaque once decoded; serialization is
//! the implementation's concern.
//!
//! Implementations must be idempotent-safe to retry: the mediator may
//! re-issue a fetch for the same cursor after a failure is retried by
//! the consumer.

mod mock;

pub use mock::MockRemoteSource;

use async_trait::async_trait;
use pager_types::{LoadDirection, Page, PageCursor};
use thiserror::Error;

/// Remote source errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// The remote could not be reached.
    #[error("remote unreachable: {0}")]
    Unreachable(String),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The remote answered with a failure status.
    #[error("server error {status}: {message}")]
    Server {
        /// Status code reported by the remote.
        status: u16,
        /// Failure detail.
        message: String,
    },

    /// The response could not be decoded into a page.
    #[error("decode error: {0}")]
    Decode(String),
}

/// A request for one page of the remote collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// The load direction this fetch serves.
    pub direction: LoadDirection,
    /// The cursor to fetch from; `None` for a refresh.
    pub cursor: Option<PageCursor>,
    /// Maximum number of items to return.
    pub page_size: usize,
}

/// Trait for remote page sources.
///
/// Implementations wrap the application's transport (e.g. JSON over
/// HTTPS). No state is retained between calls from the engine's
/// perspective.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch one page for the given request.
    async fn fetch(&self, request: FetchRequest) -> Result<Page, RemoteError>;
}
