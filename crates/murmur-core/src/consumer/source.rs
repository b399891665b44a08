//! EventSource trait definition.

use std::pin::Pin;

use futures_util::Stream;
use murmur_types::error::StreamError;
use murmur_types::event::{Cursor, FeedFrame};

/// Ordered frames of one subscription. The stream ends (or yields an error)
/// when the connection is lost.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<FeedFrame, StreamError>> + Send + 'static>>;

/// A resumable feed of repository commit events.
///
/// Implementations live in murmur-infra (e.g., `JetstreamSource`).
pub trait EventSource: Send + Sync {
    /// Open a subscription starting at `cursor` (inclusive), or at the live
    /// tip when `None`.
    fn subscribe(
        &self,
        cursor: Option<Cursor>,
    ) -> impl std::future::Future<Output = Result<FrameStream, StreamError>> + Send;
}
