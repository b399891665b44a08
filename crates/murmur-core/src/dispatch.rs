//! Routing of commit events to per-collection handlers.

use murmur_types::error::{DecodeError, DispatchError};
use murmur_types::event::{CommitEvent, Operation};
use murmur_types::post::RecordKind;
use tracing::{debug, info, warn};

use crate::eligibility::{Decision, EligibilityFilter, SkipReason};
use crate::queue::{QueueError, ReplySender};

/// Handles events for one record kind.
///
/// Called synchronously from the consumer loop, so implementations must not
/// block; long work is handed off.
pub trait CommitHandler: Send + Sync {
    fn handle(&self, event: &CommitEvent) -> Result<(), DispatchError>;
}

/// Routes events by collection. Unknown collections are ignored.
pub struct EventDispatcher<P> {
    posts: P,
}

impl<P: CommitHandler> EventDispatcher<P> {
    pub fn new(posts: P) -> Self {
        Self { posts }
    }

    pub fn dispatch(&self, event: &CommitEvent) -> Result<(), DispatchError> {
        match RecordKind::from_collection(&event.collection) {
            RecordKind::Post => self.posts.handle(event),
            RecordKind::Unhandled => Ok(()),
        }
    }
}

/// Feed post handler: runs the eligibility filter on new posts and queues
/// accepted ones for a reply.
pub struct PostHandler {
    filter: EligibilityFilter,
    replies: ReplySender,
}

impl PostHandler {
    pub fn new(filter: EligibilityFilter, replies: ReplySender) -> Self {
        Self { filter, replies }
    }
}

impl CommitHandler for PostHandler {
    fn handle(&self, event: &CommitEvent) -> Result<(), DispatchError> {
        if event.operation != Operation::Create {
            return Ok(());
        }

        match self.filter.evaluate(event) {
            Decision::Accept(post) => {
                let uri = post.uri.clone();
                match self.replies.try_enqueue(*post) {
                    Ok(()) => info!(%uri, did = %event.did, "queued reply"),
                    Err(QueueError::Full) => warn!(%uri, "reply queue full, dropping post"),
                    Err(QueueError::Closed) => warn!(%uri, "reply worker gone, dropping post"),
                }
                Ok(())
            }
            Decision::Skip(SkipReason::MalformedRecord(reason)) => {
                Err(DecodeError::Record(reason).into())
            }
            Decision::Skip(
                reason @ (SkipReason::ConsecutiveThreadReply | SkipReason::IgnoredUser),
            ) => {
                info!(uri = %event.uri(), %reason, "skipping post");
                Ok(())
            }
            Decision::Skip(reason) => {
                debug!(uri = %event.uri(), %reason, "skipping post");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::eligibility::tests::{BOT, commit, mention_record};
    use crate::queue::reply_queue;
    use murmur_types::config::EligibilityConfig;

    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl CommitHandler for Counting {
        fn handle(&self, _event: &CommitEvent) -> Result<(), DispatchError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn post_handler(capacity: usize) -> (PostHandler, crate::queue::ReplyReceiver) {
        let (tx, rx) = reply_queue(capacity);
        let filter = EligibilityFilter::new(EligibilityConfig::new(BOT));
        (PostHandler::new(filter, tx), rx)
    }

    #[test]
    fn test_unknown_collections_are_ignored() {
        let dispatcher = EventDispatcher::new(Counting::default());
        let mut event = commit("did:plc:user", "1", mention_record("@bot", BOT));
        event.collection = "app.bsky.feed.like".to_string();
        dispatcher.dispatch(&event).unwrap();
        assert_eq!(dispatcher.posts.0.load(Ordering::SeqCst), 0);

        event.collection = "app.bsky.feed.post".to_string();
        dispatcher.dispatch(&event).unwrap();
        assert_eq!(dispatcher.posts.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_malformed_post_is_a_local_error() {
        let (handler, _rx) = post_handler(4);
        let mut event = commit("did:plc:user", "1", mention_record("@bot", BOT));
        event.record = Some(b"[1, 2".to_vec());
        let err = EventDispatcher::new(handler).dispatch(&event).unwrap_err();
        assert!(matches!(err, DispatchError::Decode(DecodeError::Record(_))));
    }

    #[test]
    fn test_accepted_post_is_queued() {
        let (handler, _rx) = post_handler(4);
        let remaining = handler.replies.capacity();
        let event = commit("did:plc:user", "1", mention_record("@bot", BOT));
        handler.handle(&event).unwrap();
        assert_eq!(handler.replies.capacity(), remaining - 1);
    }

    #[test]
    fn test_self_posts_are_never_queued() {
        let (handler, _rx) = post_handler(4);
        let remaining = handler.replies.capacity();
        let event = commit(BOT, "1", mention_record("@bot", BOT));
        handler.handle(&event).unwrap();
        assert_eq!(handler.replies.capacity(), remaining);
    }

    #[test]
    fn test_deletes_are_ignored() {
        let (handler, _rx) = post_handler(4);
        let remaining = handler.replies.capacity();
        let mut event = commit("did:plc:user", "1", mention_record("@bot", BOT));
        event.operation = Operation::Delete;
        event.record = None;
        handler.handle(&event).unwrap();
        assert_eq!(handler.replies.capacity(), remaining);
    }

    #[test]
    fn test_full_queue_drops_without_error() {
        let (handler, _rx) = post_handler(1);
        for rkey in ["1", "2", "3"] {
            let event = commit("did:plc:user", rkey, mention_record("@bot", BOT));
            handler.handle(&event).unwrap();
        }
        assert_eq!(handler.replies.capacity(), 0);
    }
}
