//! Bounded reply queue with a single worker.
//!
//! Only one conversation turn can run at a time, so accepted posts wait in a
//! bounded backlog in front of one worker. When the backlog is full new
//! posts are dropped rather than piling up unbounded tasks.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::eligibility::AcceptedPost;

/// Errors enqueueing a reply job.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("reply queue is full")]
    Full,

    #[error("reply worker has stopped")]
    Closed,
}

/// Something that answers accepted posts, one at a time.
pub trait ReplyHandler: Send + Sync + 'static {
    fn handle(&self, post: AcceptedPost) -> impl std::future::Future<Output = ()> + Send;
}

/// Producer side of the reply queue. Never blocks.
#[derive(Debug, Clone)]
pub struct ReplySender {
    tx: mpsc::Sender<AcceptedPost>,
}

impl ReplySender {
    pub fn try_enqueue(&self, post: AcceptedPost) -> Result<(), QueueError> {
        self.tx.try_send(post).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full,
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })
    }

    /// Slots currently free in the backlog.
    pub fn capacity(&self) -> usize {
        self.tx.capacity()
    }
}

/// Consumer side, driven by [`run_reply_worker`].
#[derive(Debug)]
pub struct ReplyReceiver {
    rx: mpsc::Receiver<AcceptedPost>,
}

/// Create a reply queue holding at most `capacity` pending posts.
pub fn reply_queue(capacity: usize) -> (ReplySender, ReplyReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ReplySender { tx }, ReplyReceiver { rx })
}

/// Drain the queue into `handler` until cancelled or every sender is gone.
///
/// A turn in progress when cancellation fires is abandoned.
pub async fn run_reply_worker<H: ReplyHandler>(
    mut receiver: ReplyReceiver,
    handler: Arc<H>,
    cancel: CancellationToken,
) {
    info!("reply worker started");
    loop {
        let post = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = receiver.rx.recv() => match next {
                Some(post) => post,
                None => break,
            },
        };

        debug!(uri = %post.uri, did = %post.author_did, "reply job dequeued");
        tokio::select! {
            _ = cancel.cancelled() => {
                warn!(uri = %post.uri, "shutdown during reply turn, abandoning it");
                break;
            }
            _ = handler.handle(post.clone()) => {}
        }
    }
    info!("reply worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::eligibility::tests::{BOT, commit, mention_record};
    use crate::eligibility::{Decision, EligibilityFilter};
    use murmur_types::config::EligibilityConfig;

    fn accepted(rkey: &str) -> AcceptedPost {
        let filter = EligibilityFilter::new(EligibilityConfig::new(BOT));
        match filter.evaluate(&commit("did:plc:user", rkey, mention_record("@bot", BOT))) {
            Decision::Accept(post) => *post,
            other => panic!("expected accept, got {other:?}"),
        }
    }

    #[derive(Default)]
    struct Collecting {
        seen: Mutex<Vec<String>>,
    }

    impl ReplyHandler for Collecting {
        async fn handle(&self, post: AcceptedPost) {
            self.seen.lock().unwrap().push(post.uri);
        }
    }

    struct Stalling;

    impl ReplyHandler for Stalling {
        async fn handle(&self, _post: AcceptedPost) {
            std::future::pending::<()>().await;
        }
    }

    #[test]
    fn test_full_queue_rejects() {
        let (tx, _rx) = reply_queue(1);
        tx.try_enqueue(accepted("1")).unwrap();
        assert!(matches!(tx.try_enqueue(accepted("2")), Err(QueueError::Full)));
    }

    #[test]
    fn test_closed_queue_rejects() {
        let (tx, rx) = reply_queue(4);
        drop(rx);
        assert!(matches!(tx.try_enqueue(accepted("1")), Err(QueueError::Closed)));
    }

    #[tokio::test]
    async fn test_worker_handles_jobs_in_order() {
        let (tx, rx) = reply_queue(8);
        for rkey in ["1", "2", "3"] {
            tx.try_enqueue(accepted(rkey)).unwrap();
        }
        drop(tx);

        let handler = Arc::new(Collecting::default());
        run_reply_worker(rx, handler.clone(), CancellationToken::new()).await;

        let seen = handler.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen[0].ends_with("/1"));
        assert!(seen[2].ends_with("/3"));
    }

    #[tokio::test]
    async fn test_cancel_abandons_in_flight_turn() {
        let (tx, rx) = reply_queue(8);
        tx.try_enqueue(accepted("1")).unwrap();

        let cancel = CancellationToken::new();
        let worker = tokio::spawn(run_reply_worker(rx, Arc::new(Stalling), cancel.clone()));
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(1), worker)
            .await
            .expect("worker stops after cancel")
            .unwrap();
    }
}
