//! The long-running consumption loop.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use murmur_types::config::RuntimeConfig;
use murmur_types::error::StreamError;
use murmur_types::event::FeedFrame;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::dispatch::{CommitHandler, EventDispatcher};
use crate::repository::cursor::CursorStore;

use super::backoff::Backoff;
use super::source::EventSource;
use super::tracker::CursorTracker;

/// Cursor persistence and reconnect tuning.
#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    pub flush_every: u64,
    pub flush_interval: Duration,
    pub reconnect_initial: Duration,
    pub reconnect_max: Duration,
}

impl From<&RuntimeConfig> for ConsumerSettings {
    fn from(config: &RuntimeConfig) -> Self {
        Self {
            flush_every: config.cursor_flush_every,
            flush_interval: config.cursor_flush_interval(),
            reconnect_initial: config.reconnect_initial(),
            reconnect_max: config.reconnect_max(),
        }
    }
}

/// How one subscription ended.
enum Ended {
    Cancelled,
    Disconnected,
    Fatal(StreamError),
}

/// Consumes the event feed in order and keeps the cursor durable.
pub struct StreamConsumer<S, C, H> {
    source: Arc<S>,
    store: Arc<C>,
    dispatcher: EventDispatcher<H>,
    settings: ConsumerSettings,
}

impl<S, C, H> StreamConsumer<S, C, H>
where
    S: EventSource,
    C: CursorStore,
    H: CommitHandler,
{
    pub fn new(
        source: Arc<S>,
        store: Arc<C>,
        dispatcher: EventDispatcher<H>,
        settings: ConsumerSettings,
    ) -> Self {
        Self {
            source,
            store,
            dispatcher,
            settings,
        }
    }

    /// Run until cancelled or a fatal stream error.
    ///
    /// Transport failures never end the loop: the consumer waits out an
    /// exponential backoff and resubscribes from the persisted cursor. The
    /// cursor is flushed whenever a subscription ends.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), StreamError> {
        let persisted = self
            .store
            .load()
            .await
            .map_err(|e| StreamError::Fatal(format!("failed to load cursor: {e}")))?;
        let mut tracker = CursorTracker::new(
            persisted,
            self.settings.flush_every,
            self.settings.flush_interval,
        );
        let mut backoff = Backoff::new(self.settings.reconnect_initial, self.settings.reconnect_max);

        loop {
            let resume = tracker.persisted();
            info!(cursor = ?resume.map(|c| c.value()), "subscribing to event feed");

            let subscribed = tokio::select! {
                _ = cancel.cancelled() => break,
                subscribed = self.source.subscribe(resume) => subscribed,
            };

            let ended = match subscribed {
                Ok(stream) => self.consume(stream, &mut tracker, &mut backoff, &cancel).await,
                Err(e) if e.is_fatal() => Ended::Fatal(e),
                Err(e) => {
                    warn!(error = %e, "failed to subscribe to event feed");
                    Ended::Disconnected
                }
            };

            self.flush(&mut tracker).await;

            match ended {
                Ended::Cancelled => break,
                Ended::Fatal(e) => {
                    error!(error = %e, "event feed failed permanently");
                    return Err(e);
                }
                Ended::Disconnected => {
                    let delay = backoff.next_delay();
                    info!(?delay, "reconnecting to event feed");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        info!(cursor = ?tracker.persisted().map(|c| c.value()), "event consumer stopped");
        Ok(())
    }

    async fn consume(
        &self,
        mut stream: super::source::FrameStream,
        tracker: &mut CursorTracker,
        backoff: &mut Backoff,
        cancel: &CancellationToken,
    ) -> Ended {
        let mut ticker = tokio::time::interval(self.settings.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ended::Cancelled,
                _ = ticker.tick() => {
                    if tracker.flush_due(Instant::now()) {
                        self.flush(tracker).await;
                    }
                }
                frame = stream.next() => match frame {
                    Some(Ok(frame)) => {
                        backoff.reset();
                        if tracker.latest().is_some_and(|latest| frame.seq() <= latest) {
                            trace!(seq = frame.seq().value(), "already handled, skipping");
                            continue;
                        }
                        self.handle_frame(&frame);
                        tracker.advance(frame.seq());
                        if tracker.flush_due(Instant::now()) {
                            self.flush(tracker).await;
                        }
                    }
                    Some(Err(e)) if e.is_fatal() => return Ended::Fatal(e),
                    Some(Err(e)) => {
                        warn!(error = %e, "event feed interrupted");
                        return Ended::Disconnected;
                    }
                    None => {
                        warn!("event feed closed");
                        return Ended::Disconnected;
                    }
                },
            }
        }
    }

    fn handle_frame(&self, frame: &FeedFrame) {
        match frame {
            FeedFrame::Commit(event) => {
                if let Err(e) = self.dispatcher.dispatch(event) {
                    warn!(seq = event.seq.value(), uri = %event.uri(), error = %e, "skipping event");
                }
            }
            FeedFrame::Other { seq, kind } => {
                trace!(seq = seq.value(), %kind, "non-commit frame");
            }
            FeedFrame::Malformed { seq, reason } => {
                warn!(seq = seq.value(), %reason, "skipping malformed frame");
            }
        }
    }

    async fn flush(&self, tracker: &mut CursorTracker) {
        let Some(cursor) = tracker.pending() else {
            return;
        };
        match self.store.save(cursor).await {
            Ok(()) => {
                tracker.mark_persisted(cursor, Instant::now());
                debug!(cursor = cursor.value(), "persisted cursor");
            }
            Err(e) => error!(error = %e, cursor = cursor.value(), "failed to persist cursor"),
        }
    }
}
