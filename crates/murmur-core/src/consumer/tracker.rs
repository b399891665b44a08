//! In-memory cursor position and flush policy.

use std::time::Duration;

use murmur_types::event::Cursor;
use tokio::time::Instant;

/// Tracks the newest handled sequence and when it last reached storage.
///
/// The cursor only moves forward. A flush is due once `flush_every` events
/// were handled since the last one or `flush_interval` has passed with
/// something unsaved.
#[derive(Debug)]
pub struct CursorTracker {
    latest: Option<Cursor>,
    persisted: Option<Cursor>,
    since_flush: u64,
    last_flush: Instant,
    flush_every: u64,
    flush_interval: Duration,
}

impl CursorTracker {
    pub fn new(persisted: Option<Cursor>, flush_every: u64, flush_interval: Duration) -> Self {
        Self {
            latest: persisted,
            persisted,
            since_flush: 0,
            last_flush: Instant::now(),
            flush_every: flush_every.max(1),
            flush_interval,
        }
    }

    /// Record that the event at `seq` was handed to dispatch. Older or
    /// repeated sequences are ignored.
    pub fn advance(&mut self, seq: Cursor) {
        if self.latest.is_none_or(|latest| seq > latest) {
            self.latest = Some(seq);
            self.since_flush += 1;
        }
    }

    pub fn latest(&self) -> Option<Cursor> {
        self.latest
    }

    /// Last value known to be durable. Subscriptions resume here.
    pub fn persisted(&self) -> Option<Cursor> {
        self.persisted
    }

    /// Position not yet written to storage, if any.
    pub fn pending(&self) -> Option<Cursor> {
        match (self.latest, self.persisted) {
            (Some(latest), Some(persisted)) if latest <= persisted => None,
            (latest, _) => latest,
        }
    }

    pub fn flush_due(&self, now: Instant) -> bool {
        self.pending().is_some()
            && (self.since_flush >= self.flush_every
                || now.duration_since(self.last_flush) >= self.flush_interval)
    }

    pub fn mark_persisted(&mut self, cursor: Cursor, now: Instant) {
        if self.persisted.is_none_or(|persisted| cursor > persisted) {
            self.persisted = Some(cursor);
        }
        self.since_flush = 0;
        self.last_flush = now;
    }
}
