//! Event feed consumption.
//!
//! [`StreamConsumer`] keeps one ordered subscription open, hands every
//! commit to the dispatcher before advancing the cursor, persists the cursor
//! periodically and reconnects from the persisted position after transport
//! failures.

pub mod backoff;
pub mod source;
pub mod stream;
pub mod tracker;

pub use backoff::Backoff;
pub use source::{EventSource, FrameStream};
pub use stream::{ConsumerSettings, StreamConsumer};
pub use tracker::CursorTracker;
