//! Jetstream event feed adapter.

pub mod frame;
pub mod source;

pub use frame::parse_frame;
pub use source::JetstreamSource;
