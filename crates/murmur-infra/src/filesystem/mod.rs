//! Filesystem adapters for murmur.

pub mod cursor;

pub use cursor::FileCursorStore;
