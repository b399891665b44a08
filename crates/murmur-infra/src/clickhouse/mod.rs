//! ClickHouse post archive adapter.

pub mod archive;

pub use archive::{ClickHouseArchive, ClickHouseConfig};
