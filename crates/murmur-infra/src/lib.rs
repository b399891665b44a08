//! Infrastructure layer for murmur.
//!
//! Contains implementations of the port traits defined in `murmur-core`:
//! SQLite storage for memory blocks, the cursor file, the Letta agent API,
//! the XRPC social network client, the Jetstream event feed and the
//! ClickHouse post archive.

pub mod atproto;
pub mod clickhouse;
pub mod config;
pub mod filesystem;
pub mod jetstream;
pub mod letta;
pub mod sqlite;
