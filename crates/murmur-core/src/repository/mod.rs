//! Repository trait definitions (ports).
//!
//! These traits define the storage interfaces that the infrastructure layer
//! (murmur-infra) implements: the memory block table, the legacy memory
//! table, the cursor slot and the historical post archive. The core crate
//! never depends on any specific storage technology.

pub mod archive;
pub mod block;
pub mod cursor;
