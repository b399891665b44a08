//! Shared domain types for murmur.
//!
//! This crate contains the types that flow between the event feed, the
//! reply pipeline and the external collaborators: commit events, feed post
//! records, memory blocks, agent messages, configuration, and the error
//! enums used across the workspace.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod agent;
pub mod aturi;
pub mod blog;
pub mod config;
pub mod error;
pub mod event;
pub mod memory;
pub mod post;
pub mod profile;
