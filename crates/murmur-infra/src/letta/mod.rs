//! Letta agent API adapter.

pub mod client;

pub use client::{LettaClient, LettaConfig};
