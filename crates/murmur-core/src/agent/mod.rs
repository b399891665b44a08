//! Stateful conversational agent port.

pub mod client;

pub use client::AgentClient;
