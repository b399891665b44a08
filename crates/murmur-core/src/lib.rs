//! Reply pipeline logic and port trait definitions for murmur.
//!
//! This crate defines the "ports" (traits for the agent, the social network,
//! the post archive and the persisted stores) that the infrastructure layer
//! implements, and everything that decides and composes replies: the stream
//! consumer, event dispatch, eligibility, the conversation session, thread
//! reconstruction and reply chaining. It never depends on `murmur-infra` or
//! any network/database crate.

pub mod agent;
pub mod consumer;
pub mod dispatch;
pub mod eligibility;
pub mod network;
pub mod queue;
pub mod record;
pub mod reply;
pub mod repository;
pub mod session;
pub mod thread;
pub mod tools;
