//! HTTP layer: the tool endpoints the agent calls back into.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
