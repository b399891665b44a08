//! Observability for murmur: tracing subscriber set-up.

pub mod tracing_setup;

pub use tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
