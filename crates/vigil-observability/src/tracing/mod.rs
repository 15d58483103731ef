//! Structured logging setup

pub mod subscriber;

pub use subscriber::{init_tracing, TracingConfig};
