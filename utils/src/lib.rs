//! Shared utilities for gatewatch.

pub mod logging;

pub use logging::{init_tracing, LogFormat, LoggingError};
