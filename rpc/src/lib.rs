//! HTTP API for gatewatch.
//!
//! Provides endpoints for:
//! - Gate scans by the operator staffing the gate
//! - Location registration and operator assignment
//! - Per-location, per-person and breach audit logs
//! - Presence lookups
//! - Prometheus metrics

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod pagination;
pub mod server;

pub use error::RpcError;
pub use metrics::ScanMetrics;
pub use server::{router, AppState, RpcServer, ServerOptions};
