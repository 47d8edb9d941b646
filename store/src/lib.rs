//! Abstract storage traits for gatewatch.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The access engine depends only on the traits.

pub mod audit;
pub mod error;
pub mod identity;
pub mod location;

pub use audit::{AuditFilter, AuditLogStore};
pub use error::StoreError;
pub use identity::{IdentityStore, OperatorStore};
pub use location::{plan_assignment, AssignError, AssignmentConflict, LocationStore};
