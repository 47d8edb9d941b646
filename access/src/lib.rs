//! Access verification and audit engine.
//!
//! A security operator scans a person's ID card at the gate they staff. The
//! engine decides whether the scan is a check-in or a check-out, refuses a
//! check-in while the person is still checked in elsewhere, and appends
//! exactly one immutable audit record per accepted scan. Scans of identities
//! that do not resolve are recorded as breaches.
//!
//! Components, leaves first:
//! - [`PresenceResolver`]: presence derived from the audit log.
//! - [`PersonLocks`]: per-person serialization with bounded wait.
//! - [`GateAssignmentRegistry`]: one operator ⇄ one gate.
//! - [`VerificationEngine`]: the check-in/check-out state machine.
//! - [`AuditHistory`]: read-side queries for operators and administrators.

use std::sync::Arc;

use gatewatch_store::{AuditLogStore, IdentityStore, LocationStore, OperatorStore};

pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod locks;
pub mod presence;
pub mod registry;
pub mod token;

pub use config::AccessConfig;
pub use engine::{ScanAction, ScanOutcome, VerificationEngine};
pub use error::{AccessError, AssignmentConflict};
pub use history::{AuditEntry, AuditHistory, LocationOverview, Page, OVERVIEW_RECENT_RECORDS};
pub use locks::PersonLocks;
pub use presence::PresenceResolver;
pub use registry::GateAssignmentRegistry;
pub use token::parse_identity_token;

pub type SharedAuditLog = Arc<dyn AuditLogStore + Send + Sync>;
pub type SharedIdentityStore = Arc<dyn IdentityStore + Send + Sync>;
pub type SharedOperatorStore = Arc<dyn OperatorStore + Send + Sync>;
pub type SharedLocationStore = Arc<dyn LocationStore + Send + Sync>;
