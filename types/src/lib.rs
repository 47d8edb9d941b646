//! Fundamental types for gatewatch.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! person, location and operator identifiers, timestamps and clocks, audit records,
//! and derived presence state.

pub mod audit;
pub mod ids;
pub mod identity;
pub mod location;
pub mod presence;
pub mod time;

pub use audit::{AuditKind, AuditRecord, NewAuditRecord, RecordId};
pub use identity::{Identity, Operator, Role};
pub use ids::{LocationId, OperatorId, PersonId};
pub use location::{GateType, Location};
pub use presence::Presence;
pub use time::{Clock, DayRange, SystemClock, Timestamp};
