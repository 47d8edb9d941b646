//! Audit records: the immutable scan history.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{LocationId, PersonId, Timestamp};

/// Position of a record in the append-only audit log.
///
/// Assigned by the log on append, strictly increasing, starting at 1. "Most
/// recent" always means "highest record id", which makes insertion order the
/// tie-break for records sharing a timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What happened at the gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditKind {
    /// Person became present at the location.
    CheckIn,
    /// Person left a location they were present at.
    CheckOut,
    /// A scanned identity could not be resolved to a known person.
    Breach,
}

impl AuditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckIn => "CHECKIN",
            Self::CheckOut => "CHECKOUT",
            Self::Breach => "BREACH",
        }
    }

    /// Single-byte tag used in storage index keys.
    pub fn tag(&self) -> u8 {
        match self {
            Self::CheckIn => 1,
            Self::CheckOut => 2,
            Self::Breach => 3,
        }
    }
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record as handed to the log, before it has a position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAuditRecord {
    pub person_id: Option<PersonId>,
    pub location_id: LocationId,
    pub kind: AuditKind,
    pub timestamp: Timestamp,
}

impl NewAuditRecord {
    pub fn check_in(person: PersonId, location: LocationId, timestamp: Timestamp) -> Self {
        Self {
            person_id: Some(person),
            location_id: location,
            kind: AuditKind::CheckIn,
            timestamp,
        }
    }

    pub fn check_out(person: PersonId, location: LocationId, timestamp: Timestamp) -> Self {
        Self {
            person_id: Some(person),
            location_id: location,
            kind: AuditKind::CheckOut,
            timestamp,
        }
    }

    /// A breach never names a person: the scanned identity did not resolve.
    pub fn breach(location: LocationId, timestamp: Timestamp) -> Self {
        Self {
            person_id: None,
            location_id: location,
            kind: AuditKind::Breach,
            timestamp,
        }
    }

    /// Attach the position assigned by the log.
    pub fn into_record(self, id: RecordId) -> AuditRecord {
        AuditRecord {
            id,
            person_id: self.person_id,
            location_id: self.location_id,
            kind: self.kind,
            timestamp: self.timestamp,
        }
    }
}

/// An immutable entry of the audit log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: RecordId,
    /// Absent only for [`AuditKind::Breach`].
    pub person_id: Option<PersonId>,
    pub location_id: LocationId,
    pub kind: AuditKind,
    pub timestamp: Timestamp,
}
