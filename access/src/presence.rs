//! Presence derived from the audit log.
//!
//! Nothing about presence is stored: a person is present where their most
//! recent record is a check-in. Reads only, no side effects.

use gatewatch_types::{AuditKind, LocationId, PersonId, Presence};

use crate::{AccessError, SharedAuditLog};

#[derive(Clone)]
pub struct PresenceResolver {
    log: SharedAuditLog,
}

impl PresenceResolver {
    pub fn new(log: SharedAuditLog) -> Self {
        Self { log }
    }

    /// Present iff the person's most recent record anywhere is a check-in.
    pub fn global_presence(&self, person: &PersonId) -> Result<Presence, AccessError> {
        let latest = self.log.most_recent(person, None)?;
        Ok(Presence::from_latest(latest.as_ref()))
    }

    /// Present iff the person's most recent record at `location` is a check-in.
    pub fn location_presence(
        &self,
        person: &PersonId,
        location: &LocationId,
    ) -> Result<Presence, AccessError> {
        let latest = self.log.most_recent(person, Some(location))?;
        Ok(Presence::from_latest(latest.as_ref()))
    }

    /// The location the person is currently checked in at, if any.
    pub fn current_location(&self, person: &PersonId) -> Result<Option<LocationId>, AccessError> {
        Ok(self
            .log
            .most_recent(person, None)?
            .filter(|r| r.kind == AuditKind::CheckIn)
            .map(|r| r.location_id))
    }
}
