//! Audit log storage trait.

use crate::StoreError;
use gatewatch_types::{AuditKind, AuditRecord, DayRange, LocationId, NewAuditRecord, PersonId};

/// Selection over the audit log. Unset fields match everything.
///
/// Results are always returned most-recent-first (descending record id).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuditFilter {
    pub person: Option<PersonId>,
    pub location: Option<LocationId>,
    pub kind: Option<AuditKind>,
    pub day: Option<DayRange>,
    /// Skip this many matching records (newest first) before collecting.
    pub offset: usize,
    /// Stop after this many matching records.
    pub limit: Option<usize>,
}

impl AuditFilter {
    pub fn person(person: &PersonId) -> Self {
        Self {
            person: Some(person.clone()),
            ..Default::default()
        }
    }

    pub fn location(location: &LocationId) -> Self {
        Self {
            location: Some(location.clone()),
            ..Default::default()
        }
    }

    pub fn kind(kind: AuditKind) -> Self {
        Self {
            kind: Some(kind),
            ..Default::default()
        }
    }

    pub fn at(mut self, location: &LocationId) -> Self {
        self.location = Some(location.clone());
        self
    }

    pub fn on_day(mut self, day: DayRange) -> Self {
        self.day = Some(day);
        self
    }

    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `record` satisfies every set criterion (offset/limit excluded).
    pub fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(person) = &self.person {
            if record.person_id.as_ref() != Some(person) {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if &record.location_id != location {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if record.kind != kind {
                return false;
            }
        }
        if let Some(day) = &self.day {
            if !day.contains(record.timestamp) {
                return false;
            }
        }
        true
    }
}

/// Append-only, totally ordered log of scan events.
///
/// Records are never updated or deleted. `append` assigns the next record id,
/// so the log's order is insertion order.
pub trait AuditLogStore {
    /// Append a record and return it with its assigned id.
    fn append(&self, record: NewAuditRecord) -> Result<AuditRecord, StoreError>;

    /// All records matching `filter`, most recent first.
    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, StoreError>;

    /// Total number of records ever appended.
    fn record_count(&self) -> Result<u64, StoreError>;

    /// The most recent record for `person`, optionally restricted to `location`.
    fn most_recent(
        &self,
        person: &PersonId,
        location: Option<&LocationId>,
    ) -> Result<Option<AuditRecord>, StoreError> {
        let mut filter = AuditFilter::person(person).limit(1);
        filter.location = location.cloned();
        Ok(self.query(&filter)?.into_iter().next())
    }
}
