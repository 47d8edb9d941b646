//! Read-side audit queries for operators and administrators.
//!
//! Every listing is most-recent-first. Nothing here writes.

use std::collections::HashMap;

use chrono::NaiveDate;
use gatewatch_store::AuditFilter;
use gatewatch_types::{AuditKind, AuditRecord, DayRange, Location, LocationId, PersonId};
use serde::Serialize;

use crate::{AccessError, SharedAuditLog, SharedIdentityStore, SharedLocationStore};

/// Records shown per gate on the location overview.
pub const OVERVIEW_RECENT_RECORDS: usize = 5;

/// A gate together with its latest activity.
#[derive(Clone, Debug, Serialize)]
pub struct LocationOverview {
    #[serde(flatten)]
    pub location: Location,
    pub recent_records: Vec<AuditRecord>,
}

/// An audit record joined with the names an operator reads it by.
///
/// Location logs carry the card holder's name, breach logs and person
/// histories the gate's name. A name is absent when the record has no person
/// or the identity no longer resolves.
#[derive(Clone, Debug, Serialize)]
pub struct AuditEntry {
    #[serde(flatten)]
    pub record: AuditRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
}

impl AuditEntry {
    fn bare(record: AuditRecord) -> Self {
        Self {
            record,
            person_name: None,
            location_name: None,
        }
    }
}

/// Slice of a listing: `offset` records skipped, at most `limit` returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

#[derive(Clone)]
pub struct AuditHistory {
    log: SharedAuditLog,
    locations: SharedLocationStore,
    identities: SharedIdentityStore,
}

impl AuditHistory {
    pub fn new(
        log: SharedAuditLog,
        locations: SharedLocationStore,
        identities: SharedIdentityStore,
    ) -> Self {
        Self {
            log,
            locations,
            identities,
        }
    }

    /// Records at `location`, optionally restricted to one UTC calendar day.
    pub fn location_logs(
        &self,
        location: &LocationId,
        day: Option<NaiveDate>,
        page: Option<Page>,
    ) -> Result<Vec<AuditEntry>, AccessError> {
        let Some(gate) = self.locations.get_location(location)? else {
            return Err(AccessError::LocationNotFound(location.clone()));
        };
        let mut filter = AuditFilter::location(location);
        if let Some(day) = day {
            filter = filter.on_day(DayRange::for_date(day));
        }
        let mut entries = self.with_person_names(self.run(filter, page)?)?;
        for entry in &mut entries {
            entry.location_name = Some(gate.name.clone());
        }
        Ok(entries)
    }

    /// Every breach at every gate.
    pub fn breach_logs(&self, page: Option<Page>) -> Result<Vec<AuditEntry>, AccessError> {
        self.with_location_names(self.run(AuditFilter::kind(AuditKind::Breach), page)?)
    }

    /// Every check-in and check-out of one person.
    pub fn person_history(
        &self,
        person: &PersonId,
        page: Option<Page>,
    ) -> Result<Vec<AuditEntry>, AccessError> {
        let mut entries = self.with_location_names(self.run(AuditFilter::person(person), page)?)?;
        if let Some(name) = self
            .identities
            .get_identity(person)?
            .and_then(|identity| identity.display_name)
        {
            for entry in &mut entries {
                entry.person_name = Some(name.clone());
            }
        }
        Ok(entries)
    }

    /// All gates with their `recent` latest records each.
    pub fn locations_overview(&self, recent: usize) -> Result<Vec<LocationOverview>, AccessError> {
        self.locations
            .iter_locations()?
            .into_iter()
            .map(|location| -> Result<LocationOverview, AccessError> {
                let recent_records = self
                    .log
                    .query(&AuditFilter::location(&location.id).limit(recent))?;
                Ok(LocationOverview {
                    location,
                    recent_records,
                })
            })
            .collect()
    }

    fn with_person_names(&self, records: Vec<AuditRecord>) -> Result<Vec<AuditEntry>, AccessError> {
        let mut names: HashMap<PersonId, Option<String>> = HashMap::new();
        records
            .into_iter()
            .map(|record| -> Result<AuditEntry, AccessError> {
                let mut entry = AuditEntry::bare(record);
                if let Some(person) = &entry.record.person_id {
                    if !names.contains_key(person) {
                        let name = self
                            .identities
                            .get_identity(person)?
                            .and_then(|identity| identity.display_name);
                        names.insert(person.clone(), name);
                    }
                    entry.person_name = names.get(person).cloned().flatten();
                }
                Ok(entry)
            })
            .collect()
    }

    fn with_location_names(
        &self,
        records: Vec<AuditRecord>,
    ) -> Result<Vec<AuditEntry>, AccessError> {
        let mut names: HashMap<LocationId, Option<String>> = HashMap::new();
        records
            .into_iter()
            .map(|record| -> Result<AuditEntry, AccessError> {
                let mut entry = AuditEntry::bare(record);
                let id = entry.record.location_id.clone();
                if !names.contains_key(&id) {
                    let name = self.locations.get_location(&id)?.map(|l| l.name);
                    names.insert(id.clone(), name);
                }
                entry.location_name = names.get(&id).cloned().flatten();
                Ok(entry)
            })
            .collect()
    }

    fn run(&self, filter: AuditFilter, page: Option<Page>) -> Result<Vec<AuditRecord>, AccessError> {
        let filter = match page {
            Some(p) => filter.page(p.offset, p.limit),
            None => filter,
        };
        Ok(self.log.query(&filter)?)
    }
}
