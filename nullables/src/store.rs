//! Nullable stores: thread-safe in-memory storage for testing.

use gatewatch_store::{
    plan_assignment, AssignError, AuditFilter, AuditLogStore, IdentityStore, LocationStore,
    OperatorStore, StoreError,
};
use gatewatch_types::{
    AuditRecord, Identity, Location, LocationId, NewAuditRecord, Operator, OperatorId, PersonId,
    RecordId,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

/// An in-memory append-only audit log.
///
/// Records live in a `Vec` in insertion order; record ids are `index + 1`.
#[derive(Default)]
pub struct NullAuditLog {
    records: Mutex<Vec<AuditRecord>>,
}

impl NullAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record in insertion order.
    pub fn all(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }
}

impl AuditLogStore for NullAuditLog {
    fn append(&self, record: NewAuditRecord) -> Result<AuditRecord, StoreError> {
        let mut records = self.records.lock();
        let id = RecordId::new(records.len() as u64 + 1);
        let record = record.into_record(id);
        records.push(record.clone());
        Ok(record)
    }

    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, StoreError> {
        let records = self.records.lock();
        let matching = records
            .iter()
            .rev()
            .filter(|r| filter.matches(r))
            .skip(filter.offset);
        Ok(match filter.limit {
            Some(limit) => matching.take(limit).cloned().collect(),
            None => matching.cloned().collect(),
        })
    }

    fn record_count(&self) -> Result<u64, StoreError> {
        Ok(self.records.lock().len() as u64)
    }
}

/// An in-memory identity + operator store for testing.
#[derive(Default)]
pub struct NullIdentityStore {
    identities: Mutex<HashMap<PersonId, Identity>>,
    operators: Mutex<HashMap<OperatorId, Operator>>,
}

impl NullIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style seeding for test setup.
    pub fn with_identity(self, identity: Identity) -> Self {
        self.identities.lock().insert(identity.id.clone(), identity);
        self
    }

    pub fn with_operator(self, operator: Operator) -> Self {
        self.operators.lock().insert(operator.id.clone(), operator);
        self
    }
}

impl IdentityStore for NullIdentityStore {
    fn get_identity(&self, id: &PersonId) -> Result<Option<Identity>, StoreError> {
        Ok(self.identities.lock().get(id).cloned())
    }

    fn put_identity(&self, identity: &Identity) -> Result<(), StoreError> {
        self.identities
            .lock()
            .insert(identity.id.clone(), identity.clone());
        Ok(())
    }
}

impl OperatorStore for NullIdentityStore {
    fn get_operator(&self, id: &OperatorId) -> Result<Option<Operator>, StoreError> {
        Ok(self.operators.lock().get(id).cloned())
    }

    fn put_operator(&self, operator: &Operator) -> Result<(), StoreError> {
        self.operators
            .lock()
            .insert(operator.id.clone(), operator.clone());
        Ok(())
    }
}

/// An in-memory location store for testing.
#[derive(Default)]
pub struct NullLocationStore {
    locations: Mutex<BTreeMap<LocationId, Location>>,
}

impl NullLocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(self, location: Location) -> Self {
        self.locations.lock().insert(location.id.clone(), location);
        self
    }
}

impl LocationStore for NullLocationStore {
    fn get_location(&self, id: &LocationId) -> Result<Option<Location>, StoreError> {
        Ok(self.locations.lock().get(id).cloned())
    }

    fn put_location(&self, location: &Location) -> Result<(), StoreError> {
        self.locations
            .lock()
            .insert(location.id.clone(), location.clone());
        Ok(())
    }

    fn assign_operator(
        &self,
        location: &LocationId,
        operator: &OperatorId,
    ) -> Result<Location, AssignError> {
        let mut locations = self.locations.lock();
        let gate = locations
            .get(location)
            .cloned()
            .ok_or_else(|| AssignError::LocationNotFound(location.clone()))?;
        let current = locations
            .values()
            .find(|l| l.is_staffed_by(operator))
            .map(|l| l.id.clone());
        let (gate, changed) = plan_assignment(gate, operator, current.as_ref())?;
        if changed {
            locations.insert(gate.id.clone(), gate.clone());
        }
        Ok(gate)
    }

    fn clear_operator(&self, location: &LocationId) -> Result<Option<Location>, StoreError> {
        let mut locations = self.locations.lock();
        Ok(locations.get_mut(location).map(|gate| {
            gate.assigned_operator = None;
            gate.clone()
        }))
    }

    fn location_for_operator(
        &self,
        operator: &OperatorId,
    ) -> Result<Option<Location>, StoreError> {
        Ok(self
            .locations
            .lock()
            .values()
            .find(|l| l.is_staffed_by(operator))
            .cloned())
    }

    fn iter_locations(&self) -> Result<Vec<Location>, StoreError> {
        Ok(self.locations.lock().values().cloned().collect())
    }
}
