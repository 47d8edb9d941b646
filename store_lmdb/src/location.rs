//! LMDB implementation of LocationStore.
//!
//! `locations` holds the gate records keyed by id. `operator_index` maps an
//! operator id to the id of the gate they staff and is rewritten in the same
//! write transaction as the gate record.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use gatewatch_store::{plan_assignment, AssignError, LocationStore, StoreError};
use gatewatch_types::{Location, LocationId, OperatorId};

use crate::codec::{decode, encode};
use crate::LmdbError;

pub struct LmdbLocationStore {
    pub(crate) env: Arc<Env>,
    pub(crate) locations_db: Database<Bytes, Bytes>,
    pub(crate) operator_index_db: Database<Bytes, Bytes>,
}

impl LmdbLocationStore {
    fn put_inner(&self, location: &Location) -> Result<(), LmdbError> {
        let key = location.id.as_bytes();
        let bytes = encode(location)?;
        let mut wtxn = self.env.write_txn()?;

        let previous: Option<Location> =
            self.locations_db.get(&wtxn, key)?.map(decode).transpose()?;
        if let Some(old) = previous.and_then(|l| l.assigned_operator) {
            if location.assigned_operator.as_ref() != Some(&old) {
                self.operator_index_db.delete(&mut wtxn, old.as_bytes())?;
            }
        }

        self.locations_db.put(&mut wtxn, key, &bytes)?;
        if let Some(operator) = &location.assigned_operator {
            self.operator_index_db
                .put(&mut wtxn, operator.as_bytes(), key)?;
        }
        wtxn.commit()?;
        Ok(())
    }

    /// Check and write in one write transaction. LMDB admits a single writer
    /// per environment across processes, so the checks cannot go stale.
    fn assign_inner(
        &self,
        location: &LocationId,
        operator: &OperatorId,
    ) -> Result<Location, AssignError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let gate: Location = match self
            .locations_db
            .get(&wtxn, location.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => decode(bytes)?,
            None => return Err(AssignError::LocationNotFound(location.clone())),
        };

        let current: Option<Location> = match self
            .operator_index_db
            .get(&wtxn, operator.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(location_id) => self
                .locations_db
                .get(&wtxn, location_id)
                .map_err(LmdbError::from)?
                .map(decode)
                .transpose()?,
            None => None,
        };
        let current = current.filter(|l| l.is_staffed_by(operator)).map(|l| l.id);

        let (gate, changed) = plan_assignment(gate, operator, current.as_ref())?;
        if !changed {
            return Ok(gate);
        }
        let bytes = encode(&gate)?;
        self.locations_db
            .put(&mut wtxn, location.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        self.operator_index_db
            .put(&mut wtxn, operator.as_bytes(), location.as_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(gate)
    }

    fn clear_inner(&self, location: &LocationId) -> Result<Option<Location>, LmdbError> {
        let mut wtxn = self.env.write_txn()?;
        let gate: Option<Location> = self
            .locations_db
            .get(&wtxn, location.as_bytes())?
            .map(decode)
            .transpose()?;
        let Some(mut gate) = gate else {
            return Ok(None);
        };
        if let Some(operator) = gate.assigned_operator.take() {
            self.operator_index_db.delete(&mut wtxn, operator.as_bytes())?;
            self.locations_db
                .put(&mut wtxn, location.as_bytes(), &encode(&gate)?)?;
            wtxn.commit()?;
        }
        Ok(Some(gate))
    }

    fn for_operator_inner(&self, operator: &OperatorId) -> Result<Option<Location>, LmdbError> {
        let rtxn = self.env.read_txn()?;
        let Some(location_id) = self.operator_index_db.get(&rtxn, operator.as_bytes())? else {
            return Ok(None);
        };
        let location: Option<Location> = self
            .locations_db
            .get(&rtxn, location_id)?
            .map(decode)
            .transpose()?;
        Ok(location.filter(|l| l.is_staffed_by(operator)))
    }
}

impl LocationStore for LmdbLocationStore {
    fn get_location(&self, id: &LocationId) -> Result<Option<Location>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let location = self
            .locations_db
            .get(&rtxn, id.as_bytes())
            .map_err(LmdbError::from)?
            .map(decode)
            .transpose()?;
        Ok(location)
    }

    fn put_location(&self, location: &Location) -> Result<(), StoreError> {
        Ok(self.put_inner(location)?)
    }

    fn assign_operator(
        &self,
        location: &LocationId,
        operator: &OperatorId,
    ) -> Result<Location, AssignError> {
        self.assign_inner(location, operator)
    }

    fn clear_operator(&self, location: &LocationId) -> Result<Option<Location>, StoreError> {
        Ok(self.clear_inner(location)?)
    }

    fn location_for_operator(
        &self,
        operator: &OperatorId,
    ) -> Result<Option<Location>, StoreError> {
        Ok(self.for_operator_inner(operator)?)
    }

    fn iter_locations(&self) -> Result<Vec<Location>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut locations = Vec::new();
        for entry in self.locations_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_key, value) = entry.map_err(LmdbError::from)?;
            locations.push(decode(value)?);
        }
        Ok(locations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;

    fn staffed(id: &str, operator: &str) -> Location {
        let mut location = Location::new(id, id.to_uppercase());
        location.assigned_operator = Some(OperatorId::from(operator));
        location
    }

    #[test]
    fn operator_index_follows_assignment() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 1 << 20).unwrap();
        let store = env.location_store();
        let o1 = OperatorId::from("o1");

        store.put_location(&Location::new("l1", "North")).unwrap();
        assert_eq!(store.location_for_operator(&o1).unwrap(), None);

        store.put_location(&staffed("l1", "o1")).unwrap();
        assert_eq!(
            store.location_for_operator(&o1).unwrap().map(|l| l.id),
            Some(LocationId::from("l1"))
        );

        store.put_location(&staffed("l1", "o2")).unwrap();
        assert_eq!(store.location_for_operator(&o1).unwrap(), None);
        assert!(store
            .location_for_operator(&OperatorId::from("o2"))
            .unwrap()
            .is_some());

        store.put_location(&Location::new("l1", "North")).unwrap();
        assert_eq!(
            store.location_for_operator(&OperatorId::from("o2")).unwrap(),
            None
        );
    }

    #[test]
    fn assign_and_clear_keep_index_in_step() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 1 << 20).unwrap();
        let store = env.location_store();
        store.put_location(&Location::new("l1", "North")).unwrap();
        store.put_location(&Location::new("l2", "South")).unwrap();
        let (l1, l2) = (LocationId::from("l1"), LocationId::from("l2"));
        let o1 = OperatorId::from("o1");

        assert!(store.assign_operator(&l1, &o1).unwrap().is_staffed_by(&o1));
        assert!(store.assign_operator(&l1, &o1).unwrap().is_staffed_by(&o1));
        assert!(matches!(
            store.assign_operator(&l2, &o1),
            Err(AssignError::Conflict(_))
        ));
        assert!(matches!(
            store.assign_operator(&l1, &OperatorId::from("o2")),
            Err(AssignError::Conflict(_))
        ));
        assert!(matches!(
            store.assign_operator(&LocationId::from("l9"), &o1),
            Err(AssignError::LocationNotFound(_))
        ));

        let cleared = store.clear_operator(&l1).unwrap().unwrap();
        assert!(cleared.assigned_operator.is_none());
        assert_eq!(store.location_for_operator(&o1).unwrap(), None);
        assert_eq!(store.assign_operator(&l2, &o1).unwrap().id, l2);
        assert_eq!(store.clear_operator(&LocationId::from("l9")).unwrap(), None);
    }

    #[test]
    fn locations_list_in_id_order() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 1 << 20).unwrap();
        let store = env.location_store();
        for id in ["c", "a", "b"] {
            store.put_location(&Location::new(id, id)).unwrap();
        }
        let ids: Vec<String> = store
            .iter_locations()
            .unwrap()
            .into_iter()
            .map(|l| l.id.to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(store.get_location(&LocationId::from("zz")).unwrap(), None);
    }
}
