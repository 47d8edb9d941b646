//! LMDB implementation of IdentityStore and OperatorStore.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};
use serde::de::DeserializeOwned;
use serde::Serialize;

use gatewatch_store::{IdentityStore, OperatorStore, StoreError};
use gatewatch_types::{Identity, Operator, OperatorId, PersonId};

use crate::codec::{decode, encode};
use crate::LmdbError;

pub struct LmdbIdentityStore {
    pub(crate) env: Arc<Env>,
    pub(crate) identities_db: Database<Bytes, Bytes>,
    pub(crate) operators_db: Database<Bytes, Bytes>,
}

impl LmdbIdentityStore {
    fn get<T: DeserializeOwned>(
        &self,
        db: Database<Bytes, Bytes>,
        key: &[u8],
    ) -> Result<Option<T>, LmdbError> {
        let rtxn = self.env.read_txn()?;
        let value = db.get(&rtxn, key)?.map(decode).transpose()?;
        Ok(value)
    }

    fn put<T: Serialize>(
        &self,
        db: Database<Bytes, Bytes>,
        key: &[u8],
        value: &T,
    ) -> Result<(), LmdbError> {
        let bytes = encode(value)?;
        let mut wtxn = self.env.write_txn()?;
        db.put(&mut wtxn, key, &bytes)?;
        wtxn.commit()?;
        Ok(())
    }
}

impl IdentityStore for LmdbIdentityStore {
    fn get_identity(&self, id: &PersonId) -> Result<Option<Identity>, StoreError> {
        Ok(self.get(self.identities_db, id.as_bytes())?)
    }

    fn put_identity(&self, identity: &Identity) -> Result<(), StoreError> {
        Ok(self.put(self.identities_db, identity.id.as_bytes(), identity)?)
    }
}

impl OperatorStore for LmdbIdentityStore {
    fn get_operator(&self, id: &OperatorId) -> Result<Option<Operator>, StoreError> {
        Ok(self.get(self.operators_db, id.as_bytes())?)
    }

    fn put_operator(&self, operator: &Operator) -> Result<(), StoreError> {
        Ok(self.put(self.operators_db, operator.id.as_bytes(), operator)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;
    use gatewatch_types::Role;

    #[test]
    fn identity_roundtrip_keeps_flags() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 1 << 20).unwrap();
        let store = env.identity_store();

        let carol = Identity::new("carol").with_display_name("Carol").disabled();
        assert_eq!(store.get_identity(&carol.id).unwrap(), None);
        store.put_identity(&carol).unwrap();
        assert_eq!(store.get_identity(&carol.id).unwrap(), Some(carol));
    }

    #[test]
    fn operators_are_separate_from_identities() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 1 << 20).unwrap();
        let store = env.identity_store();

        store
            .put_operator(&Operator {
                id: OperatorId::from("x"),
                role: Role::Admin,
            })
            .unwrap();
        assert_eq!(store.get_identity(&PersonId::from("x")).unwrap(), None);
        let op = store.get_operator(&OperatorId::from("x")).unwrap().unwrap();
        assert_eq!(op.role, Role::Admin);
    }
}
