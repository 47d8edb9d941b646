//! Identity and operator storage traits.
//!
//! Both are owned by collaborators outside the access engine (credential
//! issuance, the account system). The engine only reads them; the write
//! methods exist for administration tooling and tests.

use crate::StoreError;
use gatewatch_types::{Identity, Operator, OperatorId, PersonId};

pub trait IdentityStore {
    /// Look up a card holder. `Ok(None)` means the id is unknown.
    fn get_identity(&self, id: &PersonId) -> Result<Option<Identity>, StoreError>;
    fn put_identity(&self, identity: &Identity) -> Result<(), StoreError>;
}

pub trait OperatorStore {
    fn get_operator(&self, id: &OperatorId) -> Result<Option<Operator>, StoreError>;
    fn put_operator(&self, operator: &Operator) -> Result<(), StoreError>;
}
