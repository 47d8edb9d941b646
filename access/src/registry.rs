//! Gate assignment registry: one security operator ⇄ one location.
//!
//! The invariant holds in both directions. An operator staffs at most one
//! gate, and a gate is staffed by at most one operator. The location store
//! checks both sides atomically with the write.

use gatewatch_store::AssignError;
use gatewatch_types::{GateType, Location, LocationId, OperatorId};
use uuid::Uuid;

use crate::{AccessError, SharedLocationStore, SharedOperatorStore};

pub struct GateAssignmentRegistry {
    locations: SharedLocationStore,
    operators: SharedOperatorStore,
}

impl GateAssignmentRegistry {
    pub fn new(locations: SharedLocationStore, operators: SharedOperatorStore) -> Self {
        Self {
            locations,
            operators,
        }
    }

    /// Register a new, unstaffed gate.
    pub fn register_location(
        &self,
        name: &str,
        gate_type: GateType,
    ) -> Result<Location, AccessError> {
        let location = Location::new(Uuid::new_v4().to_string(), name).with_gate_type(gate_type);
        self.locations.put_location(&location)?;
        tracing::info!(location = %location.id, name, gate_type = ?gate_type, "location registered");
        Ok(location)
    }

    pub fn location(&self, id: &LocationId) -> Result<Location, AccessError> {
        self.locations
            .get_location(id)?
            .ok_or_else(|| AccessError::LocationNotFound(id.clone()))
    }

    pub fn locations(&self) -> Result<Vec<Location>, AccessError> {
        Ok(self.locations.iter_locations()?)
    }

    /// Assign `operator` to staff `location`.
    ///
    /// Re-assigning an operator to the gate they already staff is a no-op.
    /// The conflict checks and the write happen inside the store, so the rule
    /// holds across every process sharing it.
    pub fn assign(
        &self,
        location_id: &LocationId,
        operator_id: &OperatorId,
    ) -> Result<Location, AccessError> {
        match self.operators.get_operator(operator_id)? {
            Some(op) if op.role.can_staff_gate() => {}
            _ => return Err(AccessError::InvalidOperator(operator_id.clone())),
        }

        let location = self
            .locations
            .assign_operator(location_id, operator_id)
            .map_err(|e| match e {
                AssignError::LocationNotFound(id) => AccessError::LocationNotFound(id),
                AssignError::Conflict(conflict) => AccessError::Conflict {
                    operator: operator_id.clone(),
                    location: location_id.clone(),
                    conflict,
                },
                AssignError::Store(e) => AccessError::Store(e),
            })?;
        tracing::info!(location = %location_id, operator = %operator_id, "operator assigned");
        Ok(location)
    }

    /// Clear the gate's assignment. Clearing an unstaffed gate is a no-op.
    pub fn unassign(&self, location_id: &LocationId) -> Result<Location, AccessError> {
        let location = self
            .locations
            .clear_operator(location_id)?
            .ok_or_else(|| AccessError::LocationNotFound(location_id.clone()))?;
        tracing::info!(location = %location_id, "operator unassigned");
        Ok(location)
    }

    /// The gate `operator` currently staffs. Used to route that operator's scans.
    pub fn resolve_operator_location(
        &self,
        operator_id: &OperatorId,
    ) -> Result<Location, AccessError> {
        self.locations
            .location_for_operator(operator_id)?
            .ok_or_else(|| AccessError::NotAssigned(operator_id.clone()))
    }
}
