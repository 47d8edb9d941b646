//! Location (gate) storage trait.

use thiserror::Error;

use crate::StoreError;
use gatewatch_types::{Location, LocationId, OperatorId};

/// Why an assignment was refused.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AssignmentConflict {
    /// The operator already staffs a different gate.
    #[error("operator already assigned to {current}")]
    OperatorBusy { current: LocationId },
    /// The gate is already staffed by a different operator.
    #[error("location already staffed by {by}")]
    GateStaffed { by: OperatorId },
}

#[derive(Debug, Error)]
pub enum AssignError {
    #[error("location not found: {0}")]
    LocationNotFound(LocationId),

    #[error(transparent)]
    Conflict(#[from] AssignmentConflict),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Gate records and the operator currently staffing each gate.
///
/// Implementations keep a reverse index from operator to location so that
/// routing a scan does not scan every gate.
pub trait LocationStore {
    fn get_location(&self, id: &LocationId) -> Result<Option<Location>, StoreError>;

    /// Insert or replace a location, keeping the operator index in step.
    fn put_location(&self, location: &Location) -> Result<(), StoreError>;

    /// Staff `location` with `operator`.
    ///
    /// Both sides of the one-operator-one-gate rule are checked in the same
    /// transaction (or under the same lock) as the write, so concurrent
    /// writers sharing the store cannot both succeed. Assigning the pair that
    /// already holds returns the location unchanged.
    fn assign_operator(
        &self,
        location: &LocationId,
        operator: &OperatorId,
    ) -> Result<Location, AssignError>;

    /// Clear the operator of `location`. `Ok(None)` if the gate does not exist.
    fn clear_operator(&self, location: &LocationId) -> Result<Option<Location>, StoreError>;

    /// The location currently staffed by `operator`, if any.
    fn location_for_operator(&self, operator: &OperatorId)
        -> Result<Option<Location>, StoreError>;

    /// All locations, ordered by id.
    fn iter_locations(&self) -> Result<Vec<Location>, StoreError>;
}

/// The assignment decision shared by every backend, given the gate record and
/// the gate the operator currently staffs. Returns the record to store and
/// whether it changed.
pub fn plan_assignment(
    mut location: Location,
    operator: &OperatorId,
    operator_current: Option<&LocationId>,
) -> Result<(Location, bool), AssignmentConflict> {
    if let Some(current) = operator_current {
        if current == &location.id && location.is_staffed_by(operator) {
            return Ok((location, false));
        }
        if current != &location.id {
            return Err(AssignmentConflict::OperatorBusy {
                current: current.clone(),
            });
        }
    }
    if let Some(other) = &location.assigned_operator {
        if other != operator {
            return Err(AssignmentConflict::GateStaffed { by: other.clone() });
        }
    }
    location.assigned_operator = Some(operator.clone());
    Ok((location, true))
}
