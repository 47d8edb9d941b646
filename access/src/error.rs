pub use gatewatch_store::AssignmentConflict;
use gatewatch_store::StoreError;
use gatewatch_types::{LocationId, OperatorId, PersonId};
use thiserror::Error;

/// Every way a call into the access engine can fail.
///
/// All variants are terminal for the call that produced them; nothing is
/// retried internally.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The scanned identity does not resolve. A breach record was written.
    #[error("invalid identity scanned at {location}")]
    InvalidIdentity { location: LocationId },

    /// Known identity, but the account is disabled. Nothing was recorded.
    #[error("access denied: account {0} is disabled")]
    AccessDenied(PersonId),

    /// Checking in would make the person present at two locations at once.
    #[error("{person} is already checked in at another location ({at})")]
    AlreadyPresentElsewhere { person: PersonId, at: LocationId },

    #[error("operator {0} is not assigned to any location")]
    NotAssigned(OperatorId),

    #[error("cannot assign {operator} to {location}: {conflict}")]
    Conflict {
        operator: OperatorId,
        location: LocationId,
        conflict: AssignmentConflict,
    },

    /// Another verification for the same person held the lock past the wait bound.
    #[error("verification for {0} is contended, retry the scan")]
    Contention(PersonId),

    #[error("location not found: {0}")]
    LocationNotFound(LocationId),

    /// Unknown operator, or an operator whose role may not staff a gate.
    #[error("invalid security operator: {0}")]
    InvalidOperator(OperatorId),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl AccessError {
    /// Failures that say nothing about the scan itself; the operator may retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Contention(_) | Self::Store(_))
    }

    /// Scan rejections the operator should show as "access denied".
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentity { .. } | Self::AccessDenied(_) | Self::AlreadyPresentElsewhere { .. }
        )
    }

    /// Stable machine-readable name, used in responses and metric labels.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidIdentity { .. } => "invalid_identity",
            Self::AccessDenied(_) => "access_denied",
            Self::AlreadyPresentElsewhere { .. } => "already_present_elsewhere",
            Self::NotAssigned(_) => "not_assigned",
            Self::Conflict { .. } => "conflict",
            Self::Contention(_) => "contention",
            Self::LocationNotFound(_) => "location_not_found",
            Self::InvalidOperator(_) => "invalid_operator",
            Self::Store(_) => "store",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_contention_and_storage_are_transient() {
        assert!(AccessError::Contention(PersonId::from("p")).is_transient());
        assert!(AccessError::Store(StoreError::Backend("io".into())).is_transient());
        assert!(!AccessError::AccessDenied(PersonId::from("p")).is_transient());
        assert!(!AccessError::NotAssigned(OperatorId::from("o")).is_transient());
    }

    #[test]
    fn denials_cover_the_three_scan_rejections() {
        let l = LocationId::from("l");
        assert!(AccessError::InvalidIdentity { location: l.clone() }.is_denial());
        assert!(AccessError::AccessDenied(PersonId::from("p")).is_denial());
        assert!(AccessError::AlreadyPresentElsewhere {
            person: PersonId::from("p"),
            at: l,
        }
        .is_denial());
        assert!(!AccessError::Contention(PersonId::from("p")).is_denial());
    }

    #[test]
    fn conflict_message_names_both_sides() {
        let err = AccessError::Conflict {
            operator: OperatorId::from("op"),
            location: LocationId::from("l2"),
            conflict: AssignmentConflict::OperatorBusy {
                current: LocationId::from("l1"),
            },
        };
        assert_eq!(
            err.to_string(),
            "cannot assign op to l2: operator already assigned to l1"
        );
    }
}
