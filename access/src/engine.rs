//! Verification engine: the check-in/check-out state machine.
//!
//! Per (person, location) the state is derived from the audit log: absent or
//! present here, combined with present or absent anywhere. One scan runs one
//! transition:
//!
//! 1. Resolve the identity. Unknown → breach record + `InvalidIdentity`.
//!    Disabled → `AccessDenied`, nothing recorded.
//! 2. Under the person's lock, read the latest record at this location and
//!    the latest record anywhere.
//! 3. Checking in = no record here, or the last one here is a check-out.
//! 4. Checking in while the latest record anywhere is a check-in →
//!    `AlreadyPresentElsewhere`, nothing recorded.
//! 5. Otherwise append exactly one check-in or check-out record.

use std::sync::Arc;

use gatewatch_types::{
    AuditKind, AuditRecord, Clock, Identity, Location, LocationId, NewAuditRecord, OperatorId,
    PersonId,
};
use serde::Serialize;

use crate::{
    parse_identity_token, AccessConfig, AccessError, GateAssignmentRegistry, PersonLocks,
    SharedAuditLog, SharedIdentityStore,
};

/// The action decided for an accepted scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanAction {
    CheckIn,
    CheckOut,
}

impl ScanAction {
    pub fn kind(&self) -> AuditKind {
        match self {
            Self::CheckIn => AuditKind::CheckIn,
            Self::CheckOut => AuditKind::CheckOut,
        }
    }
}

/// Result of an accepted scan.
#[derive(Clone, Debug, Serialize)]
pub struct ScanOutcome {
    pub action: ScanAction,
    pub identity: Identity,
    pub record: AuditRecord,
}

pub struct VerificationEngine {
    identities: SharedIdentityStore,
    log: SharedAuditLog,
    registry: Arc<GateAssignmentRegistry>,
    clock: Arc<dyn Clock + Send + Sync>,
    locks: PersonLocks,
}

impl VerificationEngine {
    pub fn new(
        identities: SharedIdentityStore,
        log: SharedAuditLog,
        registry: Arc<GateAssignmentRegistry>,
        clock: Arc<dyn Clock + Send + Sync>,
        config: &AccessConfig,
    ) -> Self {
        Self {
            identities,
            log,
            registry,
            clock,
            locks: PersonLocks::new(config.lock_timeout()),
        }
    }

    /// Verify a scan made by `operator` at whichever gate they staff.
    pub fn verify_at_operator_gate(
        &self,
        token: &str,
        operator: &OperatorId,
    ) -> Result<ScanOutcome, AccessError> {
        let location = self.registry.resolve_operator_location(operator)?;
        tracing::debug!(operator = %operator, location = %location.id, "scan routed to gate");
        self.verify_at(token, &location)
    }

    /// Verify a scan at `location_id`.
    pub fn verify(&self, token: &str, location_id: &LocationId) -> Result<ScanOutcome, AccessError> {
        let location = self.registry.location(location_id)?;
        self.verify_at(token, &location)
    }

    fn verify_at(&self, token: &str, location: &Location) -> Result<ScanOutcome, AccessError> {
        let identity = match parse_identity_token(token) {
            Some(person) => self.identities.get_identity(&person)?,
            None => None,
        };
        let Some(identity) = identity else {
            return Err(self.record_breach(&location.id));
        };

        if identity.disabled {
            tracing::info!(person = %identity.id, location = %location.id, "scan refused: account disabled");
            return Err(AccessError::AccessDenied(identity.id));
        }

        let person = identity.id.clone();
        let (action, record) = self
            .locks
            .run_exclusive(&person, || self.transition(&person, &location.id))??;

        tracing::info!(
            person = %person,
            location = %location.id,
            record = %record.id,
            action = ?action,
            "scan accepted"
        );
        Ok(ScanOutcome {
            action,
            identity,
            record,
        })
    }

    /// Steps 2 to 5. Must run under the person's lock.
    fn transition(
        &self,
        person: &PersonId,
        location: &LocationId,
    ) -> Result<(ScanAction, AuditRecord), AccessError> {
        let location_last = self.log.most_recent(person, Some(location))?;
        let action = match location_last.map(|r| r.kind) {
            Some(AuditKind::CheckIn) => ScanAction::CheckOut,
            _ => ScanAction::CheckIn,
        };

        if action == ScanAction::CheckIn {
            if let Some(global_last) = self.log.most_recent(person, None)? {
                if global_last.kind == AuditKind::CheckIn {
                    tracing::info!(
                        person = %person,
                        location = %location,
                        present_at = %global_last.location_id,
                        "scan refused: already checked in elsewhere"
                    );
                    return Err(AccessError::AlreadyPresentElsewhere {
                        person: person.clone(),
                        at: global_last.location_id,
                    });
                }
            }
        }

        let record = NewAuditRecord {
            person_id: Some(person.clone()),
            location_id: location.clone(),
            kind: action.kind(),
            timestamp: self.clock.now(),
        };
        Ok((action, self.log.append(record)?))
    }

    /// Record a scan of an unresolvable identity. Returns the error to hand back.
    fn record_breach(&self, location: &LocationId) -> AccessError {
        match self
            .log
            .append(NewAuditRecord::breach(location.clone(), self.clock.now()))
        {
            Ok(record) => {
                tracing::warn!(location = %location, record = %record.id, "security breach: unknown identity scanned");
                AccessError::InvalidIdentity {
                    location: location.clone(),
                }
            }
            Err(e) => {
                tracing::error!(location = %location, "failed to record security breach: {e}");
                AccessError::Store(e)
            }
        }
    }

    pub fn registry(&self) -> &GateAssignmentRegistry {
        &self.registry
    }
}
