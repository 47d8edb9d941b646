//! Administration subcommands run directly against the local store.
//!
//! Identities and operators normally come from external systems; these
//! commands seed and inspect them on a single host.

use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use gatewatch_access::{
    AuditHistory, GateAssignmentRegistry, Page, PresenceResolver, VerificationEngine,
    OVERVIEW_RECENT_RECORDS,
};
use gatewatch_store::{IdentityStore, OperatorStore};
use gatewatch_store_lmdb::{LmdbEnvironment, LmdbIdentityStore};
use gatewatch_types::{
    Clock, GateType, Identity, LocationId, Operator, OperatorId, PersonId, Role, SystemClock,
};
use serde::Serialize;

use crate::config::DaemonConfig;

/// The access components wired to the LMDB store.
pub struct Services {
    pub identities: Arc<LmdbIdentityStore>,
    pub engine: Arc<VerificationEngine>,
    pub presence: PresenceResolver,
    pub history: AuditHistory,
}

impl Services {
    pub fn open(config: &DaemonConfig) -> anyhow::Result<Self> {
        let env = LmdbEnvironment::open(&config.data_dir, config.map_size_bytes())
            .with_context(|| format!("opening store at {}", config.data_dir.display()))?;

        let identities = Arc::new(env.identity_store());
        let locations = Arc::new(env.location_store());
        let log = Arc::new(env.audit_log());
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(SystemClock);

        let registry = Arc::new(GateAssignmentRegistry::new(
            locations.clone(),
            identities.clone(),
        ));
        let engine = Arc::new(VerificationEngine::new(
            identities.clone(),
            log.clone(),
            registry,
            clock,
            &config.access,
        ));
        Ok(Self {
            history: AuditHistory::new(log.clone(), locations, identities.clone()),
            presence: PresenceResolver::new(log),
            identities,
            engine,
        })
    }

    fn registry(&self) -> &GateAssignmentRegistry {
        self.engine.registry()
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ── Identities and operators ─────────────────────────────────────────────

#[derive(clap::Subcommand)]
pub enum IdentityAction {
    /// Create or replace a card holder.
    Put {
        id: String,
        /// Name shown to the operator on a successful scan.
        #[arg(long)]
        name: Option<String>,
        /// Refuse this card holder at every gate.
        #[arg(long)]
        disabled: bool,
    },
    /// Show a card holder.
    Get { id: String },
}

#[derive(clap::Subcommand)]
pub enum OperatorAction {
    /// Create or replace an operator account.
    Put {
        id: String,
        /// "admin", "security" or "user". Only security operators staff gates.
        #[arg(long, default_value = "security")]
        role: Role,
    },
    /// Show an operator account.
    Get { id: String },
}

pub fn identity(services: &Services, action: IdentityAction) -> anyhow::Result<()> {
    match action {
        IdentityAction::Put { id, name, disabled } => {
            let mut identity = Identity::new(id);
            identity.display_name = name;
            identity.disabled = disabled;
            services.identities.put_identity(&identity)?;
            tracing::info!(person = %identity.id, disabled, "identity stored");
            print_json(&identity)
        }
        IdentityAction::Get { id } => {
            let identity = services
                .identities
                .get_identity(&PersonId::from(id.as_str()))?
                .with_context(|| format!("no identity {id}"))?;
            print_json(&identity)
        }
    }
}

pub fn operator(services: &Services, action: OperatorAction) -> anyhow::Result<()> {
    match action {
        OperatorAction::Put { id, role } => {
            let operator = Operator {
                id: OperatorId::from(id),
                role,
            };
            services.identities.put_operator(&operator)?;
            tracing::info!(operator = %operator.id, role = ?operator.role, "operator stored");
            print_json(&operator)
        }
        OperatorAction::Get { id } => {
            let operator = services
                .identities
                .get_operator(&OperatorId::from(id.as_str()))?
                .with_context(|| format!("no operator {id}"))?;
            print_json(&operator)
        }
    }
}

// ── Locations ────────────────────────────────────────────────────────────

#[derive(clap::Subcommand)]
pub enum LocationAction {
    /// Register a new gate.
    Create {
        name: String,
        /// ENTRY, EXIT or ENTRY_EXIT.
        #[arg(long = "type", default_value = "entry_exit")]
        gate_type: GateType,
    },
    /// List gates with their latest records.
    List,
    /// Put a security operator in charge of a gate.
    Assign { location: String, operator: String },
    /// Clear a gate's operator.
    Unassign { location: String },
}

pub fn location(services: &Services, action: LocationAction) -> anyhow::Result<()> {
    let registry = services.registry();
    match action {
        LocationAction::Create { name, gate_type } => {
            print_json(&registry.register_location(&name, gate_type)?)
        }
        LocationAction::List => {
            print_json(&services.history.locations_overview(OVERVIEW_RECENT_RECORDS)?)
        }
        LocationAction::Assign { location, operator } => print_json(
            &registry.assign(&LocationId::from(location), &OperatorId::from(operator))?,
        ),
        LocationAction::Unassign { location } => {
            print_json(&registry.unassign(&LocationId::from(location))?)
        }
    }
}

// ── Logs and presence ────────────────────────────────────────────────────

#[derive(clap::Subcommand)]
pub enum LogsAction {
    /// Records at one gate, newest first.
    Location {
        id: String,
        /// Only records from this UTC day (YYYY-MM-DD).
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Breaches at every gate, newest first.
    Breaches {
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Every record of one person, newest first.
    Person {
        id: String,
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
}

fn first(limit: usize) -> Option<Page> {
    Some(Page { offset: 0, limit })
}

pub fn logs(services: &Services, action: LogsAction) -> anyhow::Result<()> {
    let history = &services.history;
    let records = match action {
        LogsAction::Location { id, date, limit } => {
            history.location_logs(&LocationId::from(id), date, first(limit))?
        }
        LogsAction::Breaches { limit } => history.breach_logs(first(limit))?,
        LogsAction::Person { id, limit } => {
            history.person_history(&PersonId::from(id), first(limit))?
        }
    };
    print_json(&records)
}

pub fn presence(services: &Services, person: &str) -> anyhow::Result<()> {
    let person = PersonId::from(person);
    let location = services.presence.current_location(&person)?;
    print_json(&serde_json::json!({
        "person_id": person,
        "presence": services.presence.global_presence(&person)?,
        "location_id": location,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatewatch_access::ScanAction;

    fn services(dir: &tempfile::TempDir) -> Services {
        let config = DaemonConfig {
            data_dir: dir.path().join("db"),
            map_size_mb: 8,
            ..DaemonConfig::default()
        };
        Services::open(&config).unwrap()
    }

    #[test]
    fn seeded_store_accepts_scans() {
        let dir = tempfile::tempdir().unwrap();
        let s = services(&dir);
        identity(
            &s,
            IdentityAction::Put {
                id: "alice".into(),
                name: Some("Alice".into()),
                disabled: false,
            },
        )
        .unwrap();
        operator(
            &s,
            OperatorAction::Put {
                id: "guard".into(),
                role: Role::Security,
            },
        )
        .unwrap();
        let gate = s.registry().register_location("Main", GateType::Entry).unwrap();
        s.registry().assign(&gate.id, &OperatorId::from("guard")).unwrap();

        let outcome = s
            .engine
            .verify_at_operator_gate("alice", &OperatorId::from("guard"))
            .unwrap();
        assert_eq!(outcome.action, ScanAction::CheckIn);
        assert_eq!(
            s.presence.current_location(&PersonId::from("alice")).unwrap(),
            Some(gate.id)
        );
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let gate = {
            let s = services(&dir);
            s.identities.put_identity(&Identity::new("bob")).unwrap();
            let gate = s.registry().register_location("Side", GateType::default()).unwrap();
            s.engine.verify("bob", &gate.id).unwrap();
            gate
        };
        let s = services(&dir);
        let outcome = s.engine.verify("bob", &gate.id).unwrap();
        assert_eq!(outcome.action, ScanAction::CheckOut);
        assert_eq!(outcome.record.id.as_u64(), 2);
    }
}
