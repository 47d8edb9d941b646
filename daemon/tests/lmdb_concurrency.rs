//! Concurrency checks against the LMDB store the daemon ships with.

use std::sync::{Arc, Barrier};

use gatewatch_access::{
    AccessConfig, AccessError, AssignmentConflict, GateAssignmentRegistry, ScanAction,
    ScanOutcome, VerificationEngine,
};
use gatewatch_store::{AuditLogStore, IdentityStore, LocationStore, OperatorStore};
use gatewatch_store_lmdb::LmdbEnvironment;
use gatewatch_types::{Identity, Location, LocationId, Operator, OperatorId, SystemClock};

type Task<T> = Box<dyn FnOnce() -> T + Send>;

fn open(dir: &tempfile::TempDir) -> LmdbEnvironment {
    let env = LmdbEnvironment::open(&dir.path().join("db"), 8 << 20).unwrap();
    let identities = env.identity_store();
    identities.put_identity(&Identity::new("P")).unwrap();
    identities.put_operator(&Operator::security("O")).unwrap();
    identities.put_operator(&Operator::security("O2")).unwrap();
    let locations = env.location_store();
    for (id, name) in [("L1", "Main entrance"), ("L2", "Library")] {
        locations.put_location(&Location::new(id, name)).unwrap();
    }
    env
}

/// Each registry gets its own store handles, like a second process opening
/// the same data directory.
fn registry(env: &LmdbEnvironment) -> GateAssignmentRegistry {
    GateAssignmentRegistry::new(
        Arc::new(env.location_store()),
        Arc::new(env.identity_store()),
    )
}

/// Run every task on its own thread, released together.
fn race<T: Send + 'static>(tasks: Vec<Task<T>>) -> Vec<T> {
    let barrier = Arc::new(Barrier::new(tasks.len()));
    let handles: Vec<_> = tasks
        .into_iter()
        .map(|task| {
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                task()
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[test]
fn two_registries_cannot_give_one_operator_two_gates() {
    for _ in 0..20 {
        let dir = tempfile::tempdir().unwrap();
        let env = open(&dir);
        let first = Arc::new(registry(&env));
        let second = Arc::new(registry(&env));

        let tasks: Vec<Task<Result<Location, AccessError>>> = vec![
            Box::new(move || first.assign(&LocationId::from("L1"), &OperatorId::from("O"))),
            Box::new(move || second.assign(&LocationId::from("L2"), &OperatorId::from("O"))),
        ];
        let results = race(tasks);

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1, "{results:?}");
        for r in &results {
            match r {
                Ok(_) => {}
                Err(AccessError::Conflict {
                    conflict: AssignmentConflict::OperatorBusy { .. },
                    ..
                }) => {}
                Err(other) => panic!("unexpected error {other:?}"),
            }
        }
        let staffed = env
            .location_store()
            .iter_locations()
            .unwrap()
            .into_iter()
            .filter(|l| l.is_staffed_by(&OperatorId::from("O")))
            .count();
        assert_eq!(staffed, 1, "operator staffs {staffed} gates");
    }
}

#[test]
fn two_registries_cannot_put_two_operators_on_one_gate() {
    for _ in 0..20 {
        let dir = tempfile::tempdir().unwrap();
        let env = open(&dir);
        let first = Arc::new(registry(&env));
        let second = Arc::new(registry(&env));

        let tasks: Vec<Task<Result<Location, AccessError>>> = vec![
            Box::new(move || first.assign(&LocationId::from("L1"), &OperatorId::from("O"))),
            Box::new(move || second.assign(&LocationId::from("L1"), &OperatorId::from("O2"))),
        ];
        let results = race(tasks);

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1, "{results:?}");
        let gate = env
            .location_store()
            .get_location(&LocationId::from("L1"))
            .unwrap()
            .unwrap();
        let winner = results
            .iter()
            .find_map(|r| r.as_ref().ok())
            .and_then(|l| l.assigned_operator.clone());
        assert_eq!(gate.assigned_operator, winner);
    }
}

#[test]
fn concurrent_scans_at_two_gates_admit_once() {
    for _ in 0..20 {
        let dir = tempfile::tempdir().unwrap();
        let env = open(&dir);
        let log = Arc::new(env.audit_log());
        let identities = Arc::new(env.identity_store());
        let engine = Arc::new(VerificationEngine::new(
            identities.clone(),
            log.clone(),
            Arc::new(GateAssignmentRegistry::new(
                Arc::new(env.location_store()),
                identities,
            )),
            Arc::new(SystemClock),
            &AccessConfig::default(),
        ));

        let tasks: Vec<Task<Result<ScanOutcome, AccessError>>> = ["L1", "L2"]
            .into_iter()
            .map(|gate| {
                let engine = Arc::clone(&engine);
                Box::new(move || engine.verify("P", &LocationId::from(gate))) as Task<_>
            })
            .collect();
        let results = race(tasks);

        let check_ins = results
            .iter()
            .filter(|r| matches!(r, Ok(o) if o.action == ScanAction::CheckIn))
            .count();
        assert_eq!(check_ins, 1, "exactly one gate may admit P: {results:?}");
        for r in &results {
            match r {
                Ok(_)
                | Err(AccessError::AlreadyPresentElsewhere { .. })
                | Err(AccessError::Contention(_)) => {}
                Err(other) => panic!("unexpected error {other:?}"),
            }
        }
        assert_eq!(log.record_count().unwrap(), 1);
    }
}
