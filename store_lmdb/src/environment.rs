//! LMDB environment setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions, RwTxn};

use crate::meta::LmdbMeta;
use crate::{LmdbAuditLog, LmdbError, LmdbIdentityStore, LmdbLocationStore};

const MAX_DBS: u32 = 16;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    path: PathBuf,
    env: Arc<Env>,
    pub(crate) audit_db: Database<Bytes, Bytes>,
    pub(crate) audit_by_person_db: Database<Bytes, Bytes>,
    pub(crate) audit_by_location_db: Database<Bytes, Bytes>,
    pub(crate) audit_by_person_location_db: Database<Bytes, Bytes>,
    pub(crate) audit_by_kind_db: Database<Bytes, Bytes>,
    pub(crate) identities_db: Database<Bytes, Bytes>,
    pub(crate) operators_db: Database<Bytes, Bytes>,
    pub(crate) locations_db: Database<Bytes, Bytes>,
    pub(crate) operator_index_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

fn bytes_db(
    env: &Env,
    wtxn: &mut RwTxn<'_>,
    name: &str,
) -> Result<Database<Bytes, Bytes>, LmdbError> {
    Ok(env.create_database(wtxn, Some(name))?)
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    ///
    /// `map_size` is the maximum size of the memory map in bytes.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)
            .map_err(|e| LmdbError::Heed(format!("create {}: {e}", path.display())))?;

        // SAFETY: the environment is opened once per path per process and
        // shared through `Arc` afterwards.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let audit_db = bytes_db(&env, &mut wtxn, "audit_log")?;
        let audit_by_person_db = bytes_db(&env, &mut wtxn, "audit_by_person")?;
        let audit_by_location_db = bytes_db(&env, &mut wtxn, "audit_by_location")?;
        let audit_by_person_location_db = bytes_db(&env, &mut wtxn, "audit_by_person_location")?;
        let audit_by_kind_db = bytes_db(&env, &mut wtxn, "audit_by_kind")?;
        let identities_db = bytes_db(&env, &mut wtxn, "identities")?;
        let operators_db = bytes_db(&env, &mut wtxn, "operators")?;
        let locations_db = bytes_db(&env, &mut wtxn, "locations")?;
        let operator_index_db = bytes_db(&env, &mut wtxn, "operator_index")?;
        let meta_db = bytes_db(&env, &mut wtxn, "meta")?;
        wtxn.commit()?;

        let environment = Self {
            path: path.to_path_buf(),
            env: Arc::new(env),
            audit_db,
            audit_by_person_db,
            audit_by_location_db,
            audit_by_person_location_db,
            audit_by_kind_db,
            identities_db,
            operators_db,
            locations_db,
            operator_index_db,
            meta_db,
        };
        environment.meta().ensure_schema()?;
        tracing::info!(path = %path.display(), map_size, "LMDB environment opened");
        Ok(environment)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn audit_log(&self) -> LmdbAuditLog {
        LmdbAuditLog {
            env: self.env.clone(),
            records_db: self.audit_db,
            by_person_db: self.audit_by_person_db,
            by_location_db: self.audit_by_location_db,
            by_person_location_db: self.audit_by_person_location_db,
            by_kind_db: self.audit_by_kind_db,
        }
    }

    pub fn identity_store(&self) -> LmdbIdentityStore {
        LmdbIdentityStore {
            env: self.env.clone(),
            identities_db: self.identities_db,
            operators_db: self.operators_db,
        }
    }

    pub fn location_store(&self) -> LmdbLocationStore {
        LmdbLocationStore {
            env: self.env.clone(),
            locations_db: self.locations_db,
            operator_index_db: self.operator_index_db,
        }
    }

    pub fn meta(&self) -> LmdbMeta {
        LmdbMeta {
            env: self.env.clone(),
            meta_db: self.meta_db,
        }
    }
}
