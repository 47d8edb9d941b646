//! Schema version bookkeeping.
//!
//! A fresh database is stamped with [`SCHEMA_VERSION`] on first open. A
//! database stamped by a newer build is refused rather than misread.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use crate::LmdbError;

/// The schema version that the current code writes.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

pub struct LmdbMeta {
    pub(crate) env: Arc<Env>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbMeta {
    /// Stored schema version, `0` for a database that was never stamped.
    pub fn schema_version(&self) -> Result<u32, LmdbError> {
        let rtxn = self.env.read_txn()?;
        match self.meta_db.get(&rtxn, SCHEMA_VERSION_KEY)? {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                    LmdbError::Serialization("schema_version has unexpected byte length".into())
                })?;
                Ok(u32::from_le_bytes(arr))
            }
            None => Ok(0),
        }
    }

    pub fn set_schema_version(&self, version: u32) -> Result<(), LmdbError> {
        let mut wtxn = self.env.write_txn()?;
        self.meta_db
            .put(&mut wtxn, SCHEMA_VERSION_KEY, &version.to_le_bytes())?;
        wtxn.commit()?;
        Ok(())
    }

    pub(crate) fn ensure_schema(&self) -> Result<(), LmdbError> {
        match self.schema_version()? {
            SCHEMA_VERSION => Ok(()),
            0 => {
                tracing::info!(version = SCHEMA_VERSION, "stamping new database");
                self.set_schema_version(SCHEMA_VERSION)
            }
            found if found > SCHEMA_VERSION => Err(LmdbError::SchemaTooNew {
                found,
                supported: SCHEMA_VERSION,
            }),
            found => Err(LmdbError::Serialization(format!(
                "no upgrade path from schema version {found}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::LmdbEnvironment;

    use super::*;

    #[test]
    fn fresh_database_is_stamped() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 1 << 20).unwrap();
        assert_eq!(env.meta().schema_version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn newer_schema_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        {
            let env = LmdbEnvironment::open(dir.path(), 1 << 20).unwrap();
            env.meta().set_schema_version(SCHEMA_VERSION + 1).unwrap();
        }
        assert!(matches!(
            LmdbEnvironment::open(dir.path(), 1 << 20),
            Err(LmdbError::SchemaTooNew { .. })
        ));
    }
}
