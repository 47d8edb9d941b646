//! LMDB implementation of AuditLogStore.
//!
//! Records live in `audit_log` keyed by their sequence number (big-endian),
//! so a reverse cursor walks them newest first. Four secondary indexes map
//! `prefix ++ seq` to nothing:
//!
//! - `audit_by_person`: `person`
//! - `audit_by_location`: `location`
//! - `audit_by_person_location`: `person ++ location`
//! - `audit_by_kind`: `kind tag`
//!
//! A query walks the narrowest index in reverse and resolves each hit
//! against `audit_log`. Sequence numbers are allocated inside the append's
//! write transaction; LMDB admits one writer at a time, so ids are strictly
//! increasing and gap-free.

use std::ops::Bound;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn};

use gatewatch_store::{AuditFilter, AuditLogStore, StoreError};
use gatewatch_types::{AuditRecord, LocationId, NewAuditRecord, PersonId, RecordId};

use crate::codec::{decode, encode, id_prefix, increment_prefix, push_id, seq_suffix, with_seq};
use crate::LmdbError;

pub struct LmdbAuditLog {
    pub(crate) env: Arc<Env>,
    pub(crate) records_db: Database<Bytes, Bytes>,
    pub(crate) by_person_db: Database<Bytes, Bytes>,
    pub(crate) by_location_db: Database<Bytes, Bytes>,
    pub(crate) by_person_location_db: Database<Bytes, Bytes>,
    pub(crate) by_kind_db: Database<Bytes, Bytes>,
}

fn person_location_prefix(person: &PersonId, location: &LocationId) -> Result<Vec<u8>, LmdbError> {
    let mut key = id_prefix(person.as_bytes())?;
    push_id(&mut key, location.as_bytes())?;
    Ok(key)
}

/// Applies offset and limit while results stream in newest first.
struct Collector<'f> {
    filter: &'f AuditFilter,
    skipped: usize,
    records: Vec<AuditRecord>,
}

impl<'f> Collector<'f> {
    fn new(filter: &'f AuditFilter) -> Self {
        Self {
            filter,
            skipped: 0,
            records: Vec::new(),
        }
    }

    fn is_full(&self) -> bool {
        self.filter
            .limit
            .is_some_and(|limit| self.records.len() >= limit)
    }

    /// Returns `true` once no more records are wanted.
    fn offer(&mut self, record: AuditRecord) -> bool {
        if self.filter.matches(&record) {
            if self.skipped < self.filter.offset {
                self.skipped += 1;
            } else {
                self.records.push(record);
            }
        }
        self.is_full()
    }
}

impl LmdbAuditLog {
    fn append_inner(&self, record: NewAuditRecord) -> Result<AuditRecord, LmdbError> {
        let mut wtxn = self.env.write_txn()?;
        let last = match self.records_db.last(&wtxn)? {
            Some((key, _)) => seq_suffix(key)?,
            None => 0,
        };
        let record = record.into_record(RecordId::new(last + 1));
        let seq = record.id.as_u64();

        self.records_db
            .put(&mut wtxn, &seq.to_be_bytes(), &encode(&record)?)?;
        if let Some(person) = &record.person_id {
            let by_person = with_seq(&id_prefix(person.as_bytes())?, seq);
            self.by_person_db.put(&mut wtxn, &by_person, &[])?;
            let by_pair = with_seq(&person_location_prefix(person, &record.location_id)?, seq);
            self.by_person_location_db.put(&mut wtxn, &by_pair, &[])?;
        }
        let by_location = with_seq(&id_prefix(record.location_id.as_bytes())?, seq);
        self.by_location_db.put(&mut wtxn, &by_location, &[])?;
        self.by_kind_db
            .put(&mut wtxn, &with_seq(&[record.kind.tag()], seq), &[])?;
        wtxn.commit()?;

        tracing::trace!(record = %record.id, kind = %record.kind, "audit record appended");
        Ok(record)
    }

    fn query_inner(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, LmdbError> {
        let mut collector = Collector::new(filter);
        if collector.is_full() {
            return Ok(collector.records);
        }

        let rtxn = self.env.read_txn()?;
        let index = match (&filter.person, &filter.location) {
            (Some(p), Some(l)) => Some((self.by_person_location_db, person_location_prefix(p, l)?)),
            (Some(p), None) => Some((self.by_person_db, id_prefix(p.as_bytes())?)),
            (None, Some(l)) => Some((self.by_location_db, id_prefix(l.as_bytes())?)),
            (None, None) => filter.kind.map(|k| (self.by_kind_db, vec![k.tag()])),
        };

        match index {
            Some((db, prefix)) => self.scan_index(&rtxn, db, &prefix, &mut collector)?,
            None => {
                for entry in self.records_db.rev_iter(&rtxn)? {
                    let (_key, value) = entry?;
                    if collector.offer(decode(value)?) {
                        break;
                    }
                }
            }
        }
        Ok(collector.records)
    }

    /// Walk the index entries under `prefix` newest first.
    fn scan_index(
        &self,
        rtxn: &RoTxn<'_>,
        db: Database<Bytes, Bytes>,
        prefix: &[u8],
        collector: &mut Collector<'_>,
    ) -> Result<(), LmdbError> {
        let mut upper = prefix.to_vec();
        let upper_bound = if increment_prefix(&mut upper) {
            Bound::Excluded(upper.as_slice())
        } else {
            Bound::Unbounded
        };
        let bounds = (Bound::Included(prefix), upper_bound);

        for entry in db.rev_range(rtxn, &bounds)? {
            let (key, _) = entry?;
            let seq = seq_suffix(key)?;
            let value = self
                .records_db
                .get(rtxn, &seq.to_be_bytes())?
                .ok_or_else(|| LmdbError::Corruption(format!("record #{seq}")))?;
            if collector.offer(decode(value)?) {
                break;
            }
        }
        Ok(())
    }
}

impl AuditLogStore for LmdbAuditLog {
    fn append(&self, record: NewAuditRecord) -> Result<AuditRecord, StoreError> {
        Ok(self.append_inner(record)?)
    }

    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, StoreError> {
        Ok(self.query_inner(filter)?)
    }

    fn record_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.records_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;
    use gatewatch_types::{AuditKind, DayRange, Timestamp};

    fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let env = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).expect("failed to open env");
        (dir, env)
    }

    fn check_in(person: &str, location: &str, secs: u64) -> NewAuditRecord {
        NewAuditRecord::check_in(
            PersonId::from(person),
            LocationId::from(location),
            Timestamp::new(secs),
        )
    }

    fn check_out(person: &str, location: &str, secs: u64) -> NewAuditRecord {
        NewAuditRecord::check_out(
            PersonId::from(person),
            LocationId::from(location),
            Timestamp::new(secs),
        )
    }

    fn ids(records: &[AuditRecord]) -> Vec<u64> {
        records.iter().map(|r| r.id.as_u64()).collect()
    }

    #[test]
    fn append_assigns_sequential_ids() {
        let (_dir, env) = temp_env();
        let log = env.audit_log();
        assert_eq!(log.record_count().unwrap(), 0);
        let a = log.append(check_in("p", "l1", 5)).unwrap();
        let b = log.append(check_out("p", "l1", 5)).unwrap();
        assert_eq!(a.id.as_u64(), 1);
        assert_eq!(b.id.as_u64(), 2);
        assert_eq!(log.record_count().unwrap(), 2);
    }

    #[test]
    fn most_recent_uses_insertion_order_on_equal_timestamps() {
        let (_dir, env) = temp_env();
        let log = env.audit_log();
        log.append(check_in("p", "l1", 7)).unwrap();
        log.append(check_out("p", "l1", 7)).unwrap();
        let latest = log
            .most_recent(&PersonId::from("p"), Some(&LocationId::from("l1")))
            .unwrap()
            .unwrap();
        assert_eq!(latest.kind, AuditKind::CheckOut);
        assert!(log.most_recent(&PersonId::from("q"), None).unwrap().is_none());
    }

    #[test]
    fn indexes_do_not_bleed_between_prefix_ids() {
        let (_dir, env) = temp_env();
        let log = env.audit_log();
        log.append(check_in("ab", "l1", 1)).unwrap();
        log.append(check_in("abc", "l2", 2)).unwrap();
        log.append(check_in("ab", "l10", 3)).unwrap();

        let ab = log.query(&AuditFilter::person(&PersonId::from("ab"))).unwrap();
        assert_eq!(ids(&ab), vec![3, 1]);

        let l1 = log.query(&AuditFilter::location(&LocationId::from("l1"))).unwrap();
        assert_eq!(ids(&l1), vec![1]);

        let pair = log
            .query(&AuditFilter::person(&PersonId::from("ab")).at(&LocationId::from("l10")))
            .unwrap();
        assert_eq!(ids(&pair), vec![3]);
    }

    #[test]
    fn breaches_are_indexed_by_kind_and_location_only() {
        let (_dir, env) = temp_env();
        let log = env.audit_log();
        log.append(check_in("p", "l1", 1)).unwrap();
        log.append(NewAuditRecord::breach(LocationId::from("l1"), Timestamp::new(2)))
            .unwrap();
        log.append(NewAuditRecord::breach(LocationId::from("l2"), Timestamp::new(3)))
            .unwrap();

        let breaches = log.query(&AuditFilter::kind(AuditKind::Breach)).unwrap();
        assert_eq!(ids(&breaches), vec![3, 2]);
        assert!(breaches.iter().all(|r| r.person_id.is_none()));

        let at_l1 = log.query(&AuditFilter::location(&LocationId::from("l1"))).unwrap();
        assert_eq!(ids(&at_l1), vec![2, 1]);

        let p = log.query(&AuditFilter::person(&PersonId::from("p"))).unwrap();
        assert_eq!(ids(&p), vec![1]);
    }

    #[test]
    fn paging_and_day_filter() {
        let (_dir, env) = temp_env();
        let log = env.audit_log();
        let day = DayRange { start: Timestamp::new(86_400), end: Timestamp::new(2 * 86_400) };
        for secs in [86_399, 86_400, 90_000, 100_000, 172_800] {
            log.append(check_in("p", "l1", secs)).unwrap();
        }

        let on_day = log
            .query(&AuditFilter::location(&LocationId::from("l1")).on_day(day))
            .unwrap();
        assert_eq!(ids(&on_day), vec![4, 3, 2]);

        let page = log
            .query(&AuditFilter::location(&LocationId::from("l1")).on_day(day).page(1, 1))
            .unwrap();
        assert_eq!(ids(&page), vec![3]);

        let unfiltered = log.query(&AuditFilter::default().page(3, 10)).unwrap();
        assert_eq!(ids(&unfiltered), vec![2, 1]);

        assert!(log.query(&AuditFilter::default().limit(0)).unwrap().is_empty());
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let env = LmdbEnvironment::open(dir.path(), 1 << 20).unwrap();
            env.audit_log().append(check_in("p", "l1", 1)).unwrap();
        }
        let env = LmdbEnvironment::open(dir.path(), 1 << 20).unwrap();
        let log = env.audit_log();
        let next = log.append(check_out("p", "l1", 2)).unwrap();
        assert_eq!(next.id.as_u64(), 2);
        assert_eq!(log.record_count().unwrap(), 2);
    }
}
