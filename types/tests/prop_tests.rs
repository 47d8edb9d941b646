use chrono::NaiveDate;
use proptest::prelude::*;

use gatewatch_types::{
    AuditKind, DayRange, LocationId, NewAuditRecord, PersonId, Presence, RecordId, Timestamp,
};

fn kind_strategy() -> impl Strategy<Value = AuditKind> {
    prop_oneof![
        Just(AuditKind::CheckIn),
        Just(AuditKind::CheckOut),
        Just(AuditKind::Breach),
    ]
}

proptest! {
    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// Record ids order exactly like their sequence numbers, including in key bytes.
    #[test]
    fn record_id_key_bytes_sort_like_sequence(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let (ra, rb) = (RecordId::new(a), RecordId::new(b));
        prop_assert_eq!(ra.cmp(&rb), ra.to_be_bytes().cmp(&rb.to_be_bytes()));
    }

    /// Every second of a day falls in that day's range and in no neighbouring day's range.
    #[test]
    fn day_range_partitions_time(days in 0u64..40_000, offset in 0u64..86_400) {
        let date = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap() + chrono::Days::new(days);
        let range = DayRange::for_date(date);
        let ts = Timestamp::new(range.start.as_secs() + offset);
        prop_assert!(range.contains(ts));
        let next = DayRange::for_date(date + chrono::Days::new(1));
        prop_assert!(!next.contains(ts));
        prop_assert_eq!(next.start, range.end);
    }

    /// Presence is derived from the latest record's kind alone.
    #[test]
    fn presence_follows_latest_kind(kind in kind_strategy(), secs in 0u64..1_000_000) {
        let rec = NewAuditRecord {
            person_id: Some(PersonId::from("p")),
            location_id: LocationId::from("l"),
            kind,
            timestamp: Timestamp::new(secs),
        }
        .into_record(RecordId::new(1));
        let presence = Presence::from_latest(Some(&rec));
        prop_assert_eq!(presence.is_present(), kind == AuditKind::CheckIn);
    }

    /// Audit records survive the storage encoding unchanged.
    #[test]
    fn record_bincode_roundtrip(kind in kind_strategy(), seq in 1u64..u64::MAX, secs in 0u64..u64::MAX, person in proptest::option::of("[a-z0-9]{1,24}")) {
        let rec = NewAuditRecord {
            person_id: person.map(PersonId::new),
            location_id: LocationId::from("gate-1"),
            kind,
            timestamp: Timestamp::new(secs),
        }
        .into_record(RecordId::new(seq));
        let encoded = bincode::serialize(&rec).unwrap();
        let decoded: gatewatch_types::AuditRecord = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, rec);
    }
}

#[test]
fn absent_without_history() {
    assert_eq!(Presence::from_latest(None), Presence::Absent);
}
