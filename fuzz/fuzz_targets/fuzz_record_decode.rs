#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Stored values must never panic the decoder, whatever the bytes.
    let _ = bincode::deserialize::<gatewatch_types::AuditRecord>(data);
    let _ = bincode::deserialize::<gatewatch_types::Identity>(data);
    let _ = bincode::deserialize::<gatewatch_types::Location>(data);
    let _ = bincode::deserialize::<gatewatch_types::Operator>(data);

    // HTTP bodies carry the same types as JSON.
    let _ = serde_json::from_slice::<gatewatch_types::AuditRecord>(data);
});
