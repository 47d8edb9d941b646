#![no_main]

use gatewatch_access::token::{parse_identity_token, MAX_TOKEN_LEN};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    if let Some(person) = parse_identity_token(raw) {
        let id = person.as_str();
        assert!(!id.is_empty());
        assert!(id.len() <= MAX_TOKEN_LEN);
        assert_eq!(id, id.trim());
        assert!(!id.chars().any(char::is_control));
    }
});
