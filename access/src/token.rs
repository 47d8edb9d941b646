//! Extracting the person id from a scanned credential.
//!
//! An issued card's QR code carries the person id verbatim. Scanners may add
//! surrounding whitespace or a trailing newline; anything else that does not
//! look like an id is treated as unresolvable and ends up as a breach.

use gatewatch_types::PersonId;

/// Longest id accepted from a scan, in bytes.
pub const MAX_TOKEN_LEN: usize = 128;

/// Parse a scanned token into a person id, or `None` if it cannot name anyone.
pub fn parse_identity_token(token: &str) -> Option<PersonId> {
    let raw = token.trim();
    if raw.is_empty() || raw.len() > MAX_TOKEN_LEN {
        return None;
    }
    if raw.chars().any(char::is_control) {
        return None;
    }
    Some(PersonId::new(raw))
}
