//! Derived presence state.

use serde::{Deserialize, Serialize};

use crate::{AuditKind, AuditRecord};

/// Whether a person is currently inside (globally, or at one location).
///
/// Never stored: always derived from the most recent audit record in scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Presence {
    Present,
    Absent,
}

impl Presence {
    /// Presence implied by the most recent record in scope; no record means absent.
    pub fn from_latest(latest: Option<&AuditRecord>) -> Self {
        match latest.map(|r| r.kind) {
            Some(AuditKind::CheckIn) => Self::Present,
            _ => Self::Absent,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present)
    }
}
