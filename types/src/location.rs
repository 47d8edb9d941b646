//! Gate records.

use serde::{Deserialize, Serialize};

use crate::{LocationId, OperatorId};

/// Which way traffic passes through a gate. Informational only; the scan
/// state machine treats every gate alike.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateType {
    Entry,
    Exit,
    #[default]
    EntryExit,
}

impl std::str::FromStr for GateType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "entry" => Ok(Self::Entry),
            "exit" => Ok(Self::Exit),
            "entry_exit" => Ok(Self::EntryExit),
            other => Err(format!("unknown gate type: {other}")),
        }
    }
}

/// A physical access point, staffed by at most one security operator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    #[serde(default, rename = "type")]
    pub gate_type: GateType,
    #[serde(default)]
    pub assigned_operator: Option<OperatorId>,
}

impl Location {
    pub fn new(id: impl Into<LocationId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            gate_type: GateType::default(),
            assigned_operator: None,
        }
    }

    pub fn with_gate_type(mut self, gate_type: GateType) -> Self {
        self.gate_type = gate_type;
        self
    }

    pub fn is_staffed_by(&self, operator: &OperatorId) -> bool {
        self.assigned_operator.as_ref() == Some(operator)
    }
}
