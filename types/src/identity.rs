//! Identities of card holders and operator accounts.

use serde::{Deserialize, Serialize};

use crate::{OperatorId, PersonId};

/// A card holder as seen by the gate. Everything beyond these fields belongs
/// to the identity store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: PersonId,
    /// Name shown to the operator on a successful scan.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Disabled accounts are refused at every gate.
    #[serde(default)]
    pub disabled: bool,
}

impl Identity {
    pub fn new(id: impl Into<PersonId>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            disabled: false,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

/// Account role. Only [`Role::Security`] operators staff gates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Security,
    User,
}

impl Role {
    pub fn can_staff_gate(&self) -> bool {
        matches!(self, Self::Security)
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "security" => Ok(Self::Security),
            "user" => Ok(Self::User),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// An authenticated operator account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: OperatorId,
    pub role: Role,
}

impl Operator {
    pub fn security(id: impl Into<OperatorId>) -> Self {
        Self {
            id: id.into(),
            role: Role::Security,
        }
    }
}
