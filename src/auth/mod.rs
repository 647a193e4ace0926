//! Actor identity and role capabilities.
//!
//! There is no ambient session: every lifecycle call receives an [`Actor`]
//! naming who acts and with which role. Role checks are a closed capability
//! table instead of string comparisons scattered through the callers.

use crate::models::LifecycleAction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of roles known to the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Field technician. Restricted: may only confirm pickup, finalize or
    /// register returns on requests they submitted themselves.
    Technician,
    /// Back-office staff; unrestricted requester-side actions.
    Administrative,
    WarrantyManager,
    AssistanceManager,
    InstallationsManager,
    Warehouse,
    /// Full access to every transition.
    Admin,
}

impl Role {
    pub fn is_manager(&self) -> bool {
        matches!(
            self,
            Self::WarrantyManager | Self::AssistanceManager | Self::InstallationsManager
        )
    }

    /// Capability table: which roles may trigger which transition.
    pub fn may(&self, action: LifecycleAction) -> bool {
        use LifecycleAction::*;
        if matches!(self, Self::Admin) {
            return true;
        }
        match action {
            Submit | ConfirmPickup | Finalize | RegisterReturn => {
                matches!(self, Self::Technician | Self::Administrative)
            }
            Approve | Reject => self.is_manager(),
            Release | MarkNotAvailable | ConfirmReturn => matches!(self, Self::Warehouse),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Technician => "Technician",
            Self::Administrative => "Administrative",
            Self::WarrantyManager => "Warranty Manager",
            Self::AssistanceManager => "Assistance Manager",
            Self::InstallationsManager => "Installations Manager",
            Self::Warehouse => "Warehouse",
            Self::Admin => "Admin",
        };
        f.write_str(label)
    }
}

/// The acting user of a lifecycle call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub username: String,
    pub email: Option<String>,
    pub role: Role,
}

impl Actor {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            email: None,
            role,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Requester-side restriction: technicians may only act on their own
    /// requests; every other permitted role may act for anyone.
    pub fn can_act_for(&self, requester: &str) -> bool {
        match self.role {
            Role::Technician => self.username == requester,
            _ => true,
        }
    }
}
