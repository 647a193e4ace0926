use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate status of a parts request.
///
/// The lifecycle engine is the only writer of this field; every mutation goes
/// through a transition checked against this table, so an illegal transition
/// is refused before anything is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum RequestStatus {
    #[sea_orm(string_value = "Pending Approval")]
    PendingApproval,
    #[sea_orm(string_value = "Approved")]
    Approved,
    #[sea_orm(string_value = "Rejected")]
    Rejected,
    #[sea_orm(string_value = "Released Full")]
    ReleasedFull,
    #[sea_orm(string_value = "Released Partial")]
    ReleasedPartial,
    #[sea_orm(string_value = "Not Available")]
    NotAvailable,
    #[sea_orm(string_value = "Pickup Confirmed")]
    PickupConfirmed,
    #[sea_orm(string_value = "Return Pending Warehouse")]
    ReturnPendingWarehouse,
    #[sea_orm(string_value = "Return Completed")]
    ReturnCompleted,
    #[sea_orm(string_value = "Finalized")]
    Finalized,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingApproval => "Pending Approval",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::ReleasedFull => "Released Full",
            Self::ReleasedPartial => "Released Partial",
            Self::NotAvailable => "Not Available",
            Self::PickupConfirmed => "Pickup Confirmed",
            Self::ReturnPendingWarehouse => "Return Pending Warehouse",
            Self::ReturnCompleted => "Return Completed",
            Self::Finalized => "Finalized",
        }
    }

    /// Terminal states never transition again; the row stays for audit.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::ReturnCompleted | Self::Finalized)
    }

    /// Statuses a given action may start from. `Submit` has no source status
    /// and is not represented here.
    pub fn sources(action: LifecycleAction) -> &'static [RequestStatus] {
        use RequestStatus::*;
        match action {
            LifecycleAction::Submit => &[],
            LifecycleAction::Approve | LifecycleAction::Reject => &[PendingApproval],
            // Release may be retried after Not Available, and re-issued from a
            // released state: the full/partial aggregate is recomputed on
            // every write of release quantities.
            LifecycleAction::Release => &[Approved, NotAvailable, ReleasedFull, ReleasedPartial],
            LifecycleAction::MarkNotAvailable => &[Approved],
            LifecycleAction::ConfirmPickup => &[ReleasedFull, ReleasedPartial],
            LifecycleAction::Finalize => &[PickupConfirmed],
            // More components may be added to a return until the warehouse
            // confirms receipt; each registration adds to the returned
            // quantities.
            LifecycleAction::RegisterReturn => &[PickupConfirmed, ReturnPendingWarehouse],
            LifecycleAction::ConfirmReturn => &[ReturnPendingWarehouse],
        }
    }

    pub fn allows(&self, action: LifecycleAction) -> bool {
        Self::sources(action).contains(self)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The named transitions of the request lifecycle. Used for capability
/// checks and for labeling audit entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleAction {
    Submit,
    Approve,
    Reject,
    Release,
    MarkNotAvailable,
    ConfirmPickup,
    Finalize,
    RegisterReturn,
    ConfirmReturn,
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Submit => "Submit",
            Self::Approve => "Approve",
            Self::Reject => "Reject",
            Self::Release => "Release",
            Self::MarkNotAvailable => "Mark Not Available",
            Self::ConfirmPickup => "Confirm Pickup",
            Self::Finalize => "Finalize",
            Self::RegisterReturn => "Register Return",
            Self::ConfirmReturn => "Confirm Return",
        };
        f.write_str(label)
    }
}
