use crate::models::RequestStatus;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The `requests` table: one row per technician ask for parts against one
/// equipment/sale pair. Rows are never deleted; terminal states are final
/// but the record persists for audit.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "requests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    // Immutable facts, stamped on submission.
    pub requester: String,
    pub requester_email: Option<String>,
    pub customer_id: String,
    pub customer_name: String,
    pub sale_order: String,
    pub equipment_id: String,
    pub equipment_name: String,
    pub cost_center_code: String,
    pub cost_center_sector: Option<String>,
    pub created_at: DateTime<Utc>,

    // Lifecycle fields, written only by the engine.
    pub status: RequestStatus,
    pub status_changed_at: DateTime<Utc>,
    pub approver: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub released_by: Option<String>,
    pub released_at: Option<DateTime<Utc>>,
    pub cannot_fulfill_reason: Option<String>,
    pub picked_up_by: Option<String>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub return_requested_at: Option<DateTime<Utc>>,
    pub return_confirmed_by: Option<String>,
    pub return_confirmed_at: Option<DateTime<Utc>>,
    pub finalized_at: Option<DateTime<Utc>>,

    /// Optimistic lock: bumped on every transition so that two concurrent
    /// transitions on the same request cannot both commit.
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::request_item::Entity")]
    RequestItem,
    #[sea_orm(has_many = "super::audit_entry::Entity")]
    AuditEntry,
}

impl Related<super::request_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RequestItem.def()
    }
}

impl Related<super::audit_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuditEntry.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
