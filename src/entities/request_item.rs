use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One component line within a request. Owned exclusively by its request.
///
/// Quantity chain invariant, enforced by the lifecycle engine before any
/// write: `0 <= released <= requested`, `0 <= picked_up <= released`,
/// `0 <= returned <= picked_up`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "request_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub request_id: i64,
    pub component_id: String,
    pub component_description: String,
    pub quantity_requested: i32,
    pub quantity_released: i32,
    pub quantity_picked_up: i32,
    pub quantity_returned: i32,
    /// Advisory set at submission when the component was short of stock.
    pub stock_note: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::request::Entity",
        from = "Column::RequestId",
        to = "super::request::Column::Id"
    )]
    Request,
}

impl Related<super::request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Request.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Quantity still with the requester and eligible for return.
    pub fn returnable(&self) -> i32 {
        self.quantity_picked_up - self.quantity_returned
    }

    pub fn fully_released(&self) -> bool {
        self.quantity_released == self.quantity_requested
    }
}
