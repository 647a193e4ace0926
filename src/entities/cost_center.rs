use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reference data: cost-center code, sector name and the responsible
/// manager used to route approval notifications. Read-mostly; rows are
/// seeded administratively, not by end-user flows.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cost_centers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub code: String,
    pub sector: String,
    pub manager: String,
    pub manager_email: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
