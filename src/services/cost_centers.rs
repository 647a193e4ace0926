use crate::db::DbPool;
use crate::entities::cost_center::{self, Entity as CostCenter};
use crate::errors::ServiceError;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use std::sync::Arc;
use tracing::{info, instrument};

/// Standard cost centers seeded administratively.
const DEFAULT_COST_CENTERS: &[(&str, &str, &str, &str)] = &[
    ("040023", "Warranty", "warranty.manager", "warranty.manager@example.com"),
    (
        "040031",
        "Assistance",
        "assistance.manager",
        "assistance.manager@example.com",
    ),
    (
        "040024",
        "Installations",
        "installations.manager",
        "installations.manager@example.com",
    ),
];

/// Read-mostly reference data: cost centers and their responsible managers.
#[derive(Clone)]
pub struct CostCenterService {
    db: Arc<DbPool>,
}

impl CostCenterService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// All cost centers, ordered by sector name.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<cost_center::Model>, ServiceError> {
        let centers = CostCenter::find()
            .order_by_asc(cost_center::Column::Sector)
            .all(&*self.db)
            .await?;
        Ok(centers)
    }

    #[instrument(skip(self))]
    pub async fn get_by_code(
        &self,
        code: &str,
    ) -> Result<Option<cost_center::Model>, ServiceError> {
        let center = CostCenter::find()
            .filter(cost_center::Column::Code.eq(code))
            .one(&*self.db)
            .await?;
        Ok(center)
    }

    /// Cost-center codes managed by the given user.
    #[instrument(skip(self))]
    pub async fn codes_managed_by(&self, username: &str) -> Result<Vec<String>, ServiceError> {
        let centers = CostCenter::find()
            .filter(cost_center::Column::Manager.eq(username))
            .all(&*self.db)
            .await?;
        Ok(centers.into_iter().map(|c| c.code).collect())
    }

    /// Inserts the standard cost centers when the table is empty. Returns the
    /// number of rows inserted (zero when already seeded).
    #[instrument(skip(self))]
    pub async fn seed_defaults(&self) -> Result<u64, ServiceError> {
        let existing = CostCenter::find().count(&*self.db).await?;
        if existing > 0 {
            return Ok(0);
        }

        let mut inserted = 0;
        for (code, sector, manager, email) in DEFAULT_COST_CENTERS {
            cost_center::ActiveModel {
                code: Set((*code).to_string()),
                sector: Set((*sector).to_string()),
                manager: Set((*manager).to_string()),
                manager_email: Set(Some((*email).to_string())),
                ..Default::default()
            }
            .insert(&*self.db)
            .await?;
            inserted += 1;
        }
        info!(count = inserted, "Seeded default cost centers");
        Ok(inserted)
    }
}
