use crate::errors::ServiceError;
use crate::inventory::{BomLine, InventoryGateway};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{instrument, warn};

/// Advisory computed from current stock for a requested component quantity.
///
/// Advisories never block a request; they are surfaced to the approver so a
/// shortfall is visible before the warehouse gets involved.
#[derive(Debug, Clone, PartialEq)]
pub struct StockAdvisory {
    pub component_id: String,
    pub requested: i32,
    pub available: Option<i32>,
    pub short_by: i32,
    pub expected_restock_date: Option<NaiveDate>,
}

impl StockAdvisory {
    pub fn is_short(&self) -> bool {
        self.short_by > 0
    }
}

/// Read-only facade over the external inventory system.
#[derive(Clone)]
pub struct InventoryService {
    gateway: Arc<dyn InventoryGateway>,
}

impl InventoryService {
    pub fn new(gateway: Arc<dyn InventoryGateway>) -> Self {
        Self { gateway }
    }

    /// Stock advisories for the given (component, requested quantity) pairs.
    ///
    /// Components the gateway does not know about come back with no available
    /// balance and a shortfall equal to the full requested quantity.
    #[instrument(skip(self, lines))]
    pub async fn advisories(
        &self,
        lines: &[(String, i32)],
    ) -> Result<Vec<StockAdvisory>, ServiceError> {
        let ids: Vec<String> = lines.iter().map(|(id, _)| id.clone()).collect();
        let stock = self.gateway.get_stock(&ids).await?;

        let advisories = lines
            .iter()
            .map(|(component_id, requested)| match stock.get(component_id) {
                Some(level) => StockAdvisory {
                    component_id: component_id.clone(),
                    requested: *requested,
                    available: Some(level.available),
                    short_by: (requested - level.available).max(0),
                    expected_restock_date: level.expected_restock_date,
                },
                None => {
                    warn!(component_id, "No stock record for component");
                    StockAdvisory {
                        component_id: component_id.clone(),
                        requested: *requested,
                        available: None,
                        short_by: *requested,
                        expected_restock_date: None,
                    }
                }
            })
            .collect();
        Ok(advisories)
    }

    /// Bill of materials for an equipment, limited to the explosion depth the
    /// request form can display.
    #[instrument(skip(self))]
    pub async fn equipment_bom(&self, equipment_id: &str) -> Result<Vec<BomLine>, ServiceError> {
        let lines = self.gateway.get_bom(equipment_id).await?;
        for line in &lines {
            if !(1..=3).contains(&line.level) {
                return Err(ServiceError::ExternalServiceError(format!(
                    "BOM line {} for equipment {} has unsupported level {}",
                    line.component_id, equipment_id, line.level
                )));
            }
        }
        Ok(lines)
    }
}
