//! Contract with the external ERP inventory system.
//!
//! The lifecycle engine only ever consumes the two calls below; balances are
//! advisory and never gate a transition. BOM lookups come back flattened
//! with level/parent metadata so the core never recurses into the ERP.

use crate::errors::ServiceError;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stock position of one component as reported by the ERP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLevel {
    pub available: i32,
    pub committed: i32,
    pub reserved: i32,
    pub expected_restock_date: Option<NaiveDate>,
}

impl StockLevel {
    /// Neutral balance used when the ERP could not be reached.
    pub fn unknown() -> Self {
        Self {
            available: 0,
            committed: 0,
            reserved: 0,
            expected_restock_date: None,
        }
    }
}

/// One line of a flattened bill of materials, up to three levels deep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomLine {
    pub component_id: String,
    pub description: String,
    pub quantity_per_unit: Decimal,
    /// 1 = direct child of the equipment, 2-3 = nested sub-assembly.
    pub level: u8,
    pub parent_component_id: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryGateway: Send + Sync {
    /// Stock positions for the given components. Components unknown to the
    /// ERP are simply absent from the map.
    async fn get_stock(
        &self,
        component_ids: &[String],
    ) -> Result<HashMap<String, StockLevel>, ServiceError>;

    /// Flattened bill of materials for one equipment, ordered parent-first.
    async fn get_bom(&self, equipment_id: &str) -> Result<Vec<BomLine>, ServiceError>;
}

/// In-memory gateway for tests and offline operation.
#[derive(Debug, Clone, Default)]
pub struct StaticInventoryGateway {
    stock: HashMap<String, StockLevel>,
    boms: HashMap<String, Vec<BomLine>>,
}

impl StaticInventoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stock(mut self, component_id: impl Into<String>, level: StockLevel) -> Self {
        self.stock.insert(component_id.into(), level);
        self
    }

    pub fn with_available(self, component_id: impl Into<String>, available: i32) -> Self {
        self.with_stock(
            component_id,
            StockLevel {
                available,
                committed: 0,
                reserved: 0,
                expected_restock_date: None,
            },
        )
    }

    pub fn with_bom(mut self, equipment_id: impl Into<String>, lines: Vec<BomLine>) -> Self {
        self.boms.insert(equipment_id.into(), lines);
        self
    }
}

#[async_trait]
impl InventoryGateway for StaticInventoryGateway {
    async fn get_stock(
        &self,
        component_ids: &[String],
    ) -> Result<HashMap<String, StockLevel>, ServiceError> {
        Ok(component_ids
            .iter()
            .filter_map(|id| self.stock.get(id).map(|s| (id.clone(), s.clone())))
            .collect())
    }

    async fn get_bom(&self, equipment_id: &str) -> Result<Vec<BomLine>, ServiceError> {
        Ok(self.boms.get(equipment_id).cloned().unwrap_or_default())
    }
}
