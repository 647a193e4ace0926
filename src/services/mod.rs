pub mod cost_centers;
pub mod inventory;
pub mod lifecycle;

pub use cost_centers::CostCenterService;
pub use inventory::{InventoryService, StockAdvisory};
pub use lifecycle::{
    ItemReportRow, LifecycleService, ReleaseLine, RequestDetail, ReturnLine, SubmitItem,
    SubmitRequest,
};
