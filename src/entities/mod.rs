pub mod audit_entry;
pub mod cost_center;
pub mod request;
pub mod request_item;
