//! Warranty Parts API Library
//!
//! Core services for the after-sales component request lifecycle: request
//! submission, cost-center approval, warehouse release, pickup and returns.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod inventory;
pub mod migrator;
pub mod models;
pub mod notifications;
pub mod services;

pub use auth::{Actor, Role};
pub use config::{AppConfig, ApprovalRouting};
pub use errors::ServiceError;
pub use models::{LifecycleAction, RequestStatus};
pub use services::{
    CostCenterService, InventoryService, LifecycleService, ReleaseLine, RequestDetail,
    ReturnLine, SubmitItem, SubmitRequest,
};
