//! Transition-triggered notifications to the next responsible actor.
//!
//! Send failures are never fatal to the lifecycle: the engine records them
//! on the audit trail as warnings and carries on.

pub mod email;

use crate::entities::{request, request_item};
use async_trait::async_trait;
use thiserror::Error;

pub use email::SmtpNotifier;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Failed to build message: {0}")]
    Build(String),
    #[error("SMTP error: {0}")]
    Smtp(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Tell the cost-center manager a new request awaits approval.
    async fn notify_manager_pending_approval(
        &self,
        manager_email: &str,
        request: &request::Model,
        items: &[request_item::Model],
    ) -> Result<(), NotificationError>;

    /// Tell the warehouse an approved request awaits release.
    async fn notify_warehouse_approved(
        &self,
        request: &request::Model,
        items: &[request_item::Model],
    ) -> Result<(), NotificationError>;
}

/// No-op notifier for tests and environments without SMTP.
#[derive(Debug, Clone, Default)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify_manager_pending_approval(
        &self,
        _manager_email: &str,
        _request: &request::Model,
        _items: &[request_item::Model],
    ) -> Result<(), NotificationError> {
        Ok(())
    }

    async fn notify_warehouse_approved(
        &self,
        _request: &request::Model,
        _items: &[request_item::Model],
    ) -> Result<(), NotificationError> {
        Ok(())
    }
}
