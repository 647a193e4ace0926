//! Shared harness: an in-memory SQLite database with the full schema, the
//! seeded cost centers, a recording notifier and a static inventory gateway.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use warranty_parts_api::auth::{Actor, Role};
use warranty_parts_api::config::ApprovalRouting;
use warranty_parts_api::db::{self, DbConfig, DbPool};
use warranty_parts_api::entities::{request, request_item};
use warranty_parts_api::events::{Event, EventSender};
use warranty_parts_api::inventory::StaticInventoryGateway;
use warranty_parts_api::notifications::{NotificationError, Notifier};
use warranty_parts_api::services::{CostCenterService, LifecycleService};
use warranty_parts_api::services::{SubmitItem, SubmitRequest};

pub const WARRANTY_CC: &str = "040023";
pub const ASSISTANCE_CC: &str = "040031";

/// Notifier that records every call instead of talking to SMTP.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<SentMail>>,
    pub fail: Mutex<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentMail {
    ManagerPendingApproval { to: String, request_id: i64 },
    WarehouseApproved { request_id: i64 },
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    /// Makes every subsequent send fail, to exercise the warning path.
    pub fn fail_all(&self) {
        *self.fail.lock().unwrap() = true;
    }

    fn record(&self, mail: SentMail) -> Result<(), NotificationError> {
        if *self.fail.lock().unwrap() {
            return Err(NotificationError::Smtp("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_manager_pending_approval(
        &self,
        manager_email: &str,
        request: &request::Model,
        _items: &[request_item::Model],
    ) -> Result<(), NotificationError> {
        self.record(SentMail::ManagerPendingApproval {
            to: manager_email.to_string(),
            request_id: request.id,
        })
    }

    async fn notify_warehouse_approved(
        &self,
        request: &request::Model,
        _items: &[request_item::Model],
    ) -> Result<(), NotificationError> {
        self.record(SentMail::WarehouseApproved {
            request_id: request.id,
        })
    }
}

pub struct TestApp {
    pub db: Arc<DbPool>,
    pub lifecycle: LifecycleService,
    pub cost_centers: CostCenterService,
    pub notifier: Arc<RecordingNotifier>,
    pub events: mpsc::Receiver<Event>,
}

impl TestApp {
    /// Fresh app with ample stock for every component the tests use.
    pub async fn new() -> Self {
        let gateway = StaticInventoryGateway::new()
            .with_available("CMP-100", 100)
            .with_available("CMP-200", 100);
        Self::with_gateway(gateway, ApprovalRouting::PerCostCenter).await
    }

    pub async fn with_gateway(gateway: StaticInventoryGateway, routing: ApprovalRouting) -> Self {
        let config = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            acquire_timeout: Duration::from_secs(5),
        };
        let pool = Arc::new(
            db::establish_connection_with_config(&config)
                .await
                .expect("test database"),
        );
        db::run_migrations(&pool).await.expect("migrations");

        let cost_centers = CostCenterService::new(pool.clone());
        cost_centers.seed_defaults().await.expect("seed");

        let notifier = Arc::new(RecordingNotifier::default());
        let (sender, events) = EventSender::channel(64);
        let lifecycle = LifecycleService::new(
            pool.clone(),
            Arc::new(gateway),
            notifier.clone(),
            Some(Arc::new(sender)),
            routing,
        );

        Self {
            db: pool,
            lifecycle,
            cost_centers,
            notifier,
            events,
        }
    }

    pub async fn next_event(&mut self) -> Event {
        self.events.recv().await.expect("event channel open")
    }
}

pub fn technician(name: &str) -> Actor {
    Actor::new(name, Role::Technician).with_email(format!("{name}@example.com"))
}

pub fn administrative(name: &str) -> Actor {
    Actor::new(name, Role::Administrative)
}

pub fn warranty_manager() -> Actor {
    Actor::new("warranty.manager", Role::WarrantyManager)
}

pub fn assistance_manager() -> Actor {
    Actor::new("assistance.manager", Role::AssistanceManager)
}

pub fn warehouse() -> Actor {
    Actor::new("warehouse.op", Role::Warehouse)
}

pub fn admin() -> Actor {
    Actor::new("system.admin", Role::Admin)
}

/// A two-line request against the warranty cost center.
pub fn sample_request(cost_center_code: &str) -> SubmitRequest {
    SubmitRequest {
        customer_id: "C-0042".to_string(),
        customer_name: "Aurora Foods".to_string(),
        sale_order: "SO-2024-117".to_string(),
        equipment_id: "EQ-550".to_string(),
        equipment_name: "Packaging line 550".to_string(),
        cost_center_code: cost_center_code.to_string(),
        items: vec![
            SubmitItem {
                component_id: "CMP-100".to_string(),
                description: "Drive belt".to_string(),
                quantity: 3,
            },
            SubmitItem {
                component_id: "CMP-200".to_string(),
                description: "Bearing kit".to_string(),
                quantity: 2,
            },
        ],
    }
}

/// Single-line variant for the quantity-focused scenarios.
pub fn single_item_request(cost_center_code: &str, quantity: i32) -> SubmitRequest {
    SubmitRequest {
        customer_id: "C-0007".to_string(),
        customer_name: "Hilltop Dairy".to_string(),
        sale_order: "SO-2024-201".to_string(),
        equipment_id: "EQ-110".to_string(),
        equipment_name: "Filler 110".to_string(),
        cost_center_code: cost_center_code.to_string(),
        items: vec![SubmitItem {
            component_id: "CMP-100".to_string(),
            description: "Drive belt".to_string(),
            quantity,
        }],
    }
}
