//! The request lifecycle engine.
//!
//! Every state transition of a parts request goes through this service:
//! it checks the actor's capability, the transition table and the quantity
//! invariants, then applies the change and the matching audit entries in one
//! transaction. Notifications and events go out only after the commit.

use crate::auth::Actor;
use crate::config::ApprovalRouting;
use crate::db::DbPool;
use crate::entities::{audit_entry, cost_center, request, request_item};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::inventory::InventoryGateway;
use crate::models::{LifecycleAction, RequestStatus};
use crate::notifications::Notifier;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use validator::Validate;

/// A new request as entered by the requester.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitRequest {
    #[validate(length(min = 1, message = "Customer id is required"))]
    pub customer_id: String,
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub customer_name: String,
    #[validate(length(min = 1, message = "Sale order is required"))]
    pub sale_order: String,
    #[validate(length(min = 1, message = "Equipment id is required"))]
    pub equipment_id: String,
    #[validate(length(min = 1, message = "Equipment name is required"))]
    pub equipment_name: String,
    #[validate(length(min = 1, message = "Cost center is required"))]
    pub cost_center_code: String,
    #[validate(length(min = 1, message = "At least one component is required"))]
    pub items: Vec<SubmitItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitItem {
    #[validate(length(min = 1, message = "Component id is required"))]
    pub component_id: String,
    #[validate(length(min = 1, message = "Component description is required"))]
    pub description: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

/// One line of a warehouse release decision.
#[derive(Debug, Clone, Copy)]
pub struct ReleaseLine {
    pub item_id: i64,
    pub quantity: i32,
}

/// One line of a return registration.
#[derive(Debug, Clone, Copy)]
pub struct ReturnLine {
    pub item_id: i64,
    pub quantity: i32,
}

/// A request with its lines and full audit trail.
#[derive(Debug, Clone)]
pub struct RequestDetail {
    pub request: request::Model,
    pub items: Vec<request_item::Model>,
    pub audit: Vec<audit_entry::Model>,
}

/// Flat per-line reporting row joining each item with its request.
#[derive(Debug, Clone)]
pub struct ItemReportRow {
    pub request_id: i64,
    pub status: RequestStatus,
    pub requester: String,
    pub customer_name: String,
    pub equipment_id: String,
    pub component_id: String,
    pub component_description: String,
    pub quantity_requested: i32,
    pub quantity_released: i32,
    pub quantity_picked_up: i32,
    pub quantity_returned: i32,
}

pub struct LifecycleService {
    db: Arc<DbPool>,
    inventory: Arc<dyn InventoryGateway>,
    notifier: Arc<dyn Notifier>,
    event_sender: Option<Arc<EventSender>>,
    routing: ApprovalRouting,
}

impl LifecycleService {
    pub fn new(
        db: Arc<DbPool>,
        inventory: Arc<dyn InventoryGateway>,
        notifier: Arc<dyn Notifier>,
        event_sender: Option<Arc<EventSender>>,
        routing: ApprovalRouting,
    ) -> Self {
        Self {
            db,
            inventory,
            notifier,
            event_sender,
            routing,
        }
    }

    // ---- transitions -----------------------------------------------------

    /// Creates a new request in `Pending Approval` and notifies the manager
    /// responsible for its cost center.
    #[instrument(skip(self, actor, input), fields(requester = %actor.username))]
    pub async fn submit(
        &self,
        actor: &Actor,
        input: SubmitRequest,
    ) -> Result<RequestDetail, ServiceError> {
        Self::authorize(actor, LifecycleAction::Submit)?;
        input.validate()?;
        for item in &input.items {
            item.validate()?;
        }

        let center = cost_center::Entity::find()
            .filter(cost_center::Column::Code.eq(input.cost_center_code.as_str()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Unknown cost center: {}",
                    input.cost_center_code
                ))
            })?;

        // Stock is advisory only. A gateway failure degrades to "unknown"
        // instead of blocking the submission.
        let component_ids: Vec<String> =
            input.items.iter().map(|i| i.component_id.clone()).collect();
        let stock = match self.inventory.get_stock(&component_ids).await {
            Ok(levels) => Some(levels),
            Err(e) => {
                warn!(error = %e, "Stock lookup failed; submitting without advisories");
                None
            }
        };

        let now = Utc::now();
        let txn = self.db.begin().await?;

        let created = request::ActiveModel {
            requester: Set(actor.username.clone()),
            requester_email: Set(actor.email.clone()),
            customer_id: Set(input.customer_id.clone()),
            customer_name: Set(input.customer_name.clone()),
            sale_order: Set(input.sale_order.clone()),
            equipment_id: Set(input.equipment_id.clone()),
            equipment_name: Set(input.equipment_name.clone()),
            cost_center_code: Set(center.code.clone()),
            cost_center_sector: Set(Some(center.sector.clone())),
            created_at: Set(now),
            status: Set(RequestStatus::PendingApproval),
            status_changed_at: Set(now),
            version: Set(1),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut short_components = Vec::new();
        for item in &input.items {
            let note = stock.as_ref().and_then(|levels| {
                levels.get(&item.component_id).and_then(|level| {
                    if level.available < item.quantity {
                        short_components.push(item.component_id.clone());
                        Some(format!(
                            "Insufficient stock at request time. Available balance: {}",
                            level.available
                        ))
                    } else {
                        None
                    }
                })
            });
            request_item::ActiveModel {
                request_id: Set(created.id),
                component_id: Set(item.component_id.clone()),
                component_description: Set(item.description.clone()),
                quantity_requested: Set(item.quantity),
                quantity_released: Set(0),
                quantity_picked_up: Set(0),
                quantity_returned: Set(0),
                stock_note: Set(note),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        let mut detail = format!("Initial status: {}", RequestStatus::PendingApproval);
        if !short_components.is_empty() {
            detail.push_str(&format!(
                ". Insufficient stock for: {}",
                short_components.join(", ")
            ));
        }
        Self::audit(&txn, created.id, &actor.username, "Created", &detail).await?;
        if stock.is_none() {
            Self::audit(
                &txn,
                created.id,
                "system",
                "Warning",
                "Stock levels unavailable at submission; advisories skipped",
            )
            .await?;
        }

        txn.commit().await?;
        info!(request_id = created.id, "Request submitted");

        let items = Self::load_items(&*self.db, created.id).await?;
        match &center.manager_email {
            Some(email) => {
                match self
                    .notifier
                    .notify_manager_pending_approval(email, &created, &items)
                    .await
                {
                    Ok(()) => {
                        Self::audit(
                            &*self.db,
                            created.id,
                            "system",
                            "Notification",
                            &format!("Approval request emailed to {}", center.manager),
                        )
                        .await?;
                    }
                    Err(e) => {
                        warn!(request_id = created.id, error = %e, "Manager notification failed");
                        Self::audit(
                            &*self.db,
                            created.id,
                            "system",
                            "Warning",
                            &format!("Failed to notify manager {}: {}", center.manager, e),
                        )
                        .await?;
                    }
                }
            }
            None => {
                Self::audit(
                    &*self.db,
                    created.id,
                    "system",
                    "Warning",
                    &format!("Cost center {} has no manager email on file", center.code),
                )
                .await?;
            }
        }

        self.publish(Event::RequestSubmitted(created.id)).await;
        self.get_request(created.id).await
    }

    /// Manager approval: `Pending Approval` -> `Approved`.
    #[instrument(skip(self, actor), fields(actor = %actor.username))]
    pub async fn approve(&self, actor: &Actor, request_id: i64) -> Result<RequestDetail, ServiceError> {
        Self::authorize(actor, LifecycleAction::Approve)?;
        let txn = self.db.begin().await?;
        let current = Self::load_request(&txn, request_id).await?;
        Self::require_status(&current, LifecycleAction::Approve)?;
        self.ensure_may_approve(&txn, actor, &current).await?;

        let now = Utc::now();
        let changes = request::ActiveModel {
            status: Set(RequestStatus::Approved),
            status_changed_at: Set(now),
            approver: Set(Some(actor.username.clone())),
            approved_at: Set(Some(now)),
            rejection_reason: Set(None),
            ..Default::default()
        };
        Self::update_guarded(&txn, &current, changes).await?;
        Self::audit(
            &txn,
            request_id,
            &actor.username,
            "Approved",
            &format!("Status: {} -> {}", current.status, RequestStatus::Approved),
        )
        .await?;
        txn.commit().await?;
        info!(request_id, "Request approved");

        let detail = self.get_request(request_id).await?;
        match self
            .notifier
            .notify_warehouse_approved(&detail.request, &detail.items)
            .await
        {
            Ok(()) => {
                Self::audit(
                    &*self.db,
                    request_id,
                    "system",
                    "Notification",
                    "Release request emailed to warehouse",
                )
                .await?;
            }
            Err(e) => {
                warn!(request_id, error = %e, "Warehouse notification failed");
                Self::audit(
                    &*self.db,
                    request_id,
                    "system",
                    "Warning",
                    &format!("Failed to notify warehouse: {}", e),
                )
                .await?;
            }
        }

        self.publish(Event::RequestApproved(request_id)).await;
        self.get_request(request_id).await
    }

    /// Manager rejection: `Pending Approval` -> `Rejected` (terminal).
    #[instrument(skip(self, actor, reason), fields(actor = %actor.username))]
    pub async fn reject(
        &self,
        actor: &Actor,
        request_id: i64,
        reason: &str,
    ) -> Result<RequestDetail, ServiceError> {
        Self::authorize(actor, LifecycleAction::Reject)?;
        if reason.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "A rejection reason is required".to_string(),
            ));
        }
        let txn = self.db.begin().await?;
        let current = Self::load_request(&txn, request_id).await?;
        Self::require_status(&current, LifecycleAction::Reject)?;
        self.ensure_may_approve(&txn, actor, &current).await?;

        let now = Utc::now();
        let changes = request::ActiveModel {
            status: Set(RequestStatus::Rejected),
            status_changed_at: Set(now),
            approver: Set(Some(actor.username.clone())),
            approved_at: Set(Some(now)),
            rejection_reason: Set(Some(reason.trim().to_string())),
            ..Default::default()
        };
        Self::update_guarded(&txn, &current, changes).await?;
        Self::audit(
            &txn,
            request_id,
            &actor.username,
            "Rejected",
            &format!("Reason: {}", reason.trim()),
        )
        .await?;
        txn.commit().await?;
        info!(request_id, "Request rejected");

        self.publish(Event::RequestRejected(request_id)).await;
        self.get_request(request_id).await
    }

    /// Warehouse release. Overwrites the released quantity of each line in
    /// the plan, then recomputes the aggregate: `Released Full` when every
    /// line is fully released, `Released Partial` otherwise. Legal from
    /// `Approved`, `Not Available` and both released states, so the warehouse
    /// can revise a release until pickup.
    #[instrument(skip(self, actor, plan), fields(actor = %actor.username))]
    pub async fn release(
        &self,
        actor: &Actor,
        request_id: i64,
        plan: &[ReleaseLine],
    ) -> Result<RequestDetail, ServiceError> {
        Self::authorize(actor, LifecycleAction::Release)?;
        let txn = self.db.begin().await?;
        let current = Self::load_request(&txn, request_id).await?;
        Self::require_status(&current, LifecycleAction::Release)?;
        let items = Self::load_items(&txn, request_id).await?;

        if let Some(unknown) = plan
            .iter()
            .find(|l| !items.iter().any(|i| i.id == l.item_id))
        {
            return Err(ServiceError::ValidationError(format!(
                "Item {} does not belong to request #{}",
                unknown.item_id, request_id
            )));
        }
        Self::reject_duplicate_lines(plan.iter().map(|l| l.item_id))?;

        let mut released = Vec::with_capacity(items.len());
        for item in items {
            let planned = plan.iter().find(|l| l.item_id == item.id);
            let quantity = match planned {
                Some(line) => {
                    if line.quantity < 0 || line.quantity > item.quantity_requested {
                        return Err(ServiceError::ValidationError(format!(
                            "Release of {} for component {} is outside 0..={}",
                            line.quantity, item.component_id, item.quantity_requested
                        )));
                    }
                    line.quantity
                }
                None => item.quantity_released,
            };
            if planned.is_some() {
                request_item::ActiveModel {
                    id: Set(item.id),
                    quantity_released: Set(quantity),
                    ..Default::default()
                }
                .update(&txn)
                .await?;
            }
            released.push((item.component_id.clone(), quantity, item.quantity_requested));
        }

        let full = released.iter().all(|(_, rel, req)| rel == req);
        let next = if full {
            RequestStatus::ReleasedFull
        } else {
            RequestStatus::ReleasedPartial
        };

        let now = Utc::now();
        let changes = request::ActiveModel {
            status: Set(next),
            status_changed_at: Set(now),
            released_by: Set(Some(actor.username.clone())),
            released_at: Set(Some(now)),
            cannot_fulfill_reason: Set(None),
            ..Default::default()
        };
        Self::update_guarded(&txn, &current, changes).await?;

        let summary = released
            .iter()
            .map(|(component, rel, req)| format!("{}: {}/{}", component, rel, req))
            .collect::<Vec<_>>()
            .join(", ");
        Self::audit(&txn, request_id, &actor.username, "Items Released", &summary).await?;
        Self::audit(
            &txn,
            request_id,
            &actor.username,
            "Status Changed",
            &format!("Status: {} -> {}", current.status, next),
        )
        .await?;
        txn.commit().await?;
        info!(request_id, full, "Items released");

        self.publish(Event::ItemsReleased { request_id, full }).await;
        self.get_request(request_id).await
    }

    /// Warehouse declares nothing can be released: `Approved` -> `Not
    /// Available`. Recoverable; a later release leaves this state.
    #[instrument(skip(self, actor, reason), fields(actor = %actor.username))]
    pub async fn mark_not_available(
        &self,
        actor: &Actor,
        request_id: i64,
        reason: &str,
    ) -> Result<RequestDetail, ServiceError> {
        Self::authorize(actor, LifecycleAction::MarkNotAvailable)?;
        if reason.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "A reason is required when marking a request not available".to_string(),
            ));
        }
        let txn = self.db.begin().await?;
        let current = Self::load_request(&txn, request_id).await?;
        Self::require_status(&current, LifecycleAction::MarkNotAvailable)?;

        let now = Utc::now();
        let changes = request::ActiveModel {
            status: Set(RequestStatus::NotAvailable),
            status_changed_at: Set(now),
            cannot_fulfill_reason: Set(Some(reason.trim().to_string())),
            ..Default::default()
        };
        Self::update_guarded(&txn, &current, changes).await?;
        Self::audit(
            &txn,
            request_id,
            &actor.username,
            "Marked Not Available",
            &format!("Reason: {}", reason.trim()),
        )
        .await?;
        txn.commit().await?;
        info!(request_id, "Request marked not available");

        self.publish(Event::MarkedNotAvailable(request_id)).await;
        self.get_request(request_id).await
    }

    /// Requester takes possession of the released parts. Each line's picked-up
    /// quantity becomes a copy of its released quantity.
    #[instrument(skip(self, actor), fields(actor = %actor.username))]
    pub async fn confirm_pickup(
        &self,
        actor: &Actor,
        request_id: i64,
    ) -> Result<RequestDetail, ServiceError> {
        Self::authorize(actor, LifecycleAction::ConfirmPickup)?;
        let txn = self.db.begin().await?;
        let current = Self::load_request(&txn, request_id).await?;
        Self::require_status(&current, LifecycleAction::ConfirmPickup)?;
        Self::require_own_request(actor, &current)?;

        let items = Self::load_items(&txn, request_id).await?;
        for item in &items {
            request_item::ActiveModel {
                id: Set(item.id),
                quantity_picked_up: Set(item.quantity_released),
                ..Default::default()
            }
            .update(&txn)
            .await?;
        }

        let now = Utc::now();
        let changes = request::ActiveModel {
            status: Set(RequestStatus::PickupConfirmed),
            status_changed_at: Set(now),
            picked_up_by: Set(Some(actor.username.clone())),
            picked_up_at: Set(Some(now)),
            ..Default::default()
        };
        Self::update_guarded(&txn, &current, changes).await?;

        let summary = items
            .iter()
            .map(|i| format!("{}: {}", i.component_id, i.quantity_released))
            .collect::<Vec<_>>()
            .join(", ");
        Self::audit(&txn, request_id, &actor.username, "Items Picked Up", &summary).await?;
        Self::audit(
            &txn,
            request_id,
            &actor.username,
            "Status Changed",
            &format!("Status: {} -> {}", current.status, RequestStatus::PickupConfirmed),
        )
        .await?;
        txn.commit().await?;
        info!(request_id, "Pickup confirmed");

        self.publish(Event::PickupConfirmed(request_id)).await;
        self.get_request(request_id).await
    }

    /// Closes a request with no return: `Pickup Confirmed` -> `Finalized`.
    #[instrument(skip(self, actor), fields(actor = %actor.username))]
    pub async fn finalize(
        &self,
        actor: &Actor,
        request_id: i64,
    ) -> Result<RequestDetail, ServiceError> {
        Self::authorize(actor, LifecycleAction::Finalize)?;
        let txn = self.db.begin().await?;
        let current = Self::load_request(&txn, request_id).await?;
        Self::require_status(&current, LifecycleAction::Finalize)?;
        Self::require_own_request(actor, &current)?;

        let now = Utc::now();
        let changes = request::ActiveModel {
            status: Set(RequestStatus::Finalized),
            status_changed_at: Set(now),
            finalized_at: Set(Some(now)),
            ..Default::default()
        };
        Self::update_guarded(&txn, &current, changes).await?;
        Self::audit(
            &txn,
            request_id,
            &actor.username,
            "Finalized",
            "Closed with no return",
        )
        .await?;
        txn.commit().await?;
        info!(request_id, "Request finalized");

        self.publish(Event::RequestFinalized(request_id)).await;
        self.get_request(request_id).await
    }

    /// Registers unused parts for return. Additive: each call adds to the
    /// returned quantity, capped at what is still with the requester.
    #[instrument(skip(self, actor, plan), fields(actor = %actor.username))]
    pub async fn register_return(
        &self,
        actor: &Actor,
        request_id: i64,
        plan: &[ReturnLine],
    ) -> Result<RequestDetail, ServiceError> {
        Self::authorize(actor, LifecycleAction::RegisterReturn)?;
        let txn = self.db.begin().await?;
        let current = Self::load_request(&txn, request_id).await?;
        Self::require_status(&current, LifecycleAction::RegisterReturn)?;
        Self::require_own_request(actor, &current)?;
        Self::reject_duplicate_lines(plan.iter().map(|l| l.item_id))?;

        let items = Self::load_items(&txn, request_id).await?;
        let mut returned = Vec::new();
        for line in plan {
            if line.quantity == 0 {
                continue;
            }
            let item = items.iter().find(|i| i.id == line.item_id).ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Item {} does not belong to request #{}",
                    line.item_id, request_id
                ))
            })?;
            if line.quantity < 0 || line.quantity > item.returnable() {
                return Err(ServiceError::ValidationError(format!(
                    "Return of {} for component {} exceeds the {} still held",
                    line.quantity,
                    item.component_id,
                    item.returnable()
                )));
            }
            request_item::ActiveModel {
                id: Set(item.id),
                quantity_returned: Set(item.quantity_returned + line.quantity),
                ..Default::default()
            }
            .update(&txn)
            .await?;
            returned.push((item.component_id.clone(), line.quantity));
        }
        if returned.is_empty() {
            return Err(ServiceError::ValidationError(
                "A return must include at least one component".to_string(),
            ));
        }

        let now = Utc::now();
        let changes = request::ActiveModel {
            status: Set(RequestStatus::ReturnPendingWarehouse),
            status_changed_at: Set(now),
            return_requested_at: Set(Some(now)),
            ..Default::default()
        };
        Self::update_guarded(&txn, &current, changes).await?;

        let summary = returned
            .iter()
            .map(|(component, qty)| format!("{}: {}", component, qty))
            .collect::<Vec<_>>()
            .join(", ");
        Self::audit(&txn, request_id, &actor.username, "Return Registered", &summary).await?;
        txn.commit().await?;
        info!(request_id, "Return registered");

        self.publish(Event::ReturnRegistered(request_id)).await;
        self.get_request(request_id).await
    }

    /// Warehouse acknowledges receipt of the returned parts:
    /// `Return Pending Warehouse` -> `Return Completed` (terminal).
    #[instrument(skip(self, actor), fields(actor = %actor.username))]
    pub async fn confirm_return(
        &self,
        actor: &Actor,
        request_id: i64,
    ) -> Result<RequestDetail, ServiceError> {
        Self::authorize(actor, LifecycleAction::ConfirmReturn)?;
        let txn = self.db.begin().await?;
        let current = Self::load_request(&txn, request_id).await?;
        Self::require_status(&current, LifecycleAction::ConfirmReturn)?;

        let now = Utc::now();
        let changes = request::ActiveModel {
            status: Set(RequestStatus::ReturnCompleted),
            status_changed_at: Set(now),
            return_confirmed_by: Set(Some(actor.username.clone())),
            return_confirmed_at: Set(Some(now)),
            finalized_at: Set(Some(now)),
            ..Default::default()
        };
        Self::update_guarded(&txn, &current, changes).await?;
        Self::audit(
            &txn,
            request_id,
            &actor.username,
            "Return Confirmed",
            "Returned components received by the warehouse",
        )
        .await?;
        txn.commit().await?;
        info!(request_id, "Return confirmed");

        self.publish(Event::ReturnConfirmed(request_id)).await;
        self.get_request(request_id).await
    }

    // ---- reads -----------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn get_request(&self, request_id: i64) -> Result<RequestDetail, ServiceError> {
        let req = Self::load_request(&*self.db, request_id).await?;
        let items = Self::load_items(&*self.db, request_id).await?;
        let audit = audit_entry::Entity::find()
            .filter(audit_entry::Column::RequestId.eq(request_id))
            .order_by_asc(audit_entry::Column::RecordedAt)
            .order_by_asc(audit_entry::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(RequestDetail {
            request: req,
            items,
            audit,
        })
    }

    /// Newest-first page of all requests.
    #[instrument(skip(self))]
    pub async fn list_requests(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<Vec<request::Model>, ServiceError> {
        if page == 0 {
            return Err(ServiceError::ValidationError(
                "Page numbers start at 1".to_string(),
            ));
        }
        let requests = request::Entity::find()
            .order_by_desc(request::Column::CreatedAt)
            .paginate(&*self.db, per_page)
            .fetch_page(page - 1)
            .await?;
        Ok(requests)
    }

    /// Work queue for an approver: pending requests, scoped to the cost
    /// centers the actor manages when routing is per cost center.
    #[instrument(skip(self, actor), fields(actor = %actor.username))]
    pub async fn pending_approval_for(
        &self,
        actor: &Actor,
    ) -> Result<Vec<request::Model>, ServiceError> {
        let mut query = request::Entity::find()
            .filter(request::Column::Status.eq(RequestStatus::PendingApproval))
            .order_by_asc(request::Column::CreatedAt);

        if self.routing == ApprovalRouting::PerCostCenter && actor.role.is_manager() {
            let codes: Vec<String> = cost_center::Entity::find()
                .filter(cost_center::Column::Manager.eq(actor.username.as_str()))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|c| c.code)
                .collect();
            query = query.filter(request::Column::CostCenterCode.is_in(codes));
        }

        Ok(query.all(&*self.db).await?)
    }

    /// Work queue for the warehouse: approved requests awaiting release.
    #[instrument(skip(self))]
    pub async fn awaiting_release(&self) -> Result<Vec<request::Model>, ServiceError> {
        let requests = request::Entity::find()
            .filter(request::Column::Status.eq(RequestStatus::Approved))
            .order_by_asc(request::Column::ApprovedAt)
            .all(&*self.db)
            .await?;
        Ok(requests)
    }

    /// Released requests waiting for pickup, optionally scoped to one
    /// requester.
    #[instrument(skip(self))]
    pub async fn available_for_pickup(
        &self,
        requester: Option<&str>,
    ) -> Result<Vec<request::Model>, ServiceError> {
        let mut query = request::Entity::find()
            .filter(
                request::Column::Status.is_in([
                    RequestStatus::ReleasedFull,
                    RequestStatus::ReleasedPartial,
                ]),
            )
            .order_by_asc(request::Column::ReleasedAt);
        if let Some(name) = requester {
            query = query.filter(request::Column::Requester.eq(name));
        }
        Ok(query.all(&*self.db).await?)
    }

    /// Work queue for the warehouse: registered returns awaiting receipt.
    #[instrument(skip(self))]
    pub async fn returns_pending(&self) -> Result<Vec<request::Model>, ServiceError> {
        let requests = request::Entity::find()
            .filter(request::Column::Status.eq(RequestStatus::ReturnPendingWarehouse))
            .order_by_asc(request::Column::ReturnRequestedAt)
            .all(&*self.db)
            .await?;
        Ok(requests)
    }

    /// Per-line report over every request, for export.
    #[instrument(skip(self))]
    pub async fn list_item_report(&self) -> Result<Vec<ItemReportRow>, ServiceError> {
        let rows = request_item::Entity::find()
            .find_also_related(request::Entity)
            .order_by_asc(request_item::Column::RequestId)
            .all(&*self.db)
            .await?;

        let mut report = Vec::with_capacity(rows.len());
        for (item, req) in rows {
            let req = req.ok_or_else(|| {
                ServiceError::NotFound(format!("Request for item {} not found", item.id))
            })?;
            report.push(ItemReportRow {
                request_id: req.id,
                status: req.status,
                requester: req.requester,
                customer_name: req.customer_name,
                equipment_id: req.equipment_id,
                component_id: item.component_id,
                component_description: item.component_description,
                quantity_requested: item.quantity_requested,
                quantity_released: item.quantity_released,
                quantity_picked_up: item.quantity_picked_up,
                quantity_returned: item.quantity_returned,
            });
        }
        Ok(report)
    }

    // ---- helpers ---------------------------------------------------------

    fn authorize(actor: &Actor, action: LifecycleAction) -> Result<(), ServiceError> {
        if actor.role.may(action) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "Role {} may not {}",
                actor.role, action
            )))
        }
    }

    fn require_status(
        request: &request::Model,
        action: LifecycleAction,
    ) -> Result<(), ServiceError> {
        if request.status.allows(action) {
            Ok(())
        } else {
            Err(ServiceError::InvalidOperation(format!(
                "Cannot {} request #{} in status {}",
                action, request.id, request.status
            )))
        }
    }

    /// Release and return plans must name each item at most once; quantities
    /// are validated per line, so a repeated line could slip past the caps.
    fn reject_duplicate_lines(item_ids: impl Iterator<Item = i64>) -> Result<(), ServiceError> {
        let mut seen = Vec::new();
        for id in item_ids {
            if seen.contains(&id) {
                return Err(ServiceError::ValidationError(format!(
                    "Item {} appears more than once in the plan",
                    id
                )));
            }
            seen.push(id);
        }
        Ok(())
    }

    fn require_own_request(actor: &Actor, request: &request::Model) -> Result<(), ServiceError> {
        if actor.can_act_for(&request.requester) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "Request #{} belongs to {}",
                request.id, request.requester
            )))
        }
    }

    /// Approval scope check. `Admin` always passes; under `AnyManager`
    /// routing so does any manager; under `PerCostCenter` the actor must be
    /// the registered manager of the request's cost center.
    async fn ensure_may_approve(
        &self,
        txn: &DatabaseTransaction,
        actor: &Actor,
        request: &request::Model,
    ) -> Result<(), ServiceError> {
        if actor.role == crate::auth::Role::Admin || self.routing == ApprovalRouting::AnyManager {
            return Ok(());
        }
        let center = cost_center::Entity::find()
            .filter(cost_center::Column::Code.eq(request.cost_center_code.as_str()))
            .one(txn)
            .await?;
        match center {
            Some(c) if c.manager == actor.username => Ok(()),
            _ => Err(ServiceError::Forbidden(format!(
                "{} is not the manager of cost center {}",
                actor.username, request.cost_center_code
            ))),
        }
    }

    async fn load_request<C: ConnectionTrait>(
        conn: &C,
        request_id: i64,
    ) -> Result<request::Model, ServiceError> {
        request::Entity::find_by_id(request_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Request #{} not found", request_id)))
    }

    async fn load_items<C: ConnectionTrait>(
        conn: &C,
        request_id: i64,
    ) -> Result<Vec<request_item::Model>, ServiceError> {
        let items = request_item::Entity::find()
            .filter(request_item::Column::RequestId.eq(request_id))
            .order_by_asc(request_item::Column::Id)
            .all(conn)
            .await?;
        Ok(items)
    }

    async fn audit<C: ConnectionTrait>(
        conn: &C,
        request_id: i64,
        actor: &str,
        action: &str,
        detail: &str,
    ) -> Result<(), ServiceError> {
        audit_entry::ActiveModel {
            request_id: Set(request_id),
            recorded_at: Set(Utc::now()),
            actor: Set(actor.to_string()),
            action: Set(action.to_string()),
            detail: Set(detail.to_string()),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        Ok(())
    }

    /// Version-guarded status write. Loses the race to a concurrent
    /// transition instead of overwriting it.
    async fn update_guarded(
        txn: &DatabaseTransaction,
        current: &request::Model,
        mut changes: request::ActiveModel,
    ) -> Result<(), ServiceError> {
        changes.version = Set(current.version + 1);
        let result = request::Entity::update_many()
            .set(changes)
            .filter(request::Column::Id.eq(current.id))
            .filter(request::Column::Version.eq(current.version))
            .exec(txn)
            .await?;
        if result.rows_affected == 0 {
            error!(request_id = current.id, "Concurrent transition detected");
            return Err(ServiceError::Conflict(current.id));
        }
        Ok(())
    }

    async fn publish(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                error!(error = %e, "Event publish failed");
            }
        }
    }
}
