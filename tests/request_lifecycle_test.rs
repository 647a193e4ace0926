//! End-to-end tests for the parts-request lifecycle: submission, approval
//! routing, warehouse release, pickup, finalization and returns.

mod common;

use assert_matches::assert_matches;
use common::*;
use warranty_parts_api::config::ApprovalRouting;
use warranty_parts_api::errors::ServiceError;
use warranty_parts_api::events::Event;
use warranty_parts_api::inventory::StaticInventoryGateway;
use warranty_parts_api::models::RequestStatus;
use warranty_parts_api::services::{ReleaseLine, RequestDetail, ReturnLine};

fn item_id(detail: &RequestDetail, component: &str) -> i64 {
    detail
        .items
        .iter()
        .find(|i| i.component_id == component)
        .expect("component present")
        .id
}

fn release_all(detail: &RequestDetail) -> Vec<ReleaseLine> {
    detail
        .items
        .iter()
        .map(|i| ReleaseLine {
            item_id: i.id,
            quantity: i.quantity_requested,
        })
        .collect()
}

// ==================== full forward path ====================

#[tokio::test]
async fn full_release_pickup_finalize_flow() {
    let mut app = TestApp::new().await;
    let tech = technician("carlos.amaral");

    let detail = app
        .lifecycle
        .submit(&tech, single_item_request(WARRANTY_CC, 5))
        .await
        .unwrap();
    let id = detail.request.id;
    assert_eq!(detail.request.status, RequestStatus::PendingApproval);
    assert_eq!(detail.request.requester, "carlos.amaral");
    assert_eq!(detail.request.cost_center_sector.as_deref(), Some("Warranty"));

    let detail = app.lifecycle.approve(&warranty_manager(), id).await.unwrap();
    assert_eq!(detail.request.status, RequestStatus::Approved);
    assert_eq!(detail.request.approver.as_deref(), Some("warranty.manager"));
    assert!(detail.request.approved_at.is_some());

    let detail = app
        .lifecycle
        .release(&warehouse(), id, &release_all(&detail))
        .await
        .unwrap();
    assert_eq!(detail.request.status, RequestStatus::ReleasedFull);
    assert_eq!(detail.items[0].quantity_released, 5);
    assert_eq!(detail.request.released_by.as_deref(), Some("warehouse.op"));

    let detail = app.lifecycle.confirm_pickup(&tech, id).await.unwrap();
    assert_eq!(detail.request.status, RequestStatus::PickupConfirmed);
    assert_eq!(detail.items[0].quantity_picked_up, 5);

    let detail = app.lifecycle.finalize(&tech, id).await.unwrap();
    assert_eq!(detail.request.status, RequestStatus::Finalized);
    assert!(detail.request.finalized_at.is_some());
    assert!(detail.request.return_requested_at.is_none());

    assert_eq!(app.next_event().await, Event::RequestSubmitted(id));
    assert_eq!(app.next_event().await, Event::RequestApproved(id));
    assert_eq!(
        app.next_event().await,
        Event::ItemsReleased {
            request_id: id,
            full: true
        }
    );
    assert_eq!(app.next_event().await, Event::PickupConfirmed(id));
    assert_eq!(app.next_event().await, Event::RequestFinalized(id));
}

#[tokio::test]
async fn partial_release_return_flow() {
    let app = TestApp::new().await;
    let tech = technician("carlos.amaral");

    let detail = app
        .lifecycle
        .submit(&tech, single_item_request(WARRANTY_CC, 10))
        .await
        .unwrap();
    let id = detail.request.id;
    let item = item_id(&detail, "CMP-100");

    app.lifecycle.approve(&warranty_manager(), id).await.unwrap();

    let detail = app
        .lifecycle
        .release(&warehouse(), id, &[ReleaseLine { item_id: item, quantity: 6 }])
        .await
        .unwrap();
    assert_eq!(detail.request.status, RequestStatus::ReleasedPartial);
    assert_eq!(detail.items[0].quantity_released, 6);

    let detail = app.lifecycle.confirm_pickup(&tech, id).await.unwrap();
    assert_eq!(detail.items[0].quantity_picked_up, 6);

    let detail = app
        .lifecycle
        .register_return(&tech, id, &[ReturnLine { item_id: item, quantity: 2 }])
        .await
        .unwrap();
    assert_eq!(detail.request.status, RequestStatus::ReturnPendingWarehouse);
    assert_eq!(detail.items[0].quantity_returned, 2);
    assert!(detail.request.return_requested_at.is_some());

    let detail = app.lifecycle.confirm_return(&warehouse(), id).await.unwrap();
    assert_eq!(detail.request.status, RequestStatus::ReturnCompleted);
    assert_eq!(
        detail.request.return_confirmed_by.as_deref(),
        Some("warehouse.op")
    );
    assert!(detail.request.return_confirmed_at.is_some());
    assert!(detail.request.finalized_at.is_some());
}

// ==================== quantity reconciliation ====================

#[tokio::test]
async fn release_is_an_idempotent_overwrite() {
    let app = TestApp::new().await;
    let tech = technician("carlos.amaral");

    let detail = app
        .lifecycle
        .submit(&tech, single_item_request(WARRANTY_CC, 10))
        .await
        .unwrap();
    let id = detail.request.id;
    let item = item_id(&detail, "CMP-100");
    app.lifecycle.approve(&warranty_manager(), id).await.unwrap();

    let first = app
        .lifecycle
        .release(&warehouse(), id, &[ReleaseLine { item_id: item, quantity: 4 }])
        .await
        .unwrap();
    let second = app
        .lifecycle
        .release(&warehouse(), id, &[ReleaseLine { item_id: item, quantity: 4 }])
        .await
        .unwrap();
    assert_eq!(first.items[0].quantity_released, 4);
    assert_eq!(second.items[0].quantity_released, 4);
    assert_eq!(second.request.status, RequestStatus::ReleasedPartial);

    // A revised release overwrites, never accumulates, and the aggregate is
    // recomputed.
    let revised = app
        .lifecycle
        .release(&warehouse(), id, &[ReleaseLine { item_id: item, quantity: 10 }])
        .await
        .unwrap();
    assert_eq!(revised.items[0].quantity_released, 10);
    assert_eq!(revised.request.status, RequestStatus::ReleasedFull);
}

#[tokio::test]
async fn release_outside_requested_range_is_rejected_without_mutation() {
    let app = TestApp::new().await;
    let tech = technician("carlos.amaral");

    let detail = app
        .lifecycle
        .submit(&tech, single_item_request(WARRANTY_CC, 5))
        .await
        .unwrap();
    let id = detail.request.id;
    let item = item_id(&detail, "CMP-100");
    app.lifecycle.approve(&warranty_manager(), id).await.unwrap();

    let err = app
        .lifecycle
        .release(&warehouse(), id, &[ReleaseLine { item_id: item, quantity: 6 }])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let after = app.lifecycle.get_request(id).await.unwrap();
    assert_eq!(after.request.status, RequestStatus::Approved);
    assert_eq!(after.items[0].quantity_released, 0);
}

#[tokio::test]
async fn returns_accumulate_across_registrations() {
    let app = TestApp::new().await;
    let tech = technician("carlos.amaral");

    let detail = app
        .lifecycle
        .submit(&tech, single_item_request(WARRANTY_CC, 10))
        .await
        .unwrap();
    let id = detail.request.id;
    let item = item_id(&detail, "CMP-100");
    app.lifecycle.approve(&warranty_manager(), id).await.unwrap();
    app.lifecycle
        .release(&warehouse(), id, &[ReleaseLine { item_id: item, quantity: 10 }])
        .await
        .unwrap();
    app.lifecycle.confirm_pickup(&tech, id).await.unwrap();

    app.lifecycle
        .register_return(&tech, id, &[ReturnLine { item_id: item, quantity: 2 }])
        .await
        .unwrap();
    let detail = app
        .lifecycle
        .register_return(&tech, id, &[ReturnLine { item_id: item, quantity: 1 }])
        .await
        .unwrap();
    assert_eq!(detail.items[0].quantity_returned, 3);
    assert_eq!(detail.request.status, RequestStatus::ReturnPendingWarehouse);
}

#[tokio::test]
async fn return_beyond_held_quantity_is_rejected() {
    let app = TestApp::new().await;
    let tech = technician("carlos.amaral");

    let detail = app
        .lifecycle
        .submit(&tech, single_item_request(WARRANTY_CC, 10))
        .await
        .unwrap();
    let id = detail.request.id;
    let item = item_id(&detail, "CMP-100");
    app.lifecycle.approve(&warranty_manager(), id).await.unwrap();
    app.lifecycle
        .release(&warehouse(), id, &[ReleaseLine { item_id: item, quantity: 6 }])
        .await
        .unwrap();
    app.lifecycle.confirm_pickup(&tech, id).await.unwrap();
    app.lifecycle
        .register_return(&tech, id, &[ReturnLine { item_id: item, quantity: 5 }])
        .await
        .unwrap();

    // Only 1 of the 6 picked up is still held.
    let err = app
        .lifecycle
        .register_return(&tech, id, &[ReturnLine { item_id: item, quantity: 2 }])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let after = app.lifecycle.get_request(id).await.unwrap();
    assert_eq!(after.items[0].quantity_returned, 5);
}

#[tokio::test]
async fn duplicate_plan_lines_are_rejected() {
    let app = TestApp::new().await;
    let tech = technician("carlos.amaral");

    let detail = app
        .lifecycle
        .submit(&tech, single_item_request(WARRANTY_CC, 10))
        .await
        .unwrap();
    let id = detail.request.id;
    let item = item_id(&detail, "CMP-100");
    app.lifecycle.approve(&warranty_manager(), id).await.unwrap();

    // A release plan naming the same item twice is refused outright.
    let err = app
        .lifecycle
        .release(
            &warehouse(),
            id,
            &[
                ReleaseLine { item_id: item, quantity: 4 },
                ReleaseLine { item_id: item, quantity: 4 },
            ],
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
    let after = app.lifecycle.get_request(id).await.unwrap();
    assert_eq!(after.items[0].quantity_released, 0);

    app.lifecycle
        .release(&warehouse(), id, &[ReleaseLine { item_id: item, quantity: 10 }])
        .await
        .unwrap();
    app.lifecycle.confirm_pickup(&tech, id).await.unwrap();

    // Same for returns: a repeated line may neither bypass the per-item cap
    // nor silently collapse into a single increment.
    let err = app
        .lifecycle
        .register_return(
            &tech,
            id,
            &[
                ReturnLine { item_id: item, quantity: 3 },
                ReturnLine { item_id: item, quantity: 3 },
            ],
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
    let after = app.lifecycle.get_request(id).await.unwrap();
    assert_eq!(after.items[0].quantity_returned, 0);
    assert_eq!(after.request.status, RequestStatus::PickupConfirmed);

    // Split across two registrations the same quantities do accumulate.
    app.lifecycle
        .register_return(&tech, id, &[ReturnLine { item_id: item, quantity: 3 }])
        .await
        .unwrap();
    let detail = app
        .lifecycle
        .register_return(&tech, id, &[ReturnLine { item_id: item, quantity: 3 }])
        .await
        .unwrap();
    assert_eq!(detail.items[0].quantity_returned, 6);
}

#[tokio::test]
async fn empty_return_is_rejected() {
    let app = TestApp::new().await;
    let tech = technician("carlos.amaral");

    let detail = app
        .lifecycle
        .submit(&tech, single_item_request(WARRANTY_CC, 4))
        .await
        .unwrap();
    let id = detail.request.id;
    let item = item_id(&detail, "CMP-100");
    app.lifecycle.approve(&warranty_manager(), id).await.unwrap();
    app.lifecycle
        .release(&warehouse(), id, &[ReleaseLine { item_id: item, quantity: 4 }])
        .await
        .unwrap();
    app.lifecycle.confirm_pickup(&tech, id).await.unwrap();

    let err = app
        .lifecycle
        .register_return(&tech, id, &[ReturnLine { item_id: item, quantity: 0 }])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

// ==================== transition table ====================

#[tokio::test]
async fn rejected_is_terminal() {
    let app = TestApp::new().await;
    let tech = technician("carlos.amaral");

    let detail = app
        .lifecycle
        .submit(&tech, sample_request(WARRANTY_CC))
        .await
        .unwrap();
    let id = detail.request.id;

    let detail = app
        .lifecycle
        .reject(&warranty_manager(), id, "Not covered by warranty")
        .await
        .unwrap();
    assert_eq!(detail.request.status, RequestStatus::Rejected);
    assert_eq!(
        detail.request.rejection_reason.as_deref(),
        Some("Not covered by warranty")
    );
    // Rejection stamps the decision timestamp alongside the approver.
    assert_eq!(detail.request.approver.as_deref(), Some("warranty.manager"));
    assert!(detail.request.approved_at.is_some());

    let err = app
        .lifecycle
        .approve(&warranty_manager(), id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));
    let err = app
        .lifecycle
        .release(&warehouse(), id, &[])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));
}

#[tokio::test]
async fn reject_requires_a_reason() {
    let app = TestApp::new().await;
    let detail = app
        .lifecycle
        .submit(&technician("carlos.amaral"), sample_request(WARRANTY_CC))
        .await
        .unwrap();

    let err = app
        .lifecycle
        .reject(&warranty_manager(), detail.request.id, "  ")
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn pickup_before_release_is_refused() {
    let app = TestApp::new().await;
    let tech = technician("carlos.amaral");
    let detail = app
        .lifecycle
        .submit(&tech, sample_request(WARRANTY_CC))
        .await
        .unwrap();
    let id = detail.request.id;

    let err = app.lifecycle.confirm_pickup(&tech, id).await.unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));

    app.lifecycle.approve(&warranty_manager(), id).await.unwrap();
    let err = app.lifecycle.confirm_pickup(&tech, id).await.unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));
}

#[tokio::test]
async fn not_available_can_be_retried_with_a_release() {
    let app = TestApp::new().await;
    let tech = technician("carlos.amaral");
    let detail = app
        .lifecycle
        .submit(&tech, single_item_request(WARRANTY_CC, 3))
        .await
        .unwrap();
    let id = detail.request.id;
    let item = item_id(&detail, "CMP-100");
    app.lifecycle.approve(&warranty_manager(), id).await.unwrap();

    let detail = app
        .lifecycle
        .mark_not_available(&warehouse(), id, "Out of stock until next shipment")
        .await
        .unwrap();
    assert_eq!(detail.request.status, RequestStatus::NotAvailable);
    assert_eq!(
        detail.request.cannot_fulfill_reason.as_deref(),
        Some("Out of stock until next shipment")
    );

    // Stock came in; the warehouse releases after all.
    let detail = app
        .lifecycle
        .release(&warehouse(), id, &[ReleaseLine { item_id: item, quantity: 3 }])
        .await
        .unwrap();
    assert_eq!(detail.request.status, RequestStatus::ReleasedFull);
    assert!(detail.request.cannot_fulfill_reason.is_none());
}

// ==================== authorization ====================

#[tokio::test]
async fn technician_cannot_act_on_someone_elses_request() {
    let app = TestApp::new().await;
    let owner = technician("carlos.amaral");
    let other = technician("antonio.fernandes");

    let detail = app
        .lifecycle
        .submit(&owner, single_item_request(WARRANTY_CC, 2))
        .await
        .unwrap();
    let id = detail.request.id;
    let item = item_id(&detail, "CMP-100");
    app.lifecycle.approve(&warranty_manager(), id).await.unwrap();
    app.lifecycle
        .release(&warehouse(), id, &[ReleaseLine { item_id: item, quantity: 2 }])
        .await
        .unwrap();

    let err = app.lifecycle.confirm_pickup(&other, id).await.unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));

    // Administrative staff may act for any requester.
    let back_office = administrative("ana.lima");
    app.lifecycle.confirm_pickup(&back_office, id).await.unwrap();

    let err = app.lifecycle.finalize(&other, id).await.unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));
    let err = app
        .lifecycle
        .register_return(&other, id, &[ReturnLine { item_id: item, quantity: 1 }])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));

    app.lifecycle.finalize(&owner, id).await.unwrap();
}

#[tokio::test]
async fn role_capabilities_are_enforced() {
    let app = TestApp::new().await;
    let tech = technician("carlos.amaral");
    let detail = app
        .lifecycle
        .submit(&tech, sample_request(WARRANTY_CC))
        .await
        .unwrap();
    let id = detail.request.id;

    let err = app.lifecycle.approve(&tech, id).await.unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));
    let err = app
        .lifecycle
        .release(&warranty_manager(), id, &[])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));
    let err = app
        .lifecycle
        .submit(&warehouse(), sample_request(WARRANTY_CC))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));
}

#[tokio::test]
async fn approval_is_routed_to_the_cost_center_manager() {
    let app = TestApp::new().await;
    let detail = app
        .lifecycle
        .submit(&technician("carlos.amaral"), sample_request(WARRANTY_CC))
        .await
        .unwrap();
    let id = detail.request.id;

    // The assistance manager does not own cost center 040023.
    let err = app
        .lifecycle
        .approve(&assistance_manager(), id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));

    // Admins bypass the routing; the owning manager passes it.
    app.lifecycle.approve(&warranty_manager(), id).await.unwrap();
}

#[tokio::test]
async fn any_manager_routing_lets_every_manager_approve() {
    let gateway = StaticInventoryGateway::new()
        .with_available("CMP-100", 100)
        .with_available("CMP-200", 100);
    let app = TestApp::with_gateway(gateway, ApprovalRouting::AnyManager).await;

    let detail = app
        .lifecycle
        .submit(&technician("carlos.amaral"), sample_request(WARRANTY_CC))
        .await
        .unwrap();
    let detail = app
        .lifecycle
        .approve(&assistance_manager(), detail.request.id)
        .await
        .unwrap();
    assert_eq!(detail.request.status, RequestStatus::Approved);
    assert_eq!(
        detail.request.approver.as_deref(),
        Some("assistance.manager")
    );
}

// ==================== stock advisories ====================

#[tokio::test]
async fn short_stock_is_noted_but_never_blocks() {
    let gateway = StaticInventoryGateway::new()
        .with_available("CMP-100", 1)
        .with_available("CMP-200", 100);
    let app = TestApp::with_gateway(gateway, ApprovalRouting::PerCostCenter).await;

    let detail = app
        .lifecycle
        .submit(&technician("carlos.amaral"), sample_request(WARRANTY_CC))
        .await
        .unwrap();
    assert_eq!(detail.request.status, RequestStatus::PendingApproval);

    let short = detail
        .items
        .iter()
        .find(|i| i.component_id == "CMP-100")
        .unwrap();
    assert_eq!(
        short.stock_note.as_deref(),
        Some("Insufficient stock at request time. Available balance: 1")
    );
    let stocked = detail
        .items
        .iter()
        .find(|i| i.component_id == "CMP-200")
        .unwrap();
    assert!(stocked.stock_note.is_none());

    let created = detail
        .audit
        .iter()
        .find(|e| e.action == "Created")
        .unwrap();
    assert!(created.detail.contains("Insufficient stock for: CMP-100"));
}

// ==================== notifications and audit trail ====================

#[tokio::test]
async fn submit_and_approve_notify_the_next_actor() {
    let app = TestApp::new().await;
    let detail = app
        .lifecycle
        .submit(&technician("carlos.amaral"), sample_request(WARRANTY_CC))
        .await
        .unwrap();
    let id = detail.request.id;

    app.lifecycle.approve(&warranty_manager(), id).await.unwrap();

    assert_eq!(
        app.notifier.sent(),
        vec![
            SentMail::ManagerPendingApproval {
                to: "warranty.manager@example.com".to_string(),
                request_id: id,
            },
            SentMail::WarehouseApproved { request_id: id },
        ]
    );

    let detail = app.lifecycle.get_request(id).await.unwrap();
    let notifications: Vec<_> = detail
        .audit
        .iter()
        .filter(|e| e.action == "Notification")
        .collect();
    assert_eq!(notifications.len(), 2);
}

#[tokio::test]
async fn notification_failure_is_audited_not_fatal() {
    let app = TestApp::new().await;
    app.notifier.fail_all();

    let detail = app
        .lifecycle
        .submit(&technician("carlos.amaral"), sample_request(WARRANTY_CC))
        .await
        .unwrap();
    assert_eq!(detail.request.status, RequestStatus::PendingApproval);
    assert!(detail
        .audit
        .iter()
        .any(|e| e.action == "Warning" && e.detail.contains("Failed to notify")));
}

#[tokio::test]
async fn audit_trail_records_every_step_in_order() {
    let app = TestApp::new().await;
    let tech = technician("carlos.amaral");
    let detail = app
        .lifecycle
        .submit(&tech, single_item_request(WARRANTY_CC, 5))
        .await
        .unwrap();
    let id = detail.request.id;
    let item = item_id(&detail, "CMP-100");

    app.lifecycle.approve(&warranty_manager(), id).await.unwrap();
    app.lifecycle
        .release(&warehouse(), id, &[ReleaseLine { item_id: item, quantity: 5 }])
        .await
        .unwrap();
    app.lifecycle.confirm_pickup(&tech, id).await.unwrap();
    let detail = app.lifecycle.finalize(&tech, id).await.unwrap();

    let actions: Vec<&str> = detail.audit.iter().map(|e| e.action.as_str()).collect();
    let expected = [
        "Created",
        "Notification",
        "Approved",
        "Notification",
        "Items Released",
        "Status Changed",
        "Items Picked Up",
        "Status Changed",
        "Finalized",
    ];
    assert_eq!(actions, expected);
    assert!(detail.audit.iter().all(|e| e.request_id == id));
}

// ==================== validation ====================

#[tokio::test]
async fn submit_requires_items_and_a_known_cost_center() {
    let app = TestApp::new().await;
    let tech = technician("carlos.amaral");

    let mut empty = sample_request(WARRANTY_CC);
    empty.items.clear();
    let err = app.lifecycle.submit(&tech, empty).await.unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let err = app
        .lifecycle
        .submit(&tech, sample_request("999999"))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let mut bad_qty = single_item_request(WARRANTY_CC, 0);
    bad_qty.items[0].quantity = 0;
    let err = app.lifecycle.submit(&tech, bad_qty).await.unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn release_plan_must_reference_items_of_the_request() {
    let app = TestApp::new().await;
    let tech = technician("carlos.amaral");
    let detail = app
        .lifecycle
        .submit(&tech, single_item_request(WARRANTY_CC, 3))
        .await
        .unwrap();
    let id = detail.request.id;
    app.lifecycle.approve(&warranty_manager(), id).await.unwrap();

    let err = app
        .lifecycle
        .release(&warehouse(), id, &[ReleaseLine { item_id: 9999, quantity: 1 }])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn unknown_request_is_not_found() {
    let app = TestApp::new().await;
    let err = app.lifecycle.get_request(424242).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

// ==================== work queues and reporting ====================

#[tokio::test]
async fn work_queues_follow_the_lifecycle() {
    let app = TestApp::new().await;
    let tech = technician("carlos.amaral");

    let warranty = app
        .lifecycle
        .submit(&tech, single_item_request(WARRANTY_CC, 2))
        .await
        .unwrap();
    let assistance = app
        .lifecycle
        .submit(&tech, single_item_request(ASSISTANCE_CC, 1))
        .await
        .unwrap();

    // Pending-approval queue is scoped per manager under strict routing.
    let queue = app
        .lifecycle
        .pending_approval_for(&warranty_manager())
        .await
        .unwrap();
    assert_eq!(
        queue.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![warranty.request.id]
    );
    let queue = app
        .lifecycle
        .pending_approval_for(&assistance_manager())
        .await
        .unwrap();
    assert_eq!(
        queue.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![assistance.request.id]
    );

    app.lifecycle
        .approve(&warranty_manager(), warranty.request.id)
        .await
        .unwrap();
    let releases = app.lifecycle.awaiting_release().await.unwrap();
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].id, warranty.request.id);

    let item = item_id(&warranty, "CMP-100");
    app.lifecycle
        .release(
            &warehouse(),
            warranty.request.id,
            &[ReleaseLine { item_id: item, quantity: 2 }],
        )
        .await
        .unwrap();
    let pickups = app
        .lifecycle
        .available_for_pickup(Some("carlos.amaral"))
        .await
        .unwrap();
    assert_eq!(pickups.len(), 1);
    let none = app
        .lifecycle
        .available_for_pickup(Some("antonio.fernandes"))
        .await
        .unwrap();
    assert!(none.is_empty());

    app.lifecycle
        .confirm_pickup(&tech, warranty.request.id)
        .await
        .unwrap();
    app.lifecycle
        .register_return(&tech, warranty.request.id, &[ReturnLine { item_id: item, quantity: 1 }])
        .await
        .unwrap();
    let returns = app.lifecycle.returns_pending().await.unwrap();
    assert_eq!(returns.len(), 1);
    assert_eq!(returns[0].id, warranty.request.id);
}

#[tokio::test]
async fn item_report_joins_items_with_their_request() {
    let app = TestApp::new().await;
    let tech = technician("carlos.amaral");
    let detail = app
        .lifecycle
        .submit(&tech, sample_request(WARRANTY_CC))
        .await
        .unwrap();

    let report = app.lifecycle.list_item_report().await.unwrap();
    assert_eq!(report.len(), 2);
    let row = report
        .iter()
        .find(|r| r.component_id == "CMP-100")
        .unwrap();
    assert_eq!(row.request_id, detail.request.id);
    assert_eq!(row.requester, "carlos.amaral");
    assert_eq!(row.quantity_requested, 3);
    assert_eq!(row.quantity_released, 0);
}

#[tokio::test]
async fn list_requests_paginates_newest_first() {
    let app = TestApp::new().await;
    let tech = technician("carlos.amaral");
    for _ in 0..3 {
        app.lifecycle
            .submit(&tech, single_item_request(WARRANTY_CC, 1))
            .await
            .unwrap();
    }

    let page = app.lifecycle.list_requests(1, 2).await.unwrap();
    assert_eq!(page.len(), 2);
    let rest = app.lifecycle.list_requests(2, 2).await.unwrap();
    assert_eq!(rest.len(), 1);

    let err = app.lifecycle.list_requests(0, 2).await.unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}
