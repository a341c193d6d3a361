//! Audit trail tests
//!
//! Tests for the audit recorder including:
//! - Property 6: Audit Completeness
//! - Audit write failures never undo the business change
//! - Context capture and trail filtering

mod common;

use common::*;
use serde_json::json;
use uuid::Uuid;

use shared::{AuditAction, AuditQuery, AuditTable, CreateShipmentInput, UpdateOrderInput, UpdateShipmentInput};
use store_ops::services::{
    AuditEvent, AuditRecorder, OrderService, RequestContext, ShipmentService, SupplyService,
};
use store_ops::MemoryLedger;

#[tokio::test]
async fn test_every_order_mutation_is_audited_once() {
    let ledger = MemoryLedger::new();
    seed(&ledger, "X", 0, "10.00").await;
    let orders = OrderService::new(ledger.clone());

    let created = orders
        .create_order(&ctx(), order_input(vec![line("X", 2, "10.00")]))
        .await
        .unwrap();
    let id = created.order.id.to_string();

    let entries = audit_for(&ledger, AuditTable::Orders, &id).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::Create);
    assert_eq!(
        entries[0].new_values,
        Some(serde_json::to_value(&created.order).unwrap())
    );

    let updated = orders
        .update_order(
            &ctx(),
            created.order.id,
            UpdateOrderInput {
                lines: Some(vec![line("X", 3, "10.00")]),
                ..UpdateOrderInput::default()
            },
        )
        .await
        .unwrap();

    let entries = audit_for(&ledger, AuditTable::Orders, &id).await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].action, AuditAction::Update);
    let persisted = serde_json::to_value(&updated.order).unwrap();
    let new_values = entries[0].new_values.as_ref().unwrap().as_object().unwrap();
    assert!(new_values.contains_key("subtotal"));
    for (field, value) in new_values {
        assert_eq!(&persisted[field], value, "field {}", field);
    }

    orders.delete_order(&ctx(), created.order.id).await.unwrap();

    let entries = audit_for(&ledger, AuditTable::Orders, &id).await;
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].action, AuditAction::Delete);
    assert_eq!(entries[0].old_values, Some(persisted));
}

#[tokio::test]
async fn test_noop_update_writes_no_entry() {
    let ledger = MemoryLedger::new();
    seed(&ledger, "X", 0, "10.00").await;
    let orders = OrderService::new(ledger.clone());

    let created = orders
        .create_order(&ctx(), order_input(vec![line("X", 2, "10.00")]))
        .await
        .unwrap();
    orders
        .update_order(&ctx(), created.order.id, UpdateOrderInput::default())
        .await
        .unwrap();

    let entries = audit_for(&ledger, AuditTable::Orders, &created.order.id.to_string()).await;
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn test_audit_failure_does_not_undo_business_change() {
    let ledger = MemoryLedger::new();
    seed(&ledger, "X", 10, "10.00").await;
    ledger.fail_audit_writes(true);

    let intake = SupplyService::new(ledger.clone())
        .create_intake(&ctx(), intake_input(Uuid::new_v4(), &[("X", 5)]))
        .await
        .unwrap();

    assert_eq!(stock_of(&ledger, "X").await, 15);
    assert!(SupplyService::new(ledger.clone())
        .get_intake(intake.intake.id)
        .await
        .is_ok());
    assert_eq!(ledger.audit_count().await, 0);

    ledger.fail_audit_writes(false);
    SupplyService::new(ledger.clone())
        .create_intake(&ctx(), intake_input(Uuid::new_v4(), &[("X", 1)]))
        .await
        .unwrap();
    assert_eq!(ledger.audit_count().await, 2);
}

#[tokio::test]
async fn test_context_is_recorded() {
    let ledger = MemoryLedger::new();
    seed(&ledger, "X", 0, "10.00").await;
    let actor = Uuid::new_v4();
    let stamp = chrono::Utc::now();
    let context = RequestContext {
        actor_id: Some(actor),
        source_ip: Some("198.51.100.4".to_string()),
        client_timestamp: Some(stamp),
    };

    let created = OrderService::new(ledger.clone())
        .create_order(&context, order_input(vec![line("X", 1, "1.00")]))
        .await
        .unwrap();

    let entries = audit_for(&ledger, AuditTable::Orders, &created.order.id.to_string()).await;
    assert_eq!(entries[0].employee_id, Some(actor));
    assert_eq!(entries[0].ip_address.as_deref(), Some("198.51.100.4"));
    assert_eq!(entries[0].client_timestamp, Some(stamp));
}

#[tokio::test]
async fn test_system_changes_have_no_actor() {
    let ledger = MemoryLedger::new();
    seed(&ledger, "X", 0, "10.00").await;

    OrderService::new(ledger.clone())
        .create_order(&RequestContext::system(), order_input(vec![line("X", 1, "1.00")]))
        .await
        .unwrap();

    let entries = AuditRecorder::new(ledger.clone())
        .list(&AuditQuery::default())
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].employee_id.is_none());
    assert!(entries[0].ip_address.is_none());
}

#[tokio::test]
async fn test_sensitive_fields_never_persist() {
    let ledger = MemoryLedger::new();
    let recorder = AuditRecorder::new(ledger.clone());

    recorder
        .record(
            &ctx(),
            vec![AuditEvent::updated(
                AuditTable::Products,
                "X",
                &json!({"name": "a", "token": "old"}),
                &json!({"name": "b", "token": "new"}),
            )],
        )
        .await;

    let entries = audit_for(&ledger, AuditTable::Products, "X").await;
    assert_eq!(entries[0].old_values, Some(json!({"name": "a", "token": "[REDACTED]"})));
    assert_eq!(entries[0].new_values, Some(json!({"name": "b", "token": "[REDACTED]"})));
}

#[tokio::test]
async fn test_trail_filters() {
    let ledger = MemoryLedger::new();
    seed(&ledger, "X", 0, "10.00").await;
    let actor = Uuid::new_v4();

    let created = OrderService::new(ledger.clone())
        .create_order(&RequestContext::actor(actor), order_input(vec![line("X", 1, "1.00")]))
        .await
        .unwrap();
    let shipments = ShipmentService::new(ledger.clone());
    let shipment = shipments
        .create_shipment(
            &ctx(),
            CreateShipmentInput {
                order_id: created.order.id,
                code: "SHP-9".to_string(),
                employee_id: None,
                notes: None,
            },
        )
        .await
        .unwrap();
    shipments
        .update_shipment(
            &ctx(),
            shipment.id,
            UpdateShipmentInput {
                notes: Some("fragile".to_string()),
                ..UpdateShipmentInput::default()
            },
        )
        .await
        .unwrap();

    let recorder = AuditRecorder::new(ledger.clone());

    let by_actor = recorder
        .list(&AuditQuery {
            employee_id: Some(actor),
            ..AuditQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(by_actor.len(), 1);
    assert_eq!(by_actor[0].table_name, "orders");

    let updates = recorder
        .list(&AuditQuery {
            action: Some(AuditAction::Update),
            ..AuditQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].table_name, "shipments");
    assert_eq!(updates[0].new_values, Some(json!({"notes": "fragile"})));

    let paged = recorder
        .list(&AuditQuery {
            limit: Some(1),
            offset: Some(1),
            ..AuditQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(paged.len(), 1);
    assert_eq!(paged[0].action, AuditAction::Create);
    assert_eq!(paged[0].table_name, "shipments");
}
