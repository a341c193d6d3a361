//! Shipment service tests

mod common;

use common::*;
use uuid::Uuid;

use shared::{CreateShipmentInput, ShipmentStatus, UpdateShipmentInput};
use store_ops::error::AppError;
use store_ops::services::{OrderService, ShipmentService};
use store_ops::MemoryLedger;

async fn order_id(ledger: &MemoryLedger) -> Uuid {
    seed(ledger, "X", 0, "1.00").await;
    OrderService::new(ledger.clone())
        .create_order(&ctx(), order_input(vec![line("X", 1, "1.00")]))
        .await
        .unwrap()
        .order
        .id
}

fn shipment_input(order_id: Uuid, code: &str) -> CreateShipmentInput {
    CreateShipmentInput {
        order_id,
        code: code.to_string(),
        employee_id: None,
        notes: None,
    }
}

#[tokio::test]
async fn test_shipment_lifecycle() {
    let ledger = MemoryLedger::new();
    let order_id = order_id(&ledger).await;
    let shipments = ShipmentService::new(ledger.clone());

    let shipment = shipments
        .create_shipment(&ctx(), shipment_input(order_id, "SHP-1"))
        .await
        .unwrap();
    assert_eq!(shipment.status, ShipmentStatus::Preparing);
    assert!(shipment.delivered_at.is_none());

    let in_transit = shipments
        .update_shipment(
            &ctx(),
            shipment.id,
            UpdateShipmentInput {
                status: Some(ShipmentStatus::InTransit),
                ..UpdateShipmentInput::default()
            },
        )
        .await
        .unwrap();
    assert!(in_transit.delivered_at.is_none());

    let delivered = shipments
        .update_shipment(
            &ctx(),
            shipment.id,
            UpdateShipmentInput {
                status: Some(ShipmentStatus::Delivered),
                delivery_photo: Some("photos/shp-1.jpg".to_string()),
                ..UpdateShipmentInput::default()
            },
        )
        .await
        .unwrap();
    assert!(delivered.delivered_at.is_some());
    assert_eq!(delivered.delivery_photo.as_deref(), Some("photos/shp-1.jpg"));

    let listed = shipments.list_for_order(order_id).await.unwrap();
    assert_eq!(listed.len(), 1);

    shipments.delete_shipment(&ctx(), shipment.id).await.unwrap();
    assert!(shipments.list_for_order(order_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_shipment_needs_existing_order() {
    let shipments = ShipmentService::new(MemoryLedger::new());
    let err = shipments
        .create_shipment(&ctx(), shipment_input(Uuid::new_v4(), "SHP-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_shipment_code_rules() {
    let ledger = MemoryLedger::new();
    let order_id = order_id(&ledger).await;
    let shipments = ShipmentService::new(ledger.clone());

    let err = shipments
        .create_shipment(&ctx(), shipment_input(order_id, "   "))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    shipments
        .create_shipment(&ctx(), shipment_input(order_id, "SHP-1"))
        .await
        .unwrap();
    let err = shipments
        .create_shipment(&ctx(), shipment_input(order_id, "SHP-1"))
        .await
        .unwrap_err();
    assert!(err.is_transaction_failure());
}
