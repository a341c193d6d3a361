//! Bulk import reconciler tests
//!
//! Tests for spreadsheet imports including:
//! - Scenario C: an unknown code becomes a placeholder product
//! - Malformed rows are skipped rather than failing the import
//! - Codes repeated across rows collapse into one supply line

mod common;

use common::*;
use serde_json::json;
use uuid::Uuid;

use shared::import::ImportRow;
use shared::{AuditAction, AuditTable, BulkImportInput, AUTO_CREATED_DESCRIPTION};
use store_ops::error::AppError;
use store_ops::services::{ImportService, ProductService, SupplyService};
use store_ops::MemoryLedger;

fn import_input(supplier_id: Uuid) -> BulkImportInput {
    BulkImportInput {
        supplier_id,
        arrival_date: date(),
        arrival_time: time(),
        carrier: None,
        employee_id: None,
    }
}

fn row(cells: &[(&str, &str)]) -> ImportRow {
    cells
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn test_unknown_code_is_created_then_stocked() {
    let ledger = MemoryLedger::new();
    let supplier = Uuid::new_v4();

    let report = ImportService::new(ledger.clone())
        .import_rows(
            &ctx(),
            import_input(supplier),
            vec![row(&[("Code", "Z9"), ("Qty", "16 pcs"), ("Description", "Dish soap")])],
        )
        .await
        .unwrap();

    assert_eq!(report.products_created, 1);
    assert_eq!(report.rows_processed, 1);
    assert_eq!(report.rows_skipped, 0);

    let product = ProductService::new(ledger.clone()).get_product("Z9").await.unwrap();
    assert_eq!(product.stock, 16);
    assert_eq!(product.price, dec("0"));
    assert_eq!(product.name, "Dish soap");
    assert_eq!(product.supplier_id, Some(supplier));
    assert_eq!(product.description.as_deref(), Some(AUTO_CREATED_DESCRIPTION));

    // Newest first: the stock increment, then the creation with zero stock
    let entries = audit_for(&ledger, AuditTable::Products, "Z9").await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].action, AuditAction::Update);
    assert_eq!(entries[0].old_values, Some(json!({"stock": 0})));
    assert_eq!(entries[0].new_values, Some(json!({"stock": 16})));
    assert_eq!(entries[1].action, AuditAction::Create);
    assert_eq!(entries[1].new_values.as_ref().unwrap()["stock"], json!(0));
}

#[tokio::test]
async fn test_malformed_rows_are_skipped() {
    let ledger = MemoryLedger::new();
    seed(&ledger, "A1", 2, "1.00").await;

    let report = ImportService::new(ledger.clone())
        .import_rows(
            &ctx(),
            import_input(Uuid::new_v4()),
            vec![
                row(&[("codigo", "A1"), ("cantidad", "3")]),
                row(&[("codigo", ""), ("cantidad", "3")]),
                row(&[("codigo", "B2")]),
                row(&[("codigo", "C3"), ("cantidad", "none")]),
                row(&[("codigo", "D4"), ("cantidad", "0")]),
            ],
        )
        .await
        .unwrap();

    assert_eq!(report.rows_processed, 1);
    assert_eq!(report.rows_skipped, 4);
    assert_eq!(report.products_created, 0);
    assert_eq!(stock_of(&ledger, "A1").await, 5);
    assert!(ProductService::new(ledger.clone()).get_product("B2").await.is_err());
}

#[tokio::test]
async fn test_repeated_code_merges_into_one_line() {
    let ledger = MemoryLedger::new();
    seed(&ledger, "A1", 0, "1.00").await;

    let report = ImportService::new(ledger.clone())
        .import_rows(
            &ctx(),
            import_input(Uuid::new_v4()),
            vec![
                row(&[("sku", "A1"), ("qty", "4")]),
                row(&[("sku", "A1"), ("qty", "6")]),
            ],
        )
        .await
        .unwrap();

    assert_eq!(report.rows_processed, 2);
    assert_eq!(stock_of(&ledger, "A1").await, 10);

    let intake = SupplyService::new(ledger.clone())
        .get_intake(report.intake_id)
        .await
        .unwrap();
    assert_eq!(intake.lines.len(), 1);
    assert_eq!(intake.lines[0].quantity, 10);

    // One audit entry per product, from the state before the import
    let entries = audit_for(&ledger, AuditTable::Products, "A1").await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].new_values, Some(json!({"stock": 10})));
}

#[tokio::test]
async fn test_csv_upload_is_imported() {
    let ledger = MemoryLedger::new();
    let csv = "Código,Cant,Nombre\nA1,2 cajas,Rice\nB2,5,Beans\n,3,Nothing\n";

    let report = ImportService::new(ledger.clone())
        .import_csv(&ctx(), import_input(Uuid::new_v4()), csv.as_bytes())
        .await
        .unwrap();

    assert_eq!(report.rows_processed, 2);
    assert_eq!(report.rows_skipped, 1);
    assert_eq!(report.products_created, 2);
    assert_eq!(stock_of(&ledger, "A1").await, 2);
    assert_eq!(stock_of(&ledger, "B2").await, 5);
}

#[tokio::test]
async fn test_empty_file_is_a_validation_failure() {
    let err = ImportService::new(MemoryLedger::new())
        .import_csv(&ctx(), import_input(Uuid::new_v4()), b"")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
}
