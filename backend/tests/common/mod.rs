//! Shared fixtures for the ledger integration tests
#![allow(dead_code)]

use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::{
    AuditEntry, AuditQuery, AuditTable, CreateOrderInput, CreateSupplyIntakeInput, NewProduct,
    OrderLineInput, Product, SupplyLineInput,
};
use store_ops::services::{AuditRecorder, RequestContext};
use store_ops::MemoryLedger;

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

pub fn time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 30, 0).unwrap()
}

pub fn ctx() -> RequestContext {
    RequestContext {
        actor_id: Some(Uuid::new_v4()),
        source_ip: Some("192.0.2.10".to_string()),
        client_timestamp: None,
    }
}

pub async fn seed(ledger: &MemoryLedger, id: &str, stock: i32, price: &str) -> Product {
    ledger
        .seed_product(NewProduct {
            id: id.to_string(),
            name: format!("Product {}", id),
            description: None,
            supplier_id: None,
            price: dec(price),
            stock,
            image_url: None,
        })
        .await
}

pub fn line(product_id: &str, quantity: i32, unit_price: &str) -> OrderLineInput {
    OrderLineInput {
        product_id: product_id.to_string(),
        quantity,
        unit_price: Some(dec(unit_price)),
    }
}

pub fn order_input(lines: Vec<OrderLineInput>) -> CreateOrderInput {
    CreateOrderInput {
        order_date: date(),
        order_time: time(),
        status: None,
        client_id: None,
        employee_id: None,
        discount: None,
        tax: None,
        lines,
    }
}

pub fn intake_input(supplier_id: Uuid, lines: &[(&str, i32)]) -> CreateSupplyIntakeInput {
    CreateSupplyIntakeInput {
        arrival_date: date(),
        arrival_time: time(),
        supplier_id,
        carrier: Some("Fast Freight".to_string()),
        employee_id: None,
        lines: lines
            .iter()
            .map(|(product_id, quantity)| SupplyLineInput {
                product_id: product_id.to_string(),
                quantity: *quantity,
            })
            .collect(),
    }
}

/// Audit entries for one record, newest first
pub async fn audit_for(ledger: &MemoryLedger, table: AuditTable, record_id: &str) -> Vec<AuditEntry> {
    AuditRecorder::new(ledger.clone())
        .list(&AuditQuery {
            table_name: Some(table.as_str().to_string()),
            record_id: Some(record_id.to_string()),
            ..AuditQuery::default()
        })
        .await
        .unwrap()
}

pub async fn stock_of(ledger: &MemoryLedger, id: &str) -> i32 {
    store_ops::services::ProductService::new(ledger.clone())
        .get_product(id)
        .await
        .unwrap()
        .stock
}
