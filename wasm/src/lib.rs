//! WebAssembly module for the store operations admin panel
//!
//! Provides client-side previews that must agree with the server:
//! - Line subtotals and order totals (same half-up rounding)
//! - Import quantity parsing

use rust_decimal::Decimal;
use std::str::FromStr;
use wasm_bindgen::prelude::*;

use shared::import::parse_quantity;
use shared::totals::{line_subtotal, OrderTotals};

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, JsValue> {
    Decimal::from_str(value.trim())
        .map_err(|e| JsValue::from_str(&format!("Invalid {}: {}", field, e)))
}

/// Subtotal of a line as a string with two decimals, or `undefined` when the
/// unit price is blank (line not yet priced)
#[wasm_bindgen]
pub fn preview_line_subtotal(quantity: i32, unit_price: &str) -> Result<Option<String>, JsValue> {
    if unit_price.trim().is_empty() {
        return Ok(None);
    }
    let price = parse_decimal("unit price", unit_price)?;
    line_subtotal(Some(quantity), Some(price))
        .map(|s| s.map(|s| s.to_string()))
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

#[derive(serde::Deserialize)]
struct PreviewLine {
    quantity: i32,
    unit_price: Option<Decimal>,
}

/// Order totals for a JSON array of `{quantity, unit_price}` lines
#[wasm_bindgen]
pub fn preview_order_totals(lines_json: &str, discount: &str, tax: &str) -> Result<String, JsValue> {
    let lines: Vec<PreviewLine> = serde_json::from_str(lines_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid lines JSON: {}", e)))?;
    let discount = parse_decimal("discount", discount)?;
    let tax = parse_decimal("tax", tax)?;

    let subtotals = lines
        .iter()
        .map(|l| line_subtotal(Some(l.quantity), l.unit_price))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let totals = OrderTotals::compute(subtotals, discount, tax)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    serde_json::to_string(&totals).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Quantity an import cell will be read as; 0 means the row will be skipped
#[wasm_bindgen]
pub fn preview_import_quantity(cell: &str) -> i32 {
    parse_quantity(cell).unwrap_or(0)
}
