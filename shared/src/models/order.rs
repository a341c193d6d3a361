//! Sales order models

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::totals::{line_subtotal, round_money, MoneyOverflow};

/// Status given to orders created without one
pub const DEFAULT_ORDER_STATUS: &str = "pending";

/// Order header. `subtotal` and `total` are always derived from the lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: Uuid,
    pub order_date: NaiveDate,
    pub order_time: NaiveTime,
    pub status: String,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub client_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product line within an order, keyed by (order_id, product_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderLine {
    pub order_id: Uuid,
    pub product_id: String,
    pub quantity: i32,
    /// Price snapshot at the time of sale. `None` means not yet priced.
    pub unit_price: Option<Decimal>,
    pub subtotal: Option<Decimal>,
}

/// Order header together with its lines
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithLines {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// Scalar header fields written by create and update. Monetary totals are
/// not part of it: they are recomputed from the persisted lines.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderHeader {
    pub order_date: NaiveDate,
    pub order_time: NaiveTime,
    pub status: String,
    pub client_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub discount: Decimal,
    pub tax: Decimal,
}

/// A requested order line
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OrderLineInput {
    #[validate(length(min = 1, max = 64, message = "Product code is required"))]
    pub product_id: String,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
}

impl OrderLineInput {
    /// Build the persisted line with its subtotal computed. The unit price
    /// is kept as given; only the subtotal is rounded.
    pub fn to_line(&self, order_id: Uuid) -> Result<OrderLine, MoneyOverflow> {
        Ok(OrderLine {
            order_id,
            product_id: self.product_id.trim().to_string(),
            quantity: self.quantity,
            unit_price: self.unit_price,
            subtotal: line_subtotal(Some(self.quantity), self.unit_price)?,
        })
    }
}

/// Input for creating an order
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderInput {
    pub order_date: NaiveDate,
    pub order_time: NaiveTime,
    #[validate(length(max = 50, message = "Status is too long"))]
    pub status: Option<String>,
    pub client_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub discount: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub lines: Vec<OrderLineInput>,
}

impl CreateOrderInput {
    pub fn header(&self) -> OrderHeader {
        OrderHeader {
            order_date: self.order_date,
            order_time: self.order_time,
            status: self
                .status
                .clone()
                .unwrap_or_else(|| DEFAULT_ORDER_STATUS.to_string()),
            client_id: self.client_id,
            employee_id: self.employee_id,
            discount: round_money(self.discount.unwrap_or(Decimal::ZERO)),
            tax: round_money(self.tax.unwrap_or(Decimal::ZERO)),
        }
    }
}

/// Input for updating an order. Omitted `lines` keeps the existing lines;
/// a present `lines` replaces them wholesale.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateOrderInput {
    pub order_date: Option<NaiveDate>,
    pub order_time: Option<NaiveTime>,
    #[validate(length(max = 50, message = "Status is too long"))]
    pub status: Option<String>,
    pub client_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub discount: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub lines: Option<Vec<OrderLineInput>>,
}

impl UpdateOrderInput {
    /// Merge the requested changes onto the current header
    pub fn apply_to(&self, current: &Order) -> OrderHeader {
        OrderHeader {
            order_date: self.order_date.unwrap_or(current.order_date),
            order_time: self.order_time.unwrap_or(current.order_time),
            status: self.status.clone().unwrap_or_else(|| current.status.clone()),
            client_id: self.client_id.or(current.client_id),
            employee_id: self.employee_id.or(current.employee_id),
            discount: self.discount.map(round_money).unwrap_or(current.discount),
            tax: self.tax.map(round_money).unwrap_or(current.tax),
        }
    }
}
