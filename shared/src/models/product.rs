//! Product and stock models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Description given to products created implicitly by a supply import.
/// Operators search for it to find products whose price still needs setting.
pub const AUTO_CREATED_DESCRIPTION: &str = "[auto-created by supply import] review price";

/// A sellable product. The identifier is assigned externally (usually a barcode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub price: Decimal,
    pub stock: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for saving a product.
///
/// Saving an id that already exists replaces the descriptive fields and
/// *adds* `stock` to the stock on hand.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductInput {
    #[validate(length(min = 1, max = 64, message = "Product code must be 1-64 characters"))]
    pub id: String,
    #[validate(length(min = 1, max = 200, message = "Product name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub supplier_id: Option<Uuid>,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
    pub image_url: Option<String>,
}

/// Input for editing the descriptive fields of a product. Stock is never
/// touched through this path.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProductDetailsInput {
    #[validate(length(min = 1, max = 200, message = "Product name cannot be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
}

/// Signed manual stock correction
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StockAdjustmentInput {
    pub delta: i32,
}

/// Row values written when a product is inserted or upserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub price: Decimal,
    pub stock: i32,
    pub image_url: Option<String>,
}

impl NewProduct {
    /// Placeholder product for a code first seen in a supply import
    pub fn auto_created(id: &str, name: Option<&str>, supplier_id: Uuid) -> Self {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(id);

        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: Some(AUTO_CREATED_DESCRIPTION.to_string()),
            supplier_id: Some(supplier_id),
            price: Decimal::ZERO,
            stock: 0,
            image_url: None,
        }
    }
}

impl From<ProductInput> for NewProduct {
    fn from(input: ProductInput) -> Self {
        Self {
            id: input.id.trim().to_string(),
            name: input.name.trim().to_string(),
            description: input.description,
            supplier_id: input.supplier_id,
            price: crate::totals::round_money(input.price),
            stock: input.stock,
            image_url: input.image_url,
        }
    }
}

impl Product {
    /// Apply a details edit, keeping stock as is
    pub fn with_details(&self, details: &ProductDetailsInput) -> NewProduct {
        NewProduct {
            id: self.id.clone(),
            name: details.name.clone().unwrap_or_else(|| self.name.clone()),
            description: details.description.clone().or_else(|| self.description.clone()),
            supplier_id: details.supplier_id.or(self.supplier_id),
            price: details
                .price
                .map(crate::totals::round_money)
                .unwrap_or(self.price),
            stock: self.stock,
            image_url: details.image_url.clone().or_else(|| self.image_url.clone()),
        }
    }
}
