//! Inventory adjuster and product service
//!
//! Stock only ever moves through [`increment`] and [`decrement`], both of
//! which run as a single atomic statement inside the caller's transaction.

use std::collections::BTreeMap;

use uuid::Uuid;
use validator::Validate;

use shared::{
    validate_money, validate_product_code, AuditTable, NewProduct, Pagination, Product,
    ProductDetailsInput, ProductInput, StockAdjustmentInput,
};

use super::audit::{AuditEvent, AuditRecorder, RequestContext};
use crate::error::{AppError, AppResult};
use crate::ledger::{LedgerStore, LedgerTx};

fn product_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Product {}", id))
}

/// Add `by` units to a product's stock. Returns the new stock.
pub async fn increment<T: LedgerTx>(tx: &mut T, product_id: &str, by: i32) -> AppResult<i32> {
    if by <= 0 {
        return Err(AppError::InvalidQuantity(format!(
            "Increment must be positive, got {}",
            by
        )));
    }

    tx.increment_stock(product_id, by)
        .await?
        .ok_or_else(|| product_not_found(product_id))
}

/// Remove `by` units from a product's stock. Returns the new stock.
///
/// Fails with `NotFound` for an unknown product and with `InvalidQuantity`
/// when the stock on hand cannot cover it; stock is unchanged in both cases.
pub async fn decrement<T: LedgerTx>(tx: &mut T, product_id: &str, by: i32) -> AppResult<i32> {
    if by <= 0 {
        return Err(AppError::InvalidQuantity(format!(
            "Decrement must be positive, got {}",
            by
        )));
    }

    if let Some(stock) = tx.decrement_stock(product_id, by).await? {
        return Ok(stock);
    }

    match tx.find_product(product_id).await? {
        None => Err(product_not_found(product_id)),
        Some(product) => Err(AppError::InvalidQuantity(format!(
            "Product {} has {} in stock, cannot remove {}",
            product_id, product.stock, by
        ))),
    }
}

/// Look a product up, creating a zero-priced placeholder when it is unknown.
///
/// The flag is `true` when the product was created by this call.
pub async fn resolve_or_create<T: LedgerTx>(
    tx: &mut T,
    product_id: &str,
    fallback_name: Option<&str>,
    supplier_id: Uuid,
) -> AppResult<(Product, bool)> {
    if let Some(product) = tx.find_product(product_id).await? {
        return Ok((product, false));
    }

    let created = tx
        .insert_product(&NewProduct::auto_created(product_id, fallback_name, supplier_id))
        .await?;
    tracing::debug!(product_id = %created.id, "auto-created product");
    Ok((created, true))
}

/// Remembers the state of each product before a transaction first touched its
/// stock, so the audit trail gets one entry per product.
#[derive(Debug, Default)]
pub struct StockChanges {
    before: BTreeMap<String, Product>,
}

impl StockChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the prior state; later calls for the same product are ignored
    pub fn touch(&mut self, product: &Product) {
        self.before
            .entry(product.id.clone())
            .or_insert_with(|| product.clone());
    }

    /// Update events for every touched product, read back from the transaction
    pub async fn into_events<T: LedgerTx>(self, tx: &mut T) -> AppResult<Vec<AuditEvent>> {
        let mut events = Vec::with_capacity(self.before.len());
        for (id, before) in self.before {
            let after = tx
                .find_product(&id)
                .await?
                .ok_or_else(|| product_not_found(&id))?;
            events.push(AuditEvent::updated(AuditTable::Products, &id, &before, &after));
        }
        Ok(events)
    }
}

/// Product catalogue and manual stock corrections
#[derive(Clone)]
pub struct ProductService<S> {
    ledger: S,
    audit: AuditRecorder<S>,
}

impl<S: LedgerStore> ProductService<S> {
    pub fn new(ledger: S) -> Self {
        Self {
            audit: AuditRecorder::new(ledger.clone()),
            ledger,
        }
    }

    /// Save a product. An existing id keeps its stock and adds the incoming
    /// stock to it; the descriptive fields are replaced.
    pub async fn save_product(&self, ctx: &RequestContext, input: ProductInput) -> AppResult<Product> {
        input.validate()?;
        validate_product_code(&input.id).map_err(|m| AppError::validation("id", m))?;
        validate_money(input.price).map_err(|m| AppError::validation("price", m))?;
        if input.stock < 0 {
            return Err(AppError::InvalidQuantity("Stock cannot be negative".to_string()));
        }

        let new_product = NewProduct::from(input);

        let mut tx = self.ledger.begin().await?;
        let before = tx.find_product(&new_product.id).await?;
        let saved = tx.upsert_product_additive(&new_product).await?;
        tx.commit().await?;

        tracing::info!(product_id = %saved.id, stock = saved.stock, "product saved");

        let event = match &before {
            Some(before) => AuditEvent::updated(AuditTable::Products, &saved.id, before, &saved),
            None => AuditEvent::created(AuditTable::Products, &saved.id, &saved),
        };
        self.audit.record(ctx, vec![event]).await;

        Ok(saved)
    }

    /// Edit descriptive fields. Stock is never touched here.
    pub async fn update_product(
        &self,
        ctx: &RequestContext,
        id: &str,
        input: ProductDetailsInput,
    ) -> AppResult<Product> {
        input.validate()?;
        if let Some(price) = input.price {
            validate_money(price).map_err(|m| AppError::validation("price", m))?;
        }

        let mut tx = self.ledger.begin().await?;
        let before = tx.find_product(id).await?.ok_or_else(|| product_not_found(id))?;
        let updated = tx
            .update_product_details(&before.with_details(&input))
            .await?
            .ok_or_else(|| product_not_found(id))?;
        tx.commit().await?;

        tracing::info!(product_id = %id, "product updated");
        self.audit
            .record(ctx, vec![AuditEvent::updated(AuditTable::Products, id, &before, &updated)])
            .await;

        Ok(updated)
    }

    /// Signed manual stock correction
    pub async fn adjust_stock(
        &self,
        ctx: &RequestContext,
        id: &str,
        input: StockAdjustmentInput,
    ) -> AppResult<Product> {
        if input.delta == 0 {
            return Err(AppError::InvalidQuantity(
                "Adjustment cannot be zero".to_string(),
            ));
        }

        let mut tx = self.ledger.begin().await?;
        let before = tx.find_product(id).await?.ok_or_else(|| product_not_found(id))?;
        if input.delta > 0 {
            increment(&mut tx, id, input.delta).await?;
        } else {
            let by = input.delta.checked_neg().ok_or_else(|| {
                AppError::InvalidQuantity("Adjustment is out of range".to_string())
            })?;
            decrement(&mut tx, id, by).await?;
        }
        let after = tx.find_product(id).await?.ok_or_else(|| product_not_found(id))?;
        tx.commit().await?;

        tracing::info!(product_id = %id, delta = input.delta, stock = after.stock, "stock adjusted");
        self.audit
            .record(ctx, vec![AuditEvent::updated(AuditTable::Products, id, &before, &after)])
            .await;

        Ok(after)
    }

    pub async fn delete_product(&self, ctx: &RequestContext, id: &str) -> AppResult<()> {
        let mut tx = self.ledger.begin().await?;
        let deleted = tx.delete_product(id).await?.ok_or_else(|| product_not_found(id))?;
        tx.commit().await?;

        tracing::info!(product_id = %id, "product deleted");
        self.audit
            .record(ctx, vec![AuditEvent::deleted(AuditTable::Products, id, &deleted)])
            .await;

        Ok(())
    }

    pub async fn get_product(&self, id: &str) -> AppResult<Product> {
        let mut tx = self.ledger.begin().await?;
        let product = tx.find_product(id).await?;
        tx.rollback().await?;
        product.ok_or_else(|| product_not_found(id))
    }

    pub async fn list_products(&self, page: &Pagination) -> AppResult<Vec<Product>> {
        let mut tx = self.ledger.begin().await?;
        let products = tx.list_products(page).await?;
        tx.rollback().await?;
        Ok(products)
    }
}
