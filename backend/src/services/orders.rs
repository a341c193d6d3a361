//! Order transaction orchestrator
//!
//! Every mutation runs in one ledger transaction and ends by recomputing the
//! order totals from the persisted lines, inside that same transaction.

use uuid::Uuid;
use validator::Validate;

use shared::{
    find_duplicate_code, line_subtotal, validate_money, validate_positive_quantity, AuditTable,
    CreateOrderInput, Order, OrderLine, OrderLineInput, OrderTotals, OrderWithLines, Pagination,
    UpdateOrderInput,
};

use super::audit::{AuditEvent, AuditRecorder, RequestContext};
use crate::error::{AppError, AppResult};
use crate::ledger::{LedgerStore, LedgerTx};

fn order_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Order {}", id))
}

/// Sum the persisted line subtotals and write the four monetary fields back
pub async fn recompute_order_totals<T: LedgerTx>(
    tx: &mut T,
    order_id: Uuid,
    discount: rust_decimal::Decimal,
    tax: rust_decimal::Decimal,
) -> AppResult<Order> {
    let subtotal = tx.sum_line_subtotals(order_id).await?;
    let totals = OrderTotals::from_subtotal(subtotal, discount, tax)
        .map_err(|e| AppError::validation("total", e.to_string()))?;
    tx.write_order_totals(order_id, &totals).await
}

/// Reject a line set before any transaction opens
fn validate_lines(lines: &[OrderLineInput]) -> AppResult<()> {
    for line in lines {
        line.validate()?;
        validate_positive_quantity(line.quantity)
            .map_err(|m| AppError::InvalidQuantity(format!("{}: {}", line.product_id, m)))?;
        if let Some(price) = line.unit_price {
            validate_money(price).map_err(|m| AppError::validation("unit_price", m))?;
        }
        line_subtotal(Some(line.quantity), line.unit_price).map_err(|_| {
            AppError::validation(
                "unit_price",
                format!("{}: line subtotal exceeds the largest storable amount", line.product_id),
            )
        })?;
    }

    if let Some(code) = find_duplicate_code(lines.iter().map(|l| l.product_id.as_str())) {
        return Err(AppError::validation(
            "lines",
            format!("Product {} appears on more than one line", code.trim()),
        ));
    }

    Ok(())
}

fn validate_adjustments(
    discount: Option<rust_decimal::Decimal>,
    tax: Option<rust_decimal::Decimal>,
) -> AppResult<()> {
    if let Some(discount) = discount {
        validate_money(discount).map_err(|m| AppError::validation("discount", m))?;
    }
    if let Some(tax) = tax {
        validate_money(tax).map_err(|m| AppError::validation("tax", m))?;
    }
    Ok(())
}

/// Sales orders and their lines
#[derive(Clone)]
pub struct OrderService<S> {
    ledger: S,
    audit: AuditRecorder<S>,
}

impl<S: LedgerStore> OrderService<S> {
    pub fn new(ledger: S) -> Self {
        Self {
            audit: AuditRecorder::new(ledger.clone()),
            ledger,
        }
    }

    /// Insert the header, its lines and the derived totals as one unit
    pub async fn create_order(
        &self,
        ctx: &RequestContext,
        input: CreateOrderInput,
    ) -> AppResult<OrderWithLines> {
        input.validate()?;
        validate_adjustments(input.discount, input.tax)?;
        if input.lines.is_empty() {
            return Err(AppError::validation("lines", "An order needs at least one line"));
        }
        validate_lines(&input.lines)?;

        let header = input.header();

        let mut tx = self.ledger.begin().await?;
        let order = tx.insert_order(&header).await?;
        let lines = input
            .lines
            .iter()
            .map(|l| l.to_line(order.id))
            .collect::<Result<Vec<OrderLine>, _>>()?;
        tx.insert_order_lines(&lines).await?;
        let order = recompute_order_totals(&mut tx, order.id, header.discount, header.tax).await?;
        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            lines = lines.len(),
            total = %order.total,
            "order created"
        );
        self.audit
            .record(ctx, vec![AuditEvent::created(AuditTable::Orders, order.id, &order)])
            .await;

        Ok(OrderWithLines { order, lines })
    }

    /// Update header fields; a supplied line set replaces the existing one
    pub async fn update_order(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        input: UpdateOrderInput,
    ) -> AppResult<OrderWithLines> {
        input.validate()?;
        validate_adjustments(input.discount, input.tax)?;
        if let Some(lines) = &input.lines {
            validate_lines(lines)?;
        }

        let mut tx = self.ledger.begin().await?;
        let before = tx.find_order(id).await?.ok_or_else(|| order_not_found(id))?;
        let header = input.apply_to(&before);

        if !tx.update_order_header(id, &header).await? {
            return Err(order_not_found(id));
        }

        if let Some(lines) = &input.lines {
            let replaced = tx.delete_order_lines(id).await?;
            let lines = lines
                .iter()
                .map(|l| l.to_line(id))
                .collect::<Result<Vec<OrderLine>, _>>()?;
            tx.insert_order_lines(&lines).await?;
            tracing::debug!(order_id = %id, replaced, inserted = lines.len(), "order lines replaced");
        }

        let order = recompute_order_totals(&mut tx, id, header.discount, header.tax).await?;
        let lines = tx.order_lines(id).await?;
        tx.commit().await?;

        tracing::info!(order_id = %id, total = %order.total, "order updated");
        self.audit
            .record(ctx, vec![AuditEvent::updated(AuditTable::Orders, id, &before, &order)])
            .await;

        Ok(OrderWithLines { order, lines })
    }

    /// Delete the order with its lines and every shipment referencing it
    pub async fn delete_order(&self, ctx: &RequestContext, id: Uuid) -> AppResult<()> {
        let mut tx = self.ledger.begin().await?;
        let order = tx.find_order(id).await?.ok_or_else(|| order_not_found(id))?;

        tx.delete_order_lines(id).await?;

        let shipments = tx.shipments_for_order(id).await?;
        for shipment in &shipments {
            tx.delete_shipment(shipment.id).await?;
        }

        if !tx.delete_order(id).await? {
            return Err(order_not_found(id));
        }
        tx.commit().await?;

        tracing::info!(order_id = %id, shipments = shipments.len(), "order deleted");

        let mut events: Vec<AuditEvent> = shipments
            .iter()
            .map(|s| AuditEvent::deleted(AuditTable::Shipments, s.id, s))
            .collect();
        events.push(AuditEvent::deleted(AuditTable::Orders, id, &order));
        self.audit.record(ctx, events).await;

        Ok(())
    }

    pub async fn get_order(&self, id: Uuid) -> AppResult<OrderWithLines> {
        let mut tx = self.ledger.begin().await?;
        let order = tx.find_order(id).await?.ok_or_else(|| order_not_found(id))?;
        let lines = tx.order_lines(id).await?;
        tx.rollback().await?;
        Ok(OrderWithLines { order, lines })
    }

    pub async fn list_orders(&self, page: &Pagination) -> AppResult<Vec<Order>> {
        let mut tx = self.ledger.begin().await?;
        let orders = tx.list_orders(page).await?;
        tx.rollback().await?;
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn line(product_id: &str, quantity: i32) -> OrderLineInput {
        OrderLineInput {
            product_id: product_id.to_string(),
            quantity,
            unit_price: Some(Decimal::new(100, 2)),
        }
    }

    #[test]
    fn test_validate_lines_rejects_duplicates() {
        let err = validate_lines(&[line("X", 1), line("X", 2)]).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_validate_lines_rejects_non_positive_quantity() {
        let err = validate_lines(&[line("X", 0)]).unwrap_err();
        assert!(matches!(err, AppError::InvalidQuantity(_)));
    }

    #[test]
    fn test_validate_lines_rejects_empty_set() {
        assert!(validate_lines(&[]).is_err());
        assert!(validate_lines(&[line("X", 1), line("Y", 3)]).is_ok());
    }
}
