//! Supply transaction orchestrator
//!
//! A manual intake inserts its header, then for each line the line row and the
//! matching stock increment, all in one transaction. Deleting an intake only
//! removes the records: stock that arrived with it stays on hand.

use uuid::Uuid;
use validator::Validate;

use shared::{
    find_duplicate_code, validate_positive_quantity, AuditTable, CreateSupplyIntakeInput,
    Pagination, SupplyIntake, SupplyIntakeWithLines, SupplyLine, UpdateSupplyLineInput,
};

use super::audit::{AuditEvent, AuditRecorder, RequestContext};
use super::inventory::{self, StockChanges};
use crate::error::{AppError, AppResult};
use crate::ledger::{LedgerStore, LedgerTx};

fn intake_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Supply intake {}", id))
}

fn line_not_found(intake_id: Uuid, product_id: &str) -> AppError {
    AppError::NotFound(format!("Supply line {}/{}", intake_id, product_id))
}

/// Goods receipts from suppliers
#[derive(Clone)]
pub struct SupplyService<S> {
    ledger: S,
    audit: AuditRecorder<S>,
}

impl<S: LedgerStore> SupplyService<S> {
    pub fn new(ledger: S) -> Self {
        Self {
            audit: AuditRecorder::new(ledger.clone()),
            ledger,
        }
    }

    /// Record a manual intake and raise stock for each line
    pub async fn create_intake(
        &self,
        ctx: &RequestContext,
        input: CreateSupplyIntakeInput,
    ) -> AppResult<SupplyIntakeWithLines> {
        input.validate()?;
        if input.lines.is_empty() {
            return Err(AppError::validation("lines", "An intake needs at least one line"));
        }
        for line in &input.lines {
            line.validate()?;
            validate_positive_quantity(line.quantity)
                .map_err(|m| AppError::InvalidQuantity(format!("{}: {}", line.product_id, m)))?;
        }
        if let Some(code) = find_duplicate_code(input.lines.iter().map(|l| l.product_id.as_str())) {
            return Err(AppError::validation(
                "lines",
                format!("Product {} appears on more than one line", code.trim()),
            ));
        }

        let mut tx = self.ledger.begin().await?;
        let intake = tx.insert_supply_intake(&input.header()).await?;

        let mut changes = StockChanges::new();
        let mut lines = Vec::with_capacity(input.lines.len());
        for requested in &input.lines {
            let line = SupplyLine {
                intake_id: intake.id,
                product_id: requested.product_id.trim().to_string(),
                quantity: requested.quantity,
            };

            let product = tx
                .find_product(&line.product_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Product {}", line.product_id)))?;
            changes.touch(&product);
            tx.insert_supply_line(&line).await?;
            inventory::increment(&mut tx, &line.product_id, line.quantity).await?;
            lines.push(line);
        }

        let mut events = vec![AuditEvent::created(AuditTable::SupplyIntakes, intake.id, &intake)];
        events.extend(changes.into_events(&mut tx).await?);
        tx.commit().await?;

        tracing::info!(intake_id = %intake.id, lines = lines.len(), "supply intake recorded");
        self.audit.record(ctx, events).await;

        Ok(SupplyIntakeWithLines { intake, lines })
    }

    /// Remove an intake and its lines. Stock is not reversed.
    pub async fn delete_intake(&self, ctx: &RequestContext, id: Uuid) -> AppResult<()> {
        let mut tx = self.ledger.begin().await?;
        let intake = tx.find_supply_intake(id).await?.ok_or_else(|| intake_not_found(id))?;
        if !tx.delete_supply_intake(id).await? {
            return Err(intake_not_found(id));
        }
        tx.commit().await?;

        tracing::info!(intake_id = %id, "supply intake deleted, stock left as is");
        self.audit
            .record(ctx, vec![AuditEvent::deleted(AuditTable::SupplyIntakes, id, &intake)])
            .await;

        Ok(())
    }

    /// Correct the quantity received on one line, moving stock by the difference
    pub async fn update_line(
        &self,
        ctx: &RequestContext,
        intake_id: Uuid,
        product_id: &str,
        input: UpdateSupplyLineInput,
    ) -> AppResult<SupplyLine> {
        validate_positive_quantity(input.quantity)
            .map_err(|m| AppError::InvalidQuantity(m.to_string()))?;

        let mut tx = self.ledger.begin().await?;
        let current = tx
            .find_supply_line(intake_id, product_id)
            .await?
            .ok_or_else(|| line_not_found(intake_id, product_id))?;

        let mut changes = StockChanges::new();
        if let Some(product) = tx.find_product(product_id).await? {
            changes.touch(&product);
        }

        let delta = input.quantity - current.quantity;
        if delta > 0 {
            inventory::increment(&mut tx, product_id, delta).await?;
        } else if delta < 0 {
            inventory::decrement(&mut tx, product_id, -delta).await?;
        }

        let line = SupplyLine {
            quantity: input.quantity,
            ..current
        };
        if !tx.update_supply_line(&line).await? {
            return Err(line_not_found(intake_id, product_id));
        }

        let events = changes.into_events(&mut tx).await?;
        tx.commit().await?;

        tracing::info!(%intake_id, product_id, delta, "supply line corrected");
        self.audit.record(ctx, events).await;

        Ok(line)
    }

    /// Remove one line and take its quantity back out of stock
    pub async fn delete_line(
        &self,
        ctx: &RequestContext,
        intake_id: Uuid,
        product_id: &str,
    ) -> AppResult<()> {
        let mut tx = self.ledger.begin().await?;
        let line = tx
            .find_supply_line(intake_id, product_id)
            .await?
            .ok_or_else(|| line_not_found(intake_id, product_id))?;

        let mut changes = StockChanges::new();
        if let Some(product) = tx.find_product(product_id).await? {
            changes.touch(&product);
        }

        inventory::decrement(&mut tx, product_id, line.quantity).await?;
        if !tx.delete_supply_line(intake_id, product_id).await? {
            return Err(line_not_found(intake_id, product_id));
        }

        let events = changes.into_events(&mut tx).await?;
        tx.commit().await?;

        tracing::info!(%intake_id, product_id, quantity = line.quantity, "supply line removed");
        self.audit.record(ctx, events).await;

        Ok(())
    }

    pub async fn get_intake(&self, id: Uuid) -> AppResult<SupplyIntakeWithLines> {
        let mut tx = self.ledger.begin().await?;
        let intake = tx.find_supply_intake(id).await?.ok_or_else(|| intake_not_found(id))?;
        let lines = tx.supply_lines(id).await?;
        tx.rollback().await?;
        Ok(SupplyIntakeWithLines { intake, lines })
    }

    pub async fn list_intakes(&self, page: &Pagination) -> AppResult<Vec<SupplyIntake>> {
        let mut tx = self.ledger.begin().await?;
        let intakes = tx.list_supply_intakes(page).await?;
        tx.rollback().await?;
        Ok(intakes)
    }
}
