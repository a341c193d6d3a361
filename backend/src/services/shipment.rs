//! Shipment service

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use shared::{AuditTable, CreateShipmentInput, Shipment, UpdateShipmentInput};

use super::audit::{AuditEvent, AuditRecorder, RequestContext};
use crate::error::{AppError, AppResult};
use crate::ledger::{LedgerStore, LedgerTx};

fn shipment_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Shipment {}", id))
}

/// Shipments of orders
#[derive(Clone)]
pub struct ShipmentService<S> {
    ledger: S,
    audit: AuditRecorder<S>,
}

impl<S: LedgerStore> ShipmentService<S> {
    pub fn new(ledger: S) -> Self {
        Self {
            audit: AuditRecorder::new(ledger.clone()),
            ledger,
        }
    }

    pub async fn create_shipment(
        &self,
        ctx: &RequestContext,
        input: CreateShipmentInput,
    ) -> AppResult<Shipment> {
        input.validate()?;
        if input.code.trim().is_empty() {
            return Err(AppError::validation("code", "Shipment code is required"));
        }

        let mut tx = self.ledger.begin().await?;
        if tx.find_order(input.order_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Order {}", input.order_id)));
        }
        let shipment = tx.insert_shipment(&input).await?;
        tx.commit().await?;

        tracing::info!(shipment_id = %shipment.id, order_id = %shipment.order_id, "shipment created");
        self.audit
            .record(ctx, vec![AuditEvent::created(AuditTable::Shipments, shipment.id, &shipment)])
            .await;

        Ok(shipment)
    }

    pub async fn update_shipment(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        input: UpdateShipmentInput,
    ) -> AppResult<Shipment> {
        let mut tx = self.ledger.begin().await?;
        let before = tx.find_shipment(id).await?.ok_or_else(|| shipment_not_found(id))?;
        let updated = tx.update_shipment(&before.updated(&input, Utc::now())).await?;
        tx.commit().await?;

        tracing::info!(shipment_id = %id, status = %updated.status, "shipment updated");
        self.audit
            .record(ctx, vec![AuditEvent::updated(AuditTable::Shipments, id, &before, &updated)])
            .await;

        Ok(updated)
    }

    pub async fn delete_shipment(&self, ctx: &RequestContext, id: Uuid) -> AppResult<()> {
        let mut tx = self.ledger.begin().await?;
        let shipment = tx.find_shipment(id).await?.ok_or_else(|| shipment_not_found(id))?;
        if !tx.delete_shipment(id).await? {
            return Err(shipment_not_found(id));
        }
        tx.commit().await?;

        tracing::info!(shipment_id = %id, "shipment deleted");
        self.audit
            .record(ctx, vec![AuditEvent::deleted(AuditTable::Shipments, id, &shipment)])
            .await;

        Ok(())
    }

    pub async fn get_shipment(&self, id: Uuid) -> AppResult<Shipment> {
        let mut tx = self.ledger.begin().await?;
        let shipment = tx.find_shipment(id).await?;
        tx.rollback().await?;
        shipment.ok_or_else(|| shipment_not_found(id))
    }

    pub async fn list_for_order(&self, order_id: Uuid) -> AppResult<Vec<Shipment>> {
        let mut tx = self.ledger.begin().await?;
        if tx.find_order(order_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Order {}", order_id)));
        }
        let shipments = tx.shipments_for_order(order_id).await?;
        tx.rollback().await?;
        Ok(shipments)
    }
}
