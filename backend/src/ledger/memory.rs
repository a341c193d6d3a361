//! In-process ledger store
//!
//! A transaction holds the store lock from `begin` until it is committed or
//! dropped, and works on a private copy of the tables. Commit swaps the copy
//! in; anything else discards it. Transactions are therefore serialized,
//! which is at least as strict as the isolation the PostgreSQL store gives.
//!
//! The constraints the orchestrators depend on are enforced here the way the
//! schema enforces them: composite line keys, unique shipment codes, the
//! `stock >= 0` check and intake line cascade.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use shared::{
    AuditEntry, AuditQuery, CreateShipmentInput, NewAuditEntry, NewProduct, NewSupplyIntake,
    Order, OrderHeader, OrderLine, OrderTotals, Pagination, Product, Shipment, ShipmentStatus,
    SupplyIntake, SupplyLine,
};

use super::{LedgerStore, LedgerTx};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default)]
struct Tables {
    products: BTreeMap<String, Product>,
    orders: BTreeMap<Uuid, Order>,
    order_lines: BTreeMap<(Uuid, String), OrderLine>,
    shipments: BTreeMap<Uuid, Shipment>,
    intakes: BTreeMap<Uuid, SupplyIntake>,
    supply_lines: BTreeMap<(Uuid, String), SupplyLine>,
    audit_log: Vec<AuditEntry>,
}

/// Ledger kept in process memory
#[derive(Clone, Default)]
pub struct MemoryLedger {
    tables: Arc<Mutex<Tables>>,
    fail_audit_writes: Arc<AtomicBool>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every audit insert fail until switched off again
    pub fn fail_audit_writes(&self, fail: bool) {
        self.fail_audit_writes.store(fail, Ordering::SeqCst);
    }

    /// Insert a product directly, bypassing services and the audit trail
    pub async fn seed_product(&self, product: NewProduct) -> Product {
        let mut tables = self.tables.lock().await;
        let row = new_product_row(&product);
        tables.products.insert(row.id.clone(), row.clone());
        row
    }

    /// Number of order lines across all orders
    pub async fn order_line_count(&self) -> usize {
        self.tables.lock().await.order_lines.len()
    }

    /// Number of audit entries written so far
    pub async fn audit_count(&self) -> usize {
        self.tables.lock().await.audit_log.len()
    }
}

/// An open in-memory transaction
pub struct MemoryLedgerTx {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
    fail_audit_writes: bool,
}

fn new_product_row(product: &NewProduct) -> Product {
    let now = Utc::now();
    Product {
        id: product.id.clone(),
        name: product.name.clone(),
        description: product.description.clone(),
        supplier_id: product.supplier_id,
        price: shared::round_money(product.price),
        stock: product.stock,
        image_url: product.image_url.clone(),
        created_at: now,
        updated_at: now,
    }
}

fn constraint(message: &str) -> AppError {
    AppError::TransactionFailure(message.to_string())
}

fn page<T: Clone>(rows: impl Iterator<Item = T>, page: &Pagination) -> Vec<T> {
    rows.skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect()
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    type Tx = MemoryLedgerTx;

    async fn begin(&self) -> AppResult<MemoryLedgerTx> {
        let guard = self.tables.clone().lock_owned().await;
        let work = guard.clone();
        Ok(MemoryLedgerTx {
            guard,
            work,
            fail_audit_writes: self.fail_audit_writes.load(Ordering::SeqCst),
        })
    }
}

#[async_trait]
impl LedgerTx for MemoryLedgerTx {
    async fn commit(self) -> AppResult<()> {
        let MemoryLedgerTx { mut guard, work, .. } = self;
        *guard = work;
        Ok(())
    }

    async fn rollback(self) -> AppResult<()> {
        Ok(())
    }

    async fn find_product(&mut self, id: &str) -> AppResult<Option<Product>> {
        Ok(self.work.products.get(id).cloned())
    }

    async fn list_products(&mut self, pagination: &Pagination) -> AppResult<Vec<Product>> {
        let mut products: Vec<Product> = self.work.products.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(page(products.into_iter(), pagination))
    }

    async fn insert_product(&mut self, product: &NewProduct) -> AppResult<Product> {
        if self.work.products.contains_key(&product.id) {
            return Err(constraint("duplicate key value violates products_pkey"));
        }
        if product.stock < 0 {
            return Err(constraint("products_stock_non_negative"));
        }
        let row = new_product_row(product);
        self.work.products.insert(row.id.clone(), row.clone());
        Ok(row)
    }

    async fn upsert_product_additive(&mut self, product: &NewProduct) -> AppResult<Product> {
        let row = match self.work.products.get(&product.id) {
            Some(existing) => Product {
                name: product.name.clone(),
                description: product.description.clone(),
                supplier_id: product.supplier_id,
                price: shared::round_money(product.price),
                image_url: product.image_url.clone(),
                stock: existing
                    .stock
                    .checked_add(product.stock)
                    .ok_or_else(|| constraint("integer out of range"))?,
                updated_at: Utc::now(),
                ..existing.clone()
            },
            None => new_product_row(product),
        };
        if row.stock < 0 {
            return Err(constraint("products_stock_non_negative"));
        }
        self.work.products.insert(row.id.clone(), row.clone());
        Ok(row)
    }

    async fn update_product_details(&mut self, product: &NewProduct) -> AppResult<Option<Product>> {
        let Some(existing) = self.work.products.get_mut(&product.id) else {
            return Ok(None);
        };
        existing.name = product.name.clone();
        existing.description = product.description.clone();
        existing.supplier_id = product.supplier_id;
        existing.price = shared::round_money(product.price);
        existing.image_url = product.image_url.clone();
        existing.updated_at = Utc::now();
        Ok(Some(existing.clone()))
    }

    async fn delete_product(&mut self, id: &str) -> AppResult<Option<Product>> {
        let referenced = self.work.order_lines.keys().any(|(_, p)| p == id)
            || self.work.supply_lines.keys().any(|(_, p)| p == id);
        if referenced {
            return Err(constraint("products row is still referenced"));
        }
        Ok(self.work.products.remove(id))
    }

    async fn increment_stock(&mut self, id: &str, by: i32) -> AppResult<Option<i32>> {
        let Some(product) = self.work.products.get_mut(id) else {
            return Ok(None);
        };
        let stock = product
            .stock
            .checked_add(by)
            .ok_or_else(|| constraint("integer out of range"))?;
        if stock < 0 {
            return Err(constraint("products_stock_non_negative"));
        }
        product.stock = stock;
        product.updated_at = Utc::now();
        Ok(Some(stock))
    }

    async fn decrement_stock(&mut self, id: &str, by: i32) -> AppResult<Option<i32>> {
        match self.work.products.get_mut(id) {
            Some(product) if product.stock >= by => {
                product.stock -= by;
                product.updated_at = Utc::now();
                Ok(Some(product.stock))
            }
            _ => Ok(None),
        }
    }

    async fn insert_order(&mut self, header: &OrderHeader) -> AppResult<Order> {
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            order_date: header.order_date,
            order_time: header.order_time,
            status: header.status.clone(),
            subtotal: shared::round_money(Decimal::ZERO),
            discount: shared::round_money(header.discount),
            tax: shared::round_money(header.tax),
            total: shared::round_money(Decimal::ZERO),
            client_id: header.client_id,
            employee_id: header.employee_id,
            created_at: now,
            updated_at: now,
        };
        self.work.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn find_order(&mut self, id: Uuid) -> AppResult<Option<Order>> {
        Ok(self.work.orders.get(&id).cloned())
    }

    async fn list_orders(&mut self, pagination: &Pagination) -> AppResult<Vec<Order>> {
        let mut orders: Vec<Order> = self.work.orders.values().cloned().collect();
        orders.sort_by(|a, b| {
            (b.order_date, b.order_time, b.created_at).cmp(&(a.order_date, a.order_time, a.created_at))
        });
        Ok(page(orders.into_iter(), pagination))
    }

    async fn update_order_header(&mut self, id: Uuid, header: &OrderHeader) -> AppResult<bool> {
        let Some(order) = self.work.orders.get_mut(&id) else {
            return Ok(false);
        };
        order.order_date = header.order_date;
        order.order_time = header.order_time;
        order.status = header.status.clone();
        order.client_id = header.client_id;
        order.employee_id = header.employee_id;
        order.discount = shared::round_money(header.discount);
        order.tax = shared::round_money(header.tax);
        order.updated_at = Utc::now();
        Ok(true)
    }

    async fn insert_order_lines(&mut self, lines: &[OrderLine]) -> AppResult<()> {
        for line in lines {
            if !self.work.orders.contains_key(&line.order_id) {
                return Err(constraint("order_lines_order_id_fkey"));
            }
            if !self.work.products.contains_key(&line.product_id) {
                return Err(constraint("order_lines_product_id_fkey"));
            }
            if line.quantity <= 0 {
                return Err(constraint("order_lines_quantity_check"));
            }
            let key = (line.order_id, line.product_id.clone());
            if self.work.order_lines.contains_key(&key) {
                return Err(constraint("duplicate key value violates order_lines_pkey"));
            }
            self.work.order_lines.insert(key, line.clone());
        }
        Ok(())
    }

    async fn delete_order_lines(&mut self, order_id: Uuid) -> AppResult<u64> {
        let before = self.work.order_lines.len();
        self.work.order_lines.retain(|(o, _), _| *o != order_id);
        Ok((before - self.work.order_lines.len()) as u64)
    }

    async fn order_lines(&mut self, order_id: Uuid) -> AppResult<Vec<OrderLine>> {
        Ok(self
            .work
            .order_lines
            .values()
            .filter(|l| l.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn sum_line_subtotals(&mut self, order_id: Uuid) -> AppResult<Decimal> {
        self.work
            .order_lines
            .values()
            .filter(|l| l.order_id == order_id)
            .filter_map(|l| l.subtotal)
            .try_fold(Decimal::ZERO, |sum, s| sum.checked_add(s))
            .ok_or_else(|| constraint("numeric field overflow"))
    }

    async fn write_order_totals(&mut self, order_id: Uuid, totals: &OrderTotals) -> AppResult<Order> {
        let order = self
            .work
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| AppError::NotFound("Order".to_string()))?;
        order.subtotal = totals.subtotal;
        order.discount = totals.discount;
        order.tax = totals.tax;
        order.total = totals.total;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn delete_order(&mut self, id: Uuid) -> AppResult<bool> {
        let referenced = self.work.order_lines.keys().any(|(o, _)| *o == id)
            || self.work.shipments.values().any(|s| s.order_id == id);
        if referenced {
            return Err(constraint("orders row is still referenced"));
        }
        Ok(self.work.orders.remove(&id).is_some())
    }

    async fn insert_shipment(&mut self, input: &CreateShipmentInput) -> AppResult<Shipment> {
        let code = input.code.trim().to_string();
        if !self.work.orders.contains_key(&input.order_id) {
            return Err(constraint("shipments_order_id_fkey"));
        }
        if self.work.shipments.values().any(|s| s.code == code) {
            return Err(constraint("duplicate key value violates shipments_code_key"));
        }
        let shipment = Shipment {
            id: Uuid::new_v4(),
            code,
            order_id: input.order_id,
            status: ShipmentStatus::Preparing,
            employee_id: input.employee_id,
            notes: input.notes.clone(),
            delivery_photo: None,
            created_at: Utc::now(),
            delivered_at: None,
        };
        self.work.shipments.insert(shipment.id, shipment.clone());
        Ok(shipment)
    }

    async fn find_shipment(&mut self, id: Uuid) -> AppResult<Option<Shipment>> {
        Ok(self.work.shipments.get(&id).cloned())
    }

    async fn update_shipment(&mut self, shipment: &Shipment) -> AppResult<Shipment> {
        let row = self
            .work
            .shipments
            .get_mut(&shipment.id)
            .ok_or_else(|| AppError::NotFound("Shipment".to_string()))?;
        row.status = shipment.status;
        row.employee_id = shipment.employee_id;
        row.notes = shipment.notes.clone();
        row.delivery_photo = shipment.delivery_photo.clone();
        row.delivered_at = shipment.delivered_at;
        Ok(row.clone())
    }

    async fn delete_shipment(&mut self, id: Uuid) -> AppResult<bool> {
        Ok(self.work.shipments.remove(&id).is_some())
    }

    async fn shipments_for_order(&mut self, order_id: Uuid) -> AppResult<Vec<Shipment>> {
        let mut shipments: Vec<Shipment> = self
            .work
            .shipments
            .values()
            .filter(|s| s.order_id == order_id)
            .cloned()
            .collect();
        shipments.sort_by_key(|s| s.created_at);
        Ok(shipments)
    }

    async fn insert_supply_intake(&mut self, header: &NewSupplyIntake) -> AppResult<SupplyIntake> {
        let intake = SupplyIntake {
            id: Uuid::new_v4(),
            arrival_date: header.arrival_date,
            arrival_time: header.arrival_time,
            supplier_id: header.supplier_id,
            carrier: header.carrier.clone(),
            employee_id: header.employee_id,
            created_at: Utc::now(),
        };
        self.work.intakes.insert(intake.id, intake.clone());
        Ok(intake)
    }

    async fn find_supply_intake(&mut self, id: Uuid) -> AppResult<Option<SupplyIntake>> {
        Ok(self.work.intakes.get(&id).cloned())
    }

    async fn list_supply_intakes(&mut self, pagination: &Pagination) -> AppResult<Vec<SupplyIntake>> {
        let mut intakes: Vec<SupplyIntake> = self.work.intakes.values().cloned().collect();
        intakes.sort_by(|a, b| (b.arrival_date, b.arrival_time).cmp(&(a.arrival_date, a.arrival_time)));
        Ok(page(intakes.into_iter(), pagination))
    }

    async fn delete_supply_intake(&mut self, id: Uuid) -> AppResult<bool> {
        let removed = self.work.intakes.remove(&id).is_some();
        if removed {
            self.work.supply_lines.retain(|(i, _), _| *i != id);
        }
        Ok(removed)
    }

    async fn insert_supply_line(&mut self, line: &SupplyLine) -> AppResult<()> {
        if !self.work.intakes.contains_key(&line.intake_id) {
            return Err(constraint("supply_lines_intake_id_fkey"));
        }
        if !self.work.products.contains_key(&line.product_id) {
            return Err(constraint("supply_lines_product_id_fkey"));
        }
        if line.quantity <= 0 {
            return Err(constraint("supply_lines_quantity_check"));
        }
        let key = (line.intake_id, line.product_id.clone());
        if self.work.supply_lines.contains_key(&key) {
            return Err(constraint("duplicate key value violates supply_lines_pkey"));
        }
        self.work.supply_lines.insert(key, line.clone());
        Ok(())
    }

    async fn find_supply_line(
        &mut self,
        intake_id: Uuid,
        product_id: &str,
    ) -> AppResult<Option<SupplyLine>> {
        Ok(self
            .work
            .supply_lines
            .get(&(intake_id, product_id.to_string()))
            .cloned())
    }

    async fn supply_lines(&mut self, intake_id: Uuid) -> AppResult<Vec<SupplyLine>> {
        Ok(self
            .work
            .supply_lines
            .values()
            .filter(|l| l.intake_id == intake_id)
            .cloned()
            .collect())
    }

    async fn update_supply_line(&mut self, line: &SupplyLine) -> AppResult<bool> {
        if line.quantity <= 0 {
            return Err(constraint("supply_lines_quantity_check"));
        }
        match self
            .work
            .supply_lines
            .get_mut(&(line.intake_id, line.product_id.clone()))
        {
            Some(row) => {
                row.quantity = line.quantity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_supply_line(&mut self, intake_id: Uuid, product_id: &str) -> AppResult<bool> {
        Ok(self
            .work
            .supply_lines
            .remove(&(intake_id, product_id.to_string()))
            .is_some())
    }

    async fn insert_audit_entry(&mut self, entry: &NewAuditEntry) -> AppResult<AuditEntry> {
        if self.fail_audit_writes {
            return Err(constraint("audit_log is not writable"));
        }
        let row = AuditEntry {
            id: self.work.audit_log.len() as i64 + 1,
            table_name: entry.table_name.clone(),
            record_id: entry.record_id.clone(),
            action: entry.action,
            old_values: entry.old_values.clone(),
            new_values: entry.new_values.clone(),
            employee_id: entry.employee_id,
            ip_address: entry.ip_address.clone(),
            client_timestamp: entry.client_timestamp,
            created_at: Utc::now(),
        };
        self.work.audit_log.push(row.clone());
        Ok(row)
    }

    async fn audit_entries(&mut self, query: &AuditQuery) -> AppResult<Vec<AuditEntry>> {
        let limit = query.limit.unwrap_or(100).clamp(1, 1000) as usize;
        let offset = query.offset.unwrap_or(0).max(0) as usize;
        Ok(self
            .work
            .audit_log
            .iter()
            .rev()
            .filter(|e| query.matches(e))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}
